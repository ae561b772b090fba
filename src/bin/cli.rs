use anyhow::{Context, Result};
use bmfs::{Entry, EntryType, Volume, MEBIBYTE};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
struct CliArgs {
    #[arg(short, long, default_value = "bmfs.img")]
    image: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create (or truncate) the image and lay out an empty volume.
    Format {
        /// Volume size in mebibytes.
        #[arg(short, long, default_value_t = 64)]
        size: u64,
    },
    Mkdir { path: String },
    Touch { path: String },
    Rm { path: String },
    Ls {
        #[arg(default_value = "/")]
        path: String,
    },
    Stat { path: String },
    /// Print the allocation table.
    Table,
    /// Verify the image signature.
    Check,
}

fn create_image(path: &Path, size: u64) -> Result<File> {
    let file = File::options()
        .create(true)
        .read(true)
        .write(true)
        .truncate(true)
        .open(path)
        .with_context(|| format!("cannot create {}", path.display()))?;
    file.set_len(size)?;
    Ok(file)
}

fn open_volume(path: &Path) -> Result<Volume<File>> {
    let file = File::options()
        .read(true)
        .write(true)
        .open(path)
        .with_context(|| format!("cannot open {}", path.display()))?;
    Volume::open(file).with_context(|| format!("{} is not a bmfs volume", path.display()))
}

fn type_char(entry: &Entry) -> char {
    match entry.entry_type() {
        Some(EntryType::Directory) => 'd',
        Some(EntryType::File) => '-',
        None => '?',
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = CliArgs::parse();
    let image = args.image.as_path();

    match args.command {
        Command::Format { size } => {
            let total_size = size.checked_mul(MEBIBYTE).context("volume size overflows")?;
            let file = create_image(image, total_size)?;
            let volume = Volume::format(file, total_size).context("format failed")?;
            volume.close()?;
            println!("formatted {} ({} MiB)", image.display(), size);
        }
        Command::Mkdir { path } => {
            let mut volume = open_volume(image)?;
            volume.create_dir(&path).with_context(|| format!("mkdir {}", path))?;
            volume.close()?;
        }
        Command::Touch { path } => {
            let mut volume = open_volume(image)?;
            volume.create_file(&path).with_context(|| format!("touch {}", path))?;
            volume.close()?;
        }
        Command::Rm { path } => {
            let mut volume = open_volume(image)?;
            volume.delete_file(&path).with_context(|| format!("rm {}", path))?;
        }
        Command::Ls { path } => {
            let mut volume = open_volume(image)?;
            for entry in volume.read_dir(&path)? {
                println!(
                    "{} {:>12} {:#014x} {}",
                    type_char(&entry),
                    entry.modification_time,
                    entry.offset,
                    entry.name()
                );
            }
        }
        Command::Stat { path } => {
            let mut volume = open_volume(image)?;
            println!("{:#?}", volume.lookup(&path)?);
        }
        Command::Table => {
            let mut volume = open_volume(image)?;
            for (i, entry) in volume.table_entries()?.iter().enumerate() {
                println!(
                    "{:4} offset={:#014x} used={} reserved={}",
                    i, entry.offset, entry.used, entry.reserved
                );
            }
        }
        Command::Check => {
            let volume = open_volume(image)?;
            volume.check_signature()?;
            let header = volume.header();
            println!(
                "ok: {} bytes, {} table entries, root record at {:#x}",
                header.total_size, header.table_entry_count, header.root_offset
            );
        }
    }
    Ok(())
}
