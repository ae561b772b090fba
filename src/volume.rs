use crate::{BLOCK_SIZE, CREATE_MEBIBYTES};
use crate::block_dev::BlockDevice;
use crate::dir::DirBlock;
use crate::error::{Error, Result};
use crate::layout::*;
use crate::resolve::{resolve, resolve_parent};
use crate::table::TableAllocator;
use crate::time::current_time;

/// A formatted volume on a block device.
///
/// Only the header is kept in memory. Every operation re-reads table and
/// directory records from the device and writes them back before returning.
pub struct Volume<D> {
    dev: D,
    header: Header,
}

impl<D: BlockDevice> Volume<D> {
    /// Lays out an empty volume of `total_size` bytes: header, an all-empty
    /// allocation table and a root directory with its own block.
    pub fn format(mut dev: D, total_size: u64) -> Result<Self> {
        if total_size < DATA_OFFSET {
            return Err(Error::InvalidArgument("volume too small for the header and table"));
        }

        let header = Header::new(total_size);
        dev.seek_to(0)?;
        header.write_to(&mut dev)?;

        dev.seek_to(header.table_offset)?;
        let empty = TableEntry::default();
        for _ in 0..MAX_TABLE_ENTRIES {
            empty.write_to(&mut dev)?;
        }

        let mut volume = Self { dev, header };
        let offset = volume.reserve(BLOCK_SIZE)?;
        let root = Entry::new(EntryType::Directory, offset, current_time());
        DirBlock::new(&mut volume.dev, &root).clear()?;
        volume.dev.seek_to(volume.header.root_offset)?;
        root.write_to(&mut volume.dev)?;

        log::debug!("formatted {} bytes, root directory at {:#x}", total_size, offset);
        Ok(volume)
    }

    /// Opens a formatted volume, failing on a signature mismatch.
    pub fn open(mut dev: D) -> Result<Self> {
        dev.seek_to(0)?;
        let header = Header::read_from(&mut dev)?;
        let volume = Self { dev, header };
        volume.check_signature()?;
        log::debug!(
            "opened volume of {} bytes, {} table entries",
            volume.header.total_size,
            volume.header.table_entry_count
        );
        Ok(volume)
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn check_signature(&self) -> Result<()> {
        if self.header.has_valid_signature() {
            Ok(())
        } else {
            Err(Error::InvalidSignature)
        }
    }

    /// Syncs the device and hands it back.
    pub fn close(mut self) -> Result<D> {
        self.dev.sync()?;
        Ok(self.dev)
    }

    fn allocator(&mut self) -> TableAllocator<'_, D> {
        TableAllocator::new(&mut self.dev, &mut self.header)
    }

    pub fn reserve(&mut self, size: u64) -> Result<u64> {
        self.allocator().reserve(size)
    }

    pub fn reserve_mebibytes(&mut self, mebibytes: u64) -> Result<u64> {
        self.allocator().reserve_mebibytes(mebibytes)
    }

    pub fn table_entries(&mut self) -> Result<Vec<TableEntry>> {
        self.allocator().entries()
    }

    pub fn root(&mut self) -> Result<Entry> {
        self.dev.seek_to(self.header.root_offset)?;
        Entry::read_from(&mut self.dev)
    }

    pub fn lookup(&mut self, path: &str) -> Result<Entry> {
        let root = self.root()?;
        resolve(&mut self.dev, root, path)
    }

    /// Entries of the directory at `path`, in slot order.
    pub fn read_dir(&mut self, path: &str) -> Result<Vec<Entry>> {
        let dir = self.lookup(path)?;
        if !dir.is_dir() {
            return Err(Error::NotADirectory(path.to_owned()));
        }
        DirBlock::new(&mut self.dev, &dir).entries()
    }

    pub fn create_file(&mut self, path: &str) -> Result<Entry> {
        self.create_entry(path, EntryType::File)
    }

    pub fn create_dir(&mut self, path: &str) -> Result<Entry> {
        self.create_entry(path, EntryType::Directory)
    }

    // The region is reserved before the parent is resolved. If resolving or
    // appending fails the table entry stays behind with nothing referencing it.
    fn create_entry(&mut self, path: &str, ty: EntryType) -> Result<Entry> {
        let offset = self.reserve_mebibytes(CREATE_MEBIBYTES)?;
        let mut entry = Entry::new(ty, offset, current_time());
        if ty == EntryType::Directory {
            DirBlock::new(&mut self.dev, &entry).clear()?;
        }

        let root = self.root()?;
        let (parent, name) = resolve_parent(&mut self.dev, root, path)?;
        entry.set_name(name);
        DirBlock::new(&mut self.dev, &parent).append(&entry)?;

        log::debug!("created {:?} {:?} at {:#x}", ty, path, offset);
        Ok(entry)
    }

    /// Not supported: entries and their regions are never reclaimed.
    pub fn delete_file(&mut self, _path: &str) -> Result<()> {
        Err(Error::Unimplemented)
    }
}
