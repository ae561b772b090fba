use crate::block_dev::BlockDevice;
use crate::dir::DirBlock;
use crate::error::{Error, Result};
use crate::layout::{Entry, NAME_MAX};
use crate::path::Path;

// NUL terminates a stored name and cannot appear inside one.
fn check_component(name: &str, full: &str) -> Result<()> {
    if name.is_empty() || name.contains('\0') {
        return Err(Error::InvalidName(full.to_owned()));
    }
    Ok(())
}

fn check_basename(name: &str, full: &str) -> Result<()> {
    check_component(name, full)?;
    if name.len() >= NAME_MAX {
        return Err(Error::InvalidName(full.to_owned()));
    }
    Ok(())
}

/// The part of `full` consumed so far, e.g. `/docs` while `path` is at
/// `/readme`.
fn consumed<'p>(full: &'p str, path: &Path<'p>) -> &'p str {
    &full[..full.len() - path.as_str().len()]
}

/// Looks up `name` in `dir`, reporting a miss against the whole prefix.
fn lookup<D: BlockDevice>(dev: &mut D, dir: &Entry, name: &str, prefix: &str) -> Result<Entry> {
    DirBlock::new(dev, dir).find(name).map_err(|err| match err {
        Error::NotFound(_) => Error::NotFound(prefix.to_owned()),
        err => err,
    })
}

/// Descends from `root` through every component of `path` but the last, and
/// returns the directory reached together with the last component.
///
/// The basename itself is not looked up. An empty component anywhere
/// (`/a//b`, `/a/`, `/`) or one containing NUL is rejected as an invalid name.
pub fn resolve_parent<'p, D: BlockDevice>(
    dev: &mut D,
    root: Entry,
    full: &'p str,
) -> Result<(Entry, &'p str)> {
    let mut path = Path::new(full);
    let mut dir = root;
    loop {
        let name = path.split_root();
        if path.is_empty() {
            check_basename(name, full)?;
            return Ok((dir, name));
        }
        check_component(name, full)?;
        let prefix = consumed(full, &path);
        let next = lookup(dev, &dir, name, prefix)?;
        if !next.is_dir() {
            return Err(Error::NotADirectory(prefix.to_owned()));
        }
        log::trace!("descend into {:?} at {:#x}", name, next.offset);
        dir = next;
    }
}

/// Looks up every component of `path`. `/` and the empty path name the root;
/// a single trailing separator is accepted after a directory.
pub fn resolve<D: BlockDevice>(dev: &mut D, root: Entry, full: &str) -> Result<Entry> {
    let mut path = Path::new(full);
    let mut entry = root;
    loop {
        let name = path.split_root();
        if name.is_empty() {
            if !path.is_empty() {
                return Err(Error::InvalidName(full.to_owned()));
            }
            if !entry.is_dir() {
                return Err(Error::NotADirectory(full.to_owned()));
            }
            return Ok(entry);
        }
        check_component(name, full)?;
        if !entry.is_dir() {
            return Err(Error::NotADirectory(full.to_owned()));
        }
        entry = lookup(dev, &entry, name, consumed(full, &path))?;
        if path.is_empty() {
            return Ok(entry);
        }
    }
}
