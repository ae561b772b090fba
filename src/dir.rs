use crate::BLOCK_SIZE;
use crate::block_dev::BlockDevice;
use crate::error::{Error, Result};
use crate::layout::{Entry, ENTRIES_PER_BLOCK, ENTRY_SIZE};
use static_assertions::const_assert_eq;

const ZERO_CHUNK: usize = 64 * 1024;
/// Slots read per device access while looking for a free one.
const SCAN_SLOTS: usize = 512;

const_assert_eq!(ENTRIES_PER_BLOCK % SCAN_SLOTS as u64, 0);

/// The single block of entry slots owned by a directory entry.
///
/// Slots are always scanned from the start of the block: `find` looks at
/// every slot and returns the first name match, `append` takes the first
/// empty slot.
pub struct DirBlock<'a, D> {
    dev: &'a mut D,
    start: u64,
}

impl<'a, D: BlockDevice> DirBlock<'a, D> {
    pub fn new(dev: &'a mut D, dir: &Entry) -> Self {
        Self { dev, start: dir.offset }
    }

    fn slot_pos(&self, slot: u64) -> u64 {
        self.start + slot * ENTRY_SIZE as u64
    }

    pub fn find(&mut self, name: &str) -> Result<Entry> {
        self.dev.seek_to(self.start)?;
        for slot in 0..ENTRIES_PER_BLOCK {
            let entry = Entry::read_from(self.dev)?;
            if entry.is_named(name) {
                log::trace!("found {:?} in slot {} of block {:#x}", name, slot, self.start);
                return Ok(entry);
            }
        }
        Err(Error::NotFound(name.to_owned()))
    }

    fn first_empty_slot(&mut self) -> Result<Option<u64>> {
        let mut chunk = vec![0; SCAN_SLOTS * ENTRY_SIZE];
        let mut record = [0; ENTRY_SIZE];
        self.dev.seek_to(self.start)?;
        for first in (0..ENTRIES_PER_BLOCK).step_by(SCAN_SLOTS) {
            self.dev.read_bytes(&mut chunk)?;
            for (i, bytes) in chunk.chunks_exact(ENTRY_SIZE).enumerate() {
                record.copy_from_slice(bytes);
                if Entry::is_empty_record(&record) {
                    return Ok(Some(first + i as u64));
                }
            }
        }
        Ok(None)
    }

    /// Writes `entry` into the first empty slot and returns the slot index.
    pub fn append(&mut self, entry: &Entry) -> Result<u64> {
        let slot = self.first_empty_slot()?.ok_or(Error::DirectoryFull)?;
        let pos = self.slot_pos(slot);
        self.dev.seek_to(pos)?;
        entry.write_to(self.dev)?;
        log::trace!("appended {:?} to slot {} of block {:#x}", entry.name(), slot, self.start);
        Ok(slot)
    }

    /// Every used slot, in scan order.
    pub fn entries(&mut self) -> Result<Vec<Entry>> {
        self.dev.seek_to(self.start)?;
        let mut entries = vec![];
        for _ in 0..ENTRIES_PER_BLOCK {
            let entry = Entry::read_from(self.dev)?;
            if !entry.is_empty() {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    /// Marks every slot empty.
    pub fn clear(&mut self) -> Result<()> {
        let zeros = vec![0; ZERO_CHUNK];
        self.dev.seek_to(self.start)?;
        for _ in 0..BLOCK_SIZE / ZERO_CHUNK as u64 {
            self.dev.write_bytes(&zeros)?;
        }
        Ok(())
    }
}
