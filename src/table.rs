use crate::{BLOCK_SIZE, MEBIBYTE};
use crate::block_dev::BlockDevice;
use crate::error::{Error, Result};
use crate::layout::{Header, TableEntry, DATA_OFFSET, MAX_TABLE_ENTRIES, TABLE_ENTRY_SIZE};

/// Least multiple of `align` that is not below `size`, `None` on overflow.
pub fn round_up(size: u64, align: u64) -> Option<u64> {
    size.div_ceil(align).checked_mul(align)
}

/// Appends regions to the allocation table.
///
/// Regions are laid out back to back starting at `DATA_OFFSET`; nothing is
/// ever freed, so the next region always starts where the last one ends.
pub struct TableAllocator<'a, D> {
    dev: &'a mut D,
    header: &'a mut Header,
}

impl<'a, D: BlockDevice> TableAllocator<'a, D> {
    pub fn new(dev: &'a mut D, header: &'a mut Header) -> Self {
        Self { dev, header }
    }

    fn entry_pos(&self, index: u64) -> u64 {
        self.header.table_offset + index * TABLE_ENTRY_SIZE as u64
    }

    fn read_entry(&mut self, index: u64) -> Result<TableEntry> {
        let pos = self.entry_pos(index);
        self.dev.seek_to(pos)?;
        TableEntry::read_from(self.dev)
    }

    /// Reserves a block aligned region of at least `size` bytes and returns
    /// its offset. Writes one table entry and the header, nothing on failure.
    pub fn reserve(&mut self, size: u64) -> Result<u64> {
        let count = self.header.table_entry_count;
        if count >= MAX_TABLE_ENTRIES {
            return Err(Error::CapacityExceeded);
        }

        let total_size = self.header.total_size;
        let offset = if count == 0 {
            DATA_OFFSET
        } else {
            let last = self.read_entry(count - 1)?;
            match last.offset.checked_add(last.reserved) {
                Some(end) => end,
                None => {
                    return Err(Error::OutOfSpace {
                        offset: last.offset,
                        reserved: last.reserved,
                        total_size,
                    })
                }
            }
        };

        let reserved = round_up(size, BLOCK_SIZE).unwrap_or(u64::MAX);
        match offset.checked_add(reserved) {
            Some(end) if end <= total_size => (),
            _ => return Err(Error::OutOfSpace { offset, reserved, total_size }),
        }

        let entry = TableEntry { offset, used: size, reserved };
        let pos = self.entry_pos(count);
        self.dev.seek_to(pos)?;
        entry.write_to(self.dev)?;

        let mut header = self.header.clone();
        header.table_entry_count += 1;
        self.dev.seek_to(0)?;
        header.write_to(self.dev)?;
        *self.header = header;

        log::debug!("reserved {:#x} bytes at {:#x} (entry {})", reserved, offset, count);
        Ok(offset)
    }

    pub fn reserve_mebibytes(&mut self, mebibytes: u64) -> Result<u64> {
        let size = mebibytes.checked_mul(MEBIBYTE).unwrap_or(u64::MAX);
        self.reserve(size)
    }

    /// The live entries, in allocation order.
    pub fn entries(&mut self) -> Result<Vec<TableEntry>> {
        (0..self.header.table_entry_count)
            .map(|index| self.read_entry(index))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block_dev::tests::{disk, TestDisk};
    use crate::layout::TABLE_OFFSET;

    fn setup(total_size: u64) -> (TestDisk, Header) {
        let mut dev = disk(DATA_OFFSET);
        let header = Header::new(total_size);
        header.write_to(&mut dev).unwrap();
        (dev, header)
    }

    fn on_disk_header(dev: &mut TestDisk) -> Header {
        dev.seek_to(0).unwrap();
        Header::read_from(dev).unwrap()
    }

    #[test]
    fn round_up_law() {
        let sizes = [0, 1, 511, BLOCK_SIZE - 1, BLOCK_SIZE, BLOCK_SIZE + 1, 7 * BLOCK_SIZE + 3];
        for size in sizes {
            let rounded = round_up(size, BLOCK_SIZE).unwrap();
            assert!(rounded >= size);
            assert_eq!(rounded % BLOCK_SIZE, 0);
            assert!(rounded < size + BLOCK_SIZE);
        }
        assert_eq!(round_up(0, BLOCK_SIZE), Some(0));
        assert_eq!(round_up(1, BLOCK_SIZE), Some(BLOCK_SIZE));
        assert_eq!(round_up(BLOCK_SIZE, BLOCK_SIZE), Some(BLOCK_SIZE));
        assert_eq!(round_up(u64::MAX, BLOCK_SIZE), None);
    }

    #[test]
    fn first_reservation_follows_table() {
        let (mut dev, mut header) = setup(64 * MEBIBYTE);
        let offset = TableAllocator::new(&mut dev, &mut header).reserve(100).unwrap();
        assert_eq!(offset, DATA_OFFSET);
        assert_eq!(header.table_entry_count, 1);
        assert_eq!(on_disk_header(&mut dev).table_entry_count, 1);

        dev.seek_to(TABLE_OFFSET).unwrap();
        let entry = TableEntry::read_from(&mut dev).unwrap();
        assert_eq!(entry, TableEntry { offset: DATA_OFFSET, used: 100, reserved: BLOCK_SIZE });
    }

    #[test]
    fn reservations_are_contiguous() {
        let (mut dev, mut header) = setup(64 * MEBIBYTE);
        let mut allocator = TableAllocator::new(&mut dev, &mut header);
        let sizes = [1, BLOCK_SIZE, 3 * BLOCK_SIZE + 1, 0, 5];
        let offsets: Vec<u64> = sizes.iter().map(|&s| allocator.reserve(s).unwrap()).collect();

        let entries = allocator.entries().unwrap();
        assert_eq!(entries.len(), sizes.len());
        assert_eq!(entries[0].offset, DATA_OFFSET);
        for i in 1..entries.len() {
            assert_eq!(entries[i].offset, entries[i - 1].offset + entries[i - 1].reserved);
        }
        for (entry, (&size, &offset)) in entries.iter().zip(sizes.iter().zip(&offsets)) {
            assert_eq!(entry.offset, offset);
            assert_eq!(entry.used, size);
            assert_eq!(Some(entry.reserved), round_up(size, BLOCK_SIZE));
        }
        assert_eq!(header.table_entry_count, sizes.len() as u64);
    }

    #[test]
    fn reserve_mebibytes() {
        let (mut dev, mut header) = setup(64 * MEBIBYTE);
        let mut allocator = TableAllocator::new(&mut dev, &mut header);
        let a = allocator.reserve_mebibytes(2).unwrap();
        let b = allocator.reserve_mebibytes(3).unwrap();
        assert_eq!(b - a, 2 * MEBIBYTE);
        let entries = allocator.entries().unwrap();
        assert_eq!(entries[1].used, 3 * MEBIBYTE);
        assert_eq!(entries[1].reserved, 4 * MEBIBYTE);
    }

    #[test]
    fn out_of_space_has_no_side_effects() {
        let total = DATA_OFFSET + 2 * BLOCK_SIZE;
        let (mut dev, mut header) = setup(total);
        let mut allocator = TableAllocator::new(&mut dev, &mut header);
        allocator.reserve(BLOCK_SIZE).unwrap();
        allocator.reserve(BLOCK_SIZE).unwrap();
        let before = dev_snapshot(&mut allocator);

        let err = allocator.reserve(1).unwrap_err();
        assert!(matches!(err, Error::OutOfSpace { offset, .. } if offset == total));
        assert!(matches!(allocator.reserve(u64::MAX).unwrap_err(), Error::OutOfSpace { .. }));
        assert!(matches!(allocator.reserve_mebibytes(u64::MAX).unwrap_err(), Error::OutOfSpace { .. }));
        assert_eq!(dev_snapshot(&mut allocator), before);
        assert_eq!(header.table_entry_count, 2);
    }

    #[test]
    fn overflowing_last_entry() {
        let (mut dev, mut header) = setup(u64::MAX);
        let bad = TableEntry { offset: u64::MAX - 1, used: 1, reserved: BLOCK_SIZE };
        dev.seek_to(TABLE_OFFSET).unwrap();
        bad.write_to(&mut dev).unwrap();
        header.table_entry_count = 1;
        dev.seek_to(0).unwrap();
        header.write_to(&mut dev).unwrap();

        let mut allocator = TableAllocator::new(&mut dev, &mut header);
        let before = dev_snapshot(&mut allocator);
        let err = allocator.reserve(1).unwrap_err();
        assert!(matches!(err, Error::OutOfSpace { offset, .. } if offset == u64::MAX - 1));
        assert!(matches!(allocator.reserve_mebibytes(2).unwrap_err(), Error::OutOfSpace { .. }));
        assert_eq!(dev_snapshot(&mut allocator), before);
        assert_eq!(header.table_entry_count, 1);
    }

    fn dev_snapshot(allocator: &mut TableAllocator<'_, TestDisk>) -> Vec<u8> {
        allocator.dev.get_ref().clone()
    }

    #[test]
    fn full_table() {
        let (mut dev, mut header) = setup(u64::MAX);
        let mut allocator = TableAllocator::new(&mut dev, &mut header);
        for _ in 0..MAX_TABLE_ENTRIES {
            allocator.reserve(1).unwrap();
        }
        assert!(matches!(allocator.reserve(1).unwrap_err(), Error::CapacityExceeded));
        assert_eq!(header.table_entry_count, MAX_TABLE_ENTRIES);
        assert_eq!(on_disk_header(&mut dev).table_entry_count, MAX_TABLE_ENTRIES);
        assert_eq!(dev.get_ref().len() as u64, DATA_OFFSET);
    }
}
