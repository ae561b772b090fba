use core::fmt;
use static_assertions::const_assert;
use static_assertions::const_assert_eq;
use crate::BLOCK_SIZE;
use crate::block_dev::BlockDevice;
use crate::error::Result;

pub const SIGNATURE: [u8; 8] = *b"BMFS\0\0\0\0";

/// The header region: the header record followed by the root directory
/// record. The table starts right after it.
pub const HEADER_SIZE: usize = 512;
pub const TABLE_ENTRY_SIZE: usize = 24;
pub const ENTRY_SIZE: usize = 128;
/// Bytes of the region owned by the header record.
pub const HEADER_RECORD_SIZE: usize = HEADER_SIZE - ENTRY_SIZE;

/// Name capacity including the NUL terminator.
pub const NAME_MAX: usize = 64;
pub const MAX_TABLE_ENTRIES: u64 = 1024;

pub const ROOT_OFFSET: u64 = HEADER_RECORD_SIZE as u64;
pub const TABLE_OFFSET: u64 = HEADER_SIZE as u64;
/// First byte after the header region and the whole table.
pub const DATA_OFFSET: u64 = TABLE_OFFSET + MAX_TABLE_ENTRIES * TABLE_ENTRY_SIZE as u64;

pub const ENTRIES_PER_BLOCK: u64 = BLOCK_SIZE / ENTRY_SIZE as u64;

const_assert_eq!(ROOT_OFFSET, 384);
const_assert_eq!(DATA_OFFSET, 25088);
const_assert_eq!(BLOCK_SIZE % ENTRY_SIZE as u64, 0);
const_assert_eq!(ENTRIES_PER_BLOCK, 16384);
const_assert!(NAME_MAX + 1 + 7 + 3 * 8 <= ENTRY_SIZE);
const_assert!(8 + 4 * 8 <= HEADER_RECORD_SIZE);

fn get_u64(buf: &[u8], at: usize) -> u64 {
    let mut bytes = [0; 8];
    bytes.copy_from_slice(&buf[at..at + 8]);
    u64::from_le_bytes(bytes)
}

fn put_u64(buf: &mut [u8], at: usize, val: u64) {
    buf[at..at + 8].copy_from_slice(&val.to_le_bytes());
}

// Header: signature[0..8] total_size[8..16] table_offset[16..24]
// table_entry_count[24..32] root_offset[32..40], zero padded to
// HEADER_RECORD_SIZE. Writing the header never touches the root record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub signature: [u8; 8],
    pub total_size: u64,
    pub table_offset: u64,
    pub table_entry_count: u64,
    pub root_offset: u64,
}

impl Header {
    pub fn new(total_size: u64) -> Self {
        Self {
            signature: SIGNATURE,
            total_size,
            table_offset: TABLE_OFFSET,
            table_entry_count: 0,
            root_offset: ROOT_OFFSET,
        }
    }

    pub fn has_valid_signature(&self) -> bool {
        self.signature == SIGNATURE
    }

    pub fn to_bytes(&self) -> [u8; HEADER_RECORD_SIZE] {
        let mut buf = [0; HEADER_RECORD_SIZE];
        buf[0..8].copy_from_slice(&self.signature);
        put_u64(&mut buf, 8, self.total_size);
        put_u64(&mut buf, 16, self.table_offset);
        put_u64(&mut buf, 24, self.table_entry_count);
        put_u64(&mut buf, 32, self.root_offset);
        buf
    }

    pub fn from_bytes(buf: &[u8; HEADER_RECORD_SIZE]) -> Self {
        let mut signature = [0; 8];
        signature.copy_from_slice(&buf[0..8]);
        Self {
            signature,
            total_size: get_u64(buf, 8),
            table_offset: get_u64(buf, 16),
            table_entry_count: get_u64(buf, 24),
            root_offset: get_u64(buf, 32),
        }
    }

    pub fn read_from<D: BlockDevice>(dev: &mut D) -> Result<Self> {
        let mut buf = [0; HEADER_RECORD_SIZE];
        dev.read_bytes(&mut buf)?;
        Ok(Self::from_bytes(&buf))
    }

    pub fn write_to<D: BlockDevice>(&self, dev: &mut D) -> Result<()> {
        dev.write_bytes(&self.to_bytes())?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableEntry {
    pub offset: u64,
    pub used: u64,
    pub reserved: u64,
}

impl TableEntry {
    pub fn to_bytes(&self) -> [u8; TABLE_ENTRY_SIZE] {
        let mut buf = [0; TABLE_ENTRY_SIZE];
        put_u64(&mut buf, 0, self.offset);
        put_u64(&mut buf, 8, self.used);
        put_u64(&mut buf, 16, self.reserved);
        buf
    }

    pub fn from_bytes(buf: &[u8; TABLE_ENTRY_SIZE]) -> Self {
        Self {
            offset: get_u64(buf, 0),
            used: get_u64(buf, 8),
            reserved: get_u64(buf, 16),
        }
    }

    pub fn read_from<D: BlockDevice>(dev: &mut D) -> Result<Self> {
        let mut buf = [0; TABLE_ENTRY_SIZE];
        dev.read_bytes(&mut buf)?;
        Ok(Self::from_bytes(&buf))
    }

    pub fn write_to<D: BlockDevice>(&self, dev: &mut D) -> Result<()> {
        dev.write_bytes(&self.to_bytes())?;
        Ok(())
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    File = 1,
    Directory = 2,
}

impl EntryType {
    pub fn from_u8(ty: u8) -> Option<Self> {
        match ty {
            1 => Some(Self::File),
            2 => Some(Self::Directory),
            _ => None,
        }
    }
}

// Entry: name[0..64] type[64] pad[65..72] offset[72..80]
// creation_time[80..88] modification_time[88..96], zero padded.
#[derive(Clone, PartialEq, Eq)]
pub struct Entry {
    name: [u8; NAME_MAX],
    ty: u8,
    pub offset: u64,
    pub creation_time: u64,
    pub modification_time: u64,
}

impl Entry {
    /// The zeroed record marking an unused directory slot.
    pub fn empty() -> Self {
        Self {
            name: [0; NAME_MAX],
            ty: 0,
            offset: 0,
            creation_time: 0,
            modification_time: 0,
        }
    }

    pub fn new(ty: EntryType, offset: u64, time: u64) -> Self {
        Self {
            ty: ty as u8,
            offset,
            creation_time: time,
            modification_time: time,
            ..Self::empty()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name[0] == 0
    }

    /// `is_empty` on an encoded record, without decoding it.
    pub fn is_empty_record(record: &[u8; ENTRY_SIZE]) -> bool {
        record[0] == 0
    }

    pub fn entry_type(&self) -> Option<EntryType> {
        EntryType::from_u8(self.ty)
    }

    pub fn is_dir(&self) -> bool {
        self.entry_type() == Some(EntryType::Directory)
    }

    pub fn is_file(&self) -> bool {
        self.entry_type() == Some(EntryType::File)
    }

    /// Stored name bytes up to the terminator.
    pub fn name_bytes(&self) -> &[u8] {
        let len = self.name.iter().position(|&b| b == 0).unwrap_or(NAME_MAX);
        &self.name[..len]
    }

    pub fn name(&self) -> String {
        String::from_utf8_lossy(self.name_bytes()).into_owned()
    }

    /// Exact match on the stored name. Empty names and names that leave no
    /// room for the terminator never match.
    pub fn is_named(&self, name: &str) -> bool {
        let name = name.as_bytes();
        if name.is_empty() || name.len() >= NAME_MAX {
            return false;
        }
        self.name[..name.len()] == *name && self.name[name.len()] == 0
    }

    /// Callers validate the length first; longer names are cut to fit.
    pub fn set_name(&mut self, name: &str) {
        let name = name.as_bytes();
        let len = name.len().min(NAME_MAX - 1);
        self.name = [0; NAME_MAX];
        self.name[..len].copy_from_slice(&name[..len]);
    }

    pub fn to_bytes(&self) -> [u8; ENTRY_SIZE] {
        let mut buf = [0; ENTRY_SIZE];
        buf[..NAME_MAX].copy_from_slice(&self.name);
        buf[64] = self.ty;
        put_u64(&mut buf, 72, self.offset);
        put_u64(&mut buf, 80, self.creation_time);
        put_u64(&mut buf, 88, self.modification_time);
        buf
    }

    pub fn from_bytes(buf: &[u8; ENTRY_SIZE]) -> Self {
        let mut name = [0; NAME_MAX];
        name.copy_from_slice(&buf[..NAME_MAX]);
        Self {
            name,
            ty: buf[64],
            offset: get_u64(buf, 72),
            creation_time: get_u64(buf, 80),
            modification_time: get_u64(buf, 88),
        }
    }

    pub fn read_from<D: BlockDevice>(dev: &mut D) -> Result<Self> {
        let mut buf = [0; ENTRY_SIZE];
        dev.read_bytes(&mut buf)?;
        Ok(Self::from_bytes(&buf))
    }

    pub fn write_to<D: BlockDevice>(&self, dev: &mut D) -> Result<()> {
        dev.write_bytes(&self.to_bytes())?;
        Ok(())
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("name", &self.name())
            .field("type", &self.entry_type())
            .field("offset", &self.offset)
            .field("creation_time", &self.creation_time)
            .field("modification_time", &self.modification_time)
            .finish()
    }
}
