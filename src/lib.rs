mod block_dev;
mod error;
mod layout;
mod path;
mod time;
mod table;
mod dir;
mod resolve;
mod volume;

pub use block_dev::BlockDevice;
pub use error::{Error, Result};
pub use layout::{Entry, EntryType, Header, TableEntry};
pub use layout::{
    DATA_OFFSET, ENTRIES_PER_BLOCK, ENTRY_SIZE, HEADER_RECORD_SIZE, HEADER_SIZE, MAX_TABLE_ENTRIES,
    NAME_MAX, ROOT_OFFSET, SIGNATURE, TABLE_ENTRY_SIZE, TABLE_OFFSET,
};
pub use table::round_up;
pub use volume::Volume;

/// Allocation unit, and the size of one directory's entry array.
pub const BLOCK_SIZE: u64 = 2 * MEBIBYTE;
pub const MEBIBYTE: u64 = 1024 * 1024;

/// Every created file or directory is granted this many mebibytes.
pub const CREATE_MEBIBYTES: u64 = 2;
