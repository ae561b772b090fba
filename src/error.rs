use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("invalid file system signature")]
    InvalidSignature,
    #[error("allocation table is full")]
    CapacityExceeded,
    #[error("out of space: {reserved} bytes at {offset:#x} exceed volume size {total_size}")]
    OutOfSpace {
        offset: u64,
        reserved: u64,
        total_size: u64,
    },
    #[error("no such file or directory: {0}")]
    NotFound(String),
    #[error("invalid file name: {0:?}")]
    InvalidName(String),
    #[error("not a directory: {0}")]
    NotADirectory(String),
    #[error("directory is full")]
    DirectoryFull,
    #[error("operation not implemented")]
    Unimplemented,
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = core::result::Result<T, Error>;
