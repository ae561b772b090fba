use std::io::{self, Read, Seek, SeekFrom, Write};

/// Byte-addressed storage a volume lives on.
///
/// Every record access is a `seek_to` followed by one `read_bytes` or
/// `write_bytes` of the full record.
pub trait BlockDevice {
    fn seek_to(&mut self, pos: u64) -> io::Result<()>;
    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<()>;
    fn write_bytes(&mut self, buf: &[u8]) -> io::Result<()>;
    fn sync(&mut self) -> io::Result<()>;
}

impl<T: Read + Write + Seek> BlockDevice for T {
    fn seek_to(&mut self, pos: u64) -> io::Result<()> {
        self.seek(SeekFrom::Start(pos)).map(|_| ())
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.read_exact(buf)
    }

    fn write_bytes(&mut self, buf: &[u8]) -> io::Result<()> {
        self.write_all(buf)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.flush()
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::io::Cursor;
    use crate::{Volume, MEBIBYTE};

    pub type TestDisk = Cursor<Vec<u8>>;

    pub fn disk(size: u64) -> TestDisk {
        Cursor::new(vec![0; size as usize])
    }

    pub fn setup(size: u64) -> Volume<TestDisk> {
        Volume::format(disk(size), size).unwrap()
    }

    pub fn setup_64m() -> Volume<TestDisk> {
        setup(64 * MEBIBYTE)
    }

    #[test]
    fn cursor_device_basic() {
        let mut dev = disk(4096);
        dev.seek_to(1000).unwrap();
        dev.write_bytes(b"hello, world!").unwrap();

        let mut buf = [0; 13];
        dev.seek_to(1000).unwrap();
        dev.read_bytes(&mut buf).unwrap();
        assert_eq!(&buf, b"hello, world!");

        dev.seek_to(999).unwrap();
        dev.read_bytes(&mut buf[..1]).unwrap();
        assert_eq!(buf[0], 0);
    }

    #[test]
    fn cursor_device_read_over_bound() {
        let mut dev = disk(16);
        let mut buf = [0; 8];
        dev.seek_to(12).unwrap();
        let err = dev.read_bytes(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn file_device_basic() {
        let mut file = tempfile::tempfile().unwrap();
        file.set_len(4096).unwrap();
        file.seek_to(510).unwrap();
        file.write_bytes(&[6; 4]).unwrap();
        file.sync().unwrap();

        let mut buf = [0; 6];
        file.seek_to(509).unwrap();
        file.read_bytes(&mut buf).unwrap();
        assert_eq!(buf, [0, 6, 6, 6, 6, 0]);
    }
}
