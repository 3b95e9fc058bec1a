use std::convert::TryInto;

use crate::error::{BenchError, Result};

pub const HEADER_LEN: usize = 32;
const VERSION_MAJOR: u16 = 1;
const VERSION_MINOR: u16 = 0;

/// Which of the store files a header belongs to.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StoreFile {
    Nodes,
    Relationships,
}

impl StoreFile {
    fn magic(self) -> &'static [u8; 8] {
        match self {
            StoreFile::Nodes => b"HOPNODE\0",
            StoreFile::Relationships => b"HOPRELS\0",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            StoreFile::Nodes => "nodestore.db",
            StoreFile::Relationships => "relstore.db",
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct StoreHeader {
    pub file: StoreFile,
    pub record_size: u32,
    pub record_count: u64,
    pub body_crc32: u32,
}

impl StoreHeader {
    pub fn new(file: StoreFile, record_size: usize, body: &[u8]) -> Result<Self> {
        let record_size = u32::try_from(record_size)
            .map_err(|_| BenchError::Corruption("record size exceeds u32::MAX".into()))?;
        Ok(Self {
            file,
            record_size,
            record_count: (body.len() / record_size as usize) as u64,
            body_crc32: crc32fast::hash(body),
        })
    }

    pub fn read(file: StoreFile, data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(BenchError::Corruption(format!(
                "{} header shorter than expected",
                file.file_name()
            )));
        }
        if &data[..8] != file.magic() {
            return Err(BenchError::Corruption(format!(
                "invalid {} header magic",
                file.file_name()
            )));
        }

        let major = u16::from_be_bytes([data[8], data[9]]);
        let minor = u16::from_be_bytes([data[10], data[11]]);
        if major != VERSION_MAJOR || minor != VERSION_MINOR {
            return Err(BenchError::Corruption(format!(
                "unsupported store version {major}.{minor}"
            )));
        }

        let record_size = u32::from_be_bytes([data[12], data[13], data[14], data[15]]);
        let record_count = u64::from_be_bytes(data[16..24].try_into().expect("slice is 8 bytes"));
        let body_crc32 = u32::from_be_bytes([data[24], data[25], data[26], data[27]]);
        Ok(Self {
            file,
            record_size,
            record_count,
            body_crc32,
        })
    }

    pub fn write(&self, data: &mut [u8]) -> Result<()> {
        if data.len() < HEADER_LEN {
            return Err(BenchError::Corruption(
                "header buffer shorter than expected".into(),
            ));
        }
        data[..HEADER_LEN].fill(0);
        data[..8].copy_from_slice(self.file.magic());
        data[8..10].copy_from_slice(&VERSION_MAJOR.to_be_bytes());
        data[10..12].copy_from_slice(&VERSION_MINOR.to_be_bytes());
        data[12..16].copy_from_slice(&self.record_size.to_be_bytes());
        data[16..24].copy_from_slice(&self.record_count.to_be_bytes());
        data[24..28].copy_from_slice(&self.body_crc32.to_be_bytes());
        Ok(())
    }

    /// Checks that `body` is exactly the records this header describes.
    pub fn verify_body(&self, expected_record_size: usize, body: &[u8]) -> Result<()> {
        let name = self.file.file_name();
        if self.record_size as usize != expected_record_size {
            return Err(BenchError::Corruption(format!(
                "{name} record size {} does not match {expected_record_size}",
                self.record_size
            )));
        }
        let expected_len = self
            .record_count
            .checked_mul(u64::from(self.record_size))
            .ok_or_else(|| BenchError::Corruption(format!("{name} record count overflows")))?;
        if body.len() as u64 != expected_len {
            return Err(BenchError::Corruption(format!(
                "{name} holds {} body bytes, header promises {expected_len}",
                body.len()
            )));
        }
        if crc32fast::hash(body) != self.body_crc32 {
            return Err(BenchError::Corruption(format!("{name} checksum mismatch")));
        }
        Ok(())
    }
}
