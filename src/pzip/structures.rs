use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;

use crate::error::{PzipError, Result};

/// Default nominal chunk size used by the encoder (1 MiB).
pub const DEFAULT_CHUNK_SIZE: u32 = 1024 * 1024;

/// Default zlib compression effort.
pub const DEFAULT_LEVEL: u32 = 6;

/// Length prefix in front of every chunk record - 4 bytes
pub const RECORD_PREFIX_SIZE: usize = 4;

/// Container header - 24 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u32,
    pub original_size: u64,
    pub chunk_count: u32,
    pub chunk_size: u32,
}

impl Header {
    pub const MAGIC: &'static [u8; 4] = b"PZIP";
    pub const VERSION: u32 = 1;
    pub const SIZE: usize = 24;

    pub fn new(original_size: u64, chunk_count: u32, chunk_size: u32) -> Self {
        Self {
            version: Self::VERSION,
            original_size,
            chunk_count,
            chunk_size,
        }
    }

    /// Parse and validate a header.
    ///
    /// The magic is checked before any other field is read, then the
    /// version. Only version 1 is accepted.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(PzipError::TruncatedHeader(data.len() as u64));
        }

        let mut found = [0u8; 4];
        found.copy_from_slice(&data[0..4]);
        if &found != Self::MAGIC {
            return Err(PzipError::BadMagic { found });
        }

        let mut cursor = Cursor::new(&data[4..Self::SIZE]);

        let version = cursor.read_u32::<LittleEndian>()?;
        if version != Self::VERSION {
            return Err(PzipError::UnsupportedVersion(version));
        }

        let header = Self {
            version,
            original_size: cursor.read_u64::<LittleEndian>()?,
            chunk_count: cursor.read_u32::<LittleEndian>()?,
            chunk_size: cursor.read_u32::<LittleEndian>()?,
        };

        if header.chunk_size == 0 && header.chunk_count > 0 {
            return Err(PzipError::InvalidHeader("chunk size is zero"));
        }

        Ok(header)
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..4].copy_from_slice(Self::MAGIC);

        let mut cursor = Cursor::new(&mut buf[4..]);
        // Writes into a fixed 20-byte slice cannot fail.
        let _ = cursor.write_u32::<LittleEndian>(self.version);
        let _ = cursor.write_u64::<LittleEndian>(self.original_size);
        let _ = cursor.write_u32::<LittleEndian>(self.chunk_count);
        let _ = cursor.write_u32::<LittleEndian>(self.chunk_size);

        buf
    }
}

/// Location of one chunk record inside a container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordInfo {
    /// Zero-based chunk index (order of appearance)
    pub index: u32,
    /// Offset of the record's length prefix
    pub offset: u64,
    pub payload_length: u32,
}

impl RecordInfo {
    /// Offset of the compressed payload
    pub fn payload_offset(&self) -> u64 {
        self.offset + RECORD_PREFIX_SIZE as u64
    }

    /// Offset of the byte following this record
    pub fn end_offset(&self) -> u64 {
        self.payload_offset() + self.payload_length as u64
    }
}

/// Number of chunks needed to cover `size` bytes with `chunk_size`-byte chunks.
///
/// Returns `None` when the count does not fit in the header's 32-bit field.
pub fn chunk_count_for(size: u64, chunk_size: u32) -> Option<u32> {
    if chunk_size == 0 {
        return None;
    }
    u32::try_from(size.div_ceil(chunk_size as u64)).ok()
}
