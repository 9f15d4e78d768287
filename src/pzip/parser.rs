//! Low-level PZIP container parser.
//!
//! This module reads the container structure from any source that
//! implements [`ReadAt`]. It never decompresses anything; it only validates
//! the framing.
//!
//! ## Parsing Strategy
//!
//! A container has no index, so records are discovered front to back:
//! 1. Read and validate the 24-byte header at offset 0
//! 2. For each of `chunk_count` records, read the 4-byte length prefix at
//!    the current offset, then step over the payload
//! 3. After the last record the offset must equal the container size
//!
//! Every step is checked against the source size before reading, so a cut
//! container is reported as truncation rather than a short read.

use byteorder::{ByteOrder, LittleEndian};
use std::sync::Arc;

use crate::error::{PzipError, Result};
use crate::io::ReadAt;

use super::structures::*;

/// Low-level container parser.
///
/// Typically used through [`Decoder`](super::Decoder) rather than directly,
/// except for listing a container's record table.
pub struct ContainerParser<R: ReadAt> {
    /// The underlying data source
    reader: Arc<R>,
    /// Total size of the container in bytes
    size: u64,
}

/// Header and record table of a container.
#[derive(Debug, Clone)]
pub struct Listing {
    pub header: Header,
    pub records: Vec<RecordInfo>,
    /// Total container size in bytes
    pub container_size: u64,
}

impl Listing {
    /// Sum of all compressed payload lengths
    pub fn compressed_payload(&self) -> u64 {
        self.records.iter().map(|r| r.payload_length as u64).sum()
    }
}

impl<R: ReadAt> ContainerParser<R> {
    pub fn new(reader: Arc<R>) -> Self {
        let size = reader.size();
        Self { reader, size }
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Read and validate the container header.
    ///
    /// # Errors
    ///
    /// A format error if the container is shorter than a header, the magic
    /// is not `PZIP`, or the version is not 1.
    pub async fn read_header(&self) -> Result<Header> {
        if self.size < Header::SIZE as u64 {
            return Err(PzipError::TruncatedHeader(self.size));
        }

        let mut buf = [0u8; Header::SIZE];
        self.reader.read_exact_at(0, &mut buf).await?;

        Header::from_bytes(&buf)
    }

    /// Locate the record with zero-based `index` starting at `offset`.
    ///
    /// Reads only the length prefix; the payload extent is checked against
    /// the container size.
    pub async fn read_record_info(&self, index: u32, offset: u64) -> Result<RecordInfo> {
        let chunk = index + 1;

        let remaining = self.size.saturating_sub(offset);
        if remaining < RECORD_PREFIX_SIZE as u64 {
            return Err(PzipError::Truncated {
                chunk,
                detail: format!(
                    "missing length prefix at offset {} ({} bytes left)",
                    offset, remaining
                ),
            });
        }

        let mut prefix = [0u8; RECORD_PREFIX_SIZE];
        self.reader.read_exact_at(offset, &mut prefix).await?;
        let payload_length = LittleEndian::read_u32(&prefix);

        // zlib never produces an empty stream, so this is a missing record
        if payload_length == 0 {
            return Err(PzipError::Truncated {
                chunk,
                detail: format!("empty chunk record at offset {}", offset),
            });
        }

        let record = RecordInfo {
            index,
            offset,
            payload_length,
        };

        let available = self.size - record.payload_offset();
        if payload_length as u64 > available {
            return Err(PzipError::Truncated {
                chunk,
                detail: format!("expected {} bytes, got {}", payload_length, available),
            });
        }

        Ok(record)
    }

    /// Read the compressed payload of a located record.
    pub async fn read_payload(&self, record: &RecordInfo) -> Result<Vec<u8>> {
        let mut payload = vec![0u8; record.payload_length as usize];
        self.reader
            .read_exact_at(record.payload_offset(), &mut payload)
            .await?;
        Ok(payload)
    }

    /// Ensure nothing follows the record ending at `end_offset`.
    pub fn check_end(&self, end_offset: u64) -> Result<()> {
        match self.size.checked_sub(end_offset) {
            Some(0) => Ok(()),
            Some(extra) => Err(PzipError::TrailingData(extra)),
            // Record extents are checked before they are read.
            None => Err(PzipError::Truncated {
                chunk: 0,
                detail: format!("container ends before offset {}", end_offset),
            }),
        }
    }

    /// Walk the whole container and return its header and record table.
    ///
    /// Performs the same framing checks as decoding, without reading or
    /// decompressing any payload.
    pub async fn list_records(&self) -> Result<Listing> {
        let header = self.read_header().await?;

        let mut records = Vec::with_capacity(header.chunk_count.min(1 << 16) as usize);
        let mut offset = Header::SIZE as u64;

        for index in 0..header.chunk_count {
            let record = self.read_record_info(index, offset).await?;
            offset = record.end_offset();
            records.push(record);
        }

        self.check_end(offset)?;

        Ok(Listing {
            header,
            records,
            container_size: self.size,
        })
    }

    /// Get a reference to the underlying reader.
    pub fn reader(&self) -> &Arc<R> {
        &self.reader
    }
}
