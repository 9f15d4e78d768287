//! Error taxonomy for PZIP operations.
//!
//! Every failure detected by the encoder or decoder is reported as a
//! [`PzipError`]. Callers that need to react to a particular failure should
//! match on [`PzipError::kind`] rather than on the rendered message.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, PzipError>;

/// Coarse classification of a [`PzipError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Open, read or write failure on either file.
    Io,
    /// Bad magic, unsupported version or short header.
    Format,
    /// A record or its length prefix is missing or cut short.
    Truncated,
    /// A payload failed to decompress.
    Payload,
    /// The reconstructed stream disagrees with the header.
    Integrity,
}

/// Errors produced while encoding or decoding a PZIP container.
#[derive(Debug, Error)]
pub enum PzipError {
    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O failure not attributable to a particular path (in-memory
    /// buffers, caller-supplied writers).
    #[error("I/O error: {0}")]
    Stream(#[from] std::io::Error),

    #[error("invalid magic bytes: expected \"PZIP\", got \"{}\"", .found.escape_ascii())]
    BadMagic { found: [u8; 4] },

    #[error("unsupported version: {0}")]
    UnsupportedVersion(u32),

    #[error("file too small ({0} bytes), not a valid .pzip file")]
    TruncatedHeader(u64),

    #[error("invalid header: {0}")]
    InvalidHeader(&'static str),

    #[error("{size} bytes need more than {} chunks of {chunk_size} bytes", u32::MAX)]
    TooManyChunks { size: u64, chunk_size: u32 },

    #[error("unexpected end of file at chunk {chunk}: {detail}")]
    Truncated { chunk: u32, detail: String },

    #[error("error decompressing chunk {chunk}: {detail}")]
    Payload { chunk: u32, detail: String },

    #[error("size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("{0} trailing bytes after final chunk record")]
    TrailingData(u64),

    /// Failure while compressing a chunk.
    #[error("error compressing chunk {chunk}: {source}")]
    Compress {
        chunk: u32,
        #[source]
        source: std::io::Error,
    },

    /// Non-I/O failure reported by a [`ReadAt`](crate::io::ReadAt) implementation.
    #[error("container source error: {0}")]
    Source(String),
}

impl PzipError {
    /// Wraps an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PzipError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PzipError::Io { .. }
            | PzipError::Stream(_)
            | PzipError::Compress { .. }
            | PzipError::Source(_) => ErrorKind::Io,
            PzipError::BadMagic { .. }
            | PzipError::UnsupportedVersion(_)
            | PzipError::TruncatedHeader(_)
            | PzipError::InvalidHeader(_)
            | PzipError::TooManyChunks { .. } => ErrorKind::Format,
            PzipError::Truncated { .. } => ErrorKind::Truncated,
            PzipError::Payload { .. } => ErrorKind::Payload,
            PzipError::SizeMismatch { .. } | PzipError::TrailingData(_) => ErrorKind::Integrity,
        }
    }
}

impl From<anyhow::Error> for PzipError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<std::io::Error>() {
            Ok(io) => PzipError::Stream(io),
            Err(other) => PzipError::Source(format!("{:#}", other)),
        }
    }
}
