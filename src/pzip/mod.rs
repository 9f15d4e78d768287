//! The PZIP container format.
//!
//! ## Architecture
//!
//! - [`structures`]: header layout, record framing and format constants
//! - [`chunker`]: fixed-size chunking of source files
//! - [`codec`]: per-chunk zlib compression
//! - [`parser`]: framing validation over any [`ReadAt`](crate::io::ReadAt) source
//! - [`writer`]: the encoder
//! - [`extractor`]: the decoder
//!
//! ## Format Overview
//!
//! ```text
//! Header (24 bytes, little-endian):
//!   magic         "PZIP"
//!   version       u32 = 1
//!   original_size u64
//!   chunk_count   u32
//!   chunk_size    u32
//!
//! chunk_count records, in chunk order:
//!   payload_length u32
//!   payload        zlib stream of one chunk
//! ```
//!
//! Records carry no index; order of appearance is the chunk's identity.
//! The records must consume the container exactly, and their inflated
//! lengths must add up to `original_size`.
//!
//! ## Limitations
//!
//! - Chunks are processed strictly one after another
//! - No encryption or authentication

pub mod chunker;
pub mod codec;
mod extractor;
mod parser;
mod structures;
mod writer;

pub use chunker::{ChunkReader, Chunker, FileInfo};
pub use extractor::{DecodeSummary, Decoder, decode};
pub use parser::{ContainerParser, Listing};
pub use structures::*;
pub use writer::{EncodeOptions, EncodeSummary, Encoder, encode};
