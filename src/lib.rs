//! # pzip
//!
//! Chunked zlib compression into the PZIP container format.
//!
//! A source file is cut into fixed-size chunks, each chunk is compressed on
//! its own, and the compressed chunks are written as length-prefixed
//! records behind a 24-byte header. Decoding validates the framing, inflates
//! every record in order and checks the result against the size recorded in
//! the header.
//!
//! ## Features
//!
//! - Sequential encoder with per-chunk progress reporting
//! - Decoder that tells bad headers, truncation, corrupt payloads and size
//!   mismatches apart (see [`ErrorKind`])
//! - Containers are read through the [`ReadAt`] trait, so they can be
//!   decoded or listed from local files or from memory
//!
//! ## Example
//!
//! ```no_run
//! use std::num::NonZeroU32;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let progress = |message: &str, percent: f64| {
//!         eprintln!("[{:5.1}%] {}", percent, message);
//!     };
//!     let chunk_size = NonZeroU32::new(1024 * 1024).unwrap();
//!
//!     let source = Path::new("data.bin");
//!     let container = Path::new("data.bin.pzip");
//!
//!     let summary = pzip::encode(source, container, chunk_size, &progress).await?;
//!     println!("{} chunks", summary.chunk_count);
//!
//!     pzip::decode(container, Path::new("data.out"), &progress).await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod io;
pub mod progress;
pub mod pzip;

pub use cli::Cli;
pub use error::{ErrorKind, PzipError};
pub use io::{LocalFileReader, ReadAt};
pub use progress::{NoProgress, ProgressSink};
pub use pzip::{
    ContainerParser, DecodeSummary, Decoder, EncodeOptions, EncodeSummary, Encoder, Header,
    Listing, decode, encode,
};
