//! Fixed-size chunking of source files.
//!
//! A [`Chunker`] cuts a file into consecutive segments of exactly
//! `chunk_size` bytes; only the final segment may be shorter. Segments are
//! produced lazily by a [`ChunkReader`], one read at a time, so at most one
//! chunk is held in memory.

use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::error::{PzipError, Result};

use super::structures::chunk_count_for;

/// Size and chunk count of a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileInfo {
    pub size: u64,
    pub chunk_count: u32,
}

/// Splits files into fixed-size chunks.
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    chunk_size: NonZeroU32,
}

impl Chunker {
    pub fn new(chunk_size: NonZeroU32) -> Self {
        Self { chunk_size }
    }

    pub fn chunk_size(&self) -> u32 {
        self.chunk_size.get()
    }

    /// Stat `path` and compute how many chunks it splits into.
    ///
    /// A zero-length file has zero chunks.
    pub async fn file_info(&self, path: &Path) -> Result<FileInfo> {
        let size = tokio::fs::metadata(path)
            .await
            .map_err(|e| PzipError::io(path, e))?
            .len();

        let chunk_count = chunk_count_for(size, self.chunk_size()).ok_or(
            PzipError::TooManyChunks {
                size,
                chunk_size: self.chunk_size(),
            },
        )?;

        Ok(FileInfo { size, chunk_count })
    }

    /// Open `path` and return a reader yielding its chunks in order.
    ///
    /// Every call opens the file again and starts from the first byte.
    pub async fn read_chunks(&self, path: &Path) -> Result<ChunkReader> {
        let file = File::open(path).await.map_err(|e| PzipError::io(path, e))?;
        Ok(ChunkReader {
            file,
            path: path.to_path_buf(),
            chunk_size: self.chunk_size() as usize,
            done: false,
        })
    }
}

/// Lazy sequence of chunks read from one file.
pub struct ChunkReader {
    file: File,
    path: PathBuf,
    chunk_size: usize,
    done: bool,
}

impl ChunkReader {
    /// Read the next chunk.
    ///
    /// Returns `Ok(None)` once the file is exhausted. Every chunk but the
    /// last is exactly `chunk_size` bytes long.
    pub async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        if self.done {
            return Ok(None);
        }

        let mut buf = vec![0u8; self.chunk_size];
        let mut filled = 0;

        // A single read may return fewer bytes than requested well before EOF.
        while filled < buf.len() {
            let n = self
                .file
                .read(&mut buf[filled..])
                .await
                .map_err(|e| PzipError::io(&self.path, e))?;
            if n == 0 {
                self.done = true;
                break;
            }
            filled += n;
        }

        if filled == 0 {
            return Ok(None);
        }

        buf.truncate(filled);
        Ok(Some(buf))
    }
}
