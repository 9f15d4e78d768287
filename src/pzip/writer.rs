use std::num::NonZeroU32;
use std::path::Path;
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::error::{PzipError, Result};
use crate::progress::{ProgressSink, percent};

use super::chunker::Chunker;
use super::codec;
use super::structures::{DEFAULT_CHUNK_SIZE, DEFAULT_LEVEL, Header};

/// Caller-chosen encoding parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    pub chunk_size: NonZeroU32,
    /// zlib effort, 0 (store) to 9 (best)
    pub level: u32,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            chunk_size: NonZeroU32::new(DEFAULT_CHUNK_SIZE).unwrap_or(NonZeroU32::MIN),
            level: DEFAULT_LEVEL,
        }
    }
}

/// Outcome of a successful encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeSummary {
    pub original_size: u64,
    /// Size of the whole container, header included
    pub compressed_size: u64,
    pub chunk_count: u32,
    pub chunk_size: u32,
}

impl EncodeSummary {
    /// Space saved relative to the original, in percent (negative if the
    /// container is larger).
    pub fn saved_percent(&self) -> f64 {
        if self.original_size == 0 {
            0.0
        } else {
            (1.0 - self.compressed_size as f64 / self.original_size as f64) * 100.0
        }
    }
}

/// Writes PZIP containers.
///
/// The chunk size given here is the only one the encoder ever uses; it is
/// written verbatim into each header.
#[derive(Debug, Clone, Copy)]
pub struct Encoder {
    chunker: Chunker,
    level: u32,
}

impl Encoder {
    pub fn new(options: EncodeOptions) -> Self {
        Self {
            chunker: Chunker::new(options.chunk_size),
            level: options.level.min(9),
        }
    }

    pub fn chunk_size(&self) -> u32 {
        self.chunker.chunk_size()
    }

    /// Compress `source` into a container at `dest`.
    ///
    /// `dest` is created or truncated, and its missing parent directories
    /// are created. On failure the error is also reported to `progress`
    /// at 0% and whatever was written to `dest` is left in place.
    pub async fn encode_file<P: ProgressSink + ?Sized>(
        &self,
        source: &Path,
        dest: &Path,
        progress: &P,
    ) -> Result<EncodeSummary> {
        match self.write_container(source, dest, progress).await {
            Ok(summary) => {
                progress.report("Compression completed successfully!", 100.0);
                Ok(summary)
            }
            Err(e) => {
                tracing::warn!(source = %source.display(), "compression failed: {}", e);
                progress.report(&format!("Compression error: {}", e), 0.0);
                Err(e)
            }
        }
    }

    async fn write_container<P: ProgressSink + ?Sized>(
        &self,
        source: &Path,
        dest: &Path,
        progress: &P,
    ) -> Result<EncodeSummary> {
        let info = self.chunker.file_info(source).await?;
        let header = Header::new(info.size, info.chunk_count, self.chunk_size());

        tracing::info!(
            source = %source.display(),
            dest = %dest.display(),
            size = info.size,
            chunks = info.chunk_count,
            chunk_size = header.chunk_size,
            "encoding"
        );

        create_parent_dirs(dest).await?;

        let file = File::create(dest).await.map_err(|e| PzipError::io(dest, e))?;
        let mut out = BufWriter::new(file);
        let write_err = |e| PzipError::io(dest, e);

        out.write_all(&header.to_bytes()).await.map_err(write_err)?;
        let mut written = Header::SIZE as u64;

        let mut chunks = self.chunker.read_chunks(source).await?;
        let mut consumed = 0u64;

        for index in 0..info.chunk_count {
            let chunk = chunks.next_chunk().await?.ok_or_else(|| {
                PzipError::io(
                    source,
                    std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "file shrank while compressing",
                    ),
                )
            })?;
            consumed += chunk.len() as u64;

            let payload = codec::deflate(&chunk, self.level).map_err(|source| {
                PzipError::Compress {
                    chunk: index + 1,
                    source,
                }
            })?;
            let payload_length = u32::try_from(payload.len()).map_err(|_| PzipError::Compress {
                chunk: index + 1,
                source: std::io::Error::other("compressed chunk exceeds 4 GiB"),
            })?;

            out.write_all(&payload_length.to_le_bytes())
                .await
                .map_err(write_err)?;
            out.write_all(&payload).await.map_err(write_err)?;
            written += 4 + payload.len() as u64;

            tracing::trace!(
                chunk = index,
                raw = chunk.len(),
                packed = payload_length,
                "wrote record"
            );

            let done = index + 1;
            progress.report(
                &format!("Compressing chunk {}/{}", done, info.chunk_count),
                percent(done, info.chunk_count),
            );
        }

        if consumed != info.size {
            return Err(PzipError::io(
                source,
                std::io::Error::other(format!(
                    "file changed while compressing: expected {} bytes, read {}",
                    info.size, consumed
                )),
            ));
        }

        out.flush().await.map_err(write_err)?;
        out.into_inner()
            .sync_all()
            .await
            .map_err(write_err)?;

        Ok(EncodeSummary {
            original_size: info.size,
            compressed_size: written,
            chunk_count: info.chunk_count,
            chunk_size: header.chunk_size,
        })
    }
}

pub(crate) async fn create_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| PzipError::io(parent, e))?;
        }
    }
    Ok(())
}

/// Compress `source` into `dest` with the given chunk size and the default
/// compression level.
pub async fn encode<P: ProgressSink + ?Sized>(
    source: &Path,
    dest: &Path,
    chunk_size: NonZeroU32,
    progress: &P,
) -> Result<EncodeSummary> {
    let options = EncodeOptions {
        chunk_size,
        ..EncodeOptions::default()
    };
    Encoder::new(options).encode_file(source, dest, progress).await
}
