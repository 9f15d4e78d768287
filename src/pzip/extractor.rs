use std::path::Path;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

use crate::error::{PzipError, Result};
use crate::io::{LocalFileReader, ReadAt};
use crate::progress::{ProgressSink, percent};

use super::codec;
use super::parser::ContainerParser;
use super::structures::Header;
use super::writer::create_parent_dirs;

/// Outcome of a successful decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeSummary {
    pub original_size: u64,
    pub chunk_count: u32,
    /// Chunk size recorded in the container header
    pub chunk_size: u32,
}

/// Reads PZIP containers back into their original bytes.
///
/// Everything the decoder knows about a container comes from that
/// container's own header; it carries no encoder settings.
pub struct Decoder<R: ReadAt> {
    parser: ContainerParser<R>,
}

impl<R: ReadAt> Decoder<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            parser: ContainerParser::new(reader),
        }
    }

    /// Read and validate the header without decoding any record
    pub async fn header(&self) -> Result<Header> {
        self.parser.read_header().await
    }

    /// Decode the container into `out`.
    ///
    /// Records are inflated and written one at a time, in order. `out` is
    /// flushed but not synced.
    pub async fn decode_to<W, P>(&self, out: &mut W, progress: &P) -> Result<DecodeSummary>
    where
        W: AsyncWrite + Unpin,
        P: ProgressSink + ?Sized,
    {
        let header = self.parser.read_header().await?;
        self.decode_records(&header, out, None, progress).await
    }

    /// Decode the container into a file at `dest`.
    ///
    /// The header is validated before `dest` is created. On failure the
    /// error is also reported to `progress` at 0% and the partially
    /// written `dest` is left in place.
    pub async fn decode_to_file<P: ProgressSink + ?Sized>(
        &self,
        dest: &Path,
        progress: &P,
    ) -> Result<DecodeSummary> {
        let result = self.write_file(dest, progress).await;
        report_outcome(result, progress)
    }

    async fn write_file<P: ProgressSink + ?Sized>(
        &self,
        dest: &Path,
        progress: &P,
    ) -> Result<DecodeSummary> {
        let header = self.parser.read_header().await?;

        create_parent_dirs(dest).await?;
        let file = File::create(dest).await.map_err(|e| PzipError::io(dest, e))?;
        let mut out = BufWriter::new(file);

        let summary = self
            .decode_records(&header, &mut out, Some(dest), progress)
            .await?;

        out.into_inner()
            .sync_all()
            .await
            .map_err(|e| PzipError::io(dest, e))?;

        Ok(summary)
    }

    /// Inflate every record into `out`. Write failures name `dest` when
    /// the output is a file.
    async fn decode_records<W, P>(
        &self,
        header: &Header,
        out: &mut W,
        dest: Option<&Path>,
        progress: &P,
    ) -> Result<DecodeSummary>
    where
        W: AsyncWrite + Unpin,
        P: ProgressSink + ?Sized,
    {
        let write_err = |e: std::io::Error| match dest {
            Some(path) => PzipError::io(path, e),
            None => PzipError::Stream(e),
        };

        let total = header.chunk_count;
        tracing::info!(
            original_size = header.original_size,
            chunks = total,
            chunk_size = header.chunk_size,
            "decoding"
        );
        progress.report(&format!("Starting decompression: {} chunks", total), 0.0);

        let mut offset = Header::SIZE as u64;
        let mut written = 0u64;

        for index in 0..total {
            let record = self.parser.read_record_info(index, offset).await?;
            let payload = self.parser.read_payload(&record).await?;

            let chunk = codec::inflate(&payload, header.chunk_size as usize).map_err(|detail| {
                PzipError::Payload {
                    chunk: index + 1,
                    detail,
                }
            })?;

            out.write_all(&chunk).await.map_err(write_err)?;
            written += chunk.len() as u64;
            offset = record.end_offset();

            tracing::trace!(
                chunk = index,
                packed = record.payload_length,
                raw = chunk.len(),
                "read record"
            );

            let done = index + 1;
            progress.report(
                &format!("Decompressing chunk {}/{}", done, total),
                percent(done, total),
            );
        }

        out.flush().await.map_err(write_err)?;

        if written != header.original_size {
            return Err(PzipError::SizeMismatch {
                expected: header.original_size,
                actual: written,
            });
        }

        self.parser.check_end(offset)?;

        Ok(DecodeSummary {
            original_size: header.original_size,
            chunk_count: total,
            chunk_size: header.chunk_size,
        })
    }
}

fn report_outcome<P: ProgressSink + ?Sized>(
    result: Result<DecodeSummary>,
    progress: &P,
) -> Result<DecodeSummary> {
    match result {
        Ok(summary) => {
            progress.report("Decompression completed successfully!", 100.0);
            Ok(summary)
        }
        Err(e) => {
            tracing::warn!("decompression failed: {}", e);
            progress.report(&format!("Decompression error: {}", e), 0.0);
            Err(e)
        }
    }
}

/// Decode the local container `source` into `dest`.
pub async fn decode<P: ProgressSink + ?Sized>(
    source: &Path,
    dest: &Path,
    progress: &P,
) -> Result<DecodeSummary> {
    let reader = match LocalFileReader::new(source) {
        Ok(reader) => reader,
        Err(e) => {
            let err = match e.downcast::<std::io::Error>() {
                Ok(io) => PzipError::io(source, io),
                Err(other) => PzipError::from(other),
            };
            return report_outcome(Err(err), progress);
        }
    };

    Decoder::new(Arc::new(reader))
        .decode_to_file(dest, progress)
        .await
}
