//! zlib compression of individual chunks.

use flate2::write::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};
use std::io::Write;

/// Largest buffer reserved up front when inflating, whatever the header claims.
const MAX_INFLATE_RESERVE: usize = 16 * 1024 * 1024;

/// Compress one chunk into a complete zlib stream.
pub fn deflate(chunk: &[u8], level: u32) -> std::io::Result<Vec<u8>> {
    let buf = Vec::with_capacity(chunk.len() / 2 + 64);
    let mut encoder = ZlibEncoder::new(buf, Compression::new(level));
    encoder.write_all(chunk)?;
    encoder.finish()
}

/// Inflate one zlib stream.
///
/// The payload must contain exactly one complete stream: a stream that
/// ends early or is followed by extra bytes is rejected. `size_hint` is
/// the expected uncompressed length and only sizes the first allocation;
/// the output grows past it as needed.
pub fn inflate(payload: &[u8], size_hint: usize) -> Result<Vec<u8>, String> {
    let mut decoder = Decompress::new(true);
    let mut out = Vec::with_capacity(size_hint.clamp(64, MAX_INFLATE_RESERVE));

    loop {
        // The whole payload is available up front, but `Finish` would
        // require room for the entire output on the first call.
        if out.len() == out.capacity() {
            out.reserve(out.capacity().max(64));
        }

        let consumed = decoder.total_in() as usize;
        let produced = out.len();

        let status = decoder
            .decompress_vec(&payload[consumed..], &mut out, FlushDecompress::None)
            .map_err(|e| e.to_string())?;

        match status {
            Status::StreamEnd => break,
            Status::Ok | Status::BufError => {
                let progressed =
                    decoder.total_in() as usize != consumed || out.len() != produced;
                // Stalled with output space left: the input ran out mid-stream.
                if !progressed && out.len() < out.capacity() {
                    return Err("compressed stream is incomplete".to_string());
                }
            }
        }
    }

    let consumed = decoder.total_in() as usize;
    if consumed != payload.len() {
        return Err(format!(
            "{} unexpected bytes after end of compressed stream",
            payload.len() - consumed
        ));
    }

    Ok(out)
}
