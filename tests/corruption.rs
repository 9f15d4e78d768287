// Damaged containers must fail with a specific error kind.

use std::cell::RefCell;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pzip::{ContainerParser, Decoder, ErrorKind, Header, NoProgress, PzipError, decode, encode};

struct Fixture {
    dir: tempfile::TempDir,
    container: Vec<u8>,
}

impl Fixture {
    /// A 3-record container of 2500 text bytes in 1000-byte chunks.
    async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.txt");
        let container = dir.path().join("source.txt.pzip");

        let data: Vec<u8> = (0..2500u32).map(|i| b'a' + (i % 26) as u8).collect();
        std::fs::write(&source, &data).unwrap();
        encode(&source, &container, NonZeroU32::new(1000).unwrap(), &NoProgress)
            .await
            .unwrap();

        let container = std::fs::read(&container).unwrap();
        Self { dir, container }
    }

    fn write(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    /// Byte ranges of each record (prefix included).
    fn records(&self) -> Vec<std::ops::Range<usize>> {
        let mut ranges = Vec::new();
        let mut offset = Header::SIZE;
        while offset < self.container.len() {
            let len = u32::from_le_bytes(self.container[offset..offset + 4].try_into().unwrap());
            let end = offset + 4 + len as usize;
            ranges.push(offset..end);
            offset = end;
        }
        ranges
    }
}

async fn decode_path(source: &Path, dir: &Path) -> Result<(), PzipError> {
    decode(source, &dir.join("out.bin"), &NoProgress).await.map(|_| ())
}

#[tokio::test]
async fn test_bad_magic() {
    let fx = Fixture::new().await;
    for magic in [b"PZIQ", b"pzip", b"PK\x03\x04", b"\0\0\0\0"] {
        let mut bytes = fx.container.clone();
        bytes[0..4].copy_from_slice(magic);
        let path = fx.write("bad_magic.pzip", &bytes);

        let err = decode_path(&path, fx.dir.path()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(matches!(err, PzipError::BadMagic { .. }));
    }
}

#[tokio::test]
async fn test_bad_magic_on_short_garbage_is_format_error() {
    let fx = Fixture::new().await;
    let path = fx.write("tiny.pzip", b"hello");

    let err = decode_path(&path, fx.dir.path()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
    assert!(err.to_string().contains("5 bytes"));
}

#[tokio::test]
async fn test_unsupported_version() {
    let fx = Fixture::new().await;
    for version in [0u32, 2, u32::MAX] {
        let mut bytes = fx.container.clone();
        bytes[4..8].copy_from_slice(&version.to_le_bytes());
        let path = fx.write("version.pzip", &bytes);

        let err = decode_path(&path, fx.dir.path()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(err.to_string().contains(&format!("unsupported version: {}", version)));
    }
}

#[tokio::test]
async fn test_truncated_final_record() {
    let fx = Fixture::new().await;
    let bytes = &fx.container[..fx.container.len() - 5];
    let path = fx.write("cut.pzip", bytes);

    let err = decode_path(&path, fx.dir.path()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Truncated);
    assert!(matches!(err, PzipError::Truncated { chunk: 3, .. }));
}

#[tokio::test]
async fn test_truncated_inside_length_prefix() {
    let fx = Fixture::new().await;
    let last = fx.records().pop().unwrap();
    let bytes = &fx.container[..last.start + 2];
    let path = fx.write("cut_prefix.pzip", bytes);

    let err = decode_path(&path, fx.dir.path()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Truncated);
}

#[tokio::test]
async fn test_deleted_record_is_truncation() {
    let fx = Fixture::new().await;
    let middle = fx.records()[1].clone();
    let mut bytes = fx.container.clone();
    bytes.drain(middle);
    let path = fx.write("missing_record.pzip", &bytes);

    let err = decode_path(&path, fx.dir.path()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Truncated);
}

#[tokio::test]
async fn test_deleted_record_with_adjusted_count_is_integrity_error() {
    // Every remaining record inflates cleanly; only the total size disagrees.
    let fx = Fixture::new().await;
    let middle = fx.records()[1].clone();
    let mut bytes = fx.container.clone();
    bytes.drain(middle);
    bytes[16..20].copy_from_slice(&2u32.to_le_bytes());
    let path = fx.write("adjusted.pzip", &bytes);

    let err = decode_path(&path, fx.dir.path()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Integrity);
    assert!(matches!(
        err,
        PzipError::SizeMismatch {
            expected: 2500,
            actual: 1500
        }
    ));
}

#[tokio::test]
async fn test_tampered_original_size() {
    let fx = Fixture::new().await;
    let mut bytes = fx.container.clone();
    bytes[8..16].copy_from_slice(&2501u64.to_le_bytes());
    let path = fx.write("size.pzip", &bytes);

    let events = RefCell::new(Vec::new());
    let sink = |m: &str, p: f64| events.borrow_mut().push((m.to_string(), p));
    let out = fx.dir.path().join("size.out");

    let err = decode(&path, &out, &sink).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Integrity);

    // The partial output is left behind and the failure is reported at 0%.
    assert_eq!(std::fs::metadata(&out).unwrap().len(), 2500);
    let events = events.into_inner();
    let last = events.last().unwrap();
    assert!(last.0.contains("size mismatch: expected 2501, got 2500"));
    assert_eq!(last.1, 0.0);
}

#[tokio::test]
async fn test_corrupted_payload() {
    let fx = Fixture::new().await;
    let first = fx.records()[0].clone();
    let mut bytes = fx.container.clone();
    // Zero the deflate body of the first record, leaving its zlib header.
    for b in &mut bytes[first.start + 6..first.end] {
        *b = 0xFF;
    }
    let path = fx.write("corrupt.pzip", &bytes);

    let err = decode_path(&path, fx.dir.path()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Payload);
    assert!(matches!(err, PzipError::Payload { chunk: 1, .. }));
}

#[tokio::test]
async fn test_trailing_garbage() {
    let fx = Fixture::new().await;
    let mut bytes = fx.container.clone();
    bytes.extend_from_slice(b"extra");
    let path = fx.write("trailing.pzip", &bytes);

    let err = decode_path(&path, fx.dir.path()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Integrity);
    assert!(matches!(err, PzipError::TrailingData(5)));
}

#[tokio::test]
async fn test_listing_shares_framing_checks() {
    let fx = Fixture::new().await;

    let listing = ContainerParser::new(Arc::new(fx.container.clone()))
        .list_records()
        .await
        .unwrap();
    assert_eq!(listing.records.len(), 3);
    assert_eq!(listing.container_size, fx.container.len() as u64);

    let cut = fx.container[..fx.container.len() - 1].to_vec();
    let err = ContainerParser::new(Arc::new(cut))
        .list_records()
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Truncated);
}

#[tokio::test]
async fn test_in_memory_decoder() {
    let fx = Fixture::new().await;
    let mut out = Vec::new();
    let summary = Decoder::new(Arc::new(fx.container.clone()))
        .decode_to(&mut out, &NoProgress)
        .await
        .unwrap();

    assert_eq!(summary.chunk_count, 3);
    assert_eq!(summary.chunk_size, 1000);
    assert_eq!(out.len(), 2500);
    assert_eq!(&out[..3], b"abc");
}
