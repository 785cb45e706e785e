use super::*;
use crate::container::writer::ContainerWriter;

fn cfg() -> ConvertConfig {
    ConvertConfig::default()
}

fn two_chunk_container() -> Vec<u8> {
    ContainerWriter::new()
        .text("hello")
        .unwrap()
        .raw(FourCc::new(b"LIST"), b"opaque")
        .effect("ADBE Blur")
        .unwrap()
        .finish()
        .unwrap()
}

#[test]
fn yields_registered_children_and_skips_unknown_tags() {
    let cfg = cfg();
    let buf = two_chunk_container();
    let scanner = ChunkScanner::new(&buf, &cfg).unwrap();
    assert_eq!(scanner.form_type(), FourCc::new(b"Egg!"));
    assert_eq!(scanner.root_offset(), 0);

    let chunks = scanner.scan_all().unwrap();
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].role, ChunkRole::Text);
    assert_eq!(chunks[0].offset, 12);
    assert_eq!(chunks[0].payload, b"hello");
    assert_eq!(chunks[1].role, ChunkRole::Effect);
    assert_eq!(chunks[1].length, 9);
}

#[test]
fn iteration_is_restartable() {
    let cfg = cfg();
    let buf = two_chunk_container();
    let scanner = ChunkScanner::new(&buf, &cfg).unwrap();
    let first: Vec<_> = scanner.chunks().map(Result::unwrap).collect();
    let second: Vec<_> = scanner.chunks().map(Result::unwrap).collect();
    assert_eq!(first, second);
}

#[test]
fn missing_root_is_unsupported_format() {
    let cfg = cfg();
    let err = ChunkScanner::new(b"PK\x03\x04 definitely not a container", &cfg).unwrap_err();
    assert!(matches!(err, AeplanError::UnsupportedFormat { .. }));

    let err = ChunkScanner::new(&[], &cfg).unwrap_err();
    assert!(matches!(err, AeplanError::UnsupportedFormat { searched: 0 }));
}

#[test]
fn root_may_start_inside_search_window() {
    let cfg = cfg();
    let mut buf = vec![0u8; 10];
    buf.extend(two_chunk_container());
    let scanner = ChunkScanner::new(&buf, &cfg).unwrap();
    assert_eq!(scanner.root_offset(), 10);
    assert_eq!(scanner.scan_all().unwrap().len(), 2);
}

#[test]
fn root_outside_search_window_is_rejected() {
    let mut cfg = cfg();
    cfg.limits.root_search_window = 8;
    let mut buf = vec![0u8; 10];
    buf.extend(two_chunk_container());
    let err = ChunkScanner::new(&buf, &cfg).unwrap_err();
    assert!(matches!(err, AeplanError::UnsupportedFormat { searched: 8 }));
}

#[test]
fn oversize_buffer_fails_before_scanning() {
    let mut cfg = cfg();
    cfg.limits.max_file_bytes = 16;
    cfg.limits.max_analysis_bytes = 16;
    // Not even a valid container: the size check must come first.
    let buf = vec![0xAAu8; 17];
    match ChunkScanner::new(&buf, &cfg).unwrap_err() {
        AeplanError::SizeLimitExceeded { limit, actual, max } => {
            assert_eq!(limit, "max_file_bytes");
            assert_eq!(actual, 17);
            assert_eq!(max, 16);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn root_length_past_end_is_truncated() {
    let cfg = cfg();
    let mut buf = two_chunk_container();
    buf.truncate(buf.len() - 3);
    match ChunkScanner::new(&buf, &cfg).unwrap_err() {
        AeplanError::TruncatedChunk { tag, offset, .. } => {
            assert_eq!(tag, "RIFX");
            assert_eq!(offset, 0);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn child_length_past_parent_is_truncated() {
    let cfg = cfg();
    let mut buf = ContainerWriter::new().text("abc").unwrap().finish().unwrap();
    // Child length field lives at offset 16..20; claim 1000 bytes.
    buf[16..20].copy_from_slice(&1000u32.to_be_bytes());
    let scanner = ChunkScanner::new(&buf, &cfg).unwrap();
    let mut it = scanner.chunks();
    match it.next() {
        Some(Err(AeplanError::TruncatedChunk {
            tag,
            offset,
            declared,
            available,
        })) => {
            assert_eq!(tag, "btdk");
            assert_eq!(offset, 12);
            assert_eq!(declared, 1000);
            assert_eq!(available, 3);
        }
        other => panic!("unexpected item: {other:?}"),
    }
    assert!(it.next().is_none(), "iterator must fuse after an error");
}

#[test]
fn dangling_header_bytes_are_truncated() {
    let cfg = cfg();
    let buf = ContainerWriter::new()
        .raw(FourCc::new(b"LIST"), b"")
        .finish()
        .unwrap();
    // Shrink the child to 5 bytes by rewriting the root length.
    let mut cut = buf[..12 + 5].to_vec();
    cut[4..8].copy_from_slice(&(4u32 + 5).to_be_bytes());
    let scanner = ChunkScanner::new(&cut, &cfg).unwrap();
    let err = scanner.scan_all().unwrap_err();
    assert!(matches!(err, AeplanError::TruncatedChunk { declared: 8, available: 5, .. }));
}

#[test]
fn analysis_ceiling_counts_inspected_bytes() {
    let mut cfg = cfg();
    cfg.limits.max_analysis_bytes = 12 + 8 + 4;
    let buf = ContainerWriter::new()
        .text("abcd")
        .unwrap()
        .text("e")
        .unwrap()
        .finish()
        .unwrap();
    let scanner = ChunkScanner::new(&buf, &cfg).unwrap();
    let mut it = scanner.chunks();
    assert!(it.next().unwrap().is_ok());
    assert_eq!(it.inspected_bytes(), 24);
    match it.next() {
        Some(Err(AeplanError::SizeLimitExceeded { limit, .. })) => {
            assert_eq!(limit, "max_analysis_bytes")
        }
        other => panic!("unexpected item: {other:?}"),
    }
}

#[test]
fn unknown_chunks_only_charge_their_header() {
    let mut cfg = cfg();
    cfg.limits.max_analysis_bytes = 64;
    let big = vec![0u8; 4096];
    let buf = ContainerWriter::new()
        .raw(FourCc::new(b"mdat"), &big)
        .finish()
        .unwrap();
    let scanner = ChunkScanner::new(&buf, &cfg).unwrap();
    assert!(scanner.scan_all().unwrap().is_empty());
}

#[test]
fn cancellation_surfaces_as_timeout_at_boundary() {
    let cfg = cfg();
    let buf = two_chunk_container();
    let token = CancelToken::new();
    let scanner = ChunkScanner::new(&buf, &cfg)
        .unwrap()
        .with_cancel(token.clone());

    let mut it = scanner.chunks();
    assert!(it.next().unwrap().is_ok());
    token.cancel();
    match it.next() {
        Some(Err(AeplanError::Timeout { offset, .. })) => assert_eq!(offset, 12 + 8 + 5),
        other => panic!("unexpected item: {other:?}"),
    }
    assert!(it.next().is_none());
}

#[test]
fn concurrent_scans_over_independent_buffers() {
    let cfg = cfg();
    let bufs: Vec<Vec<u8>> = (0..4).map(|_| two_chunk_container()).collect();
    std::thread::scope(|s| {
        let handles: Vec<_> = bufs
            .iter()
            .map(|b| {
                let cfg = &cfg;
                s.spawn(move || ChunkScanner::new(b, cfg).unwrap().scan_all().unwrap().len())
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), 2);
        }
    });
}

#[test]
fn wall_clock_deadline_stops_long_scans() {
    let mut cfg = cfg();
    cfg.limits.timeout_ms = 1;
    let mut w = ContainerWriter::new();
    for _ in 0..50_000 {
        w = w.raw(FourCc::new(b"LIST"), b"x");
    }
    let buf = w.text("tail").unwrap().finish().unwrap();
    let scanner = ChunkScanner::new(&buf, &cfg).unwrap();

    let mut it = scanner.chunks();
    std::thread::sleep(Duration::from_millis(5));
    match it.next() {
        Some(Err(AeplanError::Timeout { offset, elapsed_ms })) => {
            assert_eq!(offset, 12);
            assert!(elapsed_ms >= 1);
        }
        other => panic!("unexpected item: {other:?}"),
    }
    assert!(it.next().is_none());
}
