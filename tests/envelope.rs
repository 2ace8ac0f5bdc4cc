use flate2::{
    write::{DeflateEncoder, ZlibEncoder},
    Compression,
};
use quickcheck_macros::quickcheck;
use std::io::Write;
use waypoint::{
    envelope::{
        decompress, decompress_with, ChunkCodec, ChunkHeader, Chunks, DecodeOptions,
        EnvelopeErrorKind, SaveFormat,
    },
    ErrorCategory,
};

fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::fast());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn push_chunk(out: &mut Vec<u8>, block: &[u8], decompressed_len: usize) {
    ChunkHeader::new(block.len() as u32, decompressed_len as u32)
        .write(&mut *out)
        .unwrap();
    out.extend_from_slice(block);
}

fn container<S: AsRef<str>>(parts: &[S]) -> Vec<u8> {
    let mut out = Vec::new();
    for part in parts {
        let part = part.as_ref().as_bytes();
        push_chunk(&mut out, &zlib(part), part.len());
    }
    out
}

#[quickcheck]
fn chunked_round_trip(parts: Vec<String>) -> bool {
    let parts: Vec<String> = parts.into_iter().map(|x| x.replace('\0', "")).collect();
    if parts.is_empty() {
        return true;
    }

    let raw = container(&parts);
    let chunks = Chunks::new(&raw).map(|x| x.map(|c| c.index())).collect::<Result<Vec<_>, _>>();
    let text = decompress(&raw);

    chunks.map(|x| x.len()).ok() == Some(parts.len()) && text.ok() == Some(parts.concat())
}

#[test]
fn test_multi_chunk_document() {
    let raw = container(&[r#"{"Version": 4720, "#, r#""Platform": "PC"}"#]);
    assert_eq!(SaveFormat::detect(&raw), Some(SaveFormat::Compressed));
    assert_eq!(
        decompress(&raw).unwrap(),
        r#"{"Version": 4720, "Platform": "PC"}"#
    );

    let headers: Vec<_> = Chunks::new(&raw)
        .map(|x| x.unwrap().header().decompressed_len())
        .collect();
    assert_eq!(headers, vec![18, 17]);
}

#[test]
fn test_nul_padding_in_last_chunk() {
    let raw = container(&["{\"a\": 1}\0\0\0\0"]);
    assert_eq!(decompress(&raw).unwrap(), "{\"a\": 1}");
}

#[test]
fn test_plain_document() {
    let text = b"\xef\xbb\xbf\r\n  {\"Version\": 4720}\0";
    assert_eq!(SaveFormat::detect(text), Some(SaveFormat::Plain));
    assert_eq!(decompress(text).unwrap(), "\r\n  {\"Version\": 4720}");
}

#[test]
fn test_raw_deflate_codec() {
    let body = br#"{"Planets": []}"#;
    let mut raw = Vec::new();
    push_chunk(&mut raw, &deflate(body), body.len());

    let options = DecodeOptions::new().with_codec(ChunkCodec::Deflate);
    assert_eq!(decompress_with(&raw, &options).unwrap(), r#"{"Planets": []}"#);

    let err = decompress(&raw).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::CorruptData);
}

#[test]
fn test_declared_length_beyond_input_is_format() {
    let body = br#"{"a": 1}"#;
    let block = zlib(body);
    let mut raw = Vec::new();
    ChunkHeader::new(block.len() as u32 + 100, body.len() as u32)
        .write(&mut raw)
        .unwrap();
    raw.extend_from_slice(&block);

    let err = decompress(&raw).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Format);
    assert!(matches!(
        err.kind(),
        EnvelopeErrorKind::TruncatedChunk { chunk: 0, .. }
    ));
}

#[test]
fn test_bad_block_of_correct_length_is_corrupt() {
    let garbage = [0xffu8; 24];
    let mut raw = Vec::new();
    push_chunk(&mut raw, &garbage, 100);

    let err = decompress(&raw).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::CorruptData);
    assert!(matches!(err.kind(), EnvelopeErrorKind::CorruptChunk { .. }));
}

#[test]
fn test_wrong_decompressed_length_is_corrupt() {
    let body = br#"{"a": 1}"#;
    let mut raw = Vec::new();
    push_chunk(&mut raw, &zlib(body), body.len() + 3);

    let err = decompress(&raw).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::CorruptData);
    assert!(matches!(
        err.kind(),
        EnvelopeErrorKind::LengthMismatch { expected: 11, actual: 8, .. }
    ));
}

#[test]
fn test_second_chunk_errors() {
    let mut raw = container(&["{\"a\": ", "1}"]);
    let second = ChunkHeader::SIZE + zlib(b"{\"a\": ").len();

    let mut bad_magic = raw.clone();
    bad_magic[second] ^= 0xff;
    let err = decompress(&bad_magic).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Format);
    assert_eq!(err.chunk(), Some(1));
    assert!(matches!(err.kind(), EnvelopeErrorKind::InvalidMagic { .. }));

    // a partial header after the last chunk
    raw.extend_from_slice(&ChunkHeader::MAGIC.to_le_bytes());
    let err = decompress(&raw).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Format);
    assert!(matches!(
        err.kind(),
        EnvelopeErrorKind::TruncatedHeader { chunk: 2, .. }
    ));
}

#[test]
fn test_chunk_size_limit() {
    let body = vec![b' '; 4096];
    let raw = {
        let mut raw = Vec::new();
        push_chunk(&mut raw, &zlib(&body), body.len());
        raw
    };

    let options = DecodeOptions::new().with_max_chunk_len(1024);
    let err = decompress_with(&raw, &options).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Format);
    assert!(matches!(
        err.kind(),
        EnvelopeErrorKind::ChunkTooLarge { declared: 4096, limit: 1024, .. }
    ));
}

#[test]
fn test_unknown_marker() {
    for raw in [&b""[..], b"PK\x03\x04", b"   ", b"[1, 2]"] {
        let err = decompress(raw).unwrap_err();
        assert!(matches!(err.kind(), EnvelopeErrorKind::UnknownMarker));
        assert_eq!(err.category(), ErrorCategory::Format);
    }
}

#[test]
fn test_error_converts_to_crate_error() {
    let err: waypoint::Error = decompress(b"nope").unwrap_err().into();
    assert_eq!(err.category(), ErrorCategory::Format);
    assert!(!err.is_retryable());
    assert!(matches!(err.kind(), waypoint::ErrorKind::Envelope(_)));
}
