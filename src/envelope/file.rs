use crate::envelope::{
    errors::{EnvelopeError, EnvelopeErrorKind},
    ChunkHeader, SaveFormat,
};
use crate::util::trailing_nuls;
use flate2::read::{DeflateDecoder, ZlibDecoder};
use std::io::Read;

/// Compression stream used for each chunk's block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChunkCodec {
    /// zlib wrapped deflate with an adler32 trailer (the default)
    #[default]
    Zlib,

    /// Raw deflate without any framing
    Deflate,
}

/// Customizes how a save is decompressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    codec: ChunkCodec,
    max_chunk_len: usize,
}

impl DecodeOptions {
    /// Default upper bound on a chunk's decompressed size (16 MiB)
    pub const DEFAULT_MAX_CHUNK_LEN: usize = 16 * 1024 * 1024;

    /// Creates the structure with default options
    pub fn new() -> Self {
        DecodeOptions::default()
    }

    /// Sets the codec the chunks are compressed with
    pub fn with_codec(mut self, codec: ChunkCodec) -> DecodeOptions {
        self.codec = codec;
        self
    }

    /// Sets the largest decompressed size a chunk may declare
    pub fn with_max_chunk_len(mut self, max_chunk_len: usize) -> DecodeOptions {
        self.max_chunk_len = max_chunk_len;
        self
    }

    /// The configured chunk codec
    pub fn codec(&self) -> ChunkCodec {
        self.codec
    }

    /// The configured decompressed size limit
    pub fn max_chunk_len(&self) -> usize {
        self.max_chunk_len
    }
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            codec: ChunkCodec::Zlib,
            max_chunk_len: Self::DEFAULT_MAX_CHUNK_LEN,
        }
    }
}

/// A compressed chunk as it sits in the container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    index: usize,
    offset: usize,
    header: ChunkHeader,
    block: &'a [u8],
}

impl<'a> Chunk<'a> {
    /// Position of the chunk within the container
    pub fn index(&self) -> usize {
        self.index
    }

    /// Byte offset of the chunk header
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The parsed header
    pub fn header(&self) -> &ChunkHeader {
        &self.header
    }

    /// The compressed bytes following the header
    pub fn block(&self) -> &'a [u8] {
        self.block
    }

    /// Inflates the block and appends it to `out`
    pub fn decompress_into(
        &self,
        options: &DecodeOptions,
        out: &mut Vec<u8>,
    ) -> Result<(), EnvelopeError> {
        let expected = self.header.decompressed_len();
        if expected > options.max_chunk_len() {
            return Err(EnvelopeErrorKind::ChunkTooLarge {
                chunk: self.index,
                declared: expected,
                limit: options.max_chunk_len(),
            }
            .into());
        }

        let start = out.len();
        out.reserve(expected);

        // Read one byte past the declared size so an overlong block is
        // detected without inflating all of it
        let limit = expected as u64 + 1;
        let result = match options.codec() {
            ChunkCodec::Zlib => ZlibDecoder::new(self.block).take(limit).read_to_end(out),
            ChunkCodec::Deflate => DeflateDecoder::new(self.block).take(limit).read_to_end(out),
        };

        let actual = result.map_err(|source| EnvelopeErrorKind::CorruptChunk {
            chunk: self.index,
            offset: self.offset,
            source,
        })?;

        if actual != expected {
            out.truncate(start);
            return Err(EnvelopeErrorKind::LengthMismatch {
                chunk: self.index,
                expected,
                actual,
            }
            .into());
        }

        tracing::trace!(
            chunk = self.index,
            compressed = self.block.len(),
            decompressed = actual,
            "inflated chunk"
        );

        Ok(())
    }
}

/// Iterator over the chunks of a compressed save.
///
/// Yields an error and then stops if the container is malformed.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    data: &'a [u8],
    offset: usize,
    index: usize,
    failed: bool,
}

impl<'a> Chunks<'a> {
    /// Iterates over the chunks in the data
    pub fn new(data: &'a [u8]) -> Self {
        Chunks {
            data,
            offset: 0,
            index: 0,
            failed: false,
        }
    }

    fn read_chunk(&mut self) -> Result<Chunk<'a>, EnvelopeError> {
        let rest = &self.data[self.offset..];
        let header = ChunkHeader::from_slice(rest, self.index, self.offset)?;
        let body = &rest[ChunkHeader::SIZE..];
        let declared = header.compressed_len();
        let block = body
            .get(..declared)
            .ok_or(EnvelopeErrorKind::TruncatedChunk {
                chunk: self.index,
                offset: self.offset,
                declared,
                available: body.len(),
            })?;

        let chunk = Chunk {
            index: self.index,
            offset: self.offset,
            header,
            block,
        };

        self.offset += ChunkHeader::SIZE + declared;
        self.index += 1;
        Ok(chunk)
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Result<Chunk<'a>, EnvelopeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.data.len() {
            return None;
        }

        let result = self.read_chunk();
        self.failed = result.is_err();
        Some(result)
    }
}

impl std::iter::FusedIterator for Chunks<'_> {}

/// Decompresses a save into its JSON text with the default options.
///
/// ```
/// use waypoint::envelope::{decompress, EnvelopeErrorKind};
///
/// let text = decompress(b"{\"Version\": 4720}\0\0").unwrap();
/// assert_eq!(text, "{\"Version\": 4720}");
///
/// let err = decompress(b"not a save").unwrap_err();
/// assert!(matches!(err.kind(), EnvelopeErrorKind::UnknownMarker));
/// ```
pub fn decompress(raw: &[u8]) -> Result<String, EnvelopeError> {
    decompress_with(raw, &DecodeOptions::default())
}

/// Decompresses a save into its JSON text.
///
/// Saves that store the document directly are returned as is, otherwise
/// every chunk is inflated in order and the results concatenated. NUL
/// padding at the end of the document is removed.
pub fn decompress_with(raw: &[u8], options: &DecodeOptions) -> Result<String, EnvelopeError> {
    let data = match SaveFormat::detect(raw) {
        Some(SaveFormat::Plain) => {
            tracing::debug!(bytes = raw.len(), "save stored as plain text");
            raw.strip_prefix(b"\xef\xbb\xbf").unwrap_or(raw).to_vec()
        }
        Some(SaveFormat::Compressed) => {
            let mut out = Vec::with_capacity(raw.len().saturating_mul(4));
            let mut chunks = 0;
            for chunk in Chunks::new(raw) {
                chunk?.decompress_into(options, &mut out)?;
                chunks += 1;
            }
            tracing::debug!(
                chunks,
                compressed = raw.len(),
                decompressed = out.len(),
                "decompressed save"
            );
            out
        }
        None => return Err(EnvelopeErrorKind::UnknownMarker.into()),
    };

    into_text(data)
}

fn into_text(mut data: Vec<u8>) -> Result<String, EnvelopeError> {
    let padding = trailing_nuls(&data);
    data.truncate(data.len() - padding);
    String::from_utf8(data).map_err(|e| {
        EnvelopeError::from(EnvelopeErrorKind::InvalidUtf8 {
            offset: e.utf8_error().valid_up_to(),
        })
    })
}
