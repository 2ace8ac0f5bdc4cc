use crate::envelope::errors::{EnvelopeError, EnvelopeErrorKind};
use crate::util::{get_split, le_u32};
use std::io::Write;

/// How the save document is stored on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveFormat {
    /// The JSON document is written directly
    Plain,

    /// The JSON document is split across compressed chunks
    Compressed,
}

impl SaveFormat {
    /// Sniffs the storage format from the start of the data.
    ///
    /// A leading UTF-8 byte order mark and ASCII whitespace are skipped
    /// before looking for the opening brace of a plain document.
    pub fn detect(data: &[u8]) -> Option<SaveFormat> {
        if data.starts_with(&ChunkHeader::MAGIC.to_le_bytes()) {
            return Some(SaveFormat::Compressed);
        }

        let text = data.strip_prefix(b"\xef\xbb\xbf").unwrap_or(data);
        match text.iter().find(|b| !b.is_ascii_whitespace()) {
            Some(b'{') => Some(SaveFormat::Plain),
            _ => None,
        }
    }
}

/// The fixed size header that precedes every compressed chunk
///
/// ```text
/// magic:u32 | compressed_len:u32 | decompressed_len:u32 | reserved:u32
/// ```
///
/// All fields are little endian.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ChunkHeader {
    compressed_len: u32,
    decompressed_len: u32,
    reserved: u32,
}

impl ChunkHeader {
    /// Marker at the start of each chunk
    pub const MAGIC: u32 = 0xFEED_A1E5;

    /// Byte length of an encoded header
    pub const SIZE: usize = 16;

    /// Creates a header for a block of the given sizes
    pub fn new(compressed_len: u32, decompressed_len: u32) -> Self {
        ChunkHeader {
            compressed_len,
            decompressed_len,
            reserved: 0,
        }
    }

    /// Parses the header at the start of the data.
    ///
    /// `chunk` and `offset` only feed error reporting.
    pub fn from_slice(data: &[u8], chunk: usize, offset: usize) -> Result<Self, EnvelopeError> {
        let truncated = || EnvelopeError::from(EnvelopeErrorKind::TruncatedHeader { chunk, offset });
        if data.len() < Self::SIZE {
            return Err(truncated());
        }

        let (magic, data) = get_split::<4>(data).ok_or_else(truncated)?;
        let magic = le_u32(magic);
        if magic != Self::MAGIC {
            return Err(EnvelopeErrorKind::InvalidMagic {
                chunk,
                offset,
                found: magic,
            }
            .into());
        }

        let (compressed_len, data) = get_split::<4>(data).ok_or_else(truncated)?;
        let (decompressed_len, data) = get_split::<4>(data).ok_or_else(truncated)?;
        let (reserved, _) = get_split::<4>(data).ok_or_else(truncated)?;

        Ok(ChunkHeader {
            compressed_len: le_u32(compressed_len),
            decompressed_len: le_u32(decompressed_len),
            reserved: le_u32(reserved),
        })
    }

    /// Number of compressed bytes that follow the header
    pub fn compressed_len(&self) -> usize {
        self.compressed_len as usize
    }

    /// Number of bytes the block inflates to
    pub fn decompressed_len(&self) -> usize {
        self.decompressed_len as usize
    }

    /// Writes the header in the on-disk layout
    pub fn write<W>(&self, mut writer: W) -> std::io::Result<()>
    where
        W: Write,
    {
        writer.write_all(&Self::MAGIC.to_le_bytes())?;
        writer.write_all(&self.compressed_len.to_le_bytes())?;
        writer.write_all(&self.decompressed_len.to_le_bytes())?;
        writer.write_all(&self.reserved.to_le_bytes())?;
        Ok(())
    }
}
