use crate::ErrorCategory;

/// Error type for envelope operations
#[derive(Debug)]
pub struct EnvelopeError {
    kind: EnvelopeErrorKind,
}

impl EnvelopeError {
    /// Return the specific type of error
    pub fn kind(&self) -> &EnvelopeErrorKind {
        &self.kind
    }

    /// Returns whether the input violates the container layout or whether
    /// a well formed chunk failed to decompress
    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    /// Index of the chunk the error occurred in (if available)
    pub fn chunk(&self) -> Option<usize> {
        match self.kind {
            EnvelopeErrorKind::TruncatedHeader { chunk, .. }
            | EnvelopeErrorKind::InvalidMagic { chunk, .. }
            | EnvelopeErrorKind::TruncatedChunk { chunk, .. }
            | EnvelopeErrorKind::ChunkTooLarge { chunk, .. }
            | EnvelopeErrorKind::CorruptChunk { chunk, .. }
            | EnvelopeErrorKind::LengthMismatch { chunk, .. } => Some(chunk),
            EnvelopeErrorKind::UnknownMarker | EnvelopeErrorKind::InvalidUtf8 { .. } => None,
        }
    }
}

impl From<EnvelopeErrorKind> for EnvelopeError {
    fn from(kind: EnvelopeErrorKind) -> Self {
        EnvelopeError { kind }
    }
}

/// Specific kind of envelope error
#[derive(Debug)]
pub enum EnvelopeErrorKind {
    /// Input starts with neither the chunk magic nor a JSON document
    UnknownMarker,

    /// Not enough bytes remain for a chunk header
    TruncatedHeader { chunk: usize, offset: usize },

    /// A chunk after the first does not start with the chunk magic
    InvalidMagic {
        chunk: usize,
        offset: usize,
        found: u32,
    },

    /// A chunk declares more compressed bytes than the input holds
    TruncatedChunk {
        chunk: usize,
        offset: usize,
        declared: usize,
        available: usize,
    },

    /// A chunk declares a decompressed size over the configured limit
    ChunkTooLarge {
        chunk: usize,
        declared: usize,
        limit: usize,
    },

    /// The codec rejected the compressed block
    CorruptChunk {
        chunk: usize,
        offset: usize,
        source: std::io::Error,
    },

    /// The block inflated to a different size than the header declared
    LengthMismatch {
        chunk: usize,
        expected: usize,
        actual: usize,
    },

    /// The document is not valid UTF-8
    InvalidUtf8 { offset: usize },
}

impl EnvelopeErrorKind {
    /// See [`EnvelopeError::category`]
    pub fn category(&self) -> ErrorCategory {
        match self {
            EnvelopeErrorKind::CorruptChunk { .. } | EnvelopeErrorKind::LengthMismatch { .. } => {
                ErrorCategory::CorruptData
            }
            _ => ErrorCategory::Format,
        }
    }
}

impl std::error::Error for EnvelopeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            EnvelopeErrorKind::CorruptChunk { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl std::fmt::Display for EnvelopeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            EnvelopeErrorKind::UnknownMarker => {
                write!(f, "unrecognized save marker: not a chunked save nor a json document")
            }
            EnvelopeErrorKind::TruncatedHeader { chunk, offset } => write!(
                f,
                "chunk {} header truncated (offset: {})",
                chunk, offset
            ),
            EnvelopeErrorKind::InvalidMagic {
                chunk,
                offset,
                found,
            } => write!(
                f,
                "chunk {} has invalid magic 0x{:08x} (offset: {})",
                chunk, found, offset
            ),
            EnvelopeErrorKind::TruncatedChunk {
                chunk,
                offset,
                declared,
                available,
            } => write!(
                f,
                "chunk {} declares {} compressed bytes but only {} remain (offset: {})",
                chunk, declared, available, offset
            ),
            EnvelopeErrorKind::ChunkTooLarge {
                chunk,
                declared,
                limit,
            } => write!(
                f,
                "chunk {} declares {} decompressed bytes, over the limit of {}",
                chunk, declared, limit
            ),
            EnvelopeErrorKind::CorruptChunk {
                chunk,
                offset,
                source,
            } => write!(
                f,
                "chunk {} failed to decompress (offset: {}): {}",
                chunk, offset, source
            ),
            EnvelopeErrorKind::LengthMismatch {
                chunk,
                expected,
                actual,
            } => write!(
                f,
                "chunk {} decompressed to {} bytes, expected {}",
                chunk, actual, expected
            ),
            EnvelopeErrorKind::InvalidUtf8 { offset } => {
                write!(f, "document is not valid utf-8 (offset: {})", offset)
            }
        }
    }
}
