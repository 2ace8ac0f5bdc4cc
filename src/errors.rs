use crate::envelope::EnvelopeError;
use std::fmt;

/// An error that can occur when decoding a save
#[derive(Debug)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub(crate) fn new(kind: ErrorKind) -> Error {
        Error(Box::new(kind))
    }

    /// Return the specific type of error
    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }

    /// Classifies the failure as a format violation, corrupt data, or I/O
    pub fn category(&self) -> ErrorCategory {
        self.0.category()
    }

    /// Returns true when reading the file again may succeed.
    ///
    /// This is the case for corrupt chunks and truncated documents, which is
    /// what a partially written save looks like, and for I/O failures.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::CorruptData | ErrorCategory::Io
        )
    }
}

/// Broad classification of a decoding failure.
///
/// A save read while the game is still writing it commonly fails with
/// corrupt data. Format errors are permanent for the given bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The input does not follow the expected layout
    Format,

    /// The layout is intact but the payload failed an integrity check
    CorruptData,

    /// The underlying reader failed
    Io,
}

/// Specific type of error
#[derive(Debug)]
pub enum ErrorKind {
    /// The save container could not be decompressed
    Envelope(EnvelopeError),

    /// The decompressed text is not a JSON document
    Json(serde_json::Error),

    /// A key mapping table could not be read
    Mapping(serde_json::Error),

    /// An I/O error
    Io(std::io::Error),
}

impl ErrorKind {
    /// See [`Error::category`]
    pub fn category(&self) -> ErrorCategory {
        match self {
            ErrorKind::Envelope(err) => err.category(),
            ErrorKind::Json(err) if err.is_eof() => ErrorCategory::CorruptData,
            ErrorKind::Json(_) | ErrorKind::Mapping(_) => ErrorCategory::Format,
            ErrorKind::Io(_) => ErrorCategory::Io,
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self.0 {
            ErrorKind::Envelope(ref err) => Some(err),
            ErrorKind::Json(ref err) | ErrorKind::Mapping(ref err) => Some(err),
            ErrorKind::Io(ref err) => Some(err),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self.0 {
            ErrorKind::Envelope(ref err) => write!(f, "unable to decompress save: {}", err),
            ErrorKind::Json(ref err) => write!(f, "save document is not valid json: {}", err),
            ErrorKind::Mapping(ref err) => write!(f, "unable to read key mapping: {}", err),
            ErrorKind::Io(ref err) => write!(f, "io error: {}", err),
        }
    }
}

impl From<EnvelopeError> for Error {
    fn from(error: EnvelopeError) -> Self {
        Error::new(ErrorKind::Envelope(error))
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::new(ErrorKind::Json(error))
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::new(ErrorKind::Io(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::decompress;

    #[test]
    fn test_envelope_category_carries_over() {
        let err = Error::from(decompress(b"garbage").unwrap_err());
        assert_eq!(err.category(), ErrorCategory::Format);
        assert!(!err.is_retryable());
        assert!(err.to_string().starts_with("unable to decompress save"));
    }

    #[test]
    fn test_truncated_json_is_retryable() {
        let err = Error::from(serde_json::from_str::<serde_json::Value>("{\"a\": [1, 2").unwrap_err());
        assert_eq!(err.category(), ErrorCategory::CorruptData);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_json_syntax_is_format() {
        let err = Error::from(serde_json::from_str::<serde_json::Value>("{\"a\" 1}").unwrap_err());
        assert_eq!(err.category(), ErrorCategory::Format);
    }
}
