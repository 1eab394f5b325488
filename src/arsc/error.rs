use thiserror::Error;

/// Build a [`ArscError::MalformedChunk`] with a formatted reason.
macro_rules! malformed {
    ($offset:expr, $msg:literal) => {
        $crate::arsc::error::ArscError::MalformedChunk {
            offset: $offset,
            reason: $msg.to_string(),
        }
    };
    ($offset:expr, $fmtstr:literal, $($args:tt)*) => {
        $crate::arsc::error::ArscError::MalformedChunk {
            offset: $offset,
            reason: format!($fmtstr, $($args)*),
        }
    };
}

/// Return early with a [`ArscError::MalformedChunk`].
macro_rules! bail {
    ($offset:expr, $msg:literal) => {
        return Err(malformed!($offset, $msg))
    };
    ($offset:expr, $fmtstr:literal, $($args:tt)*) => {
        return Err(malformed!($offset, $fmtstr, $($args)*))
    };
}

/// Errors surfaced while decoding compiled resources.
///
/// Every input-corruption variant carries the absolute byte offset where the
/// problem was detected. [`ArscError::IndexOutOfBounds`] is different: it
/// reports a caller asking the decoded model for something that is not there.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArscError {
    /// Header or size inconsistency, or a read that would overrun the buffer
    /// or the enclosing chunk.
    #[error("malformed chunk at 0x{offset:x}: {reason}")]
    MalformedChunk { offset: usize, reason: String },

    /// A string declares more bytes than its pool holds.
    #[error("truncated string at 0x{offset:x}: needs {needed} bytes, {available} available")]
    TruncatedString {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A configuration record is shorter than the minimum or overruns its chunk.
    #[error("malformed configuration at 0x{offset:x}: {reason}")]
    MalformedConfiguration { offset: usize, reason: String },

    /// A package's type or key string pool is not among its children.
    #[error("missing {kind} string pool for chunk at 0x{offset:x}")]
    MissingStringPool { offset: usize, kind: &'static str },

    /// An XML node has no enclosing XML chunk to resolve strings through.
    #[error("no enclosing XML string pool for node at 0x{offset:x}")]
    NoXmlStringPool { offset: usize },

    /// Attribute records have a size other than the one this decoder knows.
    #[error("unexpected attribute size at 0x{offset:x}: expected {expected}, got {actual}")]
    UnexpectedAttributeSize {
        offset: usize,
        expected: usize,
        actual: usize,
    },

    /// A lookup into the decoded model used an index it does not hold.
    #[error("{what} index {index} out of bounds (len {len})")]
    IndexOutOfBounds {
        what: &'static str,
        index: i64,
        len: usize,
    },
}

/// Result alias for resource decoding operations.
pub type ArscResult<T> = Result<T, ArscError>;
