use thiserror::Error;

/// Canonical result for every lazyseq crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("sequence contains no elements")]
    EmptySequence,

    #[error("sequence contains no element matching the predicate")]
    NoMatch,

    #[error("sequence contains more than one matching element")]
    MultipleElements,

    /// `index` is the zero-based position of the element whose key collided.
    #[error("duplicate key at element {index}")]
    DuplicateKey { index: usize },

    #[error("index {index} is out of range (sequence has {len} elements)")]
    OutOfRange { index: usize, len: usize },

    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    #[error("`{op}` would not terminate: its input reports an unbounded sequence")]
    NonTerminating { op: &'static str },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("plan encoding error: {0}")]
    Encode(String),
}

/// Coarse classification of [`Error`], stable across message changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    EmptySequence,
    NoMatch,
    MultipleElements,
    DuplicateKey,
    OutOfRange,
    InvalidArgument,
    NonTerminating,
    Config,
    Encode,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::EmptySequence => ErrorKind::EmptySequence,
            Error::NoMatch => ErrorKind::NoMatch,
            Error::MultipleElements => ErrorKind::MultipleElements,
            Error::DuplicateKey { .. } => ErrorKind::DuplicateKey,
            Error::OutOfRange { .. } => ErrorKind::OutOfRange,
            Error::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Error::NonTerminating { .. } => ErrorKind::NonTerminating,
            Error::Config(_) => ErrorKind::Config,
            Error::Encode(_) => ErrorKind::Encode,
        }
    }

    pub fn invalid_argument(name: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Encode(e.to_string())
    }
}
