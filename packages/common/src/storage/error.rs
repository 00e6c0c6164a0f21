use std::fmt;

/// Errors that can occur during object storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// The requested object or blob was not found.
    NotFound(String),
    /// An I/O error occurred.
    Io(std::io::Error),
    /// The provided content hash is invalid.
    InvalidHash(String),
    /// The object exceeds the configured size limit.
    SizeLimitExceeded { actual: u64, limit: u64 },
    /// A mirror write lock is held by another writer.
    Busy(String),
    /// The store reported a different key than the one written to.
    KeyChanged { expected: String, actual: String },
    /// The referenced multipart upload does not exist.
    NoSuchUpload(String),
    /// The backend rejected or failed the request. Retryable.
    Backend(String),
    /// Storage is not configured correctly.
    Config(String),
}

impl StorageError {
    /// Whether a caller may reasonably retry the failed operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Backend(_) | Self::Busy(_) | Self::Io(_))
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(key) => write!(f, "object not found: {key}"),
            Self::Io(err) => write!(f, "storage IO error: {err}"),
            Self::InvalidHash(msg) => write!(f, "invalid content hash: {msg}"),
            Self::SizeLimitExceeded { actual, limit } => {
                write!(f, "object exceeds size limit ({actual} > {limit} bytes)")
            }
            Self::Busy(name) => write!(f, "storage destination busy: {name}"),
            Self::KeyChanged { expected, actual } => {
                write!(f, "object key changed during upload: {expected} -> {actual}")
            }
            Self::NoSuchUpload(id) => write!(f, "no such multipart upload: {id}"),
            Self::Backend(msg) => write!(f, "storage backend error: {msg}"),
            Self::Config(msg) => write!(f, "storage misconfigured: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
