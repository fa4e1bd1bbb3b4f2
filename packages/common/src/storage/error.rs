use std::fmt;

/// Errors that can occur while pushing artifacts to object storage.
#[derive(Debug)]
pub enum StorageError {
    /// An I/O error occurred.
    Io(std::io::Error),
    /// The bucket or key is not usable as an object address.
    InvalidKey(String),
    /// The artifact exceeds the configured size limit.
    SizeLimitExceeded { actual: u64, limit: u64 },
    /// The remote object store rejected the request or could not be reached.
    Backend(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "storage IO error: {err}"),
            Self::InvalidKey(msg) => write!(f, "invalid object key: {msg}"),
            Self::SizeLimitExceeded { actual, limit } => {
                write!(f, "artifact exceeds size limit ({actual} > {limit} bytes)")
            }
            Self::Backend(msg) => write!(f, "object store error: {msg}"),
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
