use std::fmt;

/// Errors that can occur while reading from a photo store.
#[derive(Debug)]
pub enum StorageError {
    /// The requested folder or file was not found.
    NotFound(String),
    /// An I/O error occurred.
    Io(std::io::Error),
    /// The remote backend rejected or failed the request.
    Backend(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "not found in photo store: {path}"),
            Self::Io(err) => write!(f, "photo store IO error: {err}"),
            Self::Backend(msg) => write!(f, "photo store backend error: {msg}"),
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
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(err.to_string())
        } else {
            Self::Io(err)
        }
    }
}
