use std::io;

pub type Result<T, E = ResourceAccessError> = std::result::Result<T, E>;

/// The single failure signal raised by path items, archives and factories.
#[derive(Debug, thiserror::Error)]
pub enum ResourceAccessError {
    #[error("Resource name must not be empty")]
    EmptyName,

    #[error("Cannot access `{path}`")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Invalid archive `{path}`: {reason}")]
    MalformedArchive { path: String, reason: String },

    #[error("Unsupported compression method {0} (only STORED and DEFLATE are supported)")]
    UnsupportedCompression(u16),

    #[error("No entry `{name}` in `{root}`")]
    EntryNotFound { root: String, name: String },

    #[error("Archive `{0}` has been closed")]
    Closed(String),

    #[error("Invalid URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Invalid remote location `{uri}`: {reason}")]
    InvalidRemote { uri: String, reason: String },

    #[error("Remote operation on `{host}` failed: {reason}")]
    Remote { host: String, reason: String },

    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    #[error("HTTP request failed: {0}")]
    HttpStatus(String),

    #[error("No path item can be created for `{0}`")]
    Unresolved(String),
}

impl ResourceAccessError {
    pub(crate) fn io(path: impl Into<String>, source: io::Error) -> Self {
        ResourceAccessError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        ResourceAccessError::MalformedArchive {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn uri(uri: impl Into<String>, source: url::ParseError) -> Self {
        ResourceAccessError::InvalidUri {
            uri: uri.into(),
            source,
        }
    }
}
