use thiserror::Error;

/// Result type for media operations
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media operations
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("file not found: {key}: {reason}")]
    NotFound { key: String, reason: String },

    #[error("{message}")]
    InvalidArgument { message: String },

    #[error("storage backend error: {source}")]
    Backend {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("transport error: {source}")]
    Transport {
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("{message}")]
    Internal { message: String },
}

/// Status codes surfaced to RPC callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    InvalidArgument,
    NotFound,
    Internal,
}

impl StatusCode {
    /// Wire name (snake_case, as used by RPC-over-HTTP protocols)
    pub fn name(&self) -> &'static str {
        match self {
            StatusCode::InvalidArgument => "invalid_argument",
            StatusCode::NotFound => "not_found",
            StatusCode::Internal => "internal",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            StatusCode::InvalidArgument => 400,
            StatusCode::NotFound => 404,
            StatusCode::Internal => 500,
        }
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl MediaError {
    /// Create a backend error from any error type
    pub fn backend<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend {
            source: Box::new(error),
        }
    }

    /// Create an invalid argument (protocol violation) error
    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found<K: Into<String>, R: Into<String>>(key: K, reason: R) -> Self {
        Self::NotFound {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a transport error from a failed frame receive/send
    pub fn transport(source: std::io::Error) -> Self {
        Self::Transport { source }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Status code this error is reported with
    pub fn code(&self) -> StatusCode {
        match self {
            MediaError::NotFound { .. } => StatusCode::NotFound,
            MediaError::InvalidArgument { .. } => StatusCode::InvalidArgument,
            MediaError::Backend { .. }
            | MediaError::Transport { .. }
            | MediaError::Io { .. }
            | MediaError::Internal { .. } => StatusCode::Internal,
        }
    }

    /// Report this error as `Internal`, prefixed with what the call was doing
    pub fn into_internal<S: Into<String>>(self, what: S) -> Self {
        Self::Internal {
            message: format!("{}: {}", what.into(), self),
        }
    }

    /// Report this error as `NotFound` for `key`
    pub fn into_not_found(self, key: &str) -> Self {
        match self {
            not_found @ MediaError::NotFound { .. } => not_found,
            other => Self::not_found(key, other.to_string()),
        }
    }
}
