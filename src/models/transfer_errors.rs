// Error taxonomy shared by the path translator, the remote gateway and the engine
use std::io;

use thiserror::Error;

/// Fieldless discriminant of [`TransferError`], used for status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Input,
    Forbidden,
    OutOfScope,
    NotFound,
    Connection,
    RemoteIo,
    LocalIo,
}

#[derive(Debug, Error)]
pub enum TransferError {
    // Request validation errors
    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Project not registered: {0}")]
    Forbidden(String),

    #[error("Path {path} is outside of root {root}")]
    OutOfScope { path: String, root: String },

    // Lookup errors (local or remote side)
    #[error("Not found: {0}")]
    NotFound(String),

    // Session errors (dial, handshake and authentication are not distinguished)
    #[error("Connection to {endpoint} failed: {reason}")]
    Connection { endpoint: String, reason: String },

    #[error("Remote {operation} failed for {path}: {reason}")]
    RemoteIo {
        operation: &'static str,
        path: String,
        reason: String,
    },

    #[error("Local {operation} failed for {path}: {source}")]
    LocalIo {
        operation: &'static str,
        path: String,
        #[source]
        source: io::Error,
    },
}

impl TransferError {
    pub fn remote_io(operation: &'static str, path: &str, reason: impl ToString) -> Self {
        Self::RemoteIo {
            operation,
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Wrap a local io error, turning `NotFound` into [`TransferError::NotFound`].
    pub fn local_io(operation: &'static str, path: &str, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            return Self::NotFound(path.to_string());
        }
        Self::LocalIo {
            operation,
            path: path.to_string(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Input(_) => ErrorKind::Input,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::OutOfScope { .. } => ErrorKind::OutOfScope,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Connection { .. } => ErrorKind::Connection,
            Self::RemoteIo { .. } => ErrorKind::RemoteIo,
            Self::LocalIo { .. } => ErrorKind::LocalIo,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Input => "INPUT_ERROR",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::OutOfScope => "OUT_OF_SCOPE",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Connection => "CONNECTION_ERROR",
            ErrorKind::RemoteIo => "REMOTE_IO_ERROR",
            ErrorKind::LocalIo => "LOCAL_IO_ERROR",
        }
    }

    pub fn is_user_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Input | ErrorKind::Forbidden | ErrorKind::OutOfScope
        )
    }
}
