use std::path::PathBuf;

use thiserror::Error;

/// Error types for rmapp operations.
/// `anyhow` is used at the top level for CLI error handling,
/// these typed errors let the library be precise about failures.
#[derive(Debug, Error)]
pub enum RmappError {
    /// File system operation failed
    #[error("I/O error at '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Permission denied accessing a path
    #[error("Permission denied: '{}'. {hint}", .path.display())]
    PermissionDenied { path: PathBuf, hint: String },

    /// The application bundle could not be located
    #[error("App {name} not found")]
    AppNotFound { name: String },

    /// Nothing to search for
    #[error("Invalid scan target: {message}")]
    InvalidTarget { message: String },

    /// Refused to touch a path on the protected list
    #[error("Refusing to remove protected path: '{}'", .path.display())]
    Protected { path: PathBuf },

    /// The batched privileged operation failed
    #[error("Privileged {action} failed for {count} path(s): {message}")]
    EscalationFailed {
        action: &'static str,
        count: usize,
        message: String,
    },

    /// Configuration file is invalid
    #[error("Config error in '{}': {message}", .path.display())]
    ConfigError { path: PathBuf, message: String },

    /// A caller-imposed deadline elapsed
    #[error("{operation} did not finish within {secs}s")]
    Timeout { operation: &'static str, secs: u64 },
}

impl RmappError {
    /// Wrap an I/O error, promoting permission failures to `PermissionDenied`
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            let hint = crate::common::permissions::permission_hint(&path);
            RmappError::PermissionDenied { path, hint }
        } else {
            RmappError::Io { path, source }
        }
    }
}

pub type Result<T> = std::result::Result<T, RmappError>;
