//! Client error types

use shared::{AppError, ErrorCode};
use thiserror::Error;

/// Transport-level error
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Authentication required
    #[error("Authentication required")]
    Unauthorized,

    /// Permission denied
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Resource already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Client setup error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Remote service failure as the catalogue sees it
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("remote resource not found: {0}")]
    NotFound(String),

    #[error("remote conflict: {0}")]
    Conflict(String),

    #[error("remote service unavailable: {0}")]
    Unavailable(String),

    /// Offline mode, the remote service is never contacted
    #[error("offline mode")]
    Offline,
}

impl From<ClientError> for RemoteError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::NotFound(msg) => RemoteError::NotFound(msg),
            ClientError::Conflict(msg) => RemoteError::Conflict(msg),
            other => RemoteError::Unavailable(other.to_string()),
        }
    }
}

/// Local cache failure
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("cache I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache entry {key:?} is corrupted: {source}")]
    Corrupted {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cache serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failure of a permission group catalogue operation
#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("permission group {0:?} already exists")]
    DuplicateId(String),

    #[error("permission group {0:?} not found")]
    NotFound(String),

    #[error("invalid permission group: {0}")]
    InvalidGroup(String),

    #[error("unknown permissions: {}", .0.join(", "))]
    InvalidPermission(Vec<String>),

    #[error("local cache unavailable: {0}")]
    Storage(#[from] StorageError),

    #[error("operation cancelled")]
    Cancelled,
}

impl From<ClientError> for AppError {
    fn from(err: ClientError) -> Self {
        let code = match &err {
            ClientError::Http(e) if e.is_timeout() => ErrorCode::TimeoutError,
            ClientError::Http(_) => ErrorCode::NetworkError,
            ClientError::InvalidResponse(_) | ClientError::Serialization(_) => {
                ErrorCode::InvalidFormat
            }
            ClientError::Unauthorized => ErrorCode::NotAuthenticated,
            ClientError::Forbidden(_) => ErrorCode::PermissionDenied,
            ClientError::NotFound(_) => ErrorCode::NotFound,
            ClientError::Conflict(_) => ErrorCode::AlreadyExists,
            ClientError::Validation(_) => ErrorCode::ValidationFailed,
            ClientError::Internal(_) => ErrorCode::InternalError,
            ClientError::Config(_) => ErrorCode::ConfigError,
        };
        AppError::with_message(code, err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match &err {
            StorageError::Corrupted { key, .. } => {
                AppError::with_message(ErrorCode::StorageCorrupted, err.to_string())
                    .with_detail("key", key.as_str())
            }
            _ => AppError::storage(err.to_string()),
        }
    }
}

impl From<CatalogueError> for AppError {
    fn from(err: CatalogueError) -> Self {
        match err {
            CatalogueError::DuplicateId(id) => AppError::with_message(
                ErrorCode::PermissionGroupExists,
                format!("Permission group {} already exists", id),
            )
            .with_detail("id", id),
            CatalogueError::NotFound(id) => AppError::with_message(
                ErrorCode::PermissionGroupNotFound,
                format!("Permission group {} not found", id),
            )
            .with_detail("id", id),
            CatalogueError::InvalidGroup(msg) => AppError::validation(msg),
            CatalogueError::InvalidPermission(unknown) => AppError::with_message(
                ErrorCode::InvalidPermission,
                format!("Unknown permissions: {}", unknown.join(", ")),
            )
            .with_detail("permissions", unknown),
            CatalogueError::Storage(e) => e.into(),
            CatalogueError::Cancelled => AppError::new(ErrorCode::OperationCancelled),
        }
    }
}
