//! Error types shared across the workspace

use thiserror::Error;

/// Result type alias for common operations
pub type Result<T> = std::result::Result<T, GafuError>;

/// Main error type for shared helpers
#[derive(Error, Debug)]
pub enum GafuError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid object reference: {0}")]
    InvalidReference(String),
}
