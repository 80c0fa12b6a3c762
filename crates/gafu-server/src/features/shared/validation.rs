//! Input validation helpers shared by the genome annotation operations
//!
//! Parameters arrive as optional strings. A field that is absent, empty or
//! whitespace-only is treated as not provided.

use thiserror::Error;

/// Maximum length of a generated or caller-chosen file name
pub const MAX_FILE_NAME_LENGTH: usize = 255;

/// Errors that can occur during file name validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FileNameValidationError {
    #[error("File name is required and cannot be empty")]
    Required,

    #[error("File name must not exceed {max_length} characters")]
    TooLong { max_length: usize },

    #[error("File name must not contain path separators or refer to a directory")]
    NotPlain,
}

/// The trimmed value of an optional field, or `None` when it is blank
#[inline]
pub fn provided(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Validate a plain file name
///
/// # Rules
/// - Must not be empty (after trimming whitespace)
/// - Must not exceed [`MAX_FILE_NAME_LENGTH`] bytes
/// - Must not contain `/`, `\` or NUL, and must not be `.` or `..`
pub fn validate_file_name(name: &str) -> Result<(), FileNameValidationError> {
    if name.trim().is_empty() {
        return Err(FileNameValidationError::Required);
    }

    if name.len() > MAX_FILE_NAME_LENGTH {
        return Err(FileNameValidationError::TooLong {
            max_length: MAX_FILE_NAME_LENGTH,
        });
    }

    if name.contains(['/', '\\', '\0']) || name == "." || name == ".." {
        return Err(FileNameValidationError::NotPlain);
    }

    Ok(())
}
