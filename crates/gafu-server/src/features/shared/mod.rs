//! Shared utilities for feature modules
//!
//! - **validation**: Input validation utilities

pub mod validation;

pub use validation::{provided, validate_file_name, FileNameValidationError};
