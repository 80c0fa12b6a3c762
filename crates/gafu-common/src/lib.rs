//! GenomeAnnotationFileUtil Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the GenomeAnnotationFileUtil
//! workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`GafuError`] and the [`Result`] alias
//! - **Logging**: tracing subscriber setup driven by environment variables
//! - **Types**: workspace object references, object info tuples and KBase booleans
//! - **Checksums**: file digests recorded in export provenance
//!
//! # Example
//!
//! ```no_run
//! use gafu_common::types::{ObjectInfo, ObjectRef};
//!
//! fn reference_for(info: &ObjectInfo) -> ObjectRef {
//!     ObjectRef::from_info(info)
//! }
//! ```

pub mod checksum;
pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{GafuError, Result};
