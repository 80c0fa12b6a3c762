//! GenomeAnnotationFileUtil Server Library
//!
//! Conversion service between GenBank flat files and workspace
//! GenomeAnnotation objects.
//!
//! # Overview
//!
//! - **upload**: GenBank file, blob or URL becomes a GenomeAnnotation object
//! - **download**: a GenomeAnnotation object is written back out as GenBank
//! - **export**: the download, packaged with provenance for bulk download
//!
//! GenBank parsing and writing are done by collaborator services; this crate
//! stages files in scratch space, calls the collaborators and moves results
//! in and out of the blob store.
//!
//! # Architecture
//!
//! - [`services`]: one trait per collaborator plus production clients
//! - [`features`]: the operations, as commands and queries with REST routes
//! - [`rpc`]: KBase JSON-RPC 1.1 dispatch onto the same operations
//! - [`scratch`]: request-scoped directories removed on every exit path
//!
//! # Example
//!
//! ```no_run
//! use gafu_server::{api, config::Config, features::FeatureState, services::Services};
//! use gafu_server::storage::{config::StorageConfig, Storage};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let storage = Storage::new(StorageConfig::from_env()).await?;
//!     let services = Services::connect(&config.kbase, storage)?;
//!     let state = FeatureState::new(config.kbase.clone(), services);
//!     api::serve(config, state).await
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod features;
pub mod middleware;
pub mod rpc;
pub mod scratch;
pub mod services;
pub mod storage;

// Re-export commonly used types
pub use error::{AppError, AppResult};
