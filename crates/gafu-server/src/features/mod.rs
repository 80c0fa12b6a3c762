//! Feature modules implementing the GenomeAnnotationFileUtil API
//!
//! # Features
//!
//! - **genome_annotation**: GenBank upload, download and export, plus status
//!
//! # Architecture
//!
//! Each feature module follows the structure:
//! - `commands/` - Operations that create workspace objects or blobs
//! - `queries/` - Operations that read them back
//! - `routes.rs` - HTTP route definitions
//! - `types.rs` - Parameter and result types
//!
//! The same `handle` functions back both the REST routes and the JSON-RPC
//! dispatcher in [`crate::rpc`].

pub mod genome_annotation;
pub mod shared;

use crate::config::KbaseConfig;
use crate::services::Services;
use axum::Router;
use std::sync::Arc;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    /// Platform endpoints and scratch root
    pub config: Arc<KbaseConfig>,
    /// Collaborators the operations delegate to
    pub services: Services,
}

impl FeatureState {
    pub fn new(config: KbaseConfig, services: Services) -> Self {
        Self {
            config: Arc::new(config),
            services,
        }
    }
}

/// Creates the REST router with all feature routes mounted
///
/// - `/genome-annotations` - upload, download and export
/// - `/status` - service status
pub fn router(state: FeatureState) -> Router<()> {
    Router::new()
        .nest("/genome-annotations", genome_annotation::genome_annotation_routes())
        .merge(genome_annotation::status_route())
        .with_state(state)
}
