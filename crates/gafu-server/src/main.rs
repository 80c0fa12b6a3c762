//! GenomeAnnotationFileUtil Server - Main entry point

use anyhow::Result;
use gafu_common::logging::{init_logging, LogConfig};
use tracing::info;

use gafu_server::{
    api,
    config::Config,
    features::FeatureState,
    services::Services,
    storage::{config::StorageConfig, Storage},
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Environment variables take precedence over these defaults
    let log_config = LogConfig::builder()
        .log_file_prefix("gafu-server")
        .filter_directives("gafu_server=debug,tower_http=debug,axum=info")
        .build()
        .with_env()?;

    let _log_guard = init_logging(&log_config)?;

    info!("Starting GenomeAnnotationFileUtil server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    tokio::fs::create_dir_all(&config.kbase.scratch).await?;

    let storage = Storage::new(StorageConfig::from_env()).await?;
    info!("Storage client initialized");

    let services = Services::connect(&config.kbase, storage)?;
    info!(
        workspace_url = %config.kbase.workspace_url,
        callback_url = %config.kbase.callback_url,
        "Collaborator clients initialized"
    );

    let state = FeatureState::new(config.kbase.clone(), services);
    api::serve(config, state).await
}
