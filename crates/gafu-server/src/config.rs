//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 5000;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default CORS allowed origin.
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "*";

// ============================================================================
// Platform Endpoint Constants
// ============================================================================

/// Default workspace (object store) JSON-RPC endpoint.
pub const DEFAULT_WORKSPACE_URL: &str = "https://kbase.us/services/ws";

/// Default Shock (blob store) endpoint handed to the transform collaborators.
pub const DEFAULT_SHOCK_URL: &str = "https://kbase.us/services/shock-api";

/// Default handle service endpoint.
pub const DEFAULT_HANDLE_SERVICE_URL: &str = "https://kbase.us/services/handle_service";

/// Default scratch root shared with the callback service.
pub const DEFAULT_SCRATCH_DIR: &str = "/kb/module/work/tmp";

/// Default timeout for outbound HTTP calls. GenBank conversions of large
/// genomes routinely take minutes.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 300;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub kbase: KbaseConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

/// Platform endpoints and scratch space, fixed for the life of the process
/// and handed to every genome annotation operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KbaseConfig {
    pub workspace_url: String,
    pub shock_url: String,
    pub handle_service_url: String,
    /// Callback service that hosts the transform collaborators
    pub callback_url: String,
    pub scratch: PathBuf,
    pub http_timeout_secs: u64,
}

/// Endpoint map forwarded to the transform collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEndpoints {
    pub workspace_service_url: String,
    pub shock_service_url: String,
    pub handle_service_url: String,
}

impl KbaseConfig {
    pub fn endpoints(&self) -> ServiceEndpoints {
        ServiceEndpoints {
            workspace_service_url: self.workspace_url.clone(),
            shock_service_url: self.shock_url.clone(),
            handle_service_url: self.handle_service_url.clone(),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            server: ServerConfig {
                host: env_or("GAFU_HOST", DEFAULT_SERVER_HOST),
                port: env_parsed("GAFU_PORT", DEFAULT_SERVER_PORT),
                shutdown_timeout_secs: env_parsed(
                    "GAFU_SHUTDOWN_TIMEOUT",
                    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
                ),
            },
            cors: CorsConfig {
                allowed_origins: env_or("CORS_ALLOWED_ORIGINS", DEFAULT_CORS_ALLOWED_ORIGIN)
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                allow_credentials: env_parsed("CORS_ALLOW_CREDENTIALS", false),
            },
            kbase: KbaseConfig {
                workspace_url: env_or("WORKSPACE_URL", DEFAULT_WORKSPACE_URL),
                shock_url: env_or("SHOCK_URL", DEFAULT_SHOCK_URL),
                handle_service_url: env_or("HANDLE_SERVICE_URL", DEFAULT_HANDLE_SERVICE_URL),
                callback_url: std::env::var("SDK_CALLBACK_URL").unwrap_or_default(),
                scratch: PathBuf::from(env_or("SCRATCH", DEFAULT_SCRATCH_DIR)),
                http_timeout_secs: env_parsed("GAFU_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS),
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        if self.kbase.callback_url.trim().is_empty() {
            anyhow::bail!("SDK_CALLBACK_URL must be set");
        }

        for (name, value) in [
            ("WORKSPACE_URL", &self.kbase.workspace_url),
            ("SHOCK_URL", &self.kbase.shock_url),
            ("HANDLE_SERVICE_URL", &self.kbase.handle_service_url),
            ("SDK_CALLBACK_URL", &self.kbase.callback_url),
        ] {
            if !(value.starts_with("http://") || value.starts_with("https://")) {
                anyhow::bail!("{} must be an http(s) URL, got '{}'", name, value);
            }
        }

        if !self.kbase.scratch.is_absolute() {
            anyhow::bail!(
                "SCRATCH must be an absolute path, got '{}'",
                self.kbase.scratch.display()
            );
        }

        if self.kbase.http_timeout_secs == 0 {
            anyhow::bail!("GAFU_HTTP_TIMEOUT_SECS must be greater than 0");
        }

        if self.cors.allowed_origins.is_empty() {
            tracing::warn!("No CORS origins configured - all origins will be allowed");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
                shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            },
            cors: CorsConfig {
                allowed_origins: vec![DEFAULT_CORS_ALLOWED_ORIGIN.to_string()],
                allow_credentials: false,
            },
            kbase: KbaseConfig {
                workspace_url: DEFAULT_WORKSPACE_URL.to_string(),
                shock_url: DEFAULT_SHOCK_URL.to_string(),
                handle_service_url: DEFAULT_HANDLE_SERVICE_URL.to_string(),
                callback_url: "http://localhost:9999".to_string(),
                scratch: PathBuf::from(DEFAULT_SCRATCH_DIR),
                http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_missing_callback_url_rejected() {
        let mut config = Config::default();
        config.kbase.callback_url = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("SDK_CALLBACK_URL"));
    }

    #[test]
    fn test_relative_scratch_rejected() {
        let mut config = Config::default();
        config.kbase.scratch = PathBuf::from("tmp/scratch");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_http_workspace_url_rejected() {
        let mut config = Config::default();
        config.kbase.workspace_url = "ftp://kbase.us/ws".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("WORKSPACE_URL"));
    }

    #[test]
    fn test_endpoints_use_kbase_key_names() {
        let endpoints = Config::default().kbase.endpoints();
        let value = serde_json::to_value(&endpoints).unwrap();
        assert_eq!(value["workspace_service_url"], DEFAULT_WORKSPACE_URL);
        assert_eq!(value["shock_service_url"], DEFAULT_SHOCK_URL);
        assert_eq!(value["handle_service_url"], DEFAULT_HANDLE_SERVICE_URL);
    }
}
