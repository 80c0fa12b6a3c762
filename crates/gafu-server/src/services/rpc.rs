//! Minimal KBase JSON-RPC 1.1 client
//!
//! KBase services take `{"version": "1.1", "method": "Module.func",
//! "params": [arg], "id": ...}` and answer with `{"result": [value]}` or an
//! `error` object. Errors usually come back with HTTP 500 and a JSON body, so
//! the body is decoded before the status code is considered.

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};
use uuid::Uuid;

#[derive(Debug, Serialize)]
struct RpcRequest<'a, P: Serialize> {
    version: &'static str,
    method: &'a str,
    params: [P; 1],
    id: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<R> {
    result: Option<Vec<R>>,
    error: Option<RpcError>,
}

/// Error object of a failed call
#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    /// Server-side traceback, when the service provides one
    #[serde(default)]
    pub error: Option<String>,
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.name.as_deref().unwrap_or("JSONRPCError"),
            self.message.as_deref().unwrap_or("unknown error")
        )?;
        if let Some(code) = self.code {
            write!(f, " (code {})", code)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct JsonRpcClient {
    client: Client,
    url: String,
}

impl JsonRpcClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Call `method` and return the first element of its result list.
    pub async fn call<P, R>(&self, method: &str, params: P, token: Option<&str>) -> Result<R>
    where
        P: Serialize + Send,
        R: DeserializeOwned,
    {
        self.send::<P, R>(method, params, token)
            .await?
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| anyhow!("{} returned no result", method))
    }

    /// Call a method whose result is not needed.
    pub async fn call_no_result<P>(&self, method: &str, params: P, token: Option<&str>) -> Result<()>
    where
        P: Serialize + Send,
    {
        self.send::<P, serde_json::Value>(method, params, token).await?;
        Ok(())
    }

    #[instrument(skip(self, params, token), fields(url = %self.url))]
    async fn send<P, R>(&self, method: &str, params: P, token: Option<&str>) -> Result<Option<Vec<R>>>
    where
        P: Serialize + Send,
        R: DeserializeOwned,
    {
        let body = RpcRequest {
            version: "1.1",
            method,
            params: [params],
            id: Uuid::new_v4().to_string(),
        };

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(token) = token {
            request = request.header(reqwest::header::AUTHORIZATION, token);
        }

        debug!("Calling {}", method);
        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to call {} at {}", method, self.url))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to read {} response body", method))?;

        let decoded: RpcResponse<R> = match serde_json::from_str(&text) {
            Ok(decoded) => decoded,
            Err(e) if status.is_success() => {
                return Err(e).with_context(|| format!("Malformed {} response", method));
            },
            Err(_) => {
                return Err(anyhow!("{} failed with HTTP {}: {}", method, status, text.trim()));
            },
        };

        if let Some(error) = decoded.error {
            return Err(anyhow!("{} failed: {}", method, error));
        }

        if !status.is_success() {
            return Err(anyhow!("{} failed with HTTP {}", method, status));
        }

        Ok(decoded.result)
    }
}
