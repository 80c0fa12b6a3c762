//! URL retrieval into the staging area

use super::ftp::{self, FtpLocation};
use super::UrlFetcher;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument};
use url::Url;

/// File name used when the URL path has no usable final segment
const FALLBACK_FILE_NAME: &str = "download";

/// Fetches `http(s)://` URLs with reqwest and `ftp://` URLs with suppaftp.
pub struct RemoteFetcher {
    client: Client,
    /// URLs on this origin and under its path receive the caller's token
    authenticated_prefix: Option<Url>,
}

impl RemoteFetcher {
    pub fn new(timeout: Duration, authenticated_prefix: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        let authenticated_prefix = authenticated_prefix
            .map(|prefix| {
                Url::parse(&prefix).with_context(|| format!("Invalid blob store URL: {}", prefix))
            })
            .transpose()?;
        Ok(Self {
            client,
            authenticated_prefix,
        })
    }

    /// Same scheme, host and port as the blob store, and a path at or below its path
    fn is_authenticated(&self, url: &Url) -> bool {
        self.authenticated_prefix.as_ref().is_some_and(|prefix| {
            url.scheme() == prefix.scheme()
                && url.host_str() == prefix.host_str()
                && url.port_or_known_default() == prefix.port_or_known_default()
                && path_is_under(url.path(), prefix.path())
        })
    }

    async fn fetch_http(&self, url: &Url, destination: &Path, token: Option<&str>) -> Result<u64> {
        let mut request = self.client.get(url.clone());
        if let (true, Some(token)) = (self.is_authenticated(url), token) {
            request = request.header(reqwest::header::AUTHORIZATION, format!("OAuth {}", token));
        }

        let mut response = request
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?
            .error_for_status()
            .with_context(|| format!("Failed to fetch {}", url))?;

        let mut file = tokio::fs::File::create(destination)
            .await
            .with_context(|| format!("Failed to create {}", destination.display()))?;

        let mut written = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .with_context(|| format!("Failed to read body of {}", url))?
        {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(written)
    }
}

fn path_is_under(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    prefix.is_empty()
        || path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Last non-empty path segment of `url`, usable as a local file name
pub fn file_name_from_url(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .filter(|name| *name != "." && *name != "..")
        .map(|name| name.to_string())
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string())
}

#[async_trait]
impl UrlFetcher for RemoteFetcher {
    #[instrument(skip(self, token))]
    async fn fetch_urls(
        &self,
        working_directory: &Path,
        token: Option<&str>,
        urls: &BTreeMap<String, String>,
    ) -> Result<()> {
        for (name, raw_url) in urls {
            let url = Url::parse(raw_url).with_context(|| format!("Invalid URL: {}", raw_url))?;
            let target_dir = working_directory.join(name);
            tokio::fs::create_dir_all(&target_dir).await?;
            let destination = target_dir.join(file_name_from_url(&url));

            info!(url = %url, destination = %destination.display(), "Fetching remote file");
            let bytes = match url.scheme() {
                "http" | "https" => self.fetch_http(&url, &destination, token).await?,
                "ftp" => ftp::download_to_file(FtpLocation::from_url(&url)?, destination).await?,
                other => bail!("Unsupported URL scheme '{}' in {}", other, url),
            };
            info!(url = %url, bytes, "Fetched remote file");
        }
        Ok(())
    }
}
