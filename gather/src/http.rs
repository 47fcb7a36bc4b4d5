//! Support for gathering HTTP(S) resources.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use crate::error::Error;
use crate::gatherer::Gatherer;
use crate::home::{HomeDir, SystemHome, expand_tilde};
use crate::metadata::{HttpMetadata, Metadata};

const FORCE_PREFIX: &str = "http::";
const DEFAULT_FILE_NAME: &str = "index.html";

/// Downloads a single resource with `reqwest`, following redirects.
#[derive(Clone)]
pub struct HttpGatherer {
    client: reqwest::Client,
    home: Arc<dyn HomeDir>,
}

impl Default for HttpGatherer {
    fn default() -> Self {
        Self::with_client(reqwest::Client::default())
    }
}

impl std::fmt::Debug for HttpGatherer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGatherer")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

impl HttpGatherer {
    /// Use a preconfigured client, e.g. one with proxies or custom timeouts.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            home: Arc::new(SystemHome),
        }
    }
}

/// The last non-empty path segment of `url`, or `index.html`.
fn file_name_from(url: &url::Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        .map(String::from)
        .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string())
}

/// Stream the response body into `target`, returning the number of bytes written.
async fn write_body(
    cancel: &CancellationToken,
    mut response: reqwest::Response,
    target: &Path,
) -> Result<u64, Error> {
    let mut file = tokio::fs::File::create(target).await?;
    let mut written = 0u64;
    loop {
        let chunk = tokio::select! {
            chunk = response.chunk() => chunk?,
            _ = cancel.cancelled() => return Err(Error::Cancelled),
        };
        let Some(chunk) = chunk else {
            break;
        };
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

#[async_trait::async_trait]
impl Gatherer for HttpGatherer {
    async fn gather(
        &self,
        cancel: &CancellationToken,
        source: &str,
        destination: &Path,
    ) -> Result<Metadata, Error> {
        let url = url::Url::parse(source.strip_prefix(FORCE_PREFIX).unwrap_or(source))?;
        let destination = expand_tilde(&destination.to_string_lossy(), self.home.as_ref());
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        log::info!("downloading {url}");
        let response = tokio::select! {
            response = self.client.get(url.clone()).send() => response?,
            _ = cancel.cancelled() => return Err(Error::Cancelled),
        };
        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status,
            });
        }
        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(String::from);

        let target: PathBuf = if destination.is_dir() {
            destination.join(file_name_from(&final_url))
        } else {
            destination
        };
        if let Some(parent) = target.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content_length = match write_body(cancel, response, &target).await {
            Ok(written) => written,
            Err(err) => {
                if let Err(cleanup) = tokio::fs::remove_file(&target).await {
                    log::debug!("could not remove partial download {}: {cleanup}", target.display());
                }
                return Err(err);
            }
        };
        log::info!(
            "wrote {content_length} bytes from {final_url} to {}",
            target.display()
        );

        Ok(Metadata::Http(HttpMetadata {
            url: url.to_string(),
            final_url: final_url.to_string(),
            status: status.as_u16(),
            content_length,
            content_type,
            destination: target,
        }))
    }

    fn rehome(&self, home: Arc<dyn HomeDir>) -> Option<Arc<dyn Gatherer>> {
        Some(Arc::new(Self {
            client: self.client.clone(),
            home,
        }))
    }
}
