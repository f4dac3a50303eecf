//! Downloads archive files, trying each mirror in turn.

use std::{
    collections::HashMap,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::errors::FetchError;

/// Fetches one URL into an already opened file.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Returns the number of bytes written.
    async fn get(&self, url: &str, out: &mut File) -> Result<u64, FetchError>;
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

fn classify(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, out: &mut File) -> Result<u64, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(FetchError::ServerError {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut downloaded = 0u64;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| classify(url, e))?;
            out.write_all(&chunk)?;
            downloaded += chunk.len() as u64;
        }
        out.flush()?;

        Ok(downloaded)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    AlreadyPresent,
    Downloaded { mirror: usize, bytes: u64 },
}

/// Downloads `resource` from the first mirror that has it.
///
/// An existing `destination` counts as success and nothing is contacted.
/// `NotFound` moves on to the next mirror unless it was the last one; any other
/// failure is returned immediately. The file is written under a temporary name
/// and only renamed to `destination` once complete.
pub async fn fetch_from_mirrors(
    transport: &dyn Transport,
    mirrors: &[String],
    resource: &str,
    destination: &Path,
) -> Result<FetchOutcome, FetchError> {
    if destination.exists() {
        debug!(path = %destination.display(), "Source file already downloaded");
        return Ok(FetchOutcome::AlreadyPresent);
    }
    let dir = destination.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    for (i, mirror) in mirrors.iter().enumerate() {
        let url = format!("{mirror}{resource}");
        let mut temp = NamedTempFile::new_in(dir)?;

        match transport.get(&url, temp.as_file_mut()).await {
            Ok(bytes) => {
                temp.persist(destination).map_err(|e| FetchError::Io(e.error))?;
                info!(url = %url, path = %destination.display(), bytes, "Download completed");
                return Ok(FetchOutcome::Downloaded { mirror: i, bytes });
            }
            Err(e) if e.is_not_found() && i != mirrors.len() - 1 => {
                warn!(url = %url, "Not found on mirror, trying next");
                continue;
            }
            Err(e) => return Err(e),
        }
    }

    Err(FetchError::NoMirrors)
}

/// Mirror list plus per-destination locks, so concurrent jobs that need the
/// same source file download it once.
pub struct MirrorFetcher {
    transport: Arc<dyn Transport>,
    mirrors: Vec<String>,
    locks: Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>,
}

impl MirrorFetcher {
    pub fn new(transport: Arc<dyn Transport>, mirrors: Vec<String>) -> Self {
        Self {
            transport,
            mirrors,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub async fn fetch(&self, resource: &str, destination: &Path) -> Result<FetchOutcome, FetchError> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(locks.entry(destination.to_path_buf()).or_default())
        };
        let result = {
            let _guard = lock.lock().await;
            fetch_from_mirrors(self.transport.as_ref(), &self.mirrors, resource, destination).await
        };

        // drop the lock entry unless another fetch of the same path is waiting on it
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        if Arc::strong_count(&lock) == 2 {
            locks.remove(destination);
        }

        result
    }
}

// -- Tests -------------------------------------------------------------------
