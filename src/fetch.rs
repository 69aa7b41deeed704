// src/fetch.rs

//! Source downloads
//!
//! Sources are fetched sequentially into the build directory, one file per
//! URL, named after the last path segment of the URL. A file that is already
//! present under that name is reused as-is.

use crate::error::{Error, Result};
use reqwest::blocking::Client;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Default timeout for establishing HTTP connections
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Something that can fetch a URL into a local file
pub trait Downloader {
    fn download_file(&self, url: &str, dest_path: &Path) -> Result<()>;
}

/// HTTP client for source downloads (single attempt, no retry)
pub struct SourceClient {
    client: Client,
}

impl SourceClient {
    /// Create a new source client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            // Large tarballs may take a long time; only connecting is bounded.
            .timeout(None)
            .build()
            .map_err(|e| Error::DownloadError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl Downloader for SourceClient {
    fn download_file(&self, url: &str, dest_path: &Path) -> Result<()> {
        info!("Downloading {} to {}", url, dest_path.display());

        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|e| Error::DownloadError(format!("Failed to fetch {}: {}", url, e)))?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(Error::DownloadError(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        let mut file = File::create(dest_path).map_err(|e| {
            Error::IoError(format!("Failed to create file {}: {}", dest_path.display(), e))
        })?;

        io::copy(&mut response, &mut file)
            .map_err(|e| Error::IoError(format!("Failed to write downloaded data: {}", e)))?;

        debug!("Downloaded {}", dest_path.display());
        Ok(())
    }
}

/// File name a source URL is stored under
pub fn source_file_name(url: &str) -> Result<String> {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let name = without_query.rsplit('/').next().unwrap_or_default();

    if name.is_empty() || name == "." || name == ".." {
        return Err(Error::DownloadError(format!(
            "Cannot derive a file name from source URL: {}",
            url
        )));
    }
    Ok(name.to_string())
}

/// Copy sources that already exist in `sources_dir` into `dest_dir`
///
/// Returns the number of files staged. Missing files are skipped and will be
/// downloaded by [`fetch_sources`].
pub fn stage_local_sources(sources: &[String], sources_dir: &Path, dest_dir: &Path) -> Result<usize> {
    let mut staged = 0;
    for url in sources {
        let name = source_file_name(url)?;
        let local = sources_dir.join(&name);
        if !local.is_file() {
            continue;
        }

        let dest = dest_dir.join(&name);
        fs::copy(&local, &dest).map_err(|e| {
            Error::IoError(format!(
                "Failed to copy {} to {}: {}",
                local.display(),
                dest.display(),
                e
            ))
        })?;
        debug!("Using local source {}", local.display());
        staged += 1;
    }
    Ok(staged)
}

/// Fetch every source into `dest_dir`, skipping names already present
///
/// Returns the paths of all source files in source order.
pub fn fetch_sources(
    downloader: &dyn Downloader,
    sources: &[String],
    dest_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::with_capacity(sources.len());
    for url in sources {
        let dest = dest_dir.join(source_file_name(url)?);
        if dest.exists() {
            info!("Source {} already present, skipping download", dest.display());
        } else {
            downloader.download_file(url, &dest)?;
        }
        paths.push(dest);
    }
    Ok(paths)
}
