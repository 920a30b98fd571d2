//! Downloads repository artifacts into the local data directory.
//!
//! The destination directory is created idempotently before the first
//! write. Downloads stream to disk with a progress bar; an optional
//! SHA-256 sidecar check validates the bytes and an optional extraction
//! step unpacks gzip or tar.gz containers in place. Network or disk
//! failures surface as an unrecovered [`DownloadError`]; there is no
//! retry and no partial-download cleanup.

use std::{
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

use flate2::read::GzDecoder;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tar::Archive;
use thiserror::Error;

/// Errors raised while retrieving or unpacking a file
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("download request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server returned HTTP {status} for {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("invalid download URL: {0}")]
    InvalidUrl(String),

    #[error("checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: String,
        expected: String,
        actual: String,
    },
}

/// Result type for retrieval operations
pub type DownloadResult<T> = Result<T, DownloadError>;

/// Flags controlling a retrieval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DownloadOptions {
    /// Verify the downloaded bytes against the server's SHA-256 sidecar
    #[serde(default)]
    pub validate: bool,
    /// Unpack gzip or tar.gz containers after the download
    #[serde(default)]
    pub extract: bool,
}

/// Creates the destination directory if it is missing.
///
/// A pre-existing directory is not an error; repeated calls are no-ops.
pub fn ensure_data_dir(dir: &Path) -> DownloadResult<()> {
    fs::create_dir_all(dir)?;
    Ok(())
}

/// Derives the local file name from the final segment of a URL.
pub fn file_name_from_url(url: &str) -> DownloadResult<String> {
    let trimmed = url.split(['?', '#']).next().unwrap_or(url);
    let name = trimmed.rsplit('/').next().unwrap_or("");
    if name.is_empty() {
        return Err(DownloadError::InvalidUrl(url.to_string()));
    }
    Ok(name.to_string())
}

/// Downloads `url` into `dir`, returning the path of the local artifact.
///
/// The directory is created if absent. With `opts.validate` the bytes are
/// checked against the `<url>.sha256` sidecar; with `opts.extract` a
/// gzip or tar.gz container is unpacked in place and the extracted payload
/// path is returned instead of the archive path.
pub async fn fetch(url: &str, dir: &Path, opts: DownloadOptions) -> DownloadResult<PathBuf> {
    ensure_data_dir(dir)?;

    let file_name = file_name_from_url(url)?;
    let target = dir.join(&file_name);

    info!("Downloading {} to {}", url, target.display());
    download_to(url, &target).await?;

    if opts.validate {
        validate_sha256(url, &target).await?;
    }

    if opts.extract {
        let extracted = extract_archive(&target, dir)?;
        return Ok(extracted);
    }

    Ok(target)
}

/// Streams the response body to `path` with a progress bar.
async fn download_to(url: &str, path: &Path) -> DownloadResult<()> {
    let response = reqwest::get(url).await?;

    if !response.status().is_success() {
        return Err(DownloadError::Status {
            status: response.status(),
            url: url.to_string(),
        });
    }

    let total_size = response.content_length().unwrap_or(0);
    let progress_bar = ProgressBar::new(total_size);
    if total_size > 0 {
        progress_bar.set_style(
            ProgressStyle::with_template(
                "{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({percent}%) {eta}",
            )
            .unwrap()
            .progress_chars("=> "),
        );
    }
    progress_bar.set_message(path.file_name().unwrap_or_default().to_string_lossy().to_string());

    let mut file = File::create(path)?;
    let mut downloaded = 0u64;
    let mut stream = response.bytes_stream();

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result?;
        file.write_all(&chunk)?;
        downloaded += chunk.len() as u64;
        progress_bar.set_position(downloaded);
    }

    progress_bar.finish_and_clear();
    debug!("Downloaded {} bytes to {}", downloaded, path.display());
    Ok(())
}

/// Checks the artifact against the server's `<url>.sha256` sidecar.
///
/// A missing sidecar downgrades to a warning; a digest mismatch is a hard
/// error that leaves the artifact in place for inspection.
async fn validate_sha256(url: &str, path: &Path) -> DownloadResult<()> {
    let sidecar_url = format!("{}.sha256", url);
    let response = reqwest::get(&sidecar_url).await?;

    if !response.status().is_success() {
        warn!(
            "No checksum sidecar at {} (HTTP {}), skipping validation",
            sidecar_url,
            response.status()
        );
        return Ok(());
    }

    let body = response.text().await?;
    let expected = match body.split_whitespace().next() {
        Some(token) => token.to_ascii_lowercase(),
        None => {
            warn!("Empty checksum sidecar at {}, skipping validation", sidecar_url);
            return Ok(());
        }
    };

    let actual = sha256_hex(path)?;
    if actual != expected {
        return Err(DownloadError::ChecksumMismatch {
            path: path.display().to_string(),
            expected,
            actual,
        });
    }

    debug!("Checksum verified for {}", path.display());
    Ok(())
}

/// Hex SHA-256 digest of a file's contents.
pub fn sha256_hex(path: &Path) -> DownloadResult<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Unpacks a downloaded container in place.
///
/// `.tar.gz`/`.tgz` archives unpack into `dir` (the directory path is
/// returned), a bare `.gz` decompresses next to the archive, and anything
/// else is passed through unchanged with a warning.
pub fn extract_archive(path: &Path, dir: &Path) -> DownloadResult<PathBuf> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        info!("Extracting {} into {}", path.display(), dir.display());
        let tar_gz = File::open(path)?;
        let tar = GzDecoder::new(tar_gz);
        let mut archive = Archive::new(tar);
        archive.unpack(dir)?;
        Ok(dir.to_path_buf())
    } else if name.ends_with(".gz") {
        let target = dir.join(name.trim_end_matches(".gz"));
        info!("Decompressing {} to {}", path.display(), target.display());
        let mut decoder = GzDecoder::new(File::open(path)?);
        let mut out = File::create(&target)?;
        io::copy(&mut decoder, &mut out)?;
        Ok(target)
    } else {
        warn!("{} is not a recognized archive, leaving as-is", path.display());
        Ok(path.to_path_buf())
    }
}
