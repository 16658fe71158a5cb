//! `GET /download/{filename}` - fetch a generated spreadsheet.
//!
//! The session controller never calls this; it only renders links. The CLI
//! uses it to save spreadsheets next to the rendered report.

use super::{download_url, HttpBackend, TransportError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while downloading a spreadsheet.
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },
    #[error("refusing to save {0:?}: not a plain file name")]
    InvalidName(String),
}

/// Name the spreadsheet is saved under, or None if it would escape `dest_dir`.
fn local_name(excel_file: &str) -> Option<&str> {
    let name = Path::new(excel_file).file_name()?.to_str()?;
    if name == excel_file {
        Some(name)
    } else {
        None
    }
}

/// Download `excel_file` into `dest_dir`, returning the written path.
pub async fn download(
    backend: &HttpBackend,
    excel_file: &str,
    dest_dir: &Path,
) -> Result<PathBuf, DownloadError> {
    let name =
        local_name(excel_file).ok_or_else(|| DownloadError::InvalidName(excel_file.to_string()))?;
    let url = download_url(backend.base_url().as_str(), excel_file);

    tracing::debug!(%url, "downloading spreadsheet");

    let response = backend
        .apply_timeout(backend.http().get(url.as_str()))
        .send()
        .await
        .map_err(TransportError::from)?;

    let status = response.status().as_u16();
    let bytes = response.bytes().await.map_err(TransportError::from)?;

    if !(200..300).contains(&status) {
        let message = serde_json::from_slice::<serde_json::Value>(&bytes)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
            .unwrap_or_else(|| format!("HTTP {}", status));
        return Err(DownloadError::Server { status, message });
    }

    fs::create_dir_all(dest_dir).map_err(TransportError::from)?;
    let path = dest_dir.join(name);
    fs::write(&path, &bytes).map_err(TransportError::from)?;

    tracing::info!(path = %path.display(), bytes = bytes.len(), "saved spreadsheet");
    Ok(path)
}
