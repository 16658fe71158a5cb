//! Client for the analysis server.
//!
//! The server exposes three endpoints:
//! - `POST /upload` - multipart upload, repeated `files` field
//! - `POST /analyze` - runs the analysis over whatever was last uploaded
//! - `GET /download/{filename}` - fetches a generated spreadsheet
//!
//! The session controller only talks to the server through [`Backend`], so
//! tests can swap in an in-memory implementation.

mod analyze;
mod download;
mod upload;

pub use download::{download, DownloadError};

use crate::files::SelectedFile;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Origin used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// JSON object in the order its keys appeared on the wire.
pub type StringMap = serde_json::Map<String, serde_json::Value>;

/// Errors that prevent a usable reply from being read.
///
/// These are the "transport/parse" failures: the user sees a generic
/// message and the detail goes to the log.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("malformed response body: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid server url: {0}")]
    Url(#[from] url::ParseError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(String),
}

/// A reply whose body parsed as JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub body: serde_json::Value,
}

impl Reply {
    pub fn new(status: u16, body: serde_json::Value) -> Self {
        Self { status, body }
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The server-supplied `error` string, or `HTTP <status>` if absent.
    pub fn error_text(&self) -> String {
        match self.body.get("error").and_then(|e| e.as_str()) {
            Some(text) => text.to_string(),
            None => format!("HTTP {}", self.status),
        }
    }
}

/// Body of a successful `/analyze` reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Question -> answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responses: Option<StringMap>,
    /// Source PDF file name -> generated spreadsheet file name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excel_files: Option<StringMap>,
}

impl AnalysisResult {
    /// Parse a reply body; both parts are optional.
    pub fn from_body(body: serde_json::Value) -> Result<Self, TransportError> {
        Ok(serde_json::from_value(body)?)
    }

    /// Question/answer pairs in wire order.
    pub fn response_pairs(&self) -> Option<Vec<(String, String)>> {
        self.responses.as_ref().map(entries)
    }

    /// PDF/spreadsheet pairs in wire order.
    pub fn excel_pairs(&self) -> Option<Vec<(String, String)>> {
        self.excel_files.as_ref().map(entries)
    }
}

fn entries(map: &StringMap) -> Vec<(String, String)> {
    map.iter()
        .map(|(k, v)| (k.clone(), value_text(v)))
        .collect()
}

/// Strings render as-is; anything else renders as compact JSON.
fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// The two endpoints the session controller calls.
#[async_trait]
pub trait Backend: Send + Sync {
    /// POST every file as a `files` part of one multipart request.
    async fn upload(&self, files: &[SelectedFile]) -> Result<Reply, TransportError>;

    /// POST with an empty body.
    async fn analyze(&self) -> Result<Reply, TransportError>;
}

/// reqwest-backed [`Backend`] for a fixed origin.
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: Url,
    timeout: Option<Duration>,
}

impl HttpBackend {
    /// Create a backend for the given origin.
    pub fn new(base_url: &str) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("pdfdesk/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: Url::parse(base_url)?,
            timeout: None,
        })
    }

    /// Apply a per-request timeout. Requests have none by default.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL of an endpoint under the configured origin.
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Ok(Url::parse(&joined)?)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn apply_timeout(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.timeout {
            Some(t) => request.timeout(t),
            None => request,
        }
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn upload(&self, files: &[SelectedFile]) -> Result<Reply, TransportError> {
        upload::send(self, files).await
    }

    async fn analyze(&self) -> Result<Reply, TransportError> {
        analyze::send(self).await
    }
}

/// Link target for a generated spreadsheet.
///
/// The file name is encoded as a single path segment.
pub fn download_url(base_url: &str, excel_file: &str) -> String {
    format!(
        "{}/download/{}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(excel_file)
    )
}

/// Read a response into a [`Reply`], failing if the body is not JSON.
pub(crate) async fn read_reply(response: reqwest::Response) -> Result<Reply, TransportError> {
    let status = response.status().as_u16();
    let bytes = response.bytes().await?;
    let body: serde_json::Value = serde_json::from_slice(&bytes)?;
    Ok(Reply { status, body })
}
