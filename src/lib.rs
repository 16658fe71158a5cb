//! pdfdesk - client for the PDF incident analysis server.
//!
//! The server accepts PDF uploads, answers a fixed set of questions about
//! them, and produces one spreadsheet per PDF. This crate is the client
//! side of that exchange: pick files, upload them, trigger the analysis,
//! and render the answers with links to the spreadsheets.
//!
//! # Architecture
//!
//! - `session`: the upload/analyze controller and its state
//! - `client`: the server endpoints behind the `Backend` trait
//! - `files`: file selection from command-line paths
//! - `view`: what the page shows, derived from session state
//! - `report`: output formatting (pretty, JSON, HTML)
//! - `config`: YAML configuration
//! - `logging`: diagnostic log setup
//! - `cli`: command-line front end

pub mod cli;
pub mod client;
pub mod config;
pub mod files;
pub mod logging;
pub mod report;
pub mod session;
pub mod view;

pub use client::{AnalysisResult, Backend, HttpBackend, Reply, TransportError};
pub use config::Config;
pub use files::SelectedFile;
pub use report::OutputFormat;
pub use session::{AnalyzeOutcome, Session, SessionState, UploadOutcome};
pub use view::View;
