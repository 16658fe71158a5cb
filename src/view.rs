//! What the page shows for a given state.
//!
//! [`View::build`] is a pure function of the session state and the server
//! origin. The formatters in [`crate::report`] only decide how a `View`
//! looks, never what is in it.

use serde::Serialize;

use crate::client::{download_url, AnalysisResult};
use crate::session::{messages, SessionState};

/// A button: its label and whether it can be pressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionControl {
    pub label: String,
    pub disabled: bool,
}

impl ActionControl {
    fn new(busy: bool, idle_label: &str, busy_label: &str) -> Self {
        Self {
            label: if busy { busy_label } else { idle_label }.to_string(),
            disabled: busy,
        }
    }
}

/// One generated spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExcelLink {
    pub pdf_file: String,
    pub excel_file: String,
    pub href: String,
}

impl ExcelLink {
    /// Link text.
    pub fn label(&self) -> String {
        format!("{}{}", messages::DOWNLOAD_PREFIX, self.excel_file)
    }
}

/// The results section; each part is present only if the reply had it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultsView {
    pub responses: Option<Vec<ResponseItem>>,
    pub excel_files: Option<Vec<ExcelLink>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseItem {
    pub question: String,
    pub answer: String,
}

impl ResponseItem {
    /// `question: answer`, as the list item reads.
    pub fn text(&self) -> String {
        format!("{}: {}", self.question, self.answer)
    }
}

impl ResultsView {
    fn build(result: &AnalysisResult, base_url: &str) -> Self {
        let responses = result.response_pairs().map(|pairs| {
            pairs
                .into_iter()
                .map(|(question, answer)| ResponseItem { question, answer })
                .collect()
        });

        let excel_files = result.excel_pairs().map(|pairs| {
            pairs
                .into_iter()
                .map(|(pdf_file, excel_file)| ExcelLink {
                    href: download_url(base_url, &excel_file),
                    pdf_file,
                    excel_file,
                })
                .collect()
        });

        Self {
            responses,
            excel_files,
        }
    }
}

/// The rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct View {
    pub title: String,
    pub selected_files: usize,
    pub upload: ActionControl,
    pub analyze: ActionControl,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<ResultsView>,
}

impl View {
    pub fn build(state: &SessionState, base_url: &str) -> Self {
        Self {
            title: messages::TITLE.to_string(),
            selected_files: state.selected_count(),
            upload: ActionControl::new(
                state.uploading,
                messages::UPLOAD_LABEL,
                messages::UPLOAD_LABEL_BUSY,
            ),
            analyze: ActionControl::new(
                state.analyzing,
                messages::ANALYZE_LABEL,
                messages::ANALYZE_LABEL_BUSY,
            ),
            status: state.status.clone(),
            results: state
                .result
                .as_ref()
                .map(|r| ResultsView::build(r, base_url)),
        }
    }
}
