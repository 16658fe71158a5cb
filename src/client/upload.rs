//! `POST /upload` - multipart form with one `files` part per selected file.

use super::{read_reply, HttpBackend, Reply, TransportError};
use crate::files::SelectedFile;
use reqwest::multipart::{Form, Part};

/// Multipart field name the server reads the files from.
pub const FILES_FIELD: &str = "files";

/// Build the multipart form for a selection.
fn build_form(files: &[SelectedFile]) -> Result<Form, TransportError> {
    let mut form = Form::new();
    for file in files {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.content_type)?;
        form = form.part(FILES_FIELD, part);
    }
    Ok(form)
}

/// Send the selection to the upload endpoint.
pub async fn send(backend: &HttpBackend, files: &[SelectedFile]) -> Result<Reply, TransportError> {
    let url = backend.endpoint("/upload")?;
    let form = build_form(files)?;

    tracing::debug!(%url, files = files.len(), "uploading files");

    let response = backend
        .apply_timeout(backend.http().post(url).multipart(form))
        .send()
        .await?;

    read_reply(response).await
}
