//! `POST /analyze` - empty body, result comes back as JSON.

use super::{read_reply, HttpBackend, Reply, TransportError};

/// Ask the server to analyze whatever was last uploaded.
pub async fn send(backend: &HttpBackend) -> Result<Reply, TransportError> {
    let url = backend.endpoint("/analyze")?;

    tracing::debug!(%url, "requesting analysis");

    let response = backend
        .apply_timeout(backend.http().post(url))
        .send()
        .await?;

    read_reply(response).await
}
