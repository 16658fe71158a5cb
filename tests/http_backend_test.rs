//! End-to-end tests of the session controller over real HTTP.
//!
//! Each test starts a `tiny_http` server on 127.0.0.1 that answers a fixed
//! list of requests and records what it received.

use std::io::Read;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use pdfdesk::client::{self, DownloadError};
use pdfdesk::report::render_html;
use pdfdesk::session::messages;
use pdfdesk::{AnalyzeOutcome, HttpBackend, SelectedFile, Session, UploadOutcome};

#[derive(Debug, Clone)]
struct Captured {
    method: String,
    url: String,
    content_type: Option<String>,
    body: Vec<u8>,
}

struct TestServer {
    base_url: String,
    captured: Arc<Mutex<Vec<Captured>>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Serve one canned `(status, body)` reply per expected request.
    fn start(replies: Vec<(u16, &'static str)>) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("bind test server");
        let addr = server.server_addr().to_ip().expect("tcp listener");
        let captured = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&captured);
        let handle = thread::spawn(move || {
            for (status, body) in replies {
                let mut request = server.recv().expect("receive request");

                let mut bytes = Vec::new();
                request
                    .as_reader()
                    .read_to_end(&mut bytes)
                    .expect("read request body");
                let content_type = request
                    .headers()
                    .iter()
                    .find(|h| h.field.equiv("Content-Type"))
                    .map(|h| h.value.as_str().to_string());

                sink.lock().unwrap().push(Captured {
                    method: request.method().to_string(),
                    url: request.url().to_string(),
                    content_type,
                    body: bytes,
                });

                let response = tiny_http::Response::from_string(body)
                    .with_status_code(tiny_http::StatusCode(status))
                    .with_header(
                        tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                            .unwrap(),
                    );
                request.respond(response).expect("send response");
            }
        });

        Self {
            base_url: format!("http://{}", addr),
            captured,
            handle,
        }
    }

    fn session(&self) -> Session<HttpBackend> {
        Session::new(HttpBackend::new(&self.base_url).unwrap())
    }

    /// Wait for every canned reply to be served and return the requests.
    fn finish(self) -> Vec<Captured> {
        self.handle.join().expect("server thread");
        let captured = self.captured.lock().unwrap().clone();
        captured
    }
}

fn pdf(name: &str, content: &str) -> SelectedFile {
    SelectedFile::new(name, "application/pdf", content.as_bytes().to_vec())
}

/// An origin nothing is listening on.
fn closed_origin() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_upload_two_files_success() {
    let server = TestServer::start(vec![(
        200,
        r#"{"message": "Archivos subidos correctamente.", "files": ["a.pdf", "b.pdf"]}"#,
    )]);
    let session = server.session();
    session.select_files(vec![pdf("a.pdf", "%PDF-a"), pdf("b.pdf", "%PDF-b")]);

    assert_eq!(session.upload().await, UploadOutcome::Uploaded);

    let state = session.snapshot();
    assert_eq!(state.status, "Archivos subidos correctamente.");
    assert!(!state.uploading);

    let requests = server.finish();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, "POST");
    assert_eq!(request.url, "/upload");
    assert!(request
        .content_type
        .as_deref()
        .unwrap_or("")
        .starts_with("multipart/form-data; boundary="));

    let body = String::from_utf8_lossy(&request.body);
    assert_eq!(body.matches("name=\"files\"").count(), 2);
    assert!(body.contains("filename=\"a.pdf\""));
    assert!(body.contains("filename=\"b.pdf\""));
    assert!(body.contains("%PDF-a"));
    assert!(body.contains("%PDF-b"));
    assert_eq!(body.matches("application/pdf").count(), 2);
}

#[tokio::test]
async fn test_upload_without_files_never_connects() {
    let session = Session::new(HttpBackend::new(&closed_origin()).unwrap());

    assert_eq!(session.upload().await, UploadOutcome::NoFiles);
    assert_eq!(session.snapshot().status, messages::NO_FILES_SELECTED);
}

#[tokio::test]
async fn test_upload_server_error() {
    let server = TestServer::start(vec![(400, r#"{"error": "No se proporcionó ningún archivo."}"#)]);
    let session = server.session();
    session.select_files(vec![pdf("a.pdf", "x")]);

    session.upload().await;

    let state = session.snapshot();
    assert_eq!(state.status, "Error: No se proporcionó ningún archivo.");
    assert!(!state.uploading);
    server.finish();
}

#[tokio::test]
async fn test_upload_connection_refused() {
    let session = Session::new(HttpBackend::new(&closed_origin()).unwrap());
    session.select_files(vec![pdf("a.pdf", "x")]);

    assert_eq!(session.upload().await, UploadOutcome::Failed);

    let state = session.snapshot();
    assert_eq!(state.status, messages::UPLOAD_FAILED);
    assert!(!state.uploading);
}

#[tokio::test]
async fn test_upload_non_json_body_is_failure_even_on_success_status() {
    let server = TestServer::start(vec![(200, "<html>ok</html>")]);
    let session = server.session();
    session.select_files(vec![pdf("a.pdf", "x")]);

    assert_eq!(session.upload().await, UploadOutcome::Failed);
    assert_eq!(session.snapshot().status, messages::UPLOAD_FAILED);
    server.finish();
}

#[tokio::test]
async fn test_analyze_without_upload_renders_empty_sections() {
    let server = TestServer::start(vec![(200, r#"{"responses": {}, "excel_files": {}}"#)]);
    let session = server.session();

    assert_eq!(session.analyze().await, AnalyzeOutcome::Completed);

    let requests = server.finish();
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].url, "/analyze");
    assert!(requests[0].body.is_empty());

    let html = render_html(&session.view("http://localhost:5000"));
    assert!(html.contains(messages::RESULTS_HEADING));
    assert!(html.contains(messages::RESPONSES_HEADING));
    assert!(html.contains(messages::EXCEL_HEADING));
    assert!(!html.contains("<li>"));
}

#[tokio::test]
async fn test_analyze_server_error_leaves_results_unset() {
    let server = TestServer::start(vec![(500, r#"{"error":"parse failed"}"#)]);
    let session = server.session();

    assert_eq!(
        session.analyze().await,
        AnalyzeOutcome::Rejected("parse failed".to_string())
    );

    let state = session.snapshot();
    assert_eq!(state.status, "Error en el análisis: parse failed");
    assert!(state.result.is_none());
    assert!(!state.analyzing);

    let html = render_html(&session.view(&server.base_url));
    assert!(!html.contains(messages::RESULTS_HEADING));
    server.finish();
}

#[tokio::test]
async fn test_analyze_non_json_error_page() {
    let server = TestServer::start(vec![(502, "Bad Gateway")]);
    let session = server.session();

    assert_eq!(session.analyze().await, AnalyzeOutcome::Failed);
    assert_eq!(session.snapshot().status, messages::ANALYZE_FAILED);
    server.finish();
}

#[tokio::test]
async fn test_upload_then_analyze_renders_links() {
    let server = TestServer::start(vec![
        (200, r#"{"message": "ok"}"#),
        (
            200,
            r#"{"responses": {"When was the vessel built?": "1998"}, "excel_files": {"informe.pdf": "informe.xlsx"}}"#,
        ),
    ]);
    let session = server.session();
    session.select_files(vec![pdf("informe.pdf", "x")]);

    assert!(session.upload().await.is_success());
    assert!(session.analyze().await.is_success());

    let html = render_html(&session.view(&server.base_url));
    assert!(html.contains("<li><strong>When was the vessel built?:</strong> 1998</li>"));
    assert!(html.contains(&format!(
        "<li>informe.pdf: <a href=\"{}/download/informe.xlsx\"",
        server.base_url
    )));
    assert!(html.contains("Descargar informe.xlsx</a>"));

    let requests = server.finish();
    let urls: Vec<_> = requests.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(urls, vec!["/upload", "/analyze"]);
}

#[tokio::test]
async fn test_download_writes_file() {
    let server = TestServer::start(vec![(200, "spreadsheet-bytes")]);
    let backend = HttpBackend::new(&server.base_url).unwrap();
    let temp = tempfile::TempDir::new().unwrap();

    let path = client::download(&backend, "informe 1.xlsx", temp.path())
        .await
        .unwrap();

    assert_eq!(path, temp.path().join("informe 1.xlsx"));
    assert_eq!(std::fs::read(&path).unwrap(), b"spreadsheet-bytes");

    let requests = server.finish();
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].url, "/download/informe%201.xlsx");
}

#[tokio::test]
async fn test_download_server_error() {
    let server = TestServer::start(vec![(
        500,
        r#"{"error": "Error al descargar el archivo: not found"}"#,
    )]);
    let backend = HttpBackend::new(&server.base_url).unwrap();
    let temp = tempfile::TempDir::new().unwrap();

    let err = client::download(&backend, "missing.xlsx", temp.path())
        .await
        .unwrap_err();

    match err {
        DownloadError::Server { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "Error al descargar el archivo: not found");
        }
        other => panic!("expected server error, got {:?}", other),
    }
    assert!(!temp.path().join("missing.xlsx").exists());
    server.finish();
}

#[tokio::test]
async fn test_download_rejects_path_names() {
    let backend = HttpBackend::new(&closed_origin()).unwrap();
    let temp = tempfile::TempDir::new().unwrap();

    let err = client::download(&backend, "../escape.xlsx", temp.path())
        .await
        .unwrap_err();
    assert!(matches!(err, DownloadError::InvalidName(_)));
}
