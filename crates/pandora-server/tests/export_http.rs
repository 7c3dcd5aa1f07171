//! End-to-end tests driving the HTTP surface of the service.
//!
//! Each test starts a real server on port 0 and talks to it over HTTP.
//! Remote-storage behavior is exercised against an unreachable endpoint;
//! the happy path for the S3 variant needs an S3-compatible stack and
//! lives outside this suite.

use std::io::{Cursor, Read, Write};
use std::net::SocketAddr;
use std::path::PathBuf;

use pandora_config::{ExportSection, PandoraConfig, ServerSection};
use pandora_server::{AppState, Server, Shutdown};
use pandora_storage::ObjectStore;

const SAMPLE_DOCUMENT: &[u8] = b"%PDF-1.5 sample document payload used by the tests\n";

struct TestService {
    addr: SocketAddr,
    shutdown: Shutdown,
    _doc: Option<tempfile::NamedTempFile>,
}

impl TestService {
    /// Start a service whose local document is a fresh temp file.
    async fn start() -> Self {
        let mut doc = tempfile::NamedTempFile::new().unwrap();
        doc.write_all(SAMPLE_DOCUMENT).unwrap();
        let path = doc.path().to_path_buf();
        Self::start_with(path, Some(doc)).await
    }

    /// Start a service pointing at an arbitrary (possibly missing) file.
    async fn start_with(
        local_document_path: PathBuf,
        doc: Option<tempfile::NamedTempFile>,
    ) -> Self {
        let config = PandoraConfig {
            server: ServerSection {
                http_addr: "127.0.0.1:0".to_string(),
                ..Default::default()
            },
            export: ExportSection {
                local_document_path,
                stream_buffer_bytes: 8 * 1024,
                timeout_secs: 30,
                ..Default::default()
            },
            ..Default::default()
        };

        let state = AppState::with_store(config, offline_store());
        let bound = Server::new(state).bind().await.unwrap();
        let addr = bound.local_addr().unwrap();
        let shutdown = Shutdown::new();
        tokio::spawn(bound.serve(shutdown.clone()));

        Self {
            addr,
            shutdown,
            _doc: doc,
        }
    }

    fn url(&self, path_and_query: &str) -> String {
        format!("http://{}{}", self.addr, path_and_query)
    }
}

impl Drop for TestService {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Storage handle pointing at a port nothing listens on.
fn offline_store() -> ObjectStore {
    let config = aws_sdk_s3::Config::builder()
        .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
        .region(aws_sdk_s3::config::Region::new("us-east-1"))
        .credentials_provider(aws_sdk_s3::config::Credentials::new(
            "test", "test", None, None, "static",
        ))
        .endpoint_url("http://127.0.0.1:1")
        .force_path_style(true)
        .build();
    ObjectStore::from_client(aws_sdk_s3::Client::from_conf(config))
}

fn read_zip(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut reader = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
    let mut out = Vec::new();
    for i in 0..reader.len() {
        let mut file = reader.by_index(i).unwrap();
        let mut data = Vec::new();
        file.read_to_end(&mut data).unwrap();
        out.push((file.name().to_string(), data));
    }
    out
}

#[tokio::test]
async fn test_static_archive_has_identical_entries() {
    let service = TestService::start().await;

    let response = reqwest::get(service.url("/static-pdf?generate=3"))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response
            .headers()
            .get("content-disposition")
            .unwrap()
            .to_str()
            .unwrap(),
        "attachment; filename=\"document.zip\""
    );
    assert_eq!(
        response
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap(),
        "application/octet-stream"
    );

    let bytes = response.bytes().await.unwrap();
    let entries = read_zip(&bytes);
    assert_eq!(entries.len(), 3);
    for (i, (name, data)) in entries.iter().enumerate() {
        let suffix = format!("_{:010}.pdf", i + 1);
        assert!(name.ends_with(&suffix), "unexpected entry name {name}");
        assert_eq!(data, SAMPLE_DOCUMENT);
    }
}

#[tokio::test]
async fn test_dynamic_archive_entry_counts() {
    let service = TestService::start().await;

    for count in [1usize, 5, 100] {
        let url = service.url(&format!("/dynamic-pdf?generate={count}"));
        let bytes = reqwest::get(url).await.unwrap().bytes().await.unwrap();
        let entries = read_zip(&bytes);
        assert_eq!(entries.len(), count);
        for (i, (name, data)) in entries.iter().enumerate() {
            assert_eq!(*name, format!("dynamic-pdf_{:010}.pdf", i + 1));
            assert!(data.starts_with(b"%PDF"));
        }
    }
}

#[tokio::test]
async fn test_default_count_is_one() {
    let service = TestService::start().await;

    let bytes = reqwest::get(service.url("/dynamic-pdf"))
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    assert_eq!(read_zip(&bytes).len(), 1);
}

#[tokio::test]
async fn test_single_document_page_count() {
    let service = TestService::start().await;

    let response = reqwest::get(service.url("/dynamic-pdf-single?generate=3"))
        .await
        .unwrap();
    assert_eq!(
        response
            .headers()
            .get("content-disposition")
            .unwrap()
            .to_str()
            .unwrap(),
        "attachment; filename=\"document.pdf\""
    );

    let bytes = response.bytes().await.unwrap();
    let doc = lopdf::Document::load_mem(&bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 3);

    let text = doc.extract_text(&[1]).unwrap();
    assert!(text.contains("Document 0000000001"));
}

#[tokio::test]
async fn test_invalid_generate_is_rejected() {
    let service = TestService::start().await;

    for bad in ["0", "-1", "abc", "1001"] {
        let url = service.url(&format!("/dynamic-pdf?generate={bad}"));
        let response = reqwest::get(url).await.unwrap();
        assert_eq!(response.status(), 400, "generate={bad} should be rejected");

        let value: serde_json::Value = response.json().await.unwrap();
        assert_eq!(value["error"]["code"], "INVALID_REQUEST");
    }

    // The service keeps answering afterwards.
    let response = reqwest::get(service.url("/health")).await.unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_repeated_requests_are_byte_identical() {
    let service = TestService::start().await;

    for path in ["/static-pdf?generate=2", "/dynamic-pdf?generate=2", "/dynamic-pdf-single?generate=2"] {
        let first = reqwest::get(service.url(path)).await.unwrap().bytes().await.unwrap();
        let second = reqwest::get(service.url(path)).await.unwrap().bytes().await.unwrap();
        assert_eq!(first, second, "payload for {path} changed between runs");
    }
}

#[tokio::test]
async fn test_missing_local_file_truncates_archive() {
    let service =
        TestService::start_with(PathBuf::from("/definitely/not/here.pdf"), None).await;

    let response = reqwest::get(service.url("/static-pdf?generate=2"))
        .await
        .unwrap();
    // Framing is committed before the first entry opens its source.
    assert_eq!(response.status(), 200);

    let bytes = response.bytes().await.unwrap();
    assert!(zip::ZipArchive::new(Cursor::new(bytes.to_vec())).is_err());
}

#[tokio::test]
async fn test_unreachable_remote_truncates_archive() {
    let service = TestService::start().await;

    let response = reqwest::get(service.url("/static-s3?generate=1"))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let bytes = response.bytes().await.unwrap();
    assert!(zip::ZipArchive::new(Cursor::new(bytes.to_vec())).is_err());
}

#[tokio::test]
async fn test_client_disconnect_leaves_service_healthy() {
    let service = TestService::start().await;

    let mut response = reqwest::get(service.url("/dynamic-pdf?generate=1000"))
        .await
        .unwrap();
    // Read one chunk, then hang up mid-stream.
    let first = response.chunk().await.unwrap();
    assert!(first.is_some());
    drop(response);

    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    let response = reqwest::get(service.url("/health")).await.unwrap();
    assert_eq!(response.status(), 200);

    let bytes = reqwest::get(service.url("/dynamic-pdf?generate=2"))
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    assert_eq!(read_zip(&bytes).len(), 2);
}

#[tokio::test]
async fn test_health_payload() {
    let service = TestService::start().await;

    let value: serde_json::Value = reqwest::get(service.url("/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(value["status"], "ok");
    assert_eq!(value["service"], "pandora");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let service = TestService::start().await;

    let response = reqwest::get(service.url("/does-not-exist")).await.unwrap();
    assert_eq!(response.status(), 404);
}
