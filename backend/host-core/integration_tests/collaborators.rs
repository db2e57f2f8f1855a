//! HTTP collaborators against a mock server.

use host_core::collaborators::{AuthService, HttpAuthService};
use host_core::model::{Connectivity, UpdateInfo};
use host_core::monitor::{ConnectivityProbe, HttpConnectivityProbe};
use host_core::update::{HttpUpdateSource, UpdateSource};

use common::RedactedSecret;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn given_feed_with_newer_release_when_checked_then_release_returned() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "version": "v2.1.0",
            "url": format!("{}/netgate-2.1.0.bin", server.uri()),
            "notes": "Faster reconnects"
        })))
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let source = HttpUpdateSource::new(&format!("{}/feed.json", server.uri()), dir.path().to_path_buf()).unwrap();

    let newer = source.check("2.0.9").await.unwrap();
    let same = source.check("2.1.0").await.unwrap();

    assert_eq!(newer.unwrap().version, "v2.1.0");
    assert!(same.is_none());
}

/// **VALUE**: Transient feed errors are retried inside the retry window.
///
/// **BUG THIS CATCHES**: Would catch a single 503 from a CDN edge turning
/// into a Failed update state.
#[tokio::test]
async fn given_feed_503_then_200_when_checked_then_retry_succeeds() {
    // GIVEN: A feed that fails once
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed.json"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/feed.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "version": "9.0.0",
            "url": format!("{}/a.bin", server.uri())
        })))
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let source = HttpUpdateSource::new(&format!("{}/feed.json", server.uri()), dir.path().to_path_buf())
        .unwrap()
        .with_retry_window(Duration::from_secs(5));

    // WHEN: Checking
    let release = source.check("1.0.0").await.unwrap();

    // THEN: The second attempt's answer is used
    assert_eq!(release.unwrap().version, "9.0.0");
}

#[tokio::test]
async fn given_feed_404_when_checked_then_not_retried_and_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed.json"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let source = HttpUpdateSource::new(&format!("{}/feed.json", server.uri()), dir.path().to_path_buf()).unwrap();

    let error = source.check("1.0.0").await.unwrap_err();

    assert!(!error.is_retryable());
    assert_eq!(error.status().map(|s| s.0), Some(404));
}

#[tokio::test]
async fn given_release_artifact_when_downloaded_then_written_with_final_progress() {
    let server = MockServer::start().await;
    let body = vec![7u8; 64 * 1024];
    Mock::given(method("GET"))
        .and(path("/netgate-2.1.0.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let source = HttpUpdateSource::new(&format!("{}/feed.json", server.uri()), dir.path().to_path_buf()).unwrap();
    let info = UpdateInfo {
        version: "2.1.0".into(),
        url: format!("{}/netgate-2.1.0.bin", server.uri()),
        notes: None,
    };
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let progress = move |p: f32| sink.lock().unwrap().push(p);

    let artifact = source.download(&info, &progress).await.unwrap();

    assert_eq!(std::fs::read(&artifact).unwrap(), body);
    assert_eq!(artifact.file_name().unwrap(), "netgate-2.1.0.bin");
    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.last().copied(), Some(1.0));
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn given_probe_endpoint_when_probed_then_status_maps_to_connectivity() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/generate_204"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/portal"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "http://login.example"))
        .mount(&server)
        .await;
    let timeout = Duration::from_secs(2);

    let online = HttpConnectivityProbe::new(format!("{}/generate_204", server.uri()), timeout).unwrap();
    let captive = HttpConnectivityProbe::new(format!("{}/portal", server.uri()), timeout).unwrap();
    let offline = HttpConnectivityProbe::new("http://127.0.0.1:9/", timeout).unwrap();

    assert_eq!(online.probe().await, Connectivity::Online);
    assert_eq!(captive.probe().await, Connectivity::Unknown);
    assert_eq!(offline.probe().await, Connectivity::Offline);
}

/// **VALUE**: Portal login posts the credentials and returns the token.
#[tokio::test]
async fn given_portal_when_login_then_posts_credentials_and_returns_token() {
    // GIVEN: A portal expecting alice's credentials
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(body_json(json!({ "username": "alice", "password": "pw" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "abc" })))
        .expect(1)
        .mount(&server)
        .await;
    let portal = HttpAuthService::new(&format!("{}/api", server.uri())).unwrap();

    // WHEN: Logging in
    let token = portal.login("alice", &RedactedSecret::new("pw")).await.unwrap();

    // THEN: The portal's token comes back
    assert_eq!(token.0.expose(), "abc");
}

#[tokio::test]
async fn given_portal_rejects_when_login_then_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
        .mount(&server)
        .await;
    let portal = HttpAuthService::new(&server.uri()).unwrap();

    let error = portal.login("alice", &RedactedSecret::new("nope")).await.unwrap_err();

    assert_eq!(error.status().map(|s| s.0), Some(401));
}
