// Integration tests for `StatusClient` using wiremock.
#![allow(clippy::unwrap_used)]

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use web888_api::{DeviceAddress, Error, StatusClient, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, StatusClient) {
    let server = MockServer::start().await;
    let addr = server.address();
    let device = DeviceAddress::new(addr.ip().to_string(), addr.port());
    let client = StatusClient::new(&device, &TransportConfig::default()).unwrap();
    (server, client)
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_parses_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("users=3\nusers_max=10\nuptime=120\ngps=(45.0, -93.0)\n"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let report = client.fetch().await.unwrap();

    assert_eq!(report.users, Some(3));
    assert_eq!(report.users_max, Some(10));
    assert_eq!(report.uptime_seconds, Some(120));
    let gps = report.gps.unwrap();
    assert!((gps.latitude - 45.0).abs() < f64::EPSILON);
    assert!((gps.longitude + 93.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_bad_lines_do_not_fail_the_fetch() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("name=Rooftop\nusers=many\nnot a pair\n"),
        )
        .mount(&server)
        .await;

    let report = client.fetch().await.unwrap();

    assert_eq!(report.name.as_deref(), Some("Rooftop"));
    assert_eq!(report.users, None);
    assert_eq!(report.issues.len(), 1);
}

#[tokio::test]
async fn test_non_success_status_is_an_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client.fetch().await.unwrap_err();

    match err {
        Error::HttpStatus { status, ref url } => {
            assert_eq!(status, 503);
            assert!(url.ends_with("/status"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_connection_refused_is_transient() {
    let (server, client) = setup().await;
    drop(server);

    let err = client.fetch().await.unwrap_err();

    assert!(matches!(err, Error::Transport(_)));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_shared_client_reuses_connections() {
    let server = MockServer::start().await;
    let addr = server.address();
    let device = DeviceAddress::new(addr.ip().to_string(), addr.port());
    let http = TransportConfig::default().build_client().unwrap();
    let client = StatusClient::with_client(http, &device).unwrap();

    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_string("users=1\n"))
        .expect(2)
        .mount(&server)
        .await;

    assert_eq!(client.fetch().await.unwrap().users, Some(1));
    assert_eq!(client.fetch().await.unwrap().users, Some(1));
    assert_eq!(client.url().path(), "/status");
}
