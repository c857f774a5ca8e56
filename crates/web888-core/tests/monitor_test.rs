// Integration tests for `Monitor` against wiremock (HTTP mode) and an
// in-process fake device serving `/status` and the admin socket on one port.
#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use web888_core::{
    BackoffPolicy, ConnectionMode, CoreError, DrainConfig, ModePreference, Monitor, MonitorConfig,
    SessionState, Status,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn fast(mut config: MonitorConfig) -> MonitorConfig {
    config.poll_interval = Duration::from_secs(30);
    config.timeouts.connect = Duration::from_secs(5);
    config.timeouts.http_request = Duration::from_secs(2);
    config.timeouts.command_pause = Duration::from_millis(10);
    config.drain = DrainConfig {
        frame_timeout: Duration::from_millis(200),
        ..DrainConfig::default()
    };
    config.backoff = BackoffPolicy {
        base: Duration::from_millis(20),
        factor: 2,
        cap: Duration::from_millis(100),
    };
    config
}

fn http_config(server: &MockServer) -> MonitorConfig {
    let port = server.address().port();
    let mut config = fast(MonitorConfig::new("127.0.0.1", port));
    config.mode = ModePreference::Http;
    config
}

fn ws_config(port: u16) -> MonitorConfig {
    let mut config = fast(MonitorConfig::new("127.0.0.1", port));
    config.mode = ModePreference::Auto;
    config.password = Some(SecretString::from("s3cret"));
    config
}

/// Wait until `pred` holds for the published status.
async fn wait_for(monitor: &Monitor, pred: impl Fn(&Status) -> bool) -> Status {
    let mut rx = monitor.subscribe();
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if pred(&rx.borrow_and_update()) {
                return rx.borrow().clone();
            }
            rx.changed().await.unwrap();
        }
    })
    .await
    .expect("status condition not reached")
}

async fn wait_for_command(device: &Running, command: &str) {
    for _ in 0..200 {
        if device.commands.lock().unwrap().iter().any(|c| c == command) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("device never received {command}");
}

// ── Fake device ─────────────────────────────────────────────────────

#[derive(Clone, Default)]
struct Device {
    status_body: &'static str,
    greeting: Vec<&'static str>,
    /// `(command, reply)`: when `command` arrives, send `reply`.
    replies: Vec<(&'static str, &'static str)>,
    /// Close the first admin connection cleanly when this command arrives.
    close_on: Option<&'static str>,
    /// Stop reading and writing on the first admin connection when this
    /// command arrives, leaving the TCP connection open.
    silent_on: Option<&'static str>,
}

struct Running {
    port: u16,
    commands: Arc<Mutex<Vec<String>>>,
    admin_connections: Arc<AtomicUsize>,
}

impl Device {
    async fn start(self) -> Running {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let commands = Arc::new(Mutex::new(Vec::new()));
        let admin_connections = Arc::new(AtomicUsize::new(0));

        let running = Running {
            port,
            commands: Arc::clone(&commands),
            admin_connections: Arc::clone(&admin_connections),
        };

        tokio::spawn(async move {
            while let Ok((tcp, _)) = listener.accept().await {
                let device = self.clone();
                let commands = Arc::clone(&commands);
                let admin_connections = Arc::clone(&admin_connections);
                tokio::spawn(async move {
                    if is_upgrade(&tcp).await {
                        let nth = admin_connections.fetch_add(1, Ordering::SeqCst) + 1;
                        device.serve_admin(tcp, nth, commands).await;
                    } else {
                        serve_status(tcp, device.status_body).await;
                    }
                });
            }
        });

        running
    }

    async fn serve_admin(&self, tcp: TcpStream, nth: usize, commands: Arc<Mutex<Vec<String>>>) {
        let mut ws = accept_async(tcp).await.unwrap();
        for frame in &self.greeting {
            ws.send(Message::binary(frame.as_bytes().to_vec())).await.unwrap();
        }

        while let Some(Ok(msg)) = ws.next().await {
            let text = match msg {
                Message::Text(text) => text.as_str().to_owned(),
                Message::Close(_) => break,
                _ => continue,
            };
            commands.lock().unwrap().push(text.clone());

            if nth == 1 && self.close_on == Some(text.as_str()) {
                let _ = ws.close(None).await;
                break;
            }
            if nth == 1 && self.silent_on == Some(text.as_str()) {
                std::future::pending::<()>().await;
            }
            for (command, reply) in &self.replies {
                if text == *command {
                    let _ = ws.send(Message::binary(reply.as_bytes().to_vec())).await;
                }
            }
        }
    }
}

async fn is_upgrade(tcp: &TcpStream) -> bool {
    let mut buf = vec![0_u8; 4096];
    for _ in 0..100 {
        let n = tcp.peek(&mut buf).await.unwrap_or(0);
        let head = String::from_utf8_lossy(&buf[..n]).to_ascii_lowercase();
        if head.contains("\r\n\r\n") || n == 0 {
            return head.contains("upgrade: websocket");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}

async fn serve_status(mut tcp: TcpStream, body: &str) {
    let mut buf = vec![0_u8; 4096];
    let _ = tcp.read(&mut buf).await;
    let response = format!(
        "HTTP/1.1 200 OK\r\ncontent-type: text/plain\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = tcp.write_all(response.as_bytes()).await;
    let _ = tcp.shutdown().await;
}

const GREETING: [&str; 4] = [
    "MSG badp=0",
    "MSG load_cfg=%7B%22WSPR%22%3A%7B%22callsign%22%3A%22KC0XYZ%22%7D%2C%22rx_grid%22%3A%22EN34%22%7D",
    r#"MSG user_cb=[{"i":0,"e":"ft8","a":"127.0.0.1","g":"12%20decoded"},{"i":1,"a":"198.51.100.7"}]"#,
    "MSG cfg_loaded",
];

// ── HTTP mode ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_http_mode_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("users=3\nusers_max=10\nuptime=120\ngps=(45.0, -93.0)\n"),
        )
        .mount(&server)
        .await;

    let monitor = Monitor::new(http_config(&server)).unwrap();
    let snap = monitor.update().await.unwrap();

    assert!(snap.status.connected);
    assert_eq!(snap.status.mode, ConnectionMode::Http);
    assert_eq!(snap.status.users, Some(3));
    assert_eq!(snap.status.users_max, Some(10));
    assert_eq!(snap.status.uptime_seconds, Some(120));
    assert_eq!(snap.status.gps.latitude, Some(45.0));
    assert_eq!(snap.status.gps.longitude, Some(-93.0));

    // WebSocket-only data reads as absent, not zero.
    assert_eq!(snap.status.cpu_temp_c(), None);
    assert_eq!(snap.status.gps.satellites, None);
    assert_eq!(snap.status.reporter, None);
    assert!(snap.channel_slots.is_none());
    assert_eq!(snap.thermal_warning, None);
    assert_eq!(monitor.session_state().await, SessionState::Polling);

    monitor.shutdown().await;
}

#[tokio::test]
async fn test_http_partial_response_keeps_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_string("name=Rooftop\nusers=3\n"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_string("users=1\n"))
        .mount(&server)
        .await;

    let monitor = Monitor::new(http_config(&server)).unwrap();
    monitor.update().await.unwrap();
    let snap = monitor.update().await.unwrap();

    assert_eq!(snap.status.name.as_deref(), Some("Rooftop"));
    assert_eq!(snap.status.users, Some(1));
    monitor.shutdown().await;
}

#[tokio::test]
async fn test_http_connect_failure_counts() {
    // Bind then drop to get a port nothing listens on.
    let port = TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let mut config = fast(MonitorConfig::new("127.0.0.1", port));
    config.mode = ModePreference::Http;

    let monitor = Monitor::new(config).unwrap();
    let err = monitor.update().await.unwrap_err();
    assert!(matches!(err, CoreError::ConnectionFailed { .. }), "got {err:?}");
    assert_eq!(monitor.consecutive_failures().await, 1);

    let _ = monitor.update().await.unwrap_err();
    assert_eq!(monitor.consecutive_failures().await, 2);
    assert!(!monitor.is_connected());
}

// ── WebSocket mode ──────────────────────────────────────────────────

#[tokio::test]
async fn test_websocket_handshake_and_streaming() {
    let device = Device {
        status_body: "name=Rooftop\nsnr=24,19\nfixes_min=4\n",
        greeting: GREETING.to_vec(),
        replies: vec![
            (
                "SET GET_CONFIG",
                r#"MSG config_cb={"m":"6a:8c:58:18:61:f0","s":4242}"#,
            ),
            ("SET STATS_UPD ch=0", r#"MSG stats_cb={"cc":48.5,"cu":[10,30]}"#),
        ],
        ..Device::default()
    }
    .start()
    .await;

    let monitor = Monitor::new(ws_config(device.port)).unwrap();
    let snap = monitor.update().await.unwrap();

    assert_eq!(snap.status.mode, ConnectionMode::WebSocket);
    assert!(snap.status.connected);
    let reporter = snap.status.reporter.as_ref().unwrap();
    assert_eq!(reporter.callsign(), "KC0XYZ");
    assert_eq!(reporter.grid(), "EN34");
    assert_eq!(
        snap.mac_address.as_ref().map(|m| m.as_str()),
        Some("6A:8C:58:18:61:F0")
    );
    // Hybrid fetch fills what the socket never sends.
    assert_eq!(snap.status.name.as_deref(), Some("Rooftop"));
    assert_eq!(snap.status.snr_hf(), Some(19));

    let status = wait_for(&monitor, |s| s.cpu_temp_c() == Some(48.5)).await;
    assert_eq!(
        status.system.as_ref().and_then(|s| s.cpu_usage_avg()),
        Some(20.0)
    );
    assert_eq!(monitor.session_state().await, SessionState::Streaming);
    wait_for_command(&device, "SET GET_USERS").await;

    monitor.shutdown().await;
    assert!(!monitor.is_connected());
    assert!(matches!(
        monitor.update().await.unwrap_err(),
        CoreError::Disconnected
    ));

    let commands = device.commands.lock().unwrap().clone();
    assert_eq!(commands[0], "SET auth t=admin p=s3cret");
    assert_eq!(commands[1], "SET GET_CONFIG");
    assert!(commands.contains(&"SET STATS_UPD ch=0".to_owned()));
    assert!(!commands.contains(&"SET gps_update".to_owned()));
}

#[tokio::test]
async fn test_wrong_password_never_streams() {
    let device = Device {
        greeting: vec!["MSG badp=1", "MSG cfg_loaded"],
        ..Device::default()
    }
    .start()
    .await;

    let monitor = Monitor::new(ws_config(device.port)).unwrap();
    let err = monitor.update().await.unwrap_err();
    assert!(err.is_auth_failure(), "got {err:?}");
    assert_eq!(monitor.session_state().await, SessionState::Idle);
    assert!(!monitor.is_connected());

    // Latched: no new connection with the same password.
    let err = monitor.update().await.unwrap_err();
    assert!(err.is_auth_failure());
    assert_eq!(device.admin_connections.load(Ordering::SeqCst), 1);

    // A new password clears the latch and tries again.
    monitor
        .set_password(Some(SecretString::from("other")))
        .await;
    let _ = monitor.update().await;
    assert_eq!(device.admin_connections.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_malformed_user_list_keeps_channels() {
    let device = Device {
        greeting: GREETING.to_vec(),
        replies: vec![
            ("SET GET_USERS", r#"MSG user_cb=[{"i":0,"#),
            ("SET GET_USERS", r#"MSG stats_cb={"cc":51.0}"#),
        ],
        ..Device::default()
    }
    .start()
    .await;

    let monitor = Monitor::new(ws_config(device.port)).unwrap();
    monitor.update().await.unwrap();

    // The stats frame follows the malformed one, so once it lands the
    // malformed frame has been processed.
    let status = wait_for(&monitor, |s| s.cpu_temp_c() == Some(51.0)).await;
    let channels = status.channels.as_ref().unwrap();
    assert_eq!(channels.len(), 2);
    assert_eq!(channels[0].decoded_count, 12);
    assert!(monitor.is_connected());

    let snap = monitor.snapshot();
    let slots = snap.channel_slots.unwrap();
    assert_eq!(slots.len(), 12);
    assert_eq!(snap.status.channel_summary().unwrap().ft8, 1);

    monitor.shutdown().await;
}

#[tokio::test]
async fn test_reconnects_after_device_closes() {
    let device = Device {
        greeting: GREETING.to_vec(),
        close_on: Some("SET STATS_UPD ch=0"),
        ..Device::default()
    }
    .start()
    .await;

    let monitor = Monitor::new(ws_config(device.port)).unwrap();
    monitor.update().await.unwrap();
    wait_for(&monitor, |s| !s.connected).await;

    // The drop is not an error for the tick: it backs off and reconnects.
    let snap = monitor.update().await.unwrap();
    assert!(snap.status.connected);
    assert_eq!(device.admin_connections.load(Ordering::SeqCst), 2);
    assert_eq!(monitor.consecutive_failures().await, 0);

    monitor.shutdown().await;
}

#[tokio::test]
async fn test_silent_device_is_detected_and_replaced() {
    let device = Device {
        greeting: GREETING.to_vec(),
        silent_on: Some("SET STATS_UPD ch=0"),
        ..Device::default()
    }
    .start()
    .await;

    let mut config = ws_config(device.port);
    config.timeouts.ping_interval = Duration::from_millis(50);
    config.timeouts.ping_timeout = Duration::from_millis(100);

    let monitor = Monitor::new(config).unwrap();
    monitor.update().await.unwrap();
    wait_for_command(&device, "SET STATS_UPD ch=0").await;

    // No close frame ever arrives; the missing pongs give it away.
    wait_for(&monitor, |s| !s.connected).await;

    let snap = monitor.update().await.unwrap();
    assert!(snap.status.connected);
    assert_eq!(device.admin_connections.load(Ordering::SeqCst), 2);

    monitor.shutdown().await;
}

#[tokio::test]
async fn test_quiet_device_answering_pings_stays_connected() {
    let device = Device {
        greeting: GREETING.to_vec(),
        ..Device::default()
    }
    .start()
    .await;

    let mut config = ws_config(device.port);
    config.timeouts.ping_interval = Duration::from_millis(50);
    config.timeouts.ping_timeout = Duration::from_millis(100);

    let monitor = Monitor::new(config).unwrap();
    monitor.update().await.unwrap();

    // Several idle windows pass with no data frames, only pongs.
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(monitor.is_connected());
    assert_eq!(device.admin_connections.load(Ordering::SeqCst), 1);

    monitor.shutdown().await;
}

#[tokio::test]
async fn test_observer_failure_does_not_drop_connection() {
    let device = Device {
        greeting: GREETING.to_vec(),
        replies: vec![("SET STATS_UPD ch=0", r#"MSG stats_cb={"cc":47.0}"#)],
        ..Device::default()
    }
    .start()
    .await;

    let monitor = Monitor::new(ws_config(device.port)).unwrap();
    monitor.add_observer(Arc::new(|_: &Status| -> Result<(), web888_core::ObserverError> {
        Err("bridge offline".into())
    }));

    monitor.update().await.unwrap();
    wait_for(&monitor, |s| s.cpu_temp_c() == Some(47.0)).await;
    assert!(monitor.is_connected());

    monitor.shutdown().await;
}
