// ── Monitor ──
//
// Scheduler-facing entry point. Each `update()` tick lets the supervisor
// decide whether the session must be rebuilt, waits out the backoff,
// connects under the connect timeout, refreshes HTTP-mode status, and
// returns a snapshot. WebSocket data arrives in the background between
// ticks.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use tokio::sync::{Mutex, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use web888_api::{DeviceAddress, StatusClient, TransportConfig};

use crate::config::MonitorConfig;
use crate::error::CoreError;
use crate::model::{ConnectionMode, Status};
use crate::session::{Session, SessionState};
use crate::snapshot::{Snapshot, SnapshotOptions};
use crate::store::{StatusObserver, StatusStore};
use crate::supervisor::ReconnectSupervisor;

/// Monitors one receiver. Cheaply cloneable.
#[derive(Clone)]
pub struct Monitor {
    inner: Arc<MonitorInner>,
}

struct MonitorInner {
    address: String,
    store: Arc<StatusStore>,
    http: StatusClient,
    options: SnapshotOptions,
    /// Parent of every session's token.
    shutdown: CancellationToken,
    state: Mutex<MonitorState>,
}

struct MonitorState {
    config: MonitorConfig,
    session: Option<Session>,
    supervisor: ReconnectSupervisor,
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("address", &self.inner.address)
            .field("mode", &self.inner.store.mode())
            .finish_non_exhaustive()
    }
}

impl Monitor {
    /// Build a monitor. Does not connect; the first [`update`](Self::update)
    /// does.
    pub fn new(config: MonitorConfig) -> Result<Self, CoreError> {
        let device = DeviceAddress::new(&config.host, config.port);
        let transport = TransportConfig {
            timeout: config.timeouts.http_request,
            connect_timeout: config.timeouts.connect,
            ..TransportConfig::default()
        };
        let http = StatusClient::new(&device, &transport)?;
        let store = Arc::new(StatusStore::new(config.connection_mode()));

        Ok(Self {
            inner: Arc::new(MonitorInner {
                address: device.to_string(),
                store,
                http,
                options: SnapshotOptions::from(&config),
                shutdown: CancellationToken::new(),
                state: Mutex::new(MonitorState {
                    supervisor: ReconnectSupervisor::new(config.backoff),
                    session: None,
                    config,
                }),
            }),
        })
    }

    /// Connect, take one snapshot, close.
    ///
    /// In WebSocket mode `settle` gives the first poll cycle time to answer
    /// before the snapshot is taken.
    pub async fn oneshot(config: MonitorConfig, settle: Duration) -> Result<Snapshot, CoreError> {
        let monitor = Self::new(config)?;
        let mut result = monitor.update().await;
        if result.is_ok() && monitor.mode().is_websocket() && !settle.is_zero() {
            tokio::time::sleep(settle).await;
            result = Ok(monitor.snapshot());
        }
        monitor.shutdown().await;
        result
    }

    pub fn address(&self) -> &str {
        &self.inner.address
    }

    pub fn mode(&self) -> ConnectionMode {
        self.inner.store.mode()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.store.is_connected()
    }

    /// Current status by value.
    pub fn status(&self) -> Status {
        self.inner.store.snapshot()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::build(self.inner.store.snapshot(), &self.inner.options)
    }

    /// Every merged update, pushed.
    pub fn subscribe(&self) -> watch::Receiver<Status> {
        self.inner.store.subscribe()
    }

    pub fn add_observer(&self, observer: Arc<dyn StatusObserver>) {
        self.inner.store.add_observer(observer);
    }

    pub async fn session_state(&self) -> SessionState {
        self.inner
            .state
            .lock()
            .await
            .session
            .as_ref()
            .map_or(SessionState::Idle, Session::state)
    }

    pub async fn consecutive_failures(&self) -> u32 {
        self.inner.state.lock().await.supervisor.failures()
    }

    // ── Scheduler tick ───────────────────────────────────────────

    /// One scheduler tick.
    ///
    /// Fails on a connect failure or timeout, on an HTTP refresh timeout,
    /// and while a rejected password is installed. A transport drop seen
    /// between ticks is not itself an error: this tick reconnects.
    pub async fn update(&self) -> Result<Snapshot, CoreError> {
        if self.inner.shutdown.is_cancelled() {
            return Err(CoreError::Disconnected);
        }

        let mut state = self.inner.state.lock().await;
        state.supervisor.check_credentials()?;

        let live = state.session.as_ref().is_some_and(Session::is_connected);
        if state.supervisor.observe(live) {
            if let Some(stale) = state.session.take() {
                stale.close().await;
            }
        }

        if state.supervisor.needs_connect() {
            self.connect_locked(&mut state).await?;
        } else if let Some(session) = state.session.as_ref() {
            if session.mode() == ConnectionMode::Http {
                session.refresh().await?;
            }
        }
        drop(state);

        Ok(self.snapshot())
    }

    async fn connect_locked(&self, state: &mut MonitorState) -> Result<(), CoreError> {
        if let Some(stale) = state.session.take() {
            stale.close().await;
        }

        let delay = state.supervisor.backoff();
        if !delay.is_zero() {
            debug!(
                delay_secs = delay.as_secs(),
                attempt = state.supervisor.failures(),
                address = %self.inner.address,
                "backing off before reconnect"
            );
            tokio::select! {
                biased;
                () = self.inner.shutdown.cancelled() => return Err(CoreError::Disconnected),
                () = tokio::time::sleep(delay) => {}
            }
        }

        let cap = state.config.timeouts.connect;
        debug!(
            address = %self.inner.address,
            mode = %state.config.connection_mode(),
            "connecting"
        );
        let open = Session::open(
            &state.config,
            self.inner.http.clone(),
            Arc::clone(&self.inner.store),
            &self.inner.shutdown,
        );
        let result = match tokio::time::timeout(cap, open).await {
            Ok(result) => result,
            Err(_) => Err(CoreError::Timeout {
                timeout_secs: cap.as_secs(),
            }),
        };

        match result {
            Ok(session) => {
                state.session = Some(session);
                state.supervisor.record_success(&self.inner.address);
                Ok(())
            }
            Err(e) => {
                self.inner.store.set_connected(false);
                state.supervisor.record_failure(&e);
                Err(e)
            }
        }
    }

    // ── Credentials & lifecycle ──────────────────────────────────

    /// Install a new password (or none), dropping the current session and
    /// clearing an authentication latch. Under `auto` mode this may switch
    /// between HTTP and WebSocket.
    pub async fn set_password(&self, password: Option<SecretString>) {
        let mut state = self.inner.state.lock().await;
        if let Some(session) = state.session.take() {
            session.close().await;
        }
        state.config.password = password;
        let mode = state.config.connection_mode();
        self.inner.store.set_mode(mode);
        state.supervisor.reset_credentials();
        info!(address = %self.inner.address, %mode, "credentials updated");
    }

    /// Stop background work and close the session. Further ticks fail with
    /// [`CoreError::Disconnected`].
    pub async fn shutdown(&self) {
        self.inner.shutdown.cancel();
        let mut state = self.inner.state.lock().await;
        if let Some(session) = state.session.take() {
            session.close().await;
        }
        state.supervisor.mark_closed();
        debug!(address = %self.inner.address, "monitor shut down");
    }
}
