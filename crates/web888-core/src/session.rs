// ── Connection session ──
//
// One live connection to the device, in either mode:
//
//   Idle → Connecting → Polling                                  (HTTP)
//   Idle → Connecting → Authenticating → Draining → Streaming    (WebSocket)
//   any  → Closed
//
// Background tasks run under a child `CancellationToken`. Closing cancels
// both tasks, awaits both, and only then releases the socket.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use strum::Display;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use web888_api::{
    AdminCommand, AdminReader, AdminSocket, AdminWriter, DeviceAddress, StatusClient,
    connection_nonce, parse_frame,
};

use crate::config::MonitorConfig;
use crate::error::CoreError;
use crate::merge;
use crate::model::ConnectionMode;
use crate::store::StatusStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SessionState {
    Idle,
    Connecting,
    /// HTTP mode steady state.
    Polling,
    Authenticating,
    Draining,
    /// WebSocket mode steady state.
    Streaming,
    Closed,
}

enum Tasks {
    None,
    Http(JoinHandle<()>),
    WebSocket {
        receive: JoinHandle<AdminReader>,
        poll: JoinHandle<AdminWriter>,
    },
}

/// Shared by the background tasks.
#[derive(Clone)]
struct Ctx {
    store: Arc<StatusStore>,
    http: StatusClient,
    request_timeout: Duration,
    cancel: CancellationToken,
}

impl Ctx {
    /// Cancellable sleep. `false` if cancelled.
    async fn pause(&self, period: Duration) -> bool {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => false,
            () = tokio::time::sleep(period) => true,
        }
    }

    /// One `/status` fetch under the request cap, merged on success.
    async fn fetch_status(&self) -> Result<(), CoreError> {
        let report = tokio::time::timeout(self.request_timeout, self.http.fetch())
            .await
            .map_err(|_| CoreError::Timeout {
                timeout_secs: self.request_timeout.as_secs(),
            })??;
        self.store.apply(|status| merge::apply_report(status, report));
        Ok(())
    }
}

pub struct Session {
    mode: ConnectionMode,
    state: watch::Sender<SessionState>,
    ctx: Ctx,
    tasks: Tasks,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("mode", &self.mode)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Connect and run the mode's handshake, then start the background
    /// tasks. Callers bound the whole call with the connect timeout; if the
    /// future is dropped early nothing has been spawned yet.
    pub async fn open(
        config: &MonitorConfig,
        http: StatusClient,
        store: Arc<StatusStore>,
        parent: &CancellationToken,
    ) -> Result<Self, CoreError> {
        let mode = config.connection_mode();
        let (state, _) = watch::channel(SessionState::Idle);
        let mut session = Self {
            mode,
            state,
            ctx: Ctx {
                store,
                http,
                request_timeout: config.timeouts.http_request,
                cancel: parent.child_token(),
            },
            tasks: Tasks::None,
        };

        session.transition(SessionState::Connecting);
        let result = match mode {
            ConnectionMode::Http => session.start_polling(config).await,
            ConnectionMode::WebSocket => session.start_streaming(config).await,
        };
        if let Err(e) = result {
            session.transition(SessionState::Closed);
            session.ctx.store.set_connected(false);
            return Err(e);
        }
        Ok(session)
    }

    pub fn mode(&self) -> ConnectionMode {
        self.mode
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// The transport still looks alive.
    pub fn is_connected(&self) -> bool {
        self.state() != SessionState::Closed && self.ctx.store.is_connected()
    }

    fn transition(&self, next: SessionState) {
        let prev = self.state.send_replace(next);
        if prev != next {
            debug!(from = %prev, to = %next, "session state");
        }
    }

    // ── HTTP ─────────────────────────────────────────────────────

    async fn start_polling(&mut self, config: &MonitorConfig) -> Result<(), CoreError> {
        self.ctx.fetch_status().await?;
        self.ctx.store.set_connected(true);
        self.transition(SessionState::Polling);

        let ctx = self.ctx.clone();
        self.tasks = Tasks::Http(tokio::spawn(http_poll_task(ctx, config.poll_interval)));
        Ok(())
    }

    /// Scheduler-driven fetch in HTTP mode. Any failure clears the
    /// connected flag for the supervisor to see; only a timeout is also
    /// returned as an error.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        match self.ctx.fetch_status().await {
            Ok(()) => {
                self.ctx.store.set_connected(true);
                Ok(())
            }
            Err(e @ CoreError::Timeout { .. }) => {
                self.ctx.store.set_connected(false);
                Err(e)
            }
            Err(e) => {
                warn!(error = %e, "status fetch failed");
                self.ctx.store.set_connected(false);
                Ok(())
            }
        }
    }

    // ── WebSocket ────────────────────────────────────────────────

    async fn start_streaming(&mut self, config: &MonitorConfig) -> Result<(), CoreError> {
        let address = DeviceAddress::new(&config.host, config.port);
        let mut socket = AdminSocket::connect(&address, connection_nonce()).await?;

        self.transition(SessionState::Authenticating);
        let drained = socket
            .authenticate_and_drain(config.password.as_ref(), &config.drain)
            .await;
        let outcome = match drained {
            Ok(outcome) => outcome,
            Err(e) => {
                socket.close().await;
                return Err(e.into());
            }
        };

        self.transition(SessionState::Draining);
        let mut messages = outcome.messages;
        match socket.request_identity(&config.drain).await {
            Ok(seen) => messages.extend(seen),
            Err(e) => {
                socket.close().await;
                return Err(e.into());
            }
        }
        let store = &self.ctx.store;
        let merged = messages
            .into_iter()
            .filter_map(|m| store.apply(|status| merge::apply_message(status, m)).then_some(()))
            .count();
        info!(
            merged,
            completed = outcome.completed,
            "admin handshake finished"
        );

        self.ctx.store.set_connected(true);
        self.transition(SessionState::Streaming);

        if let Err(e) = self.ctx.fetch_status().await {
            warn!(error = %e, "initial status fetch failed");
        }

        let (writer, reader) = socket.into_split();
        let idle = config.timeouts.ping_interval + config.timeouts.ping_timeout;
        let receive = tokio::spawn(receive_task(self.ctx.clone(), reader, idle));
        let poll = tokio::spawn(ws_poll_task(
            self.ctx.clone(),
            writer,
            PollPlan::from(config),
        ));
        self.tasks = Tasks::WebSocket { receive, poll };
        Ok(())
    }

    // ── Close ────────────────────────────────────────────────────

    /// Cancel both tasks, await both, then release the socket.
    pub async fn close(mut self) {
        self.ctx.cancel.cancel();

        match std::mem::replace(&mut self.tasks, Tasks::None) {
            Tasks::None => {}
            Tasks::Http(handle) => {
                let _ = handle.await;
            }
            Tasks::WebSocket { receive, poll } => {
                let (reader, writer) = tokio::join!(receive, poll);
                if let Ok(mut writer) = writer {
                    let _ = writer.close().await;
                }
                drop(reader);
            }
        }

        self.ctx.store.set_connected(false);
        self.transition(SessionState::Closed);
        debug!(mode = %self.mode, "session closed");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.ctx.cancel.cancel();
    }
}

// ── Background tasks ─────────────────────────────────────────────────

async fn http_poll_task(ctx: Ctx, period: Duration) {
    while ctx.pause(period).await {
        let result = tokio::select! {
            biased;
            () = ctx.cancel.cancelled() => break,
            r = ctx.fetch_status() => r,
        };
        match result {
            Ok(()) => ctx.store.set_connected(true),
            Err(e) => {
                warn!(error = %e, "status poll failed");
                ctx.store.set_connected(false);
            }
        }
    }
    debug!("http poll task stopped");
}

/// Requests sent each WebSocket poll cycle.
#[derive(Debug, Clone)]
struct PollPlan {
    period: Duration,
    command_pause: Duration,
    ping_interval: Duration,
    commands: Vec<AdminCommand>,
}

impl From<&MonitorConfig> for PollPlan {
    fn from(config: &MonitorConfig) -> Self {
        let mut commands = vec![AdminCommand::StatsUpdate { channel: 0 }];
        if config.enable_channels {
            commands.push(AdminCommand::GetUsers);
        }
        if config.enable_satellites {
            commands.push(AdminCommand::GpsUpdate);
        }
        Self {
            period: config.poll_interval,
            command_pause: config.timeouts.command_pause,
            ping_interval: config.timeouts.ping_interval,
            commands,
        }
    }
}

/// Sleep until `until`, pinging the device on `pings`. `false` if
/// cancelled or a ping could not be written.
async fn keep_alive_until(
    ctx: &Ctx,
    writer: &mut AdminWriter,
    pings: &mut Interval,
    until: Instant,
) -> bool {
    loop {
        tokio::select! {
            biased;
            () = ctx.cancel.cancelled() => return false,
            () = tokio::time::sleep_until(until) => return true,
            _ = pings.tick() => {
                let sent = tokio::select! {
                    biased;
                    () = ctx.cancel.cancelled() => return false,
                    r = writer.ping() => r,
                };
                if let Err(e) = sent {
                    warn!(error = %e, "keep-alive ping failed");
                    ctx.store.set_connected(false);
                    return false;
                }
            }
        }
    }
}

async fn ws_poll_task(ctx: Ctx, mut writer: AdminWriter, plan: PollPlan) -> AdminWriter {
    let mut pings = tokio::time::interval_at(
        Instant::now() + plan.ping_interval,
        plan.ping_interval,
    );
    pings.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut first = true;
    'cycle: loop {
        let next_cycle = Instant::now() + plan.period;
        for (i, command) in plan.commands.iter().enumerate() {
            if i > 0 && !ctx.pause(plan.command_pause).await {
                break 'cycle;
            }
            let sent = tokio::select! {
                biased;
                () = ctx.cancel.cancelled() => break 'cycle,
                r = writer.send(command) => r,
            };
            if let Err(e) = sent {
                warn!(error = %e, command = command.verb(), "admin poll failed");
                ctx.store.set_connected(false);
                break 'cycle;
            }
        }

        // The initial hybrid fetch already ran during the handshake.
        if !first {
            let fetched = tokio::select! {
                biased;
                () = ctx.cancel.cancelled() => break 'cycle,
                r = ctx.fetch_status() => r,
            };
            if let Err(e) = fetched {
                warn!(error = %e, "hybrid status fetch failed");
            }
        }
        first = false;

        if !keep_alive_until(&ctx, &mut writer, &mut pings, next_cycle).await {
            break;
        }
    }
    debug!("admin poll task stopped");
    writer
}

async fn receive_task(ctx: Ctx, mut reader: AdminReader, idle: Duration) -> AdminReader {
    loop {
        let next = tokio::select! {
            biased;
            () = ctx.cancel.cancelled() => break,
            r = reader.recv_alive(idle) => r,
        };
        match next {
            Ok(Some(frame)) => match parse_frame(&frame) {
                Ok(Some(message)) => {
                    ctx.store
                        .apply(|status| merge::apply_message(status, message));
                }
                Ok(None) => {}
                Err(e) => debug!(error = %e, "dropping malformed admin frame"),
            },
            Ok(None) => {
                info!("admin socket closed by device");
                ctx.store.set_connected(false);
                break;
            }
            Err(e) => {
                warn!(error = %e, "admin socket closed abruptly");
                ctx.store.set_connected(false);
                break;
            }
        }
    }
    debug!("admin receive task stopped");
    reader
}
