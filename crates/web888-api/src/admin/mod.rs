// Admin WebSocket client.
//
// Connects to `ws://host:port/kiwi/{nonce}/admin`, authenticates, drains
// the config burst the device pushes after auth, and then splits into a
// writer half (commands) and a reader half (frames) so a session can run
// its poll loop and receive loop as separate tasks.

mod command;
pub mod lenient;
mod messages;
pub mod models;

use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use secrecy::SecretString;
use tokio::net::TcpStream;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use url::Url;

pub use command::AdminCommand;
pub use messages::{AdminMessage, FRAME_PREFIX, parse_frame, percent_decode};
pub use models::{
    AdminConfig, GeneralConfig, Identity, IpAddressSection, PositionUpdate, ReporterSection,
    SatelliteEntry, SatelliteUpdate, StatsBlock, UserEntry,
};

use crate::error::Error;
use crate::transport::DeviceAddress;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ── Handshake budgets ────────────────────────────────────────────────

/// Bounds for the post-auth drain and the identity request.
#[derive(Debug, Clone)]
pub struct DrainConfig {
    /// Per-read cap while draining.
    pub frame_timeout: Duration,
    /// Maximum frames read during the drain.
    pub max_frames: usize,
    /// Wall-clock cap for the whole drain.
    pub overall_timeout: Duration,
    /// Maximum frames read while waiting for `config_cb`.
    pub identity_frames: usize,
}

impl Default for DrainConfig {
    fn default() -> Self {
        Self {
            frame_timeout: Duration::from_millis(300),
            max_frames: 20,
            overall_timeout: Duration::from_secs(5),
            identity_frames: 10,
        }
    }
}

/// Result of [`AdminSocket::authenticate_and_drain`].
#[derive(Debug, Default)]
pub struct DrainOutcome {
    /// Every parsed message seen during the drain, in arrival order.
    pub messages: Vec<AdminMessage>,
    /// `true` if the `cfg_loaded` marker arrived before a budget ran out.
    pub completed: bool,
    /// `badp` code of the first acknowledgement, if any arrived.
    pub auth_code: Option<i64>,
}

// ── Socket ───────────────────────────────────────────────────────────

/// A connected admin socket, before it is split for streaming.
pub struct AdminSocket {
    writer: AdminWriter,
    reader: AdminReader,
    url: Url,
}

impl std::fmt::Debug for AdminSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSocket").field("url", &self.url.as_str()).finish_non_exhaustive()
    }
}

impl AdminSocket {
    /// Open the admin socket using a per-connection nonce.
    pub async fn connect(address: &DeviceAddress, nonce: u64) -> Result<Self, Error> {
        let url = address.admin_url(nonce)?;
        info!(url = %url, "connecting admin WebSocket");

        let (ws, _response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| Error::WebSocketConnect(e.to_string()))?;
        let (sink, stream) = ws.split();

        Ok(Self {
            writer: AdminWriter { sink },
            reader: AdminReader { stream },
            url,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub async fn send(&mut self, command: &AdminCommand) -> Result<(), Error> {
        self.writer.send(command).await
    }

    /// Send the credential (if any), then drain the config burst.
    ///
    /// Only the first `badp` acknowledgement counts: non-zero (or
    /// unparseable) fails with [`Error::Authentication`]. A read timeout or
    /// an exhausted budget ends the drain normally. If a password was sent
    /// and no acknowledgement arrived at all, that is an auth failure too.
    pub async fn authenticate_and_drain(
        &mut self,
        password: Option<&SecretString>,
        budget: &DrainConfig,
    ) -> Result<DrainOutcome, Error> {
        if let Some(password) = password {
            debug!("sending admin authentication");
            self.send(&AdminCommand::Auth {
                password: password.clone(),
            })
            .await?;
        }

        let mut outcome = DrainOutcome::default();
        let mut acknowledged = false;
        let deadline = Instant::now() + budget.overall_timeout;

        for _ in 0..budget.max_frames {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!("config drain hit its time cap, continuing with partial config");
                break;
            }

            let Some(message) = self
                .reader
                .recv_message_within(budget.frame_timeout.min(remaining))
                .await?
            else {
                // Read timeout: the device has nothing more to say.
                break;
            };

            match message {
                AdminMessage::AuthResult { code } if !acknowledged => {
                    acknowledged = true;
                    outcome.auth_code = code;
                    if code != Some(0) {
                        let _ = self.writer.close().await;
                        return Err(Error::Authentication {
                            message: format!(
                                "device rejected the admin password (badp={})",
                                code.map_or_else(|| "?".to_owned(), |c| c.to_string())
                            ),
                        });
                    }
                    debug!("admin authentication accepted");
                }
                AdminMessage::AuthResult { .. } => {}
                AdminMessage::ConfigLoaded => {
                    outcome.completed = true;
                    break;
                }
                other => outcome.messages.push(other),
            }
        }

        if password.is_some() && !acknowledged {
            let _ = self.writer.close().await;
            return Err(Error::Authentication {
                message: "no authentication acknowledgement received".into(),
            });
        }

        debug!(
            messages = outcome.messages.len(),
            completed = outcome.completed,
            "config drain finished"
        );
        Ok(outcome)
    }

    /// Send `SET GET_CONFIG` and wait (bounded) for the `config_cb` reply.
    ///
    /// Returns everything parsed while waiting; the identity message, if it
    /// arrived, is last. Running out of budget is not an error.
    pub async fn request_identity(
        &mut self,
        budget: &DrainConfig,
    ) -> Result<Vec<AdminMessage>, Error> {
        self.send(&AdminCommand::GetConfig).await?;

        let mut seen = Vec::new();
        for _ in 0..budget.identity_frames {
            match self.reader.recv_message_within(budget.frame_timeout).await? {
                Some(message @ AdminMessage::Identity(_)) => {
                    seen.push(message);
                    return Ok(seen);
                }
                Some(message) => seen.push(message),
                None => break,
            }
        }

        debug!("identity reply not received");
        Ok(seen)
    }

    /// Split for streaming: commands go through the writer, frames come
    /// from the reader.
    pub fn into_split(self) -> (AdminWriter, AdminReader) {
        (self.writer, self.reader)
    }

    /// Close without streaming (used when the handshake is abandoned).
    pub async fn close(mut self) {
        let _ = self.writer.close().await;
    }
}

// ── Writer half ──────────────────────────────────────────────────────

pub struct AdminWriter {
    sink: SplitSink<WsStream, Message>,
}

impl AdminWriter {
    pub async fn send(&mut self, command: &AdminCommand) -> Result<(), Error> {
        debug!("SET {}", command.verb());
        self.sink
            .send(Message::text(command.to_wire()))
            .await
            .map_err(|e| Error::WebSocketIo(e.to_string()))
    }

    /// Keep-alive ping. The reply is a pong the reader counts as traffic.
    pub async fn ping(&mut self) -> Result<(), Error> {
        self.sink
            .send(Message::Ping(Vec::new().into()))
            .await
            .map_err(|e| Error::WebSocketIo(e.to_string()))
    }

    /// Send a close frame and flush. Errors mean the peer is already gone.
    pub async fn close(&mut self) -> Result<(), Error> {
        self.sink
            .close()
            .await
            .map_err(|e| Error::WebSocketIo(e.to_string()))
    }
}

// ── Reader half ──────────────────────────────────────────────────────

pub struct AdminReader {
    stream: SplitStream<WsStream>,
}

impl AdminReader {
    /// Next data frame payload.
    ///
    /// `Ok(None)` is a clean close (close frame with a normal code).
    /// Anything else that ends the stream is an abrupt close, reported as
    /// [`Error::WebSocketClosed`] or [`Error::WebSocketIo`].
    pub async fn recv(&mut self) -> Result<Option<Vec<u8>>, Error> {
        self.next_frame(None).await
    }

    /// [`recv`](Self::recv) for a streaming session. Silence longer than
    /// `idle` (no frame of any kind, pongs included) is an abrupt close
    /// with code 1006.
    pub async fn recv_alive(&mut self, idle: Duration) -> Result<Option<Vec<u8>>, Error> {
        self.next_frame(Some(idle)).await
    }

    async fn next_frame(&mut self, idle: Option<Duration>) -> Result<Option<Vec<u8>>, Error> {
        use tokio_tungstenite::tungstenite::Error as WsError;

        loop {
            let next = match idle {
                None => self.stream.next().await,
                Some(limit) => match tokio::time::timeout(limit, self.stream.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        return Err(Error::WebSocketClosed {
                            code: 1006,
                            reason: format!("no traffic for {}ms", limit.as_millis()),
                        });
                    }
                },
            };
            let Some(next) = next else {
                return Err(Error::WebSocketClosed {
                    code: 1006,
                    reason: "stream ended without a close frame".into(),
                });
            };

            match next {
                Ok(Message::Text(text)) => return Ok(Some(text.as_bytes().to_vec())),
                Ok(Message::Binary(bytes)) => return Ok(Some(bytes.to_vec())),
                Ok(Message::Close(frame)) => {
                    return match frame {
                        None => Ok(None),
                        Some(f) if matches!(f.code, CloseCode::Normal | CloseCode::Away) => {
                            Ok(None)
                        }
                        Some(f) => Err(Error::WebSocketClosed {
                            code: u16::from(f.code),
                            reason: f.reason.as_str().to_owned(),
                        }),
                    };
                }
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {}
                Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => return Ok(None),
                Err(e) => return Err(Error::WebSocketIo(e.to_string())),
            }
        }
    }

    /// Next parsed message within `limit`.
    ///
    /// `Ok(None)` means the read timed out. Non-`MSG` frames and payloads
    /// that fail to parse are skipped (logged at debug) while time remains.
    /// A clean close during a bounded read is an error: the caller still
    /// needed the socket.
    pub async fn recv_message_within(
        &mut self,
        limit: Duration,
    ) -> Result<Option<AdminMessage>, Error> {
        let deadline = Instant::now() + limit;
        loop {
            let frame = match tokio::time::timeout_at(deadline, self.recv()).await {
                Err(_) => return Ok(None),
                Ok(Ok(Some(frame))) => frame,
                Ok(Ok(None)) => {
                    return Err(Error::WebSocketClosed {
                        code: 1000,
                        reason: "closed by device".into(),
                    });
                }
                Ok(Err(e)) => return Err(e),
            };

            match parse_frame(&frame) {
                Ok(Some(message)) => return Ok(Some(message)),
                Ok(None) => {}
                Err(e) => debug!(error = %e, "skipping unparseable admin frame"),
            }
        }
    }
}
