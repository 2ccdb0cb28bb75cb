//! Editor connection management
//!
//! One WebSocket session to the editor plugin, opened lazily and reopened
//! after the editor goes away. Every command waits on its own oneshot slot in
//! the pending map; the reader task resolves slots by `commandId`.

use futures::{SinkExt, Stream, StreamExt};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, info, warn};

use godot_core::{Error, GodotSettings, Result};

use crate::protocol::{GodotCommand, GodotResponse};

type PendingMap = Arc<Mutex<HashMap<String, oneshot::Sender<Result<Value>>>>>;

/// Configuration for the editor connection
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Editor plugin endpoint
    pub url: String,
    /// How long a command waits for its reply
    pub command_timeout: Duration,
    /// Bound on a single connection attempt
    pub connect_timeout: Duration,
    /// Connection attempts before giving up
    pub max_retries: u32,
    /// Pause between connection attempts
    pub retry_delay: Duration,
    /// `Sec-WebSocket-Protocol` to request
    pub subprotocol: Option<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::from(&GodotSettings::default())
    }
}

impl From<&GodotSettings> for ConnectionConfig {
    fn from(settings: &GodotSettings) -> Self {
        Self {
            url: settings.url.clone(),
            command_timeout: settings.command_timeout(),
            connect_timeout: settings.connect_timeout(),
            max_retries: settings.max_retries,
            retry_delay: settings.retry_delay(),
            subprotocol: settings.subprotocol().map(String::from),
        }
    }
}

/// Live socket plus the tasks that pump it
struct Session {
    outbound: mpsc::UnboundedSender<Message>,
    alive: Arc<AtomicBool>,
    writer: JoinHandle<()>,
    reader: JoinHandle<()>,
}

impl Session {
    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    async fn close(mut self) {
        self.alive.store(false, Ordering::SeqCst);
        if self.outbound.send(Message::Close(None)).is_ok() {
            let _ = tokio::time::timeout(Duration::from_secs(1), &mut self.writer).await;
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}

/// Connection to the Godot editor plugin
pub struct GodotConnection {
    config: ConnectionConfig,
    session: Mutex<Option<Session>>,
    /// Serializes connect attempts; held across retries and sleeps
    connecting: Mutex<()>,
    /// Bumped by `disconnect` to abandon connects already in progress
    cancel: watch::Sender<u64>,
    pending: PendingMap,
    next_id: AtomicU64,
}

impl GodotConnection {
    pub fn new(config: ConnectionConfig) -> Self {
        let (cancel, _) = watch::channel(0);
        Self {
            config,
            session: Mutex::new(None),
            connecting: Mutex::new(()),
            cancel,
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.session.lock().await.as_ref().is_some_and(Session::is_alive)
    }

    /// Number of commands still waiting for a reply
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Open the session if it is not already open.
    ///
    /// Concurrent callers serialize on the connect lock, so at most one
    /// socket is opened. A `disconnect` while this is running makes it fail
    /// with `Error::ConnectionClosed`.
    pub async fn connect(&self) -> Result<()> {
        let mut cancelled = self.cancel.subscribe();

        let _connecting = tokio::select! {
            guard = self.connecting.lock() => guard,
            _ = cancelled.changed() => return Err(Error::ConnectionClosed),
        };

        {
            let mut session = self.session.lock().await;
            if session.as_ref().is_some_and(Session::is_alive) {
                debug!("Reusing existing Godot connection");
                return Ok(());
            }
            if let Some(stale) = session.take() {
                warn!("Godot connection lost, reconnecting...");
                fail_pending(&self.pending).await;
                drop(stale);
            }
        }

        let attempts = self.config.max_retries.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            debug!(attempt, url = %self.config.url, "Connecting to Godot");

            let opened = tokio::select! {
                opened = self.open_session() => opened,
                _ = cancelled.changed() => {
                    info!("Connect cancelled by disconnect");
                    return Err(Error::ConnectionClosed);
                }
            };

            match opened {
                Ok(opened) => {
                    let mut session = self.session.lock().await;
                    // disconnect() bumps the counter before taking the session
                    if cancelled.has_changed().unwrap_or(true) {
                        drop(session);
                        opened.close().await;
                        return Err(Error::ConnectionClosed);
                    }
                    info!(url = %self.config.url, "Connected to Godot editor");
                    *session = Some(opened);
                    return Ok(());
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Connection attempt failed");
                    last_error = Some(e);

                    if attempt < attempts {
                        tokio::select! {
                            _ = tokio::time::sleep(self.config.retry_delay) => {}
                            _ = cancelled.changed() => return Err(Error::ConnectionClosed),
                        }
                    }
                }
            }
        }

        let reason = match last_error {
            Some(Error::Connection(msg)) => msg,
            Some(other) => other.to_string(),
            None => "no attempt made".to_string(),
        };
        Err(Error::Connection(format!(
            "Failed to connect to Godot: {} ({}, {} attempts)",
            reason, self.config.url, attempts
        )))
    }

    /// Send a command and wait for the editor's reply.
    ///
    /// Connects first when no session is open.
    pub async fn send_command(&self, command: &str, params: Value) -> Result<Value> {
        if !self.is_connected().await {
            self.connect().await?;
        }

        let command_id = format!("cmd_{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        let payload = serde_json::to_string(&GodotCommand::new(command, params, &command_id))?;

        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(command_id.clone(), tx);

        let sent = {
            let session = self.session.lock().await;
            session
                .as_ref()
                .filter(|s| s.is_alive())
                .is_some_and(|s| s.outbound.send(Message::Text(payload.into())).is_ok())
        };
        if !sent {
            self.pending.lock().await.remove(&command_id);
            return Err(Error::NotConnected);
        }

        debug!(command, command_id = %command_id, "Sent command to Godot");

        match tokio::time::timeout(self.config.command_timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::ConnectionClosed),
            Err(_) => {
                self.pending.lock().await.remove(&command_id);
                warn!(command, command_id = %command_id, "Command timed out");
                Err(Error::Timeout(command.to_string()))
            }
        }
    }

    /// Close the session, abandon any connect in progress and fail
    /// everything still waiting
    pub async fn disconnect(&self) {
        self.cancel.send_modify(|generation| *generation += 1);
        let session = self.session.lock().await.take();
        if let Some(session) = session {
            session.close().await;
            info!("Disconnected from Godot editor");
        }
        fail_pending(&self.pending).await;
    }

    async fn open_session(&self) -> Result<Session> {
        let mut request = self
            .config
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| Error::connection(e.to_string()))?;

        if let Some(protocol) = &self.config.subprotocol {
            let value = HeaderValue::from_str(protocol)
                .map_err(|e| Error::connection(format!("Invalid subprotocol: {}", e)))?;
            request.headers_mut().insert(SEC_WEBSOCKET_PROTOCOL, value);
        }

        let (stream, _) = tokio::time::timeout(self.config.connect_timeout, connect_async(request))
            .await
            .map_err(|_| Error::connection("Connection timeout"))?
            .map_err(|e| Error::connection(e.to_string()))?;

        let (mut sink, source) = stream.split();
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<Message>();
        let alive = Arc::new(AtomicBool::new(true));

        let writer_alive = alive.clone();
        let writer = tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                let closing = matches!(message, Message::Close(_));
                if let Err(e) = sink.send(message).await {
                    warn!(error = %e, "Failed to write to Godot");
                    writer_alive.store(false, Ordering::SeqCst);
                    break;
                }
                if closing {
                    break;
                }
            }
        });

        let reader = tokio::spawn(read_loop(source, self.pending.clone(), alive.clone()));

        Ok(Session {
            outbound,
            alive,
            writer,
            reader,
        })
    }
}

async fn read_loop<S>(mut source: S, pending: PendingMap, alive: Arc<AtomicBool>)
where
    S: Stream<Item = std::result::Result<Message, WsError>> + Unpin,
{
    while let Some(message) = source.next().await {
        match message {
            Ok(Message::Text(text)) => dispatch_reply(&pending, text.as_str()).await,
            Ok(Message::Binary(data)) => match std::str::from_utf8(&data) {
                Ok(text) => dispatch_reply(&pending, text).await,
                Err(_) => warn!(len = data.len(), "Ignoring non-UTF-8 frame from Godot"),
            },
            Ok(Message::Close(frame)) => {
                info!(?frame, "Godot closed the connection");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "Godot connection error");
                break;
            }
        }
    }

    alive.store(false, Ordering::SeqCst);
    fail_pending(&pending).await;
}

async fn dispatch_reply(pending: &PendingMap, text: &str) {
    let response: GodotResponse = match serde_json::from_str(text) {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "Ignoring malformed message from Godot");
            return;
        }
    };

    let Some(command_id) = response.command_id.clone() else {
        debug!("Ignoring Godot message without commandId");
        return;
    };

    let waiter = pending.lock().await.remove(&command_id);
    match waiter {
        Some(tx) => {
            let _ = tx.send(response.into_result());
        }
        None => debug!(command_id = %command_id, "No pending command for reply"),
    }
}

async fn fail_pending(pending: &PendingMap) {
    let drained: Vec<_> = pending.lock().await.drain().collect();
    if !drained.is_empty() {
        warn!(count = drained.len(), "Failing pending commands: connection closed");
    }
    for (_, tx) in drained {
        let _ = tx.send(Err(Error::ConnectionClosed));
    }
}
