//! Realtime push channel with supervised auto-reconnect.
//!
//! Connects to the BrewCreator telemetry websocket (SignalR-style JSON
//! protocol): negotiate a connection token, open the socket, send the
//! protocol handshake, subscribe to the equipment-update topic, then keep
//! the connection alive with a 10-second ping task. Update notifications
//! trigger a fleet re-fetch delivered to the caller's callback. The
//! supervising loop never dies on its own — transport failures are logged
//! and followed by a fixed cooldown before reconnecting; only `stop()`
//! ends the session.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::client::BrewCreatorClient;
use crate::error::Error;
use crate::models::EquipmentPage;

/// Interval between client keepalive pings.
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(10);
/// Unconditional pause before reconnecting after a failure or close.
pub const RECONNECT_COOLDOWN: Duration = Duration::from_secs(60);

const PROTOCOL_HANDSHAKE: &str = r#"{"protocol":"json","version":1}"#;
const SUBSCRIBE_FRAME: &str = r#"{"arguments":["devicetwin"],"target":"SubscribeToUser","type":1}"#;
const KEEPALIVE_FRAME: &str = r#"{"type":6}"#;
const UPDATE_PREFIX: &str = r#"{"type":1"#;
/// SignalR appends a record separator to every frame.
const RECORD_SEPARATOR: char = '\u{1e}';

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Callback invoked with a fresh fleet page after each update notification.
pub type UpdateCallback =
    Arc<dyn Fn(EquipmentPage) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

struct SupervisedTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Handle to the realtime session.
///
/// Owns the supervising task's cancellation token and join handle;
/// `stop()` cancels and joins so no background activity outlives it.
pub struct RealtimeSession {
    client: Arc<BrewCreatorClient>,
    task: tokio::sync::Mutex<Option<SupervisedTask>>,
}

impl RealtimeSession {
    pub fn new(client: Arc<BrewCreatorClient>) -> Self {
        Self {
            client,
            task: tokio::sync::Mutex::new(None),
        }
    }

    /// Launch the supervising loop.
    ///
    /// Fails with [`Error::AlreadyRunning`] while a previous session task
    /// is still live. Returns as soon as the task is spawned -- the first
    /// connection attempt happens asynchronously.
    pub async fn start(&self, on_update: UpdateCallback) -> Result<(), Error> {
        let mut slot = self.task.lock().await;
        if let Some(task) = slot.as_ref() {
            if !task.handle.is_finished() {
                return Err(Error::AlreadyRunning);
            }
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(supervise(
            Arc::clone(&self.client),
            on_update,
            cancel.clone(),
        ));
        *slot = Some(SupervisedTask { cancel, handle });
        debug!("realtime session started");
        Ok(())
    }

    /// Cancel the supervising loop (and its keepalive task) and wait for
    /// both to unwind. Idempotent; never errors.
    pub async fn stop(&self) {
        let Some(task) = self.task.lock().await.take() else {
            return;
        };
        task.cancel.cancel();
        if let Err(err) = task.handle.await {
            if !err.is_cancelled() {
                warn!(error = %err, "realtime supervisor ended abnormally");
            }
        }
        debug!("realtime session stopped");
    }

    /// Whether a session task is currently live.
    pub async fn is_running(&self) -> bool {
        self.task
            .lock()
            .await
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished())
    }
}

// ── Supervising loop ─────────────────────────────────────────────────

async fn supervise(client: Arc<BrewCreatorClient>, on_update: UpdateCallback, cancel: CancellationToken) {
    let mut keepalive: Option<SupervisedTask> = None;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = connect_and_listen(&client, &on_update, &cancel, &mut keepalive) => {
                match result {
                    // Connection ended after its own cooldown (server
                    // close or transport error) -- reconnect.
                    Ok(()) => info!("realtime connection ended, reconnecting"),
                    Err(err) => {
                        error!(error = %err, "realtime connection failed");
                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => break,
                            _ = tokio::time::sleep(RECONNECT_COOLDOWN) => {}
                        }
                    }
                }
            }
        }
    }

    // Shutdown guarantee: no keepalive sender survives the supervisor.
    if let Some(task) = keepalive.take() {
        task.cancel.cancel();
        let _ = task.handle.await;
    }
    debug!("realtime supervisor exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Negotiate, connect, handshake, subscribe, then read until the
/// connection drops.
async fn connect_and_listen(
    client: &Arc<BrewCreatorClient>,
    on_update: &UpdateCallback,
    cancel: &CancellationToken,
    keepalive: &mut Option<SupervisedTask>,
) -> Result<(), Error> {
    let access_token = client.tokens().ensure_valid_token().await?;
    let connection_token = client.negotiate().await?;
    let url = client
        .endpoints()
        .telemetry_ws_url(&connection_token, &access_token)?;

    info!(host = url.host_str().unwrap_or_default(), "connecting realtime socket");

    let (ws, _response) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .map_err(|e| Error::WebSocket(e.to_string()))?;
    let (mut write, mut read) = ws.split();

    write
        .send(Message::text(PROTOCOL_HANDSHAKE))
        .await
        .map_err(|e| Error::WebSocket(format!("handshake send failed: {e}")))?;

    match read.next().await {
        Some(Ok(Message::Text(text))) => {
            if is_handshake_ack(text.as_str()) {
                debug!("protocol handshake acknowledged");
            } else {
                // Tolerated but monitored: the server will most likely
                // close the connection shortly after this.
                warn!(
                    response = text.as_str(),
                    "unexpected handshake response, server will likely close the connection"
                );
            }
        }
        Some(Ok(other)) => {
            warn!(?other, "non-text handshake response");
        }
        Some(Err(e)) => return Err(Error::WebSocket(format!("handshake read failed: {e}"))),
        None => return Err(Error::WebSocket("socket closed during handshake".into())),
    }

    write
        .send(Message::text(SUBSCRIBE_FRAME))
        .await
        .map_err(|e| Error::WebSocket(format!("subscribe send failed: {e}")))?;
    info!("subscribed to equipment updates");

    // One keepalive sender per connection: retire the previous one
    // before handing the write half to a new task.
    if let Some(task) = keepalive.take() {
        task.cancel.cancel();
        let _ = task.handle.await;
    }
    let ka_cancel = cancel.child_token();
    let handle = tokio::spawn(keepalive_loop(write, ka_cancel.clone()));
    *keepalive = Some(SupervisedTask {
        cancel: ka_cancel,
        handle,
    });

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    handle_text_frame(client, on_update, text.as_str()).await;
                }
                Some(Ok(Message::Ping(_))) => {
                    // tungstenite answers transport pings automatically
                }
                Some(Ok(Message::Close(frame))) => {
                    info!(?frame, "realtime socket closed by server");
                    cooldown(cancel).await;
                    return Ok(());
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    error!(error = %e, "realtime socket error");
                    cooldown(cancel).await;
                    return Ok(());
                }
                None => {
                    info!("realtime stream ended");
                    return Ok(());
                }
            }
        }
    }
}

/// Cancellable fixed cooldown between reconnect attempts.
async fn cooldown(cancel: &CancellationToken) {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {}
        _ = tokio::time::sleep(RECONNECT_COOLDOWN) => {}
    }
}

// ── Inbound frames ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    KeepaliveAck,
    UpdateNotification,
    Other,
}

fn classify_frame(text: &str) -> FrameKind {
    let frame = text.trim_end_matches(RECORD_SEPARATOR);
    if frame == KEEPALIVE_FRAME {
        FrameKind::KeepaliveAck
    } else if frame.starts_with(UPDATE_PREFIX) {
        FrameKind::UpdateNotification
    } else {
        FrameKind::Other
    }
}

fn is_handshake_ack(text: &str) -> bool {
    text.trim_end_matches(RECORD_SEPARATOR) == "{}"
}

async fn handle_text_frame(
    client: &Arc<BrewCreatorClient>,
    on_update: &UpdateCallback,
    text: &str,
) {
    match classify_frame(text) {
        FrameKind::KeepaliveAck => debug!("received keepalive ack"),
        FrameKind::UpdateNotification => {
            debug!(frame = text, "update notification, re-fetching fleet");
            match client.equipment_page().await {
                Ok(page) => on_update(page).await,
                Err(err) => {
                    warn!(error = %err, "fleet re-fetch after update notification failed");
                }
            }
        }
        FrameKind::Other => debug!(frame = text, "ignoring unexpected realtime message"),
    }
}

// ── Keepalive sender ─────────────────────────────────────────────────

/// Ping the server every [`KEEPALIVE_INTERVAL`] independently of inbound
/// traffic, satisfying the transport's idle-timeout expectations. Exits
/// on cancellation or the first failed send.
async fn keepalive_loop(mut write: WsSink, cancel: CancellationToken) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("keepalive sender stopped");
                return;
            }
            _ = tokio::time::sleep(KEEPALIVE_INTERVAL) => {
                debug!("sending keepalive ping");
                if let Err(err) = write.send(Message::text(KEEPALIVE_FRAME)).await {
                    warn!(error = %err, "keepalive send failed");
                    return;
                }
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keepalive_ack_is_recognized_with_and_without_separator() {
        assert_eq!(classify_frame(r#"{"type":6}"#), FrameKind::KeepaliveAck);
        assert_eq!(
            classify_frame("{\"type\":6}\u{1e}"),
            FrameKind::KeepaliveAck
        );
    }

    #[test]
    fn update_notifications_are_prefix_matched() {
        assert_eq!(
            classify_frame(r#"{"type":1,"target":"devicetwin","arguments":[]}"#),
            FrameKind::UpdateNotification
        );
        assert_eq!(
            classify_frame("{\"type\":1}\u{1e}"),
            FrameKind::UpdateNotification
        );
    }

    #[test]
    fn unknown_frames_are_other() {
        assert_eq!(classify_frame(r#"{"type":7}"#), FrameKind::Other);
        assert_eq!(classify_frame(r#"{"error":"boom"}"#), FrameKind::Other);
        assert_eq!(classify_frame("not json"), FrameKind::Other);
    }

    #[test]
    fn handshake_ack_tolerates_record_separator() {
        assert!(is_handshake_ack("{}"));
        assert!(is_handshake_ack("{}\u{1e}"));
        assert!(!is_handshake_ack(r#"{"error":"unsupported protocol"}"#));
    }

    #[test]
    fn timing_constants_match_protocol() {
        assert_eq!(KEEPALIVE_INTERVAL, Duration::from_secs(10));
        assert_eq!(RECONNECT_COOLDOWN, Duration::from_secs(60));
    }
}
