//! Realtime building feed over WebSocket, with auto-reconnect.
//!
//! Connects to `WS {base}/ws/buildings/{id}/realtime` and fans parsed
//! [`RealtimeMessage`]s out through a [`tokio::sync::broadcast`] channel.
//! Dropped connections are retried with exponential backoff + jitter; a
//! rejection by the backend (unknown building) ends the feed.
//!
//! # Example
//!
//! ```rust,ignore
//! use twinboard_api::realtime::{RealtimeHandle, ReconnectConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let url = client.realtime_url("pleiades-a")?;
//! let handle = RealtimeHandle::connect(url, ReconnectConfig::default(), CancellationToken::new());
//! let mut rx = handle.subscribe();
//!
//! while let Ok(message) = rx.recv().await {
//!     println!("{message:?}");
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, watch};
use tokio::time::{Instant, interval_at};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::client::{ApiClient, Segment};
use crate::error::Error;
use crate::query::QueryParams;
use crate::types::{RealtimeCommand, RealtimeMessage};

// ── Tunables ─────────────────────────────────────────────────────────

const MESSAGE_CHANNEL_CAPACITY: usize = 256;

/// Interval between client `ping` frames on an open connection.
const KEEPALIVE: Duration = Duration::from_secs(30);

/// Close code the backend sends for an unknown building.
pub const CLOSE_UNKNOWN_BUILDING: u16 = 4004;

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Maximum reconnection attempts before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

// ── LinkStatus ───────────────────────────────────────────────────────

/// Connection state of a [`RealtimeHandle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStatus {
    Connecting,
    Open,
    /// Waiting to reconnect after a failure.
    Retrying { attempt: u32 },
    /// The backend refused the feed; no further attempts are made.
    Rejected { reason: String },
    /// Shut down, or out of retries.
    Closed,
}

impl LinkStatus {
    /// `true` once the background task has stopped for good.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected { .. } | Self::Closed)
    }
}

// ── RealtimeHandle ───────────────────────────────────────────────────

/// Handle to a running realtime feed.
///
/// Call [`shutdown`](Self::shutdown) to tear down the background task.
pub struct RealtimeHandle {
    message_rx: broadcast::Receiver<Arc<RealtimeMessage>>,
    status_rx: watch::Receiver<LinkStatus>,
    cancel: CancellationToken,
}

impl RealtimeHandle {
    /// Spawn the connect/reconnect loop for `url`.
    ///
    /// Returns immediately; the first handshake happens in the
    /// background. Must be called within a Tokio runtime.
    pub fn connect(url: Url, reconnect: ReconnectConfig, cancel: CancellationToken) -> Self {
        let (message_tx, message_rx) = broadcast::channel(MESSAGE_CHANNEL_CAPACITY);
        let (status_tx, status_rx) = watch::channel(LinkStatus::Connecting);

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            ws_loop(url, message_tx, status_tx, reconnect, task_cancel).await;
        });

        Self {
            message_rx,
            status_rx,
            cancel,
        }
    }

    /// New receiver for the message stream.
    ///
    /// A receiver that falls behind gets
    /// [`broadcast::error::RecvError::Lagged`].
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<RealtimeMessage>> {
        self.message_rx.resubscribe()
    }

    pub fn status(&self) -> watch::Receiver<LinkStatus> {
        self.status_rx.clone()
    }

    /// Signal the background task to shut down.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl ApiClient {
    /// `WS /ws/buildings/{id}/realtime`, on the same host as the REST base.
    pub fn realtime_url(&self, building_id: &str) -> Result<Url, Error> {
        let path = format!("/ws/buildings/{}/realtime", Segment(building_id));
        let mut url = self.url(&path, &QueryParams::new())?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme).map_err(|()| {
            Error::WebSocketConnect(format!("no WebSocket equivalent for {}", self.base_url()))
        })?;
        Ok(url)
    }
}

// ── Background reconnection loop ─────────────────────────────────────

/// How a single connection ended without a transport error.
enum Ended {
    /// Server closed or the stream ran out; reconnect.
    Dropped,
    /// The backend refused this building.
    Rejected(String),
    Cancelled,
}

/// Main loop: connect → read → on error, backoff → reconnect.
async fn ws_loop(
    url: Url,
    message_tx: broadcast::Sender<Arc<RealtimeMessage>>,
    status_tx: watch::Sender<LinkStatus>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;

    let last = loop {
        let ended = tokio::select! {
            biased;
            () = cancel.cancelled() => break LinkStatus::Closed,
            result = connect_and_read(&url, &message_tx, &status_tx, &cancel) => result,
        };

        match ended {
            Ok(Ended::Cancelled) => break LinkStatus::Closed,
            Ok(Ended::Rejected(reason)) => {
                tracing::warn!(url = %url, %reason, "realtime feed rejected");
                break LinkStatus::Rejected { reason };
            }
            Ok(Ended::Dropped) => {
                tracing::info!("realtime feed disconnected, reconnecting");
                attempt = 0;
                status_tx.send_replace(LinkStatus::Connecting);
            }
            Err(e) => {
                tracing::warn!(error = %e, attempt, "realtime feed error");

                if reconnect.max_retries.is_some_and(|max| attempt >= max) {
                    tracing::error!(attempt, "realtime reconnection limit reached, giving up");
                    break LinkStatus::Closed;
                }

                attempt += 1;
                status_tx.send_replace(LinkStatus::Retrying { attempt });
                let delay = calculate_backoff(attempt - 1, &reconnect);
                tracing::debug!(?delay, attempt, "waiting before reconnect");

                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break LinkStatus::Closed,
                    () = tokio::time::sleep(delay) => {}
                }
            }
        }
    };

    status_tx.send_replace(last);
    tracing::debug!("realtime loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Establish one connection and read frames until it drops.
async fn connect_and_read(
    url: &Url,
    message_tx: &broadcast::Sender<Arc<RealtimeMessage>>,
    status_tx: &watch::Sender<LinkStatus>,
    cancel: &CancellationToken,
) -> Result<Ended, Error> {
    tracing::info!(url = %url, "connecting to realtime feed");

    let ws_stream = match tokio_tungstenite::connect_async(url.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(tungstenite::Error::Http(response)) if response.status().is_client_error() => {
            return Ok(Ended::Rejected(format!("handshake refused: {}", response.status())));
        }
        Err(e) => return Err(Error::WebSocketConnect(e.to_string())),
    };

    status_tx.send_replace(LinkStatus::Open);
    tracing::info!("realtime feed connected");

    let (mut write, mut read) = ws_stream.split();
    let mut keepalive = interval_at(Instant::now() + KEEPALIVE, KEEPALIVE);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                let _ = write.send(Message::Close(None)).await;
                return Ok(Ended::Cancelled);
            }
            _ = keepalive.tick() => {
                let ping = serde_json::to_string(&RealtimeCommand::Ping).map_err(Error::Encode)?;
                write
                    .send(Message::text(ping))
                    .await
                    .map_err(|e| Error::WebSocketConnect(e.to_string()))?;
            }
            frame = read.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        parse_and_broadcast(&text, message_tx);
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let Some(cf) = frame else {
                            tracing::info!("close frame received (no payload)");
                            return Ok(Ended::Dropped);
                        };
                        tracing::info!(code = %cf.code, reason = %cf.reason, "close frame received");
                        if u16::from(cf.code) == CLOSE_UNKNOWN_BUILDING {
                            return Ok(Ended::Rejected(cf.reason.to_string()));
                        }
                        return Ok(Ended::Dropped);
                    }
                    Some(Err(e)) => {
                        return Err(Error::WebSocketConnect(e.to_string()));
                    }
                    None => {
                        tracing::info!("realtime stream ended");
                        return Ok(Ended::Dropped);
                    }
                    // Binary, Ping, Pong, Frame: tungstenite answers pings itself.
                    _ => {}
                }
            }
        }
    }
}

// ── Message parsing ──────────────────────────────────────────────────

/// Parse a text frame and broadcast it. Unknown shapes are dropped.
fn parse_and_broadcast(text: &str, message_tx: &broadcast::Sender<Arc<RealtimeMessage>>) {
    match serde_json::from_str::<RealtimeMessage>(text) {
        Ok(message) => {
            // No subscribers right now is fine.
            let _ = message_tx.send(Arc::new(message));
        }
        Err(e) => {
            tracing::debug!(error = %e, "unrecognised realtime frame");
        }
    }
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) * (1 ± 0.25)`
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let exponent = i32::try_from(attempt.min(20)).unwrap_or(20);
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exponent);
    let capped = base.min(config.max_delay.as_secs_f64());

    // Deterministic jitter seeded from the attempt number.
    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    Duration::from_secs_f64((capped * jitter_factor).max(0.0))
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_then_caps() {
        let config = ReconnectConfig {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            max_retries: None,
        };

        let d0 = calculate_backoff(0, &config);
        let d2 = calculate_backoff(2, &config);
        assert!(d2 > d0, "d2 ({d2:?}) should exceed d0 ({d0:?})");

        let late = calculate_backoff(u32::MAX, &config);
        assert!(late <= Duration::from_millis(12_500), "uncapped delay {late:?}");
    }

    #[test]
    fn realtime_url_swaps_scheme_and_escapes_id() {
        let base = Url::parse("https://twin.example.org/api/v1").unwrap();
        let client = ApiClient::with_client(reqwest::Client::new(), &base);
        let url = client.realtime_url("wing/3").unwrap();
        assert_eq!(url.as_str(), "wss://twin.example.org/api/v1/ws/buildings/wing%2F3/realtime");

        let base = Url::parse("http://localhost:8000/api/v1").unwrap();
        let client = ApiClient::with_client(reqwest::Client::new(), &base);
        assert_eq!(client.realtime_url("a").unwrap().scheme(), "ws");
    }

    #[test]
    fn malformed_frames_are_dropped() {
        let (tx, mut rx) = broadcast::channel(4);
        parse_and_broadcast(r#"{"error": "Building not found"}"#, &tx);
        parse_and_broadcast(r#"{"type":"pong","timestamp":"2024-06-15T10:30:00"}"#, &tx);

        let message = rx.try_recv().unwrap();
        assert!(matches!(*message, RealtimeMessage::Pong { .. }));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn terminal_statuses() {
        assert!(LinkStatus::Closed.is_terminal());
        assert!(LinkStatus::Rejected { reason: "gone".into() }.is_terminal());
        assert!(!LinkStatus::Retrying { attempt: 1 }.is_terminal());
    }
}
