// ── Live building feed ──
//
// Follows the selected building over the realtime WebSocket. A selection
// change tears down the previous connection and resets the feed state
// inside the selection write, so frames from the previous building are
// never shown against the new one. Each connection carries a generation;
// the bridge task commits only while its generation is current.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use chrono::{DateTime, Utc};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};
use twinboard_api::types::{RealtimeMessage, SensorReadings};
use twinboard_api::{ApiClient, LinkStatus, RealtimeHandle, ReconnectConfig};

use crate::fetch::{Dependency, Dependent};
use crate::stream::{MessageStream, StateStream};

/// Alerts retained per building, newest first.
pub const ALERT_HISTORY: usize = 20;

const MESSAGE_CAPACITY: usize = 128;

/// The most recent periodic sensor snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorSample {
    pub timestamp: DateTime<Utc>,
    pub readings: SensorReadings,
}

/// An alert pushed over the feed.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveAlert {
    pub timestamp: DateTime<Utc>,
    pub severity: String,
    pub title: String,
    pub message: String,
}

/// Observable state of a [`RealtimeFeed`]. Always describes a single
/// building.
#[derive(Debug, Clone, PartialEq)]
pub struct RealtimeState {
    /// `None` while nothing is selected.
    pub building_id: Option<String>,
    pub link: LinkStatus,
    pub latest: Option<SensorSample>,
    pub alerts: Vec<LiveAlert>,
}

impl RealtimeState {
    fn reset(building_id: Option<String>) -> Self {
        let link = if building_id.is_some() {
            LinkStatus::Connecting
        } else {
            LinkStatus::Closed
        };
        Self {
            building_id,
            link,
            latest: None,
            alerts: Vec::new(),
        }
    }

    /// Fold one frame in. Returns whether anything changed.
    fn apply(&mut self, message: &RealtimeMessage) -> bool {
        match message {
            RealtimeMessage::SensorUpdate {
                timestamp, data, ..
            } => {
                self.latest = Some(SensorSample {
                    timestamp: *timestamp,
                    readings: data.clone(),
                });
                true
            }
            RealtimeMessage::Alert {
                timestamp,
                severity,
                title,
                message,
                ..
            } => {
                self.alerts.insert(
                    0,
                    LiveAlert {
                        timestamp: *timestamp,
                        severity: severity.clone(),
                        title: title.clone(),
                        message: message.clone(),
                    },
                );
                self.alerts.truncate(ALERT_HISTORY);
                true
            }
            RealtimeMessage::Error { message } => {
                warn!(%message, "realtime feed reported an error");
                false
            }
            RealtimeMessage::Connected { .. }
            | RealtimeMessage::Pong { .. }
            | RealtimeMessage::Subscribed { .. } => false,
        }
    }
}

impl Default for RealtimeState {
    fn default() -> Self {
        Self::reset(None)
    }
}

struct FeedInner {
    client: Arc<ApiClient>,
    reconnect: ReconnectConfig,
    state: watch::Sender<RealtimeState>,
    messages: broadcast::Sender<Arc<RealtimeMessage>>,
    /// Bumped under the state lock on every building switch.
    generation: AtomicU64,
    cancel: CancellationToken,
    connection: Mutex<Option<CancellationToken>>,
}

/// Realtime feed for the selected building.
///
/// Dropping the feed closes its connection.
pub struct RealtimeFeed {
    inner: Arc<FeedInner>,
}

impl RealtimeFeed {
    /// Connect for the current value of `selection` and follow it.
    ///
    /// Must be called within a Tokio runtime.
    pub fn new(
        client: Arc<ApiClient>,
        reconnect: ReconnectConfig,
        selection: &Dependency<Option<String>>,
    ) -> Self {
        let (state, _) = watch::channel(RealtimeState::default());
        let (messages, _) = broadcast::channel(MESSAGE_CAPACITY);
        let inner = Arc::new(FeedInner {
            client,
            reconnect,
            state,
            messages,
            generation: AtomicU64::new(0),
            cancel: CancellationToken::new(),
            connection: Mutex::new(None),
        });
        selection.attach(Box::new(Rebind(Arc::downgrade(&inner))));
        Self { inner }
    }

    pub fn state(&self) -> RealtimeState {
        self.inner.state.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<RealtimeState> {
        self.inner.state.subscribe()
    }

    pub fn subscribe(&self) -> StateStream<RealtimeState> {
        StateStream::new(self.inner.state.subscribe())
    }

    /// Frames received for the current building from now on.
    pub fn messages(&self) -> MessageStream<Arc<RealtimeMessage>> {
        MessageStream::new(self.inner.messages.subscribe())
    }

    /// Close the connection and stop following the selection.
    pub fn dispose(&self) {
        self.inner.cancel.cancel();
        self.inner.state.send_modify(|state| state.link = LinkStatus::Closed);
    }
}

impl Drop for RealtimeFeed {
    fn drop(&mut self) {
        self.inner.cancel.cancel();
    }
}

impl FeedInner {
    /// Drop the current connection and open one for `building`.
    fn switch(self: &Arc<Self>, building: Option<&str>) {
        let mut generation = 0;
        self.state.send_modify(|state| {
            generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
            *state = RealtimeState::reset(building.map(str::to_owned));
        });

        let mut connection = self
            .connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = connection.take() {
            previous.cancel();
        }
        let Some(id) = building else {
            return;
        };

        let url = match self.client.realtime_url(id) {
            Ok(url) => url,
            Err(err) => {
                warn!(building = id, error = %err, "no realtime endpoint");
                self.set_link(
                    generation,
                    LinkStatus::Rejected {
                        reason: err.to_string(),
                    },
                );
                return;
            }
        };

        debug!(building = id, generation, "realtime feed following building");
        let cancel = self.cancel.child_token();
        let handle = RealtimeHandle::connect(url, self.reconnect.clone(), cancel.clone());
        *connection = Some(cancel.clone());
        tokio::spawn(bridge(Arc::downgrade(self), generation, handle, cancel));
    }

    /// Record a link transition. Returns `false` once `generation` is stale.
    fn set_link(&self, generation: u64, link: LinkStatus) -> bool {
        let mut current = true;
        self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::Acquire) != generation {
                current = false;
                return false;
            }
            if state.link == link {
                return false;
            }
            state.link = link;
            true
        });
        current
    }

    /// Fold a frame into the state and pass it on. Returns `false` once
    /// `generation` is stale.
    fn deliver(&self, generation: u64, message: Arc<RealtimeMessage>) -> bool {
        let mut current = true;
        self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::Acquire) != generation {
                current = false;
                return false;
            }
            let changed = state.apply(&message);
            // No readers right now is fine.
            let _ = self.messages.send(message);
            changed
        });
        current
    }
}

/// Forward one connection's status and frames into its feed.
async fn bridge(
    feed: Weak<FeedInner>,
    generation: u64,
    handle: RealtimeHandle,
    cancel: CancellationToken,
) {
    let mut status = handle.status();
    let mut frames = handle.subscribe();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let link = status.borrow_and_update().clone();
                let terminal = link.is_terminal();
                let Some(inner) = feed.upgrade() else { break };
                if !inner.set_link(generation, link) || terminal {
                    break;
                }
            }
            received = frames.recv() => match received {
                Ok(message) => {
                    let Some(inner) = feed.upgrade() else { break };
                    if !inner.deliver(generation, message) {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, generation, "realtime bridge lagged");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    handle.shutdown();
    trace!(generation, "realtime bridge exiting");
}

/// Re-targets a feed when the selection changes.
struct Rebind(Weak<FeedInner>);

impl Dependent<Option<String>> for Rebind {
    fn rekey(&self, value: &Option<String>) -> bool {
        let Some(inner) = self.0.upgrade() else {
            return false;
        };
        if inner.cancel.is_cancelled() {
            return false;
        }
        inner.switch(value.as_deref());
        true
    }
}
