// ── Reactive state streams ──
//
// Subscription handles for consuming state transitions of a resource,
// action, feed or the selection context, and the frames of a live feed.

use std::pin::Pin;
use std::task::{Context, Poll, ready};

use futures_core::Stream;
use tokio::sync::{broadcast, watch};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::trace;

/// A subscription to a piece of observable state.
///
/// Provides both point-in-time snapshot access and reactive change
/// notification via [`changed()`](Self::changed).
pub struct StateStream<S: Clone + Send + Sync + 'static> {
    current: S,
    receiver: watch::Receiver<S>,
}

impl<S: Clone + Send + Sync + 'static> StateStream<S> {
    pub(crate) fn new(mut receiver: watch::Receiver<S>) -> Self {
        let current = receiver.borrow_and_update().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at creation time or at the last `changed()`.
    pub fn current(&self) -> &S {
        &self.current
    }

    /// The latest snapshot (may have changed since the last `changed()`).
    pub fn latest(&self) -> S {
        self.receiver.borrow().clone()
    }

    /// Whether a transition happened that `changed()` has not yet returned.
    pub fn has_changed(&self) -> bool {
        self.receiver.has_changed().unwrap_or(false)
    }

    /// Wait for the next transition, returning the new snapshot.
    /// Returns `None` once the owner has been dropped.
    pub async fn changed(&mut self) -> Option<S> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Wait until `predicate` holds, returning the matching snapshot.
    /// Returns `None` if the owner is dropped first.
    pub async fn wait_for(&mut self, predicate: impl FnMut(&S) -> bool) -> Option<S> {
        let snap = self.receiver.wait_for(predicate).await.ok()?.clone();
        self.current = snap.clone();
        Some(snap)
    }
}

/// Live frames of a broadcast channel as a `Stream`.
///
/// A reader that falls behind skips the frames it missed rather than
/// failing. Ends once the sending side is gone.
pub struct MessageStream<M: Clone + Send + 'static> {
    inner: BroadcastStream<M>,
}

impl<M: Clone + Send + 'static> MessageStream<M> {
    pub(crate) fn new(receiver: broadcast::Receiver<M>) -> Self {
        Self {
            inner: BroadcastStream::new(receiver),
        }
    }
}

impl<M: Clone + Send + 'static> Stream for MessageStream<M> {
    type Item = M;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match ready!(Pin::new(&mut self.inner).poll_next(cx)) {
                Some(Ok(message)) => return Poll::Ready(Some(message)),
                Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                    trace!(skipped, "message stream lagged");
                }
                None => return Poll::Ready(None),
            }
        }
    }
}
