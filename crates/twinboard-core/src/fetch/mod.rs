// ── Resource-fetch state machine ──
//
// Wraps an async accessor and tracks `{data, loading, error}` for one
// consumer. Re-issues when its dependency changes value and on manual
// refetch. Only the most recently issued invocation may commit; late
// outcomes from superseded or disposed invocations are dropped.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::error::CoreError;
use crate::stream::StateStream;

mod dependency;

pub use dependency::Dependency;
pub(crate) use dependency::Dependent;

/// Observable state of a [`Resource`].
///
/// Once `loading` is false at most one of `data` and `error` is set.
/// While `loading` is true the previous `data` is retained.
pub struct ResourceState<T> {
    pub data: Option<Arc<T>>,
    pub loading: bool,
    pub error: Option<Arc<CoreError>>,
}

impl<T> ResourceState<T> {
    pub fn data(&self) -> Option<&T> {
        self.data.as_deref()
    }

    pub fn error(&self) -> Option<&CoreError> {
        self.error.as_deref()
    }

    /// Nothing loaded, nothing loading, nothing failed.
    pub fn is_idle(&self) -> bool {
        !self.loading && self.data.is_none() && self.error.is_none()
    }
}

impl<T> Clone for ResourceState<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            loading: self.loading,
            error: self.error.clone(),
        }
    }
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ResourceState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceState")
            .field("data", &self.data)
            .field("loading", &self.loading)
            .field("error", &self.error)
            .finish()
    }
}

type Pending<T> = BoxFuture<'static, Result<T, CoreError>>;
type Rerun<T> = Box<dyn Fn(&Arc<ResourceInner<T>>) + Send + Sync>;
type Keyed<T, D> = Arc<dyn Fn(&D) -> Option<Pending<T>> + Send + Sync>;

struct ResourceInner<T> {
    label: &'static str,
    state: watch::Sender<ResourceState<T>>,
    generation: AtomicU64,
    cancel: CancellationToken,
    rerun: Rerun<T>,
}

/// A reactive fetch handle for one consumer.
///
/// Dropping the handle disposes it: in-flight invocations are cancelled
/// and nothing is written afterwards. Constructors spawn onto the
/// current Tokio runtime.
pub struct Resource<T> {
    inner: Arc<ResourceInner<T>>,
}

impl<T: Send + Sync + 'static> Resource<T> {
    /// Resource without dependencies. Fetches immediately.
    pub fn new<F, Fut>(label: &'static str, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, CoreError>> + Send + 'static,
    {
        let rerun: Rerun<T> = Box::new(move |inner: &Arc<ResourceInner<T>>| {
            inner.start(Some(fetch().boxed()));
        });
        let inner = Arc::new(ResourceInner::new(label, rerun));
        inner.run();
        Self { inner }
    }

    /// Resource keyed to a dependency value.
    ///
    /// Fetches immediately for the current value, then again whenever
    /// `deps` is set to a different value. The re-issue happens inside
    /// that write, so `state()` reports `loading` as soon as the new
    /// value is visible. `fetch` returns `None` when the value has
    /// nothing to fetch; the resource then goes idle and any in-flight
    /// invocation is stale.
    pub fn with_dependency<D, F, Fut>(label: &'static str, deps: &Dependency<D>, fetch: F) -> Self
    where
        D: Clone + PartialEq + Send + Sync + 'static,
        F: Fn(&D) -> Option<Fut> + Send + Sync + 'static,
        Fut: Future<Output = Result<T, CoreError>> + Send + 'static,
    {
        let fetch: Keyed<T, D> = Arc::new(move |dep: &D| fetch(dep).map(FutureExt::boxed));

        let current = deps.watch();
        let rerun_fetch = Arc::clone(&fetch);
        // The borrow is held across `start` so a concurrent write waits
        // and re-keys after this cycle.
        let rerun: Rerun<T> = Box::new(move |inner: &Arc<ResourceInner<T>>| {
            let dep = current.borrow();
            inner.start(rerun_fetch(&dep));
        });

        let inner = Arc::new(ResourceInner::new(label, rerun));
        deps.attach(Box::new(Rekey {
            resource: Arc::downgrade(&inner),
            fetch,
        }));
        Self { inner }
    }

    /// Current state snapshot.
    pub fn state(&self) -> ResourceState<T> {
        self.inner.state.borrow().clone()
    }

    /// Subscribe to state transitions.
    pub fn subscribe(&self) -> StateStream<ResourceState<T>> {
        StateStream::new(self.inner.state.subscribe())
    }

    /// Raw watch receiver, for building derived views.
    pub fn watch(&self) -> watch::Receiver<ResourceState<T>> {
        self.inner.state.subscribe()
    }

    /// Wait for the first state that is not loading.
    pub async fn settled(&self) -> ResourceState<T> {
        let mut rx = self.inner.state.subscribe();
        match rx.wait_for(|s| !s.loading).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }

    /// Re-run the fetch cycle for the current dependency value.
    pub fn refetch(&self) {
        self.inner.run();
    }

    /// Stop the resource. Later outcomes are never applied.
    pub fn dispose(&self) {
        if !self.inner.cancel.is_cancelled() {
            trace!(resource = self.inner.label, "disposed");
        }
        self.inner.cancel.cancel();
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    pub fn label(&self) -> &'static str {
        self.inner.label
    }
}

impl<T> Drop for Resource<T> {
    fn drop(&mut self) {
        self.inner.cancel.cancel();
    }
}

impl<T: Send + Sync + 'static> ResourceInner<T> {
    fn new(label: &'static str, rerun: Rerun<T>) -> Self {
        let (state, _) = watch::channel(ResourceState::default());
        Self {
            label,
            state,
            generation: AtomicU64::new(0),
            cancel: CancellationToken::new(),
            rerun,
        }
    }

    fn run(self: &Arc<Self>) {
        (self.rerun)(self);
    }

    /// Begin a new cycle. The generation is bumped under the state lock,
    /// so no commit from an earlier cycle can interleave.
    fn start(self: &Arc<Self>, pending: Option<Pending<T>>) {
        if self.cancel.is_cancelled() {
            return;
        }

        let Some(pending) = pending else {
            self.state.send_if_modified(|state| {
                self.generation.fetch_add(1, Ordering::SeqCst);
                let changed = !state.is_idle();
                *state = ResourceState::default();
                changed
            });
            trace!(resource = self.label, "idle");
            return;
        };

        let mut generation = 0;
        self.state.send_modify(|state| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            state.loading = true;
            state.error = None;
        });
        trace!(resource = self.label, generation, "fetch issued");

        let weak: Weak<Self> = Arc::downgrade(self);
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                outcome = pending => outcome,
            };
            if let Some(inner) = weak.upgrade() {
                inner.commit(generation, outcome);
            }
        });
    }

    fn commit(&self, generation: u64, outcome: Result<T, CoreError>) {
        let applied = self.state.send_if_modified(|state| {
            if self.cancel.is_cancelled() || self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            match outcome {
                Ok(value) => {
                    state.data = Some(Arc::new(value));
                    state.error = None;
                }
                Err(err) => {
                    state.data = None;
                    state.error = Some(Arc::new(err));
                }
            }
            state.loading = false;
            true
        });

        if applied {
            trace!(resource = self.label, generation, "fetch committed");
        } else {
            debug!(resource = self.label, generation, "discarding stale response");
        }
    }
}

/// Attachment of a keyed resource to its [`Dependency`].
struct Rekey<T, D> {
    resource: Weak<ResourceInner<T>>,
    fetch: Keyed<T, D>,
}

impl<T: Send + Sync + 'static, D: 'static> Dependent<D> for Rekey<T, D> {
    fn rekey(&self, value: &D) -> bool {
        let Some(inner) = self.resource.upgrade() else {
            return false;
        };
        if inner.cancel.is_cancelled() {
            return false;
        }
        trace!(resource = inner.label, "dependency changed");
        inner.start((self.fetch)(value));
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    use tokio::sync::oneshot;

    use super::*;

    type Reply = Result<String, CoreError>;

    /// Fetcher whose invocations resolve only when the test says so.
    #[derive(Clone, Default)]
    struct Script {
        pending: Arc<Mutex<VecDeque<oneshot::Receiver<Reply>>>>,
        calls: Arc<AtomicUsize>,
    }

    impl Script {
        fn expect(&self) -> oneshot::Sender<Reply> {
            let (tx, rx) = oneshot::channel();
            self.pending.lock().unwrap().push_back(rx);
            tx
        }

        fn call(&self) -> impl Future<Output = Reply> + Send + use<> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let rx = self.pending.lock().unwrap().pop_front();
            async move {
                match rx {
                    Some(rx) => rx
                        .await
                        .unwrap_or_else(|_| Err(CoreError::Internal("reply dropped".into()))),
                    None => Err(CoreError::Internal("unexpected call".into())),
                }
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    async fn drain() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn success_sets_data_and_clears_loading() {
        let resource = Resource::new("answer", || async { Ok::<_, CoreError>(42_u32) });
        assert!(resource.state().loading);

        let state = resource.settled().await;
        assert_eq!(state.data(), Some(&42));
        assert!(!state.loading);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn not_found_surfaces_status_and_message() {
        let resource: Resource<u32> = Resource::new("building", || async {
            Err(CoreError::Api {
                status: 404,
                message: "Building not found".into(),
            })
        });

        let state = resource.settled().await;
        let err = state.error().unwrap();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.message(), "Building not found");
        assert!(state.data.is_none());
    }

    #[tokio::test]
    async fn refetch_keeps_previous_data_while_loading() {
        let script = Script::default();
        let first = script.expect();
        let s = script.clone();
        let resource = Resource::new("zones", move || s.call());

        first.send(Ok("v1".into())).unwrap();
        assert_eq!(resource.settled().await.data().unwrap(), "v1");

        let second = script.expect();
        resource.refetch();
        let state = resource.state();
        assert!(state.loading);
        assert_eq!(state.data().unwrap(), "v1");
        assert!(state.error.is_none());

        second.send(Err(CoreError::Internal("boom".into()))).unwrap();
        let state = resource.settled().await;
        assert!(state.data.is_none());
        assert!(state.error.is_some());
    }

    #[tokio::test]
    async fn superseded_response_is_discarded() {
        let script = Script::default();
        let for_a = script.expect();
        let for_b = script.expect();

        let dep = Dependency::new("a".to_string());
        let s = script.clone();
        let resource = Resource::with_dependency("energy", &dep, move |_: &String| Some(s.call()));
        assert_eq!(script.calls(), 1);

        assert!(dep.set("b".into()));
        assert_eq!(script.calls(), 2);

        for_b.send(Ok("b".into())).unwrap();
        assert_eq!(resource.settled().await.data().unwrap(), "b");

        // The slow response for "a" arrives after "b" committed.
        for_a.send(Ok("a".into())).unwrap();
        drain().await;
        let state = resource.state();
        assert_eq!(state.data().unwrap(), "b");
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn dependency_write_reissues_before_returning() {
        let script = Script::default();
        let first = script.expect();
        let _second = script.expect();
        let dep = Dependency::new("hq".to_string());
        let s = script.clone();
        let resource = Resource::with_dependency("hvac", &dep, move |_: &String| Some(s.call()));

        first.send(Ok("hq".into())).unwrap();
        assert!(!resource.settled().await.loading);

        dep.set("annex".into());
        // No yield between the write and the read.
        let state = resource.state();
        assert!(state.loading);
        assert!(state.error.is_none());
        assert_eq!(script.calls(), 2);
        assert_eq!(dep.get(), "annex");
    }

    #[tokio::test]
    async fn equal_dependency_value_does_not_refetch() {
        let script = Script::default();
        let reply = script.expect();
        let dep = Dependency::new(7_u32);
        let s = script.clone();
        let resource = Resource::with_dependency("kpis", &dep, move |_: &u32| Some(s.call()));
        reply.send(Ok("once".into())).unwrap();
        resource.settled().await;

        assert!(!dep.set(7));
        drain().await;
        assert_eq!(script.calls(), 1);
    }

    #[tokio::test]
    async fn none_dependency_goes_idle() {
        let script = Script::default();
        let slow = script.expect();
        let dep = Dependency::new(Some("pleiades-a".to_string()));
        let s = script.clone();
        let resource = Resource::with_dependency("hvac", &dep, move |id: &Option<String>| {
            id.as_ref().map(|_| s.call())
        });
        assert!(resource.state().loading);

        dep.set(None);
        assert!(resource.state().is_idle());

        slow.send(Ok("late".into())).ok();
        drain().await;
        assert!(resource.state().is_idle());
        assert_eq!(script.calls(), 1);
    }

    #[tokio::test]
    async fn refetch_uses_current_dependency_value() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let dep = Dependency::new(1_u32);
        let log = Arc::clone(&seen);
        let resource = Resource::with_dependency("iaq", &dep, move |n: &u32| {
            log.lock().unwrap().push(*n);
            let n = *n;
            Some(async move { Ok::<_, CoreError>(n) })
        });
        dep.set(2);
        resource.refetch();
        assert_eq!(*resource.settled().await.data().unwrap(), 2);
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 2]);
    }

    #[tokio::test]
    async fn dropped_resource_detaches_from_dependency() {
        let script = Script::default();
        let _reply = script.expect();
        let dep = Dependency::new(0_u8);
        let s = script.clone();
        let resource = Resource::with_dependency("alerts", &dep, move |_: &u8| Some(s.call()));
        assert_eq!(dep.attached(), 1);

        drop(resource);
        dep.set(1);
        assert_eq!(dep.attached(), 0);
        assert_eq!(script.calls(), 1);
    }

    #[tokio::test]
    async fn disposed_resource_ignores_late_outcome() {
        let script = Script::default();
        let reply = script.expect();
        let s = script.clone();
        let resource = Resource::new("alerts", move || s.call());
        let mut stream = resource.subscribe();

        resource.dispose();
        assert!(resource.is_disposed());
        reply.send(Ok("late".into())).ok();
        drain().await;

        let state = resource.state();
        assert!(state.data.is_none());
        assert!(state.error.is_none());
        assert!(!stream.has_changed());

        resource.refetch();
        assert_eq!(script.calls(), 1);
        drop(resource);
        assert!(stream.changed().await.is_none());
    }

    #[tokio::test]
    async fn dropping_mid_flight_is_silent() {
        let script = Script::default();
        let reply = script.expect();
        let s = script.clone();
        let resource = Resource::new("equipment", move || s.call());
        let rx = resource.watch();

        drop(resource);
        reply.send(Ok("late".into())).ok();
        drain().await;

        assert!(rx.borrow().data.is_none());
    }
}
