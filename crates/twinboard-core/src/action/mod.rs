// ── Action-triggered fetch state machine ──
//
// One-shot, user-initiated operations. Nothing runs until `trigger` is
// called. Failures are recorded as display strings and re-raised to the
// caller. Overlapping triggers are not sequenced: whichever completes
// last owns the state.

mod triggers;

pub use triggers::{
    CustomScenarioRunner, EnergyForecaster, MpcOptimizer, QuickMpcPlanner, ReportGenerator,
    RoiCalculator, ScenarioRunner, SetpointUpdater, ThermalSimulator,
};

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::error::CoreError;
use crate::stream::StateStream;

/// Observable state of an [`Action`].
pub struct ActionState<T> {
    pub result: Option<Arc<T>>,
    pub loading: bool,
    /// Human-readable failure message of the last completed call.
    pub error: Option<String>,
}

impl<T> ActionState<T> {
    pub fn result(&self) -> Option<&T> {
        self.result.as_deref()
    }
}

impl<T> Clone for ActionState<T> {
    fn clone(&self) -> Self {
        Self {
            result: self.result.clone(),
            loading: self.loading,
            error: self.error.clone(),
        }
    }
}

impl<T> Default for ActionState<T> {
    fn default() -> Self {
        Self {
            result: None,
            loading: false,
            error: None,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ActionState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionState")
            .field("result", &self.result)
            .field("loading", &self.loading)
            .field("error", &self.error)
            .finish()
    }
}

type Invoke<A, T> = Box<dyn Fn(A) -> BoxFuture<'static, Result<T, CoreError>> + Send + Sync>;

/// A trigger-driven operation with observable `{result, loading, error}`.
pub struct Action<A, T> {
    label: &'static str,
    state: watch::Sender<ActionState<T>>,
    disposed: CancellationToken,
    invoke: Invoke<A, T>,
}

impl<A: Send + 'static, T: Send + Sync + 'static> Action<A, T> {
    pub fn new<F, Fut>(label: &'static str, invoke: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, CoreError>> + Send + 'static,
    {
        let (state, _) = watch::channel(ActionState::default());
        Self {
            label,
            state,
            disposed: CancellationToken::new(),
            invoke: Box::new(move |args| invoke(args).boxed()),
        }
    }

    /// Run the operation with `args`.
    ///
    /// The outcome is recorded in state and also returned, so callers can
    /// layer their own handling on top of the failure.
    pub async fn trigger(&self, args: A) -> Result<Arc<T>, CoreError> {
        self.write(|state| {
            state.loading = true;
            state.error = None;
        });
        trace!(action = self.label, "triggered");

        match (self.invoke)(args).await {
            Ok(value) => {
                let value = Arc::new(value);
                let committed = Arc::clone(&value);
                self.write(move |state| {
                    state.result = Some(committed);
                    state.error = None;
                    state.loading = false;
                });
                Ok(value)
            }
            Err(err) => {
                debug!(action = self.label, error = %err, "action failed");
                let message = err.message();
                self.write(move |state| {
                    state.result = None;
                    state.error = Some(message);
                    state.loading = false;
                });
                Err(err)
            }
        }
    }

    /// Clear result and error. Does not touch an in-flight call.
    pub fn reset(&self) {
        self.write(|state| {
            state.result = None;
            state.error = None;
        });
    }

    /// Stop recording outcomes. Calls already in flight still complete
    /// for their caller but leave state untouched.
    pub fn dispose(&self) {
        self.disposed.cancel();
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.is_cancelled()
    }

    pub fn state(&self) -> ActionState<T> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> StateStream<ActionState<T>> {
        StateStream::new(self.state.subscribe())
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    fn write(&self, modify: impl FnOnce(&mut ActionState<T>)) {
        self.state.send_if_modified(|state| {
            if self.disposed.is_cancelled() {
                return false;
            }
            modify(state);
            true
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tokio::sync::oneshot;

    use super::*;

    fn doubler() -> Action<u32, u32> {
        Action::new("double", |n: u32| async move {
            if n == 0 {
                Err(CoreError::Api {
                    status: 422,
                    message: "value must be positive".into(),
                })
            } else {
                Ok(n * 2)
            }
        })
    }

    #[tokio::test]
    async fn nothing_runs_before_trigger() {
        let action = doubler();
        let state = action.state();
        assert!(state.result.is_none());
        assert!(!state.loading);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn success_populates_result() {
        let action = doubler();
        let value = action.trigger(21).await.unwrap();
        assert_eq!(*value, 42);

        let state = action.state();
        assert_eq!(state.result(), Some(&42));
        assert!(!state.loading);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn failure_is_recorded_as_message_and_reraised() {
        let action = doubler();
        action.trigger(4).await.unwrap();

        let err = action.trigger(0).await.unwrap_err();
        assert_eq!(err.status(), Some(422));

        let state = action.state();
        assert!(state.result.is_none());
        assert_eq!(state.error.as_deref(), Some("value must be positive"));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn loading_is_visible_while_in_flight() {
        let (tx, rx) = oneshot::channel::<u32>();
        let rx = std::sync::Mutex::new(Some(rx));
        let action = Action::new("slow", move |(): ()| {
            let rx = rx.lock().unwrap().take();
            async move {
                match rx {
                    Some(rx) => rx.await.map_err(|e| CoreError::Internal(e.to_string())),
                    None => Err(CoreError::Internal("called twice".into())),
                }
            }
        });

        let mut stream = action.subscribe();
        let call = action.trigger(());
        tokio::pin!(call);

        tokio::select! {
            _ = &mut call => panic!("completed before reply"),
            snap = stream.changed() => assert!(snap.unwrap().loading),
        }

        tx.send(7).unwrap();
        assert_eq!(*call.await.unwrap(), 7);
        assert!(!action.state().loading);
    }

    #[tokio::test]
    async fn reset_clears_result_and_error() {
        let action = doubler();
        action.trigger(0).await.ok();
        action.reset();
        let state = action.state();
        assert!(state.error.is_none());
        assert!(state.result.is_none());
    }

    #[tokio::test]
    async fn disposed_action_leaves_state_untouched() {
        let action = doubler();
        action.dispose();
        assert_eq!(*action.trigger(5).await.unwrap(), 10);
        assert!(action.state().result.is_none());
    }
}
