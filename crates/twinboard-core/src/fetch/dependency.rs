// ── Dependency keys ──
//
// A published value that resources key their fetches to. Writes fan
// out to every attached resource while the value is still locked, so a
// reader never sees the new key next to a resource that has not yet
// re-issued for it.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;

/// Something re-keyed when a [`Dependency`] changes.
pub(crate) trait Dependent<D>: Send + Sync {
    /// Re-issue for `value`. Returns `false` once the dependent is gone,
    /// after which it is detached.
    fn rekey(&self, value: &D) -> bool;
}

struct DependencyInner<D> {
    value: watch::Sender<D>,
    dependents: Mutex<Vec<Box<dyn Dependent<D>>>>,
}

/// Shared, observable dependency value.
///
/// Cheaply cloneable. Changing the value re-issues every resource built
/// with [`Resource::with_dependency`](super::Resource::with_dependency)
/// before the write returns, so call it inside a Tokio runtime.
pub struct Dependency<D> {
    inner: Arc<DependencyInner<D>>,
}

impl<D> Clone for Dependency<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: fmt::Debug> fmt::Debug for Dependency<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependency")
            .field("value", &*self.inner.value.borrow())
            .finish_non_exhaustive()
    }
}

impl<D: Clone + PartialEq + Send + Sync + 'static> Dependency<D> {
    pub fn new(initial: D) -> Self {
        let (value, _) = watch::channel(initial);
        Self {
            inner: Arc::new(DependencyInner {
                value,
                dependents: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn get(&self) -> D {
        self.inner.value.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<D> {
        self.inner.value.subscribe()
    }

    /// Publish `value`. Returns `false` when it equals the current one,
    /// in which case nothing re-issues.
    pub fn set(&self, value: D) -> bool {
        self.modify(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        })
    }

    /// Edit the value in place; `edit` reports whether it changed it.
    pub fn modify(&self, edit: impl FnOnce(&mut D) -> bool) -> bool {
        self.inner.value.send_if_modified(|current| {
            if !edit(current) {
                return false;
            }
            self.inner.fan_out(current);
            true
        })
    }

    /// Attach `dependent` and key it to the current value.
    pub(crate) fn attach(&self, dependent: Box<dyn Dependent<D>>) {
        // Same lock order as `modify`: value first, then the list.
        let current = self.inner.value.borrow();
        let mut dependents = self
            .inner
            .dependents
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if dependent.rekey(&current) {
            dependents.push(dependent);
        }
    }

    #[cfg(test)]
    pub(crate) fn attached(&self) -> usize {
        self.inner
            .dependents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl<D> DependencyInner<D> {
    fn fan_out(&self, value: &D) {
        self.dependents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|dependent| dependent.rekey(value));
    }
}
