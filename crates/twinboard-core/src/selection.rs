// ── Building selection context ──
//
// The one process-wide piece of mutable state: which building is in
// view. Written only through `set_selected_building_id` and the healer
// task; every building-scoped resource keys itself to `selection_key()`
// and re-issues inside the write.

use std::future::Future;
use std::sync::{Arc, Weak};

use tokio::sync::watch;
use tracing::{debug, warn};
use twinboard_api::ApiClient;
use twinboard_api::types::Building;

use crate::error::CoreError;
use crate::fetch::{Dependency, Resource, ResourceState};
use crate::stream::StateStream;

tokio::task_local! {
    static CURRENT: BuildingContext;
}

/// Read-only projection of the selection context.
#[derive(Debug, Clone)]
pub struct BuildingSelection {
    pub buildings: Arc<Vec<Building>>,
    /// Derived from `buildings` and `selected_building_id` on every read.
    pub selected_building: Option<Building>,
    pub selected_building_id: Option<String>,
    pub loading: bool,
    pub error: Option<Arc<CoreError>>,
}

/// Decide whether `selected` must change for `buildings`.
///
/// Returns `None` when the selection is already consistent, otherwise the
/// replacement: the first building's id, or no selection for an empty list.
pub fn reconcile(buildings: &[Building], selected: Option<&str>) -> Option<Option<String>> {
    let Some(first) = buildings.first() else {
        return selected.is_some().then_some(None);
    };
    match selected {
        Some(id) if buildings.iter().any(|b| b.id == id) => None,
        _ => Some(Some(first.id.clone())),
    }
}

struct ContextInner {
    buildings: Resource<Vec<Building>>,
    selected: Dependency<Option<String>>,
}

/// Shared handle to the building list and the selected building.
///
/// Cheaply cloneable. Construct inside a Tokio runtime.
#[derive(Clone)]
pub struct BuildingContext {
    inner: Arc<ContextInner>,
}

impl BuildingContext {
    /// Context backed by `GET /buildings`, seeded with `seed` until the
    /// list arrives.
    pub fn new(client: Arc<ApiClient>, seed: impl Into<String>) -> Self {
        Self::with_loader(seed, move || {
            let client = Arc::clone(&client);
            async move {
                let list = client.list_buildings().await?;
                Ok(list.buildings)
            }
        })
    }

    /// Context backed by an arbitrary building-list accessor.
    pub fn with_loader<F, Fut>(seed: impl Into<String>, loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<Building>, CoreError>> + Send + 'static,
    {
        let selected = Dependency::new(Some(seed.into()));
        let buildings = Resource::new("buildings", loader);
        let list_rx = buildings.watch();
        let inner = Arc::new(ContextInner {
            buildings,
            selected,
        });
        tokio::spawn(heal_selection(Arc::downgrade(&inner), list_rx));
        Self { inner }
    }

    // ── Provider scope ───────────────────────────────────────────────

    /// Run `fut` with this context in scope for [`current`](Self::current).
    pub async fn provide<F: Future>(&self, fut: F) -> F::Output {
        CURRENT.scope(self.clone(), fut).await
    }

    /// The context of the enclosing [`provide`](Self::provide) scope.
    ///
    /// # Panics
    ///
    /// Panics when called outside a provider scope.
    pub fn current() -> Self {
        Self::try_current()
            .expect("BuildingContext::current() called outside of a provider scope")
    }

    pub fn try_current() -> Option<Self> {
        CURRENT.try_with(Clone::clone).ok()
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn buildings(&self) -> Arc<Vec<Building>> {
        self.inner
            .buildings
            .state()
            .data
            .unwrap_or_default()
    }

    pub fn selected_building_id(&self) -> Option<String> {
        self.inner.selected.get()
    }

    /// The list entry matching the selected id, if any.
    pub fn selected_building(&self) -> Option<Building> {
        let id = self.selected_building_id()?;
        self.buildings().iter().find(|b| b.id == id).cloned()
    }

    pub fn loading(&self) -> bool {
        self.inner.buildings.state().loading
    }

    pub fn error(&self) -> Option<Arc<CoreError>> {
        self.inner.buildings.state().error
    }

    pub fn snapshot(&self) -> BuildingSelection {
        let ResourceState {
            data,
            loading,
            error,
        } = self.inner.buildings.state();
        let buildings = data.unwrap_or_default();
        let selected_building_id = self.selected_building_id();
        let selected_building = selected_building_id
            .as_deref()
            .and_then(|id| buildings.iter().find(|b| b.id == id).cloned());
        BuildingSelection {
            buildings,
            selected_building,
            selected_building_id,
            loading,
            error,
        }
    }

    /// Dependency key for building-scoped resources.
    pub fn selection_key(&self) -> &Dependency<Option<String>> {
        &self.inner.selected
    }

    pub fn watch_selection(&self) -> watch::Receiver<Option<String>> {
        self.inner.selected.watch()
    }

    pub fn subscribe_selection(&self) -> StateStream<Option<String>> {
        StateStream::new(self.inner.selected.watch())
    }

    /// Wait until the building list has settled and the selection agrees
    /// with it.
    pub async fn ready(&self) -> BuildingSelection {
        let state = self.inner.buildings.settled().await;
        if let Some(list) = state.data {
            let mut rx = self.watch_selection();
            let _ = rx
                .wait_for(|selected| reconcile(&list, selected.as_deref()).is_none())
                .await;
        }
        self.snapshot()
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Select a building.
    ///
    /// Once the list has loaded, ids outside it are rejected. Every
    /// building-scoped resource has re-issued by the time this returns.
    pub fn set_selected_building_id(&self, id: impl Into<String>) -> Result<(), CoreError> {
        let id = id.into();
        if let Some(list) = self.inner.buildings.state().data {
            if !list.iter().any(|b| b.id == id) {
                return Err(CoreError::UnknownBuilding { id });
            }
        }
        if self.inner.selected.set(Some(id.clone())) {
            debug!(building = %id, "building selected");
        }
        Ok(())
    }

    /// Refetch the building list.
    pub fn refresh(&self) {
        self.inner.buildings.refetch();
    }
}

/// Keep the selection pointing at a member of the loaded list.
async fn heal_selection(
    context: Weak<ContextInner>,
    mut list_rx: watch::Receiver<ResourceState<Vec<Building>>>,
) {
    loop {
        let list = list_rx.borrow_and_update().data.clone();
        if let Some(list) = list {
            let Some(inner) = context.upgrade() else { break };
            inner.selected.modify(|selected| {
                let Some(replacement) = reconcile(&list, selected.as_deref()) else {
                    return false;
                };
                warn!(
                    from = selected.as_deref().unwrap_or("<none>"),
                    to = replacement.as_deref().unwrap_or("<none>"),
                    "selected building not in list, reselecting"
                );
                *selected = replacement;
                true
            });
        }
        if list_rx.changed().await.is_err() {
            break;
        }
    }
}
