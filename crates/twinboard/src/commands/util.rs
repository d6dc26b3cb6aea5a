//! Shared helpers for command handlers.

use std::sync::Arc;

use twinboard_core::{Dashboard, Resource};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Wait for the building list, apply `--building`, and return the id every
/// building-scoped resource will fetch for.
pub async fn select_building(dashboard: &Dashboard, global: &GlobalOpts) -> Result<String, CliError> {
    select(dashboard, global.building.as_deref()).await
}

/// Wait for the building list and select `requested`, or keep the healed
/// selection when `None`.
pub async fn select(dashboard: &Dashboard, requested: Option<&str>) -> Result<String, CliError> {
    let snap = dashboard.ready().await;
    if let Some(err) = snap.error {
        return Err(CliError::from(err.as_ref()));
    }
    if let Some(id) = requested {
        dashboard.selection().set_selected_building_id(id)?;
        return Ok(id.to_owned());
    }
    snap.selected_building_id.ok_or(CliError::NoBuildings)
}

/// Await a resource's first settled state and surface its data or error.
pub async fn load<T: Send + Sync + 'static>(resource: &Resource<T>) -> Result<Arc<T>, CliError> {
    let state = resource.settled().await;
    if let Some(err) = state.error {
        return Err(CliError::from(err.as_ref()));
    }
    // Idle: nothing was selected to fetch for
    state.data.ok_or(CliError::NoBuildings)
}

/// Select the building, then load one of its resources.
pub async fn load_scoped<T, F>(
    dashboard: &Dashboard,
    global: &GlobalOpts,
    make: F,
) -> Result<Arc<T>, CliError>
where
    T: Send + Sync + 'static,
    F: FnOnce(&Dashboard) -> Resource<T>,
{
    select_building(dashboard, global).await?;
    let resource = make(dashboard);
    load(&resource).await
}

pub fn or_dash(value: Option<impl ToString>) -> String {
    value.map_or_else(|| "-".into(), |v| v.to_string())
}

/// Reject values outside `[min, max]` with a usage error.
pub fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<(), CliError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(CliError::Validation {
            field: field.into(),
            reason: format!("{value} is outside {min}..={max}"),
        })
    }
}
