//! Building command handlers.

use tabled::Tabled;
use twinboard_core::{Building, Dashboard};

use crate::cli::{BuildingsArgs, BuildingsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct BuildingRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "City")]
    city: String,
    #[tabled(rename = "Type")]
    building_type: String,
    #[tabled(rename = "Floors")]
    floors: u32,
    #[tabled(rename = "Area (m²)")]
    area: String,
    #[tabled(rename = "Occupancy")]
    occupancy: String,
}

impl From<&Building> for BuildingRow {
    fn from(b: &Building) -> Self {
        Self {
            id: b.id.clone(),
            name: b.name.clone(),
            city: b.location.city.clone(),
            building_type: b.building_type.clone(),
            floors: b.floors,
            area: format!("{:.0}", b.area_sqm),
            occupancy: format!("{:.0}%", b.occupancy_rate),
        }
    }
}

fn detail(b: &Building) -> String {
    output::detail_lines(&[
        ("ID", b.id.clone()),
        ("Name", b.name.clone()),
        ("Type", b.building_type.clone()),
        (
            "Address",
            format!("{}, {}, {}", b.location.address, b.location.city, b.location.country),
        ),
        (
            "Coordinates",
            format!("{:.4}, {:.4}", b.location.latitude, b.location.longitude),
        ),
        ("Built", b.year_built.to_string()),
        ("Floors", b.floors.to_string()),
        ("Area", format!("{:.0} m²", b.area_sqm)),
        ("Occupancy", format!("{:.0}%", b.occupancy_rate)),
        ("Updated", b.updated_at.format("%Y-%m-%d %H:%M").to_string()),
    ])
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    dashboard: &Dashboard,
    args: BuildingsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        BuildingsCommand::List => {
            let snap = dashboard.ready().await;
            if let Some(err) = snap.error {
                return Err(CliError::from(err.as_ref()));
            }
            let out = output::render_list(
                &global.output,
                snap.buildings.as_slice(),
                |b| BuildingRow::from(b),
                |b| b.id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        BuildingsCommand::Show { id } => {
            util::select(dashboard, id.as_deref().or(global.building.as_deref())).await?;
            let building = util::load(&dashboard.building()).await?;
            let out =
                output::render_single(&global.output, building.as_ref(), detail, |b| b.id.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
