//! Report download handler.

use std::path::PathBuf;

use serde::Serialize;
use twinboard_core::Dashboard;

use crate::cli::{GlobalOpts, ReportArgs};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Serialize)]
struct SavedReport {
    building_id: String,
    period: String,
    path: PathBuf,
    bytes: usize,
    content_type: Option<String>,
}

fn detail(r: &SavedReport) -> String {
    format!(
        "Saved {} report for {} to {} ({} bytes)",
        r.period,
        r.building_id,
        r.path.display(),
        r.bytes
    )
}

pub async fn handle(
    dashboard: &Dashboard,
    args: ReportArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let building_id = util::select_building(dashboard, global).await?;
    let doc = dashboard
        .report_generator()
        .generate_report((building_id, args.period))
        .await?;

    let path = args.out.unwrap_or_else(|| PathBuf::from(doc.file_name()));
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, &doc.body)?;
    tracing::info!(path = %path.display(), bytes = doc.body.len(), "report written");

    let saved = SavedReport {
        building_id: doc.building_id.clone(),
        period: doc.period.to_string(),
        path,
        bytes: doc.body.len(),
        content_type: doc.content_type.clone(),
    };
    let out = output::render_single(&global.output, &saved, detail, |r| {
        r.path.display().to_string()
    });
    output::print_output(&out, global.quiet);
    Ok(())
}
