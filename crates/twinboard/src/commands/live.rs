//! Live feed command handler.

use futures_util::StreamExt;
use twinboard_core::{Dashboard, LinkStatus, RealtimeMessage, ReconnectConfig};

use crate::cli::{GlobalOpts, LiveArgs, OutputFormat};
use crate::error::CliError;
use crate::output::{self, Tone};

use super::util;

/// Reconnection attempts before `live` gives up.
const RETRIES: u32 = 3;

fn severity_tone(severity: &str) -> Tone {
    match severity {
        "critical" | "error" => Tone::Bad,
        "warning" => Tone::Warn,
        _ => Tone::Good,
    }
}

/// One line per sensor update or alert; other frames are not shown.
fn frame_line(frame: &RealtimeMessage, color: bool) -> String {
    match frame {
        RealtimeMessage::SensorUpdate {
            building_id,
            timestamp,
            data,
        } => format!(
            "{} {building_id}  {:.1} kW  {:.1} °C  {:.0}% RH  CO2 {:.0} ppm  AQI {}  occupancy {}/{}",
            timestamp.format("%H:%M:%S"),
            data.energy.current_power_kw,
            data.hvac.avg_temperature,
            data.hvac.avg_humidity,
            data.iaq.avg_co2_ppm,
            data.iaq.avg_aqi,
            data.occupancy.current,
            data.occupancy.capacity,
        ),
        RealtimeMessage::Alert {
            building_id,
            timestamp,
            severity,
            title,
            message,
        } => {
            let tag = output::paint(&format!("[{severity}]"), severity_tone(severity), color);
            format!(
                "{} {building_id}  {tag} {title}: {message}",
                timestamp.format("%H:%M:%S")
            )
        }
        other => format!("{other:?}"),
    }
}

fn shown(frame: &RealtimeMessage) -> bool {
    matches!(
        frame,
        RealtimeMessage::SensorUpdate { .. } | RealtimeMessage::Alert { .. }
    )
}

pub async fn handle(dashboard: &Dashboard, args: LiveArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let building_id = util::select_building(dashboard, global).await?;
    let url = dashboard
        .client()
        .realtime_url(&building_id)
        .map_or_else(|_| building_id.clone(), |url| url.to_string());

    let feed = dashboard.realtime_with(ReconnectConfig {
        max_retries: Some(RETRIES),
        ..ReconnectConfig::default()
    });
    let mut frames = feed.messages();
    let mut link = feed.watch();
    let color = output::should_color(&global.color);
    // A stream of documents reads best one per line
    let format = match global.output {
        OutputFormat::Json => OutputFormat::JsonCompact,
        ref other => other.clone(),
    };

    let mut count = 0;
    while count < args.count {
        tokio::select! {
            frame = frames.next() => {
                let Some(frame) = frame else { break };
                if !shown(&frame) {
                    continue;
                }
                let line = output::render_single(
                    &format,
                    &*frame,
                    |f| frame_line(f, color),
                    |f| frame_line(f, false),
                );
                output::print_output(&line, global.quiet);
                count += 1;
            }
            ended = link.wait_for(|state| state.link.is_terminal()) => {
                let reason = match ended.map(|state| state.link.clone()) {
                    Ok(LinkStatus::Rejected { reason }) => reason,
                    _ => format!("gave up after {RETRIES} reconnection attempts"),
                };
                return Err(CliError::ConnectionFailed { url, reason });
            }
        }
    }

    feed.dispose();
    Ok(())
}
