//! Command dispatch: bridges CLI args -> dashboard resources -> output formatting.

pub mod buildings;
pub mod config_cmd;
pub mod energy;
pub mod equipment;
pub mod hvac;
pub mod iaq;
pub mod kpis;
pub mod live;
pub mod report;
pub mod simulate;
pub mod util;

use twinboard_core::Dashboard;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    dashboard: &Dashboard,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Buildings(args) => buildings::handle(dashboard, args, global).await,
        Command::Energy(args) => energy::handle(dashboard, args, global).await,
        Command::Equipment(args) => equipment::handle(dashboard, args, global).await,
        Command::Alerts => equipment::handle_alerts(dashboard, global).await,
        Command::Hvac => hvac::handle(dashboard, global).await,
        Command::Setpoint(args) => hvac::handle_setpoint(dashboard, args, global).await,
        Command::Iaq(args) => iaq::handle(dashboard, args, global).await,
        Command::Kpis(args) => kpis::handle(dashboard, args, global).await,
        Command::Simulate(args) => simulate::handle(dashboard, args, global).await,
        Command::Live(args) => live::handle(dashboard, args, global).await,
        Command::Report(args) => report::handle(dashboard, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
