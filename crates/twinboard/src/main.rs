mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use twinboard_config::Config;
use twinboard_core::{Dashboard, DashboardConfig};

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(mut cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands never touch the backend, and a broken config
        // file must not stop them from reporting where it lives.
        Command::Config(args) => {
            let cfg = twinboard_config::load_config().unwrap_or_default();
            if let Err(err) = cli.global.resolve_display(&cfg) {
                tracing::warn!(error = %err, "ignoring configured display settings");
                cli.global.resolve_display(&Config::default())?;
            }
            commands::config_cmd::handle(args, &cli.global)
        }

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "twinboard", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let cfg = twinboard_config::load_config()?;
            cli.global.resolve_display(&cfg)?;
            let dashboard = Dashboard::new(build_dashboard_config(cfg, &cli.global)?)?;
            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &dashboard, &cli.global).await
        }
    }
}

/// Config file + environment, then CLI flag overrides.
fn build_dashboard_config(
    mut cfg: Config,
    global: &GlobalOpts,
) -> Result<DashboardConfig, CliError> {
    if let Some(url) = &global.api_url {
        cfg.api_url.clone_from(url);
    }
    if let Some(timeout) = global.timeout {
        cfg.timeout = Some(timeout);
    }
    if let Some(building) = &global.building {
        cfg.default_building.clone_from(building);
    }
    Ok(cfg.to_dashboard_config()?)
}
