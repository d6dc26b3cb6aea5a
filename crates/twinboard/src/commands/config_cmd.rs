//! Config subcommand handlers. None of these touch the backend.

use twinboard_config::{self as config, Preferences};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

fn show(cfg: &config::Config) -> String {
    output::detail_lines(&[
        ("api_url", cfg.api_url.clone()),
        ("default_building", cfg.default_building.clone()),
        (
            "timeout",
            cfg.timeout.map_or_else(|| "none".into(), |t| format!("{t}s")),
        ),
        ("output", cfg.output.clone()),
        ("color", cfg.color.clone()),
    ])
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let mut cfg = config::load_config()?;
            // Flags win over file and environment, as they do for commands
            if let Some(url) = &global.api_url {
                cfg.api_url.clone_from(url);
            }
            if let Some(building) = &global.building {
                cfg.default_building.clone_from(building);
            }
            if let Some(timeout) = global.timeout {
                cfg.timeout = Some(timeout);
            }
            let out = output::render_single(&global.output, &cfg, show, |c| c.api_url.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Theme { theme: None } => {
            let prefs = config::load_preferences()?;
            output::print_output(&prefs.theme.to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Theme { theme: Some(theme) } => {
            config::save_preferences(&Preferences { theme })?;
            tracing::debug!(path = %config::preferences_path().display(), %theme, "theme saved");
            output::print_output(&theme.to_string(), global.quiet);
            Ok(())
        }
    }
}
