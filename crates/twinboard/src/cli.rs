//! Clap derive structures for the `twinboard` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};

use twinboard_config::{Config, ConfigError, Theme};
use twinboard_core::{
    HvacMode, KpiPeriod, ReportPeriod, Resolution, ScenarioType, SimulationMode, flexible_datetime,
};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// twinboard -- building digital-twin dashboard for the terminal
#[derive(Debug, Parser)]
#[command(
    name = "twinboard",
    version,
    about = "Monitor and simulate buildings from the command line",
    long_about = "Terminal dashboard for a building digital twin.\n\n\
        Shows energy, HVAC, air quality, equipment and KPIs for the selected\n\
        building, and runs what-if simulations against the twin.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend API base URL, including /api/v1 (overrides config)
    #[arg(long, env = "TWINBOARD_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Building to show (defaults to the configured building)
    #[arg(long, short = 'b', env = "TWINBOARD_BUILDING", global = true)]
    pub building: Option<String>,

    /// Output format [default: table, or `output` from the config file]
    #[arg(
        long = "output",
        short = 'o',
        env = "TWINBOARD_OUTPUT",
        value_name = "FORMAT",
        global = true
    )]
    output_flag: Option<OutputFormat>,

    /// When to use color output [default: auto, or `color` from the config file]
    #[arg(long = "color", value_name = "WHEN", global = true)]
    color_flag: Option<ColorMode>,

    /// Effective output format, settled by [`GlobalOpts::resolve_display`].
    #[arg(skip)]
    pub output: OutputFormat,

    /// Effective color mode, settled by [`GlobalOpts::resolve_display`].
    #[arg(skip)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds (none by default)
    #[arg(long, env = "TWINBOARD_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

impl GlobalOpts {
    /// Settle the output format and color mode: a flag (or its env var)
    /// wins, then the config file.
    pub fn resolve_display(&mut self, cfg: &Config) -> Result<(), ConfigError> {
        self.output = match &self.output_flag {
            Some(format) => format.clone(),
            None => parse_setting("output", &cfg.output)?,
        };
        self.color = match &self.color_flag {
            Some(mode) => mode.clone(),
            None => parse_setting("color", &cfg.color)?,
        };
        Ok(())
    }
}

fn parse_setting<T: ValueEnum>(field: &str, value: &str) -> Result<T, ConfigError> {
    T::from_str(value, true).map_err(|reason| ConfigError::Validation {
        field: field.into(),
        reason,
    })
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    #[default]
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List and inspect buildings
    #[command(alias = "b")]
    Buildings(BuildingsArgs),

    /// Energy consumption for the selected building
    #[command(alias = "e")]
    Energy(EnergyArgs),

    /// Equipment health and maintenance
    #[command(alias = "eq")]
    Equipment(EquipmentArgs),

    /// Active and recent alerts
    Alerts,

    /// HVAC zones
    Hvac,

    /// Indoor air quality and thermal comfort
    Iaq(IaqArgs),

    /// Key performance indicators
    Kpis(KpisArgs),

    /// Change a zone setpoint
    Setpoint(SetpointArgs),

    /// Digital-twin simulations
    #[command(alias = "sim")]
    Simulate(SimulateArgs),

    /// Stream live sensor updates and alerts for the selected building
    Live(LiveArgs),

    /// Download the PDF report
    Report(ReportArgs),

    /// Manage CLI configuration and preferences
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Buildings ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct BuildingsArgs {
    #[command(subcommand)]
    pub command: BuildingsCommand,
}

#[derive(Debug, Subcommand)]
pub enum BuildingsCommand {
    /// List all buildings
    #[command(alias = "ls")]
    List,

    /// Show one building (the selected one by default)
    Show {
        /// Building ID
        id: Option<String>,
    },
}

// ── Energy ───────────────────────────────────────────────────────────

fn parse_datetime(raw: &str) -> Result<DateTime<Utc>, String> {
    flexible_datetime::parse(raw)
        .ok_or_else(|| format!("expected an ISO-8601 timestamp, got '{raw}'"))
}

#[derive(Debug, Args)]
pub struct EnergyArgs {
    /// Start of the range (ISO-8601)
    #[arg(long, value_parser = parse_datetime)]
    pub from: Option<DateTime<Utc>>,

    /// End of the range (ISO-8601)
    #[arg(long, value_parser = parse_datetime)]
    pub to: Option<DateTime<Utc>>,

    /// Data resolution: hourly, daily, monthly
    #[arg(long, short = 'r')]
    pub resolution: Option<Resolution>,

    /// Show daily totals instead of the 24-hour chart
    #[arg(long)]
    pub daily: bool,
}

// ── Equipment ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct EquipmentArgs {
    /// Only equipment in alarm or warning
    #[arg(long, conflicts_with = "maintenance_days")]
    pub faults: bool,

    /// Only equipment due for maintenance within N days
    #[arg(long, value_name = "DAYS")]
    pub maintenance_days: Option<u32>,
}

// ── IAQ ──────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct IaqArgs {
    /// Show an N-hour trend for one zone
    #[arg(long, value_name = "HOURS", value_parser = clap::value_parser!(u32).range(1..=168))]
    pub trend_hours: Option<u32>,

    /// Zone for the trend (first zone by default)
    #[arg(long, requires = "trend_hours")]
    pub zone: Option<String>,

    /// Seed for the trend padding (random by default)
    #[arg(long, requires = "trend_hours")]
    pub seed: Option<u64>,
}

// ── KPIs ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct KpisArgs {
    /// Period: today, week, month, year
    #[arg(long, short = 'p')]
    pub period: Option<KpiPeriod>,
}

// ── Setpoint ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SetpointArgs {
    /// Zone ID
    #[arg(long, short = 'z')]
    pub zone: String,

    /// Target temperature in Celsius (16-30)
    #[arg(long, short = 't')]
    pub temperature: Option<f64>,

    /// Target humidity in percent (30-70)
    #[arg(long)]
    pub humidity: Option<f64>,

    /// Mode: cooling, heating, auto, off
    #[arg(long, short = 'm')]
    pub mode: Option<HvacMode>,
}

// ── Simulation ───────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SimulateArgs {
    #[command(subcommand)]
    pub command: SimulateCommand,
}

#[derive(Debug, Subcommand)]
pub enum SimulateCommand {
    /// List available what-if scenarios
    Scenarios,

    /// Run a scenario against the selected building
    Run {
        /// Scenario ID
        scenario: String,

        /// Simulated duration in hours
        #[arg(long, default_value = "24", value_parser = clap::value_parser!(u32).range(1..=168))]
        hours: u32,
    },

    /// Run a user-defined scenario
    Custom {
        /// Scenario family, e.g. setpoint_change or demand_response
        kind: ScenarioType,

        /// Scenario parameter as KEY=VALUE (repeatable); JSON values are parsed
        #[arg(long = "param", short = 'p', value_name = "KEY=VALUE", value_parser = parse_param)]
        params: Vec<(String, serde_json::Value)>,

        /// Simulated duration in hours (backend default when unset)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=168))]
        hours: Option<u32>,
    },

    /// Free-run the thermal model at a fixed setpoint
    Thermal {
        /// Setpoint in Celsius
        #[arg(long, default_value = "22.0")]
        setpoint: f64,

        /// HVAC mode: off, heat, cool, auto
        #[arg(long, default_value = "auto")]
        mode: SimulationMode,

        /// Simulated duration in hours
        #[arg(long, default_value = "24", value_parser = clap::value_parser!(u32).range(1..=168))]
        hours: u32,
    },

    /// Status of the simulation models
    Models,

    /// First twelve hours of an MPC schedule, with backend defaults
    QuickMpc {
        /// Current indoor temperature in Celsius
        #[arg(long)]
        current_temp: Option<f64>,

        /// Preferred setpoint in Celsius
        #[arg(long)]
        setpoint: Option<f64>,
    },

    /// Optimize HVAC setpoints with model-predictive control
    Mpc {
        /// Current indoor temperature in Celsius
        #[arg(long, default_value = "23.0")]
        current_temp: f64,

        /// Preferred setpoint in Celsius
        #[arg(long, default_value = "22.0")]
        setpoint: f64,

        /// Horizon in hours
        #[arg(long, default_value = "24", value_parser = clap::value_parser!(u32).range(1..=48))]
        horizon: u32,
    },

    /// Forecast energy consumption
    Forecast {
        /// Horizon in hours
        #[arg(long, default_value = "24", value_parser = clap::value_parser!(u32).range(1..=168))]
        horizon: u32,

        /// Overlay a placeholder "observed" series on the first N hours
        #[arg(long, default_value = "0")]
        observed_hours: usize,

        /// Seed for the observed overlay (random by default)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Return on investment of an optimization project
    Roi {
        /// Annual energy consumption in kWh
        #[arg(long)]
        annual_kwh: f64,

        /// Electricity price in EUR/kWh
        #[arg(long)]
        price: Option<f64>,

        /// Expected savings in percent
        #[arg(long)]
        savings: Option<f64>,

        /// Implementation cost in EUR
        #[arg(long)]
        cost: Option<f64>,

        /// Annual maintenance cost in EUR
        #[arg(long)]
        maintenance: Option<f64>,
    },
}

fn parse_param(raw: &str) -> Result<(String, serde_json::Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    if key.is_empty() {
        return Err(format!("missing key in '{raw}'"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| value.into());
    Ok((key.to_owned(), value))
}

// ── Live ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LiveArgs {
    /// Stop after N sensor updates and alerts
    #[arg(long, short = 'n', default_value = "5", value_parser = clap::value_parser!(u64).range(1..))]
    pub count: u64,
}

// ── Report ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Period: week, month, quarter, year
    #[arg(long, short = 'p', default_value = "month")]
    pub period: ReportPeriod,

    /// Output file (defaults to <building>-<period>-report.pdf)
    #[arg(long)]
    pub out: Option<PathBuf>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Print the config file path
    Path,

    /// Show or set the UI theme
    Theme {
        /// light or dark
        theme: Option<Theme>,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
