//! CLI subcommands — card discovery, layout inspection, mixer control.

mod config_cmd;
mod defaults;
mod detect;
mod devices;
mod dump;
mod monitor;
mod probe;
mod reset;
mod set;
mod solo;

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Subcommand;
use serde::Serialize;

pub(super) use crate::RUNNING;
pub(super) use scarlett_mixer_lib::addressing::{self, ControlId, ControlKind};
pub(super) use scarlett_mixer_lib::config::{Config, HostConfig};
pub(super) use scarlett_mixer_lib::context::ProfileSource;
pub(super) use scarlett_mixer_lib::endpoint::{self, ControlEndpoint, mock::MockEndpoint};
pub(super) use scarlett_mixer_lib::engine::{MixerEngine, TickOutcome, WriteOutcome};
pub(super) use scarlett_mixer_lib::error::{MixerError, Result};
pub(super) use scarlett_mixer_lib::gain;
pub(super) use scarlett_mixer_lib::presenter::{Interaction, Presenter, Value};
pub(super) use scarlett_mixer_lib::profile::DeviceProfile;
pub(super) use scarlett_mixer_lib::reset::ResetReport;
pub(super) use scarlett_mixer_lib::snapshot::ControlSnapshot;

const PADDING: usize = 2;

/// Compute alignment width for a command's key-value output.
/// Ensures at least PADDING spaces after the longest key in either level,
/// with top-level and indent values aligned to the same column.
pub(super) fn kv_width(top: &[&str], indent: &[&str]) -> usize {
    let top_max = top.iter().map(|k| k.len()).max().unwrap_or(0);
    let indent_max = indent.iter().map(|k| k.len()).max().unwrap_or(0);
    let top_need = if top.is_empty() { 0 } else { top_max + PADDING };
    // Indent keys lose 2 chars of inner width to the "  " prefix
    let indent_need = if indent.is_empty() {
        0
    } else {
        indent_max + PADDING + 2
    };
    top_need.max(indent_need)
}

pub(super) fn format_kv(key: &str, value: impl std::fmt::Display, w: usize) -> String {
    format!("{key:<width$}{value}", width = w)
}

pub(super) fn kv(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("{key:<width$}{value}", width = w);
}

pub(super) fn kv_indent(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("  {key:<width$}{value}", width = w - 2);
}

// ── Global options ──

/// `env_logger` default filter for a verbosity level.
pub fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Read the config from `custom_path`, or the default location.
pub fn load_config(custom_path: Option<&Path>) -> (Config, Vec<String>) {
    match custom_path {
        Some(path) => Config::load_from(path),
        None => Config::load_with_warnings(),
    }
}

/// Command-line values that take precedence over the config file.
pub struct Overrides {
    pub device: Option<String>,
    pub preset_only: bool,
    pub verbose: u8,
    pub snapshot: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
}

/// Config file merged with command-line flags.
pub struct GlobalOpts {
    pub config: Config,
    pub config_path: Option<PathBuf>,
    pub snapshot: Option<PathBuf>,
}

impl GlobalOpts {
    pub fn resolve(mut config: Config, overrides: Overrides) -> Self {
        if let Some(device) = overrides.device {
            config.device = device;
        }
        if overrides.preset_only {
            config.autodetect = false;
        }
        config.verbose = overrides.verbose;
        GlobalOpts {
            config,
            config_path: overrides.config_path,
            snapshot: overrides.snapshot,
        }
    }

    pub(super) fn host(&self) -> HostConfig {
        self.config.host()
    }

    pub(super) fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.config.poll_interval_ms)
    }

    fn validate(&self) -> Result<()> {
        self.config.validate().map_err(|errors| {
            let joined: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            MixerError::Config(joined.join("; "))
        })
    }
}

// ── Session ──

/// Hardware when no snapshot is given, otherwise the snapshot's controls.
pub(super) fn open_endpoint(opts: &GlobalOpts) -> Result<Box<dyn ControlEndpoint>> {
    match &opts.snapshot {
        Some(path) => {
            let snapshot = ControlSnapshot::load(path)?;
            log::info!(
                "[cli] using snapshot {} ({} controls)",
                path.display(),
                snapshot.controls.len()
            );
            Ok(Box::new(MockEndpoint::from_snapshot(snapshot)))
        }
        None => Ok(Box::new(endpoint::open_endpoint(&opts.config.device)?)),
    }
}

/// An open engine plus where to save snapshot-backed changes.
pub(super) struct Session {
    pub engine: MixerEngine<Box<dyn ControlEndpoint>>,
    snapshot: Option<PathBuf>,
}

impl Session {
    pub fn open(opts: &GlobalOpts) -> Result<Self> {
        opts.validate()?;
        let endpoint = open_endpoint(opts)?;
        let engine = MixerEngine::open(endpoint, &opts.host())?;
        Ok(Session {
            engine,
            snapshot: opts.snapshot.clone(),
        })
    }

    /// Save the current state back to the snapshot file, if there is one.
    pub fn persist(&self) -> Result<()> {
        if let Some(path) = &self.snapshot {
            ControlSnapshot::capture(self.engine.endpoint())?.save(path)?;
            log::info!("[cli] saved {}", path.display());
        }
        Ok(())
    }
}

/// Human form of a value, e.g. `-6dB`, `muted`, `3 (Analog 3)`.
pub(super) fn describe_value(value: Value, items: &[String]) -> String {
    match value {
        Value::Gain(knob) => gain::format_db(gain::knob_to_db(knob)).trim_start().to_string(),
        Value::Mute(true) => "muted".into(),
        Value::Mute(false) => "live".into(),
        Value::Selector(item) => match items.get(item as usize) {
            Some(name) => format!("{item} ({name})"),
            None => item.to_string(),
        },
        Value::Switch(on) => if on { "on" } else { "off" }.into(),
    }
}

// ── JSON output structs ──

#[derive(Serialize)]
pub(super) struct CardJson {
    pub device: String,
    pub name: String,
}

#[derive(Serialize)]
pub(super) struct DevicesOutput {
    pub count: usize,
    pub cards: Vec<CardJson>,
}

#[derive(Serialize)]
pub(super) struct ProbeOutput {
    pub card_name: String,
    pub device: String,
    pub control_count: usize,
    pub profile_source: ProfileSource,
    pub candidate_missing: Vec<&'static str>,
    pub master_db_range: Option<(i32, i32)>,
    pub profile: DeviceProfile,
}

#[derive(Serialize)]
pub(super) struct DetectOutput {
    pub card_name: String,
    pub control_count: usize,
    pub complete: bool,
    pub missing: Vec<&'static str>,
    pub has_static_profile: bool,
    /// Which profile the mixer would use for this card.
    pub adopted: Option<ProfileSource>,
    pub candidate: DeviceProfile,
}

#[derive(Serialize)]
pub(super) struct ResetOutput {
    pub card_name: String,
    pub total: usize,
    pub report: ResetReport,
}

#[derive(Serialize)]
pub(super) struct WritesOutput {
    pub card_name: String,
    pub writes: usize,
}

#[derive(Serialize)]
pub(super) struct ConfigOutput {
    pub config_file: Option<String>,
    pub config_file_exists: bool,
    pub settings: Config,
    pub problems: Vec<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// List sound cards
    Devices,

    /// Open the card and show the control layout in use
    Probe,

    /// Print the control list, or save it as a snapshot
    Dump {
        /// Write the snapshot JSON to this file
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Derive a layout from a snapshot file (no hardware required)
    Detect {
        /// Snapshot JSON file (from `dump --output`)
        snapshot_file: PathBuf,
    },

    /// Follow the mixer and print every value change
    Monitor {
        /// Stop after this many polls (default: until Ctrl+C)
        #[arg(long)]
        ticks: Option<u64>,
    },

    /// Show the current value of one control
    Get {
        /// capture:R, matrix-source:R, matrix:R:C, bus:N, aux:N, master, output:N, hiz:N, pad:N, air:N
        control: ControlId,
    },

    /// Change one control
    Set {
        /// capture:R, matrix-source:R, matrix:R:C, bus:N, aux:N, master, output:N, hiz:N, pad:N, air:N
        control: ControlId,
        /// dB for gains, item index or name for selectors, on/off for switches, mute/unmute
        #[arg(allow_hyphen_values = true)]
        value: String,
    },

    /// Route only one matrix cell of a row (toggles it between off and 0 dB)
    Solo {
        /// Matrix row (input), 0-based
        row: usize,
        /// Matrix column (mix), 0-based
        col: usize,
    },

    /// Re-send every control value to the card
    Reset,

    /// Restore factory routing and unity gains
    Defaults,

    /// Show current configuration and file paths
    Config,
}

/// Warn if `--json` was passed to a command that doesn't support it.
fn warn_json_unsupported(cmd_name: &str) {
    log::warn!("--json is not supported for `{cmd_name}` (ignored)");
}

pub fn run(cmd: Command, opts: &GlobalOpts, json: bool) -> Result<()> {
    match cmd {
        Command::Devices => devices::cmd_devices(json),
        Command::Probe => probe::cmd_probe(opts, json),
        Command::Dump { output } => dump::cmd_dump(opts, output.as_deref(), json),
        Command::Detect { snapshot_file } => detect::cmd_detect(opts, &snapshot_file, json),
        Command::Monitor { ticks } => {
            if json {
                warn_json_unsupported("monitor");
            }
            monitor::cmd_monitor(opts, ticks)
        }
        Command::Get { control } => {
            if json {
                warn_json_unsupported("get");
            }
            set::cmd_get(opts, control)
        }
        Command::Set { control, value } => {
            if json {
                warn_json_unsupported("set");
            }
            set::cmd_set(opts, control, &value)
        }
        Command::Solo { row, col } => solo::cmd_solo(opts, row, col, json),
        Command::Reset => reset::cmd_reset(opts, json),
        Command::Defaults => defaults::cmd_defaults(opts, json),
        Command::Config => config_cmd::cmd_config(opts, json),
    }
}


#[cfg(test)]
mod option_tests {
    use super::*;

    fn overrides() -> Overrides {
        Overrides {
            device: None,
            preset_only: false,
            verbose: 0,
            snapshot: None,
            config_path: None,
        }
    }

    #[test]
    fn log_filter_levels() {
        assert_eq!(log_filter(0), "warn");
        assert_eq!(log_filter(1), "info");
        assert_eq!(log_filter(2), "debug");
        assert_eq!(log_filter(3), "trace");
        assert_eq!(log_filter(9), "trace");
    }

    #[test]
    fn flags_override_config() {
        let opts = GlobalOpts::resolve(
            Config::default(),
            Overrides {
                device: Some("hw:1".into()),
                preset_only: true,
                verbose: 2,
                ..overrides()
            },
        );
        let host = opts.host();
        assert_eq!(host.device, "hw:1");
        assert!(!host.autodetect);
        assert_eq!(host.verbose, 2);
    }

    #[test]
    fn config_kept_without_flags() {
        let config = Config {
            device: "hw:CARD=USB".into(),
            poll_interval_ms: 20,
            ..Config::default()
        };
        let opts = GlobalOpts::resolve(config, overrides());
        assert_eq!(opts.host().device, "hw:CARD=USB");
        assert!(opts.host().autodetect);
        assert_eq!(opts.poll_interval(), Duration::from_millis(20));
    }

    #[test]
    fn invalid_config_is_rejected_at_open() {
        let config = Config {
            device: " ".into(),
            ..Config::default()
        };
        let opts = GlobalOpts::resolve(config, overrides());
        let err = Session::open(&opts).err().unwrap();
        assert!(matches!(err, MixerError::Config(_)));
    }

    #[test]
    fn missing_config_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (config, warnings) = load_config(Some(&dir.path().join("absent.toml")));
        assert_eq!(config, Config::default());
        assert!(warnings.is_empty());
    }
}
