//! Host configuration — TOML-based, platform-aware paths.
//!
//! The file is optional and read-only from the mixer's point of view:
//! a missing file gives defaults, a malformed one gives defaults plus a
//! warning. Command-line flags override what it says.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Card used when nothing else is specified.
pub const DEFAULT_DEVICE: &str = "hw:2";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// ALSA device of the card. Default: "hw:2".
    #[serde(default = "default_device")]
    pub device: String,

    /// Derive the control layout from control names. Default: true.
    /// When false, only the static model table is used.
    #[serde(default = "default_true")]
    pub autodetect: bool,

    /// Log verbosity: 0 warnings, 1 info, 2 debug (plus control dump), 3 trace.
    #[serde(default)]
    pub verbose: u8,

    /// How often the monitor loop checks for hardware events.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_device() -> String {
    DEFAULT_DEVICE.into()
}

fn default_true() -> bool {
    true
}

fn default_poll_interval_ms() -> u64 {
    50
}

impl Default for Config {
    fn default() -> Self {
        Config {
            device: default_device(),
            autodetect: true,
            verbose: 0,
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// What the engine needs to know about its host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostConfig {
    pub device: String,
    pub autodetect: bool,
    pub verbose: u8,
}

impl Default for HostConfig {
    fn default() -> Self {
        Config::default().host()
    }
}

/// Validation errors that [`Config::validate`] can return.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The `device` field is empty or whitespace-only.
    EmptyDevice,
    /// `poll_interval_ms` is zero.
    ZeroPollInterval,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyDevice => write!(f, "Device cannot be empty"),
            ValidationError::ZeroPollInterval => {
                write!(f, "poll_interval_ms must be greater than zero")
            }
        }
    }
}

impl Config {
    /// Platform-specific config directory.
    pub fn dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("scarlett-mixer"))
    }

    /// Full path to config file.
    pub fn path() -> Option<PathBuf> {
        Self::dir().map(|d| d.join("config.toml"))
    }

    /// Load config from disk, or return defaults if not found.
    pub fn load() -> Self {
        let (config, warnings) = Self::load_with_warnings();
        for w in &warnings {
            log::warn!("{w}");
        }
        config
    }

    /// Load config from an arbitrary path, returning the config and any parse warnings.
    ///
    /// Returns `(defaults, [])` if the file doesn't exist.
    /// Returns `(defaults, [warning])` if the file exists but can't be parsed.
    pub fn load_from(path: &Path) -> (Self, Vec<String>) {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => (config, vec![]),
                Err(e) => {
                    let warning = format!(
                        "config parse error ({}), using defaults: {e}",
                        path.display()
                    );
                    (Self::default(), vec![warning])
                }
            },
            Err(_) => (Self::default(), vec![]),
        }
    }

    /// Load config from the default path, returning the config and any parse warnings.
    pub fn load_with_warnings() -> (Self, Vec<String>) {
        let Some(path) = Self::path() else {
            return (Self::default(), vec![]);
        };
        Self::load_from(&path)
    }

    /// Check field values. Returns every problem found.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        if self.device.trim().is_empty() {
            errors.push(ValidationError::EmptyDevice);
        }
        if self.poll_interval_ms == 0 {
            errors.push(ValidationError::ZeroPollInterval);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// The subset the engine consumes.
    pub fn host(&self) -> HostConfig {
        HostConfig {
            device: self.device.trim().to_string(),
            autodetect: self.autodetect,
            verbose: self.verbose,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = Config::default();
        assert_eq!(c.device, "hw:2");
        assert!(c.autodetect);
        assert_eq!(c.verbose, 0);
        assert_eq!(c.poll_interval_ms, 50);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn host_config_defaults_match() {
        let h = HostConfig::default();
        assert_eq!(h.device, "hw:2");
        assert!(h.autodetect);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let c: Config = toml::from_str("device = \"hw:1\"\n").unwrap();
        assert_eq!(c.device, "hw:1");
        assert!(c.autodetect);
        assert_eq!(c.poll_interval_ms, 50);
    }

    #[test]
    fn full_toml() {
        let toml = r#"
            device = "hw:CARD=USB"
            autodetect = false
            verbose = 2
            poll_interval_ms = 20
        "#;
        let c: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            c.host(),
            HostConfig {
                device: "hw:CARD=USB".into(),
                autodetect: false,
                verbose: 2,
            }
        );
        assert_eq!(c.poll_interval_ms, 20);
    }

    #[test]
    fn load_from_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (c, warnings) = Config::load_from(&dir.path().join("nope.toml"));
        assert_eq!(c, Config::default());
        assert!(warnings.is_empty());
    }

    #[test]
    fn load_from_malformed_file_warns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "device = [not a string").unwrap();
        let (c, warnings) = Config::load_from(&path);
        assert_eq!(c, Config::default());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("config parse error"));
    }

    #[test]
    fn load_from_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "verbose = 3\nautodetect = false\n").unwrap();
        let (c, warnings) = Config::load_from(&path);
        assert!(warnings.is_empty());
        assert_eq!(c.verbose, 3);
        assert!(!c.autodetect);
    }

    #[test]
    fn validate_reports_every_problem() {
        let c = Config {
            device: "  ".into(),
            poll_interval_ms: 0,
            ..Config::default()
        };
        let errors = c.validate().unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::EmptyDevice, ValidationError::ZeroPollInterval]
        );
        assert_eq!(errors[0].to_string(), "Device cannot be empty");
    }

    #[test]
    fn host_trims_device() {
        let c = Config {
            device: " hw:3 ".into(),
            ..Config::default()
        };
        assert_eq!(c.host().device, "hw:3");
    }

    #[test]
    fn config_path_ends_with_file_name() {
        if let Some(path) = Config::path() {
            assert!(path.ends_with("scarlett-mixer/config.toml"));
        }
    }
}
