//! TOML-based monitor configuration and preset definitions.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::devices::validation::{
    validate_healthy_limit_kwh, validate_max_active_minutes, validate_name, validate_power_watts,
};
use crate::devices::{SeedDevice, builtin_devices};
pub use crate::error::ConfigError;
use crate::storage::history::DEFAULT_HISTORY_CAPACITY;
use crate::storage::rate::DEFAULT_RATE_PER_KWH;

/// Top-level configuration parsed from TOML.
///
/// All fields have defaults matching the household preset. Load from
/// TOML with [`MonitorConfig::from_toml_file`] or use
/// [`MonitorConfig::household`] for the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonitorConfig {
    /// Driver timing, history bound and default rate.
    #[serde(default)]
    pub monitor: TimingConfig,
    /// Where persisted state lives.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Built-in devices present at startup.
    #[serde(default = "builtin_devices")]
    pub devices: Vec<SeedDevice>,
}

/// Driver timing, history bound and default rate.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimingConfig {
    /// Seconds between device timer ticks (must be > 0).
    pub tick_interval_secs: u64,
    /// Seconds between history snapshots (must be > 0).
    pub sample_interval_secs: u64,
    /// Maximum number of retained snapshots (must be > 0).
    pub history_capacity: usize,
    /// Rate used until one is stored ($/kWh, >= 0).
    pub default_rate_per_kwh: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 1,
            sample_interval_secs: 60,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            default_rate_per_kwh: DEFAULT_RATE_PER_KWH,
        }
    }
}

/// Persistence backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One JSON file per key under `data_dir`.
    #[default]
    File,
    /// Nothing survives a restart.
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            data_dir: PathBuf::from(".electrack"),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::household()
    }
}

impl MonitorConfig {
    /// The four built-in household appliances.
    pub fn household() -> Self {
        Self {
            monitor: TimingConfig::default(),
            storage: StorageConfig::default(),
            devices: builtin_devices(),
        }
    }

    /// No built-in devices; everything is user-added.
    pub fn empty() -> Self {
        Self {
            devices: Vec::new(),
            ..Self::household()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["household", "empty"];

    /// Loads configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "household" => Ok(Self::household()),
            "empty" => Ok(Self::empty()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let m = &self.monitor;

        if m.tick_interval_secs == 0 {
            errors.push(ConfigError {
                field: "monitor.tick_interval_secs".into(),
                message: "must be > 0".into(),
            });
        }
        if m.sample_interval_secs == 0 {
            errors.push(ConfigError {
                field: "monitor.sample_interval_secs".into(),
                message: "must be > 0".into(),
            });
        }
        if m.history_capacity == 0 {
            errors.push(ConfigError {
                field: "monitor.history_capacity".into(),
                message: "must be > 0".into(),
            });
        }
        if !m.default_rate_per_kwh.is_finite() || m.default_rate_per_kwh < 0.0 {
            errors.push(ConfigError {
                field: "monitor.default_rate_per_kwh".into(),
                message: "must be a number >= 0".into(),
            });
        }

        let mut seen = HashSet::new();
        for (i, seed) in self.devices.iter().enumerate() {
            let field = |name: &str| format!("devices[{i}].{name}");
            if seed.id.trim().is_empty() {
                errors.push(ConfigError {
                    field: field("id"),
                    message: "must not be empty".into(),
                });
            } else if !seen.insert(seed.id.as_str()) {
                errors.push(ConfigError {
                    field: field("id"),
                    message: format!("duplicate id \"{}\"", seed.id),
                });
            }
            let checks = [
                validate_name(&seed.name).err(),
                validate_power_watts(seed.power_watts).err(),
                validate_healthy_limit_kwh(seed.healthy_limit_kwh).err(),
                validate_max_active_minutes(seed.max_active_minutes).err(),
            ];
            for e in checks.into_iter().flatten() {
                errors.push(ConfigError {
                    field: field(e.field),
                    message: e.message,
                });
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::{DeviceIcon, DeviceRegistry};

    #[test]
    fn household_preset_valid() {
        let cfg = MonitorConfig::household();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "household should be valid: {errors:?}");
        assert_eq!(cfg.devices.len(), 4);
    }

    #[test]
    fn from_preset_unknown() {
        let err = MonitorConfig::from_preset("nonexistent");
        assert!(err.is_err());
        let e = err.err().map(|e| e.message).unwrap_or_default();
        assert!(e.contains("unknown preset"));
    }

    #[test]
    fn all_presets_are_valid() {
        for name in MonitorConfig::PRESETS {
            let cfg = MonitorConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[monitor]
tick_interval_secs = 2
sample_interval_secs = 30
history_capacity = 100
default_rate_per_kwh = 0.21

[storage]
backend = "memory"
data_dir = "/tmp/electrack"

[[devices]]
id = "fridge"
name = "Fridge"
icon = "Thermometer"
power_watts = 150.0
healthy_limit_kwh = 1.5
max_active_minutes = 240

[[devices]]
id = "kettle"
name = "Kettle"
icon = "Teapot"
power_watts = 2200.0
healthy_limit_kwh = 0.5
"#;
        let cfg = MonitorConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.monitor.tick_interval_secs), Some(2));
        assert_eq!(
            cfg.as_ref().map(|c| c.storage.backend),
            Some(StorageBackend::Memory)
        );
        assert_eq!(cfg.as_ref().map(|c| c.devices.len()), Some(2));
        let kettle = cfg.as_ref().and_then(|c| c.devices.get(1));
        assert_eq!(kettle.map(|d| d.icon), Some(DeviceIcon::Plug));
        assert_eq!(kettle.map(|d| d.max_active_minutes), Some(60));
        assert!(cfg.map(|c| c.validate()).unwrap_or_default().is_empty());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r"
[monitor]
sample_interval_secs = 10
";
        let cfg = MonitorConfig::from_toml_str(toml).ok();
        assert_eq!(cfg.as_ref().map(|c| c.monitor.sample_interval_secs), Some(10));
        assert_eq!(cfg.as_ref().map(|c| c.monitor.tick_interval_secs), Some(1));
        assert_eq!(
            cfg.as_ref().map(|c| c.monitor.history_capacity),
            Some(10_080)
        );
        assert_eq!(cfg.as_ref().map(|c| c.devices.len()), Some(4));
    }

    #[test]
    fn padded_device_names_load_trimmed() {
        let toml = r#"
[[devices]]
id = "fridge"
name = "  Fridge  "
power_watts = 150.0
healthy_limit_kwh = 1.5
"#;
        let cfg = MonitorConfig::from_toml_str(toml).ok();
        assert!(cfg.as_ref().is_some_and(|c| c.validate().is_empty()));
        let registry = DeviceRegistry::from_seeds(&cfg.map(|c| c.devices).unwrap_or_default());
        assert_eq!(registry.get("fridge").map(|d| d.name.as_str()), Some("Fridge"));
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r"
[monitor]
bogus_field = true
";
        assert!(MonitorConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn validation_catches_zero_intervals() {
        let mut cfg = MonitorConfig::household();
        cfg.monitor.tick_interval_secs = 0;
        cfg.monitor.sample_interval_secs = 0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "monitor.tick_interval_secs"));
        assert!(errors.iter().any(|e| e.field == "monitor.sample_interval_secs"));
    }

    #[test]
    fn validation_catches_negative_rate() {
        let mut cfg = MonitorConfig::household();
        cfg.monitor.default_rate_per_kwh = -0.1;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "monitor.default_rate_per_kwh"));
    }

    #[test]
    fn validation_catches_bad_devices() {
        let mut cfg = MonitorConfig::household();
        cfg.devices[1].id = cfg.devices[0].id.clone();
        cfg.devices[2].power_watts = 0.0;
        cfg.devices[3].max_active_minutes = 1000;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "devices[1].id"));
        assert!(errors.iter().any(|e| e.field == "devices[2].power_watts"));
        assert!(errors.iter().any(|e| e.field == "devices[3].max_active_minutes"));
    }
}
