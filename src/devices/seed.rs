//! Built-in devices present at startup.

use serde::Deserialize;

use super::types::{Device, DeviceIcon};

/// Description of a built-in device, as listed in configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedDevice {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: DeviceIcon,
    pub power_watts: f64,
    pub healthy_limit_kwh: f64,
    #[serde(default = "default_max_active_minutes")]
    pub max_active_minutes: u32,
}

/// Default time ceiling for new devices (minutes).
pub const DEFAULT_MAX_ACTIVE_MINUTES: u32 = 60;

fn default_max_active_minutes() -> u32 {
    DEFAULT_MAX_ACTIVE_MINUTES
}

impl SeedDevice {
    fn builtin(
        id: &str,
        name: &str,
        icon: DeviceIcon,
        power_watts: f64,
        healthy_limit_kwh: f64,
        max_active_minutes: u32,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            icon,
            power_watts,
            healthy_limit_kwh,
            max_active_minutes,
        }
    }

    /// Builds an idle, non-editable device record with a trimmed name.
    pub fn to_device(&self) -> Device {
        Device {
            id: self.id.clone(),
            name: self.name.trim().to_string(),
            icon: self.icon,
            power_watts: self.power_watts,
            healthy_limit_kwh: self.healthy_limit_kwh,
            max_active_minutes: self.max_active_minutes,
            is_active: false,
            active_seconds: 0,
            total_energy_kwh: 0.0,
            is_exceeding: false,
            is_custom: false,
        }
    }
}

/// The four household appliances tracked out of the box.
pub fn builtin_devices() -> Vec<SeedDevice> {
    vec![
        SeedDevice::builtin("thermostat", "Thermostat", DeviceIcon::Thermometer, 500.0, 2.0, 60),
        SeedDevice::builtin("ac", "Air Conditioner", DeviceIcon::Wind, 3500.0, 8.0, 120),
        SeedDevice::builtin("heater", "Electric Heater", DeviceIcon::Flame, 1500.0, 3.0, 45),
        SeedDevice::builtin(
            "water-heater",
            "Water Heater",
            DeviceIcon::Droplets,
            4500.0,
            5.0,
            30,
        ),
    ]
}
