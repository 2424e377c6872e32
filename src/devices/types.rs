//! Device record and the value types used to create and edit devices.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::energy::energy_kwh;

/// Icon shown next to a device card.
///
/// A closed set: unrecognised names resolve to [`DeviceIcon::Plug`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum DeviceIcon {
    Thermometer,
    Wind,
    Flame,
    Droplets,
    #[default]
    Plug,
}

impl DeviceIcon {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Thermometer => "Thermometer",
            Self::Wind => "Wind",
            Self::Flame => "Flame",
            Self::Droplets => "Droplets",
            Self::Plug => "Plug",
        }
    }
}

impl FromStr for DeviceIcon {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "thermometer" => Self::Thermometer,
            "wind" => Self::Wind,
            "flame" => Self::Flame,
            "droplets" => Self::Droplets,
            _ => Self::Plug,
        })
    }
}

impl From<String> for DeviceIcon {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(icon) => icon,
            Err(never) => match never {},
        }
    }
}

impl fmt::Display for DeviceIcon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tracked appliance.
///
/// Records are only ever mutated by [`DeviceRegistry`](super::DeviceRegistry), which
/// maintains these invariants:
///
/// - `active_seconds == 0` whenever `is_active` is false
/// - `is_exceeding` implies `is_active`
/// - `total_energy_kwh` never decreases
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Stable unique identifier.
    pub id: String,
    /// Display label, 1-50 characters, trimmed.
    pub name: String,
    pub icon: DeviceIcon,
    /// Rated draw (W).
    pub power_watts: f64,
    /// Soft energy ceiling used for the usage gauge (kWh).
    pub healthy_limit_kwh: f64,
    /// Minutes of continuous activity before the device counts as exceeding.
    pub max_active_minutes: u32,
    pub is_active: bool,
    /// Elapsed seconds in the current session.
    pub active_seconds: u64,
    /// Energy from all completed sessions (kWh).
    pub total_energy_kwh: f64,
    pub is_exceeding: bool,
    /// User-created devices may be edited and removed; built-ins may not.
    pub is_custom: bool,
}

impl Device {
    /// Whether edit and remove operations may touch this record.
    pub fn is_editable(&self) -> bool {
        self.is_custom
    }

    /// Energy drawn by the in-progress session, or zero when idle.
    pub fn session_energy_kwh(&self) -> f64 {
        if self.is_active {
            energy_kwh(self.power_watts, self.active_seconds)
        } else {
            0.0
        }
    }

    /// Completed sessions plus the in-progress one.
    pub fn current_energy_kwh(&self) -> f64 {
        self.total_energy_kwh + self.session_energy_kwh()
    }

    /// Seconds after which an active session counts as exceeding.
    pub fn max_active_seconds(&self) -> u64 {
        u64::from(self.max_active_minutes) * 60
    }

    pub fn is_over_healthy_limit(&self) -> bool {
        self.current_energy_kwh() > self.healthy_limit_kwh
    }

    /// Current energy as a share of the healthy limit, capped at 100.
    pub fn healthy_usage_percent(&self) -> f64 {
        if self.healthy_limit_kwh <= 0.0 {
            return 100.0;
        }
        (self.current_energy_kwh() / self.healthy_limit_kwh * 100.0).min(100.0)
    }

    /// Session time as a share of the time limit, capped at 100; zero when idle.
    pub fn time_limit_percent(&self) -> f64 {
        let max = self.max_active_seconds();
        if !self.is_active || max == 0 {
            return 0.0;
        }
        (self.active_seconds as f64 / max as f64 * 100.0).min(100.0)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match (self.is_active, self.is_exceeding) {
            (true, true) => "EXCEEDING",
            (true, false) => "on",
            (false, _) => "off",
        };
        write!(
            f,
            "{:<20} {:>9} | {:>7.0} W | {:>8} / {:>3}m | {:.3} kWh ({:.0}% of {} kWh)",
            self.name,
            state,
            self.power_watts,
            format_active_time(self.active_seconds),
            self.max_active_minutes,
            self.current_energy_kwh(),
            self.healthy_usage_percent(),
            self.healthy_limit_kwh,
        )
    }
}

/// Formats a session length as `MM:SS`, or `H:MM:SS` from one hour up.
pub fn format_active_time(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}

/// Fields for a user-created device, validated by the registry on add.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDevice {
    pub name: String,
    pub power_watts: f64,
    pub healthy_limit_kwh: f64,
}

impl NewDevice {
    pub fn new(name: impl Into<String>, power_watts: f64, healthy_limit_kwh: f64) -> Self {
        Self {
            name: name.into(),
            power_watts,
            healthy_limit_kwh,
        }
    }
}

/// Partial update for a custom device. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceUpdate {
    pub name: Option<String>,
    pub power_watts: Option<f64>,
    pub healthy_limit_kwh: Option<f64>,
}

impl DeviceUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.power_watts.is_none() && self.healthy_limit_kwh.is_none()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn heater() -> Device {
        Device {
            id: "heater".into(),
            name: "Electric Heater".into(),
            icon: DeviceIcon::Flame,
            power_watts: 1500.0,
            healthy_limit_kwh: 3.0,
            max_active_minutes: 45,
            is_active: false,
            active_seconds: 0,
            total_energy_kwh: 0.0,
            is_exceeding: false,
            is_custom: false,
        }
    }

    #[test]
    fn idle_device_has_no_session_energy() {
        let mut d = heater();
        d.total_energy_kwh = 1.25;
        assert_eq!(d.session_energy_kwh(), 0.0);
        assert_eq!(d.current_energy_kwh(), 1.25);
    }

    #[test]
    fn active_device_adds_session_energy() {
        let mut d = heater();
        d.is_active = true;
        d.active_seconds = 1800;
        d.total_energy_kwh = 1.0;
        assert_relative_eq!(d.current_energy_kwh(), 1.75, epsilon = 1e-12);
    }

    #[test]
    fn healthy_gauge_caps_at_hundred() {
        let mut d = heater();
        d.total_energy_kwh = 1.5;
        assert_relative_eq!(d.healthy_usage_percent(), 50.0, epsilon = 1e-9);
        assert!(!d.is_over_healthy_limit());
        d.total_energy_kwh = 6.0;
        assert_eq!(d.healthy_usage_percent(), 100.0);
        assert!(d.is_over_healthy_limit());
    }

    #[test]
    fn time_gauge_is_zero_when_idle() {
        let mut d = heater();
        assert_eq!(d.time_limit_percent(), 0.0);
        d.is_active = true;
        d.active_seconds = 45 * 30;
        assert_relative_eq!(d.time_limit_percent(), 50.0, epsilon = 1e-9);
    }

    #[test]
    fn active_time_formatting() {
        assert_eq!(format_active_time(0), "00:00");
        assert_eq!(format_active_time(75), "01:15");
        assert_eq!(format_active_time(3600), "1:00:00");
        assert_eq!(format_active_time(3725), "1:02:05");
    }

    #[test]
    fn unknown_icon_falls_back_to_plug() {
        assert_eq!(DeviceIcon::from("Rocket".to_string()), DeviceIcon::Plug);
        assert_eq!(DeviceIcon::from("wind".to_string()), DeviceIcon::Wind);
    }

    #[test]
    fn display_does_not_panic() {
        let s = format!("{}", heater());
        assert!(s.contains("Electric Heater"));
    }

    #[test]
    fn empty_update() {
        assert!(DeviceUpdate::default().is_empty());
        let update = DeviceUpdate {
            power_watts: Some(10.0),
            ..DeviceUpdate::default()
        };
        assert!(!update.is_empty());
    }
}
