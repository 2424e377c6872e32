//! Aggregate usage figures derived from a device collection.

use std::fmt;

use serde::Serialize;

use crate::devices::Device;

/// Sum of every device's current displayable energy (kWh).
pub fn total_energy_kwh(devices: &[Device]) -> f64 {
    devices.iter().map(Device::current_energy_kwh).sum()
}

/// Cost of `total_energy_kwh` at `rate_per_kwh`.
pub fn total_cost(devices: &[Device], rate_per_kwh: f64) -> f64 {
    total_energy_kwh(devices) * rate_per_kwh
}

pub fn active_count(devices: &[Device]) -> usize {
    devices.iter().filter(|d| d.is_active).count()
}

/// Instantaneous draw of all active devices (W).
pub fn current_draw_watts(devices: &[Device]) -> f64 {
    devices
        .iter()
        .filter(|d| d.is_active)
        .map(|d| d.power_watts)
        .sum()
}

/// Summary figures shown above the device list.
///
/// Computed on demand from a device snapshot; never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageSummary {
    /// Total energy used across devices (kWh).
    pub total_energy_kwh: f64,
    /// `total_energy_kwh * rate_per_kwh` ($).
    pub total_cost: f64,
    pub rate_per_kwh: f64,
    pub active_devices: usize,
    pub exceeding_devices: usize,
    /// Instantaneous draw of active devices (W).
    pub current_draw_watts: f64,
}

impl UsageSummary {
    pub fn from_devices(devices: &[Device], rate_per_kwh: f64) -> Self {
        let total_energy_kwh = total_energy_kwh(devices);
        Self {
            total_energy_kwh,
            total_cost: total_energy_kwh * rate_per_kwh,
            rate_per_kwh,
            active_devices: active_count(devices),
            exceeding_devices: devices.iter().filter(|d| d.is_exceeding).count(),
            current_draw_watts: current_draw_watts(devices),
        }
    }
}

impl fmt::Display for UsageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Usage Summary ---")?;
        writeln!(f, "Total energy used:  {:.3} kWh", self.total_energy_kwh)?;
        writeln!(
            f,
            "Cost tracked:       ${:.2} (at ${:.2}/kWh)",
            self.total_cost, self.rate_per_kwh
        )?;
        writeln!(f, "Active devices:     {}", self.active_devices)?;
        writeln!(f, "Exceeding limits:   {}", self.exceeding_devices)?;
        write!(f, "Current draw:       {:.0} W", self.current_draw_watts)
    }
}
