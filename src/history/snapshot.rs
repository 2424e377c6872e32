use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::devices::Device;

/// Every device's cumulative energy at one instant.
///
/// Serialized as `{"timestamp": <epoch ms>, "deviceEnergies": {"<id>": <kWh>}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergySnapshot {
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Device id to cumulative kWh, including any in-progress session.
    pub device_energies: BTreeMap<String, f64>,
}

impl EnergySnapshot {
    /// Records the current displayable energy of each device.
    pub fn capture(devices: &[Device], timestamp: i64) -> Self {
        Self {
            timestamp,
            device_energies: devices
                .iter()
                .map(|d| (d.id.clone(), d.current_energy_kwh()))
                .collect(),
        }
    }

    pub fn energy_of(&self, id: &str) -> Option<f64> {
        self.device_energies.get(id).copied()
    }

    /// Sum over all devices.
    pub fn total_kwh(&self) -> f64 {
        self.device_energies.values().sum()
    }
}
