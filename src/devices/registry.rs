//! Device registry: owns the device collection and applies every state transition.
//!
//! Each operation builds a complete replacement collection and swaps it in, so a
//! snapshot handed out by [`DeviceRegistry::devices`] is never observed half-updated.

use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use tracing::debug;

use super::energy::energy_kwh;
use super::seed::{DEFAULT_MAX_ACTIVE_MINUTES, SeedDevice};
use super::types::{Device, DeviceIcon, DeviceUpdate, NewDevice};
use super::validation::{
    validate_healthy_limit_kwh, validate_max_active_minutes, validate_name, validate_power_watts,
};
use crate::error::ValidationError;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 5;

/// Copy-on-write collection of tracked devices.
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    devices: Arc<Vec<Device>>,
}

impl DeviceRegistry {
    pub fn new(devices: Vec<Device>) -> Self {
        Self {
            devices: Arc::new(devices),
        }
    }

    /// Creates a registry holding idle, non-editable devices built from `seeds`.
    pub fn from_seeds(seeds: &[SeedDevice]) -> Self {
        Self::new(seeds.iter().map(SeedDevice::to_device).collect())
    }

    /// Returns a consistent snapshot of the collection.
    pub fn devices(&self) -> Arc<Vec<Device>> {
        Arc::clone(&self.devices)
    }

    pub fn get(&self, id: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.id == id)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Flips `is_active`. Deactivating folds the session's energy into the running total.
    ///
    /// Returns `false` if `id` is unknown.
    pub fn toggle(&mut self, id: &str) -> bool {
        self.update_one(id, |device| {
            if device.is_active {
                deactivated(device)
            } else {
                Device {
                    is_active: true,
                    active_seconds: 0,
                    is_exceeding: false,
                    ..device.clone()
                }
            }
        })
    }

    /// Forces a device idle, folding any session energy into the running total.
    ///
    /// Returns `false` if `id` is unknown.
    pub fn shutdown(&mut self, id: &str) -> bool {
        self.update_one(id, deactivated)
    }

    /// Overwrites the time ceiling. `is_exceeding` is re-evaluated on the next tick.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if `minutes` is outside 5..=240.
    pub fn set_max_active_time(&mut self, id: &str, minutes: u32) -> Result<bool, ValidationError> {
        let minutes = validate_max_active_minutes(minutes)?;
        Ok(self.update_one(id, |device| Device {
            max_active_minutes: minutes,
            ..device.clone()
        }))
    }

    /// Validates and appends a new idle custom device, returning its id.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the name is empty or longer than 50 characters,
    /// the draw is outside 1..=50000 W, or the healthy limit is outside 0.01..=1000 kWh.
    /// The collection is left untouched.
    pub fn add_device(&mut self, new: NewDevice) -> Result<String, ValidationError> {
        let name = validate_name(&new.name)?;
        let power_watts = validate_power_watts(new.power_watts)?;
        let healthy_limit_kwh = validate_healthy_limit_kwh(new.healthy_limit_kwh)?;

        let id = self.generate_custom_id();
        let device = Device {
            id: id.clone(),
            name,
            icon: DeviceIcon::Plug,
            power_watts,
            healthy_limit_kwh,
            max_active_minutes: DEFAULT_MAX_ACTIVE_MINUTES,
            is_active: false,
            active_seconds: 0,
            total_energy_kwh: 0.0,
            is_exceeding: false,
            is_custom: true,
        };
        debug!(device_id = %id, name = %device.name, "Adding device");

        let mut next = Vec::with_capacity(self.devices.len() + 1);
        next.extend(self.devices.iter().cloned());
        next.push(device);
        self.devices = Arc::new(next);
        Ok(id)
    }

    /// Applies a partial update to a custom device. Activity and timers are untouched.
    ///
    /// Returns `Ok(false)` without changes for unknown or built-in devices, whatever
    /// the update holds.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if any supplied field is out of range, in which
    /// case nothing is applied.
    pub fn edit_device(&mut self, id: &str, update: DeviceUpdate) -> Result<bool, ValidationError> {
        if !self.get(id).is_some_and(Device::is_editable) {
            debug!(device_id = %id, "Ignoring edit of unknown or built-in device");
            return Ok(false);
        }

        let name = update.name.as_deref().map(validate_name).transpose()?;
        let power_watts = update.power_watts.map(validate_power_watts).transpose()?;
        let healthy_limit_kwh = update
            .healthy_limit_kwh
            .map(validate_healthy_limit_kwh)
            .transpose()?;
        Ok(self.update_one(id, |device| Device {
            name: name.clone().unwrap_or_else(|| device.name.clone()),
            power_watts: power_watts.unwrap_or(device.power_watts),
            healthy_limit_kwh: healthy_limit_kwh.unwrap_or(device.healthy_limit_kwh),
            ..device.clone()
        }))
    }

    /// Deletes a custom device. Built-in and unknown ids are ignored.
    pub fn remove_device(&mut self, id: &str) -> bool {
        if !self.get(id).is_some_and(Device::is_editable) {
            debug!(device_id = %id, "Ignoring removal of unknown or built-in device");
            return false;
        }
        let next: Vec<Device> = self.devices.iter().filter(|d| d.id != id).cloned().collect();
        self.devices = Arc::new(next);
        debug!(device_id = %id, "Removed device");
        true
    }

    /// Advances every active device's session by `delta_seconds` and re-evaluates
    /// its exceed flag. Idle devices are unaffected.
    ///
    /// Returns the number of devices advanced.
    pub fn tick(&mut self, delta_seconds: u64) -> usize {
        let active = self.devices.iter().filter(|d| d.is_active).count();
        if active == 0 || delta_seconds == 0 {
            return 0;
        }
        let next: Vec<Device> = self
            .devices
            .iter()
            .map(|device| {
                if !device.is_active {
                    return device.clone();
                }
                let active_seconds = device.active_seconds.saturating_add(delta_seconds);
                Device {
                    active_seconds,
                    is_exceeding: active_seconds >= device.max_active_seconds(),
                    ..device.clone()
                }
            })
            .collect();
        self.devices = Arc::new(next);
        active
    }

    /// Replaces the matching device with `f(device)`; returns whether `id` matched.
    fn update_one(&mut self, id: &str, f: impl FnOnce(&Device) -> Device) -> bool {
        let Some(index) = self.devices.iter().position(|d| d.id == id) else {
            debug!(device_id = %id, "Ignoring operation on unknown device");
            return false;
        };
        let mut next: Vec<Device> = Vec::with_capacity(self.devices.len());
        next.extend_from_slice(&self.devices[..index]);
        next.push(f(&self.devices[index]));
        next.extend_from_slice(&self.devices[index + 1..]);
        self.devices = Arc::new(next);
        true
    }

    /// `custom-{epoch_ms}-{random base36}`, regenerated until unused.
    fn generate_custom_id(&self) -> String {
        let mut rng = rand::rng();
        loop {
            let suffix: String = (0..ID_SUFFIX_LEN)
                .map(|_| char::from(ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())]))
                .collect();
            let id = format!("custom-{}-{suffix}", Utc::now().timestamp_millis());
            if self.get(&id).is_none() {
                return id;
            }
        }
    }
}

/// Idle copy of `device` with any session energy folded into the total.
fn deactivated(device: &Device) -> Device {
    let session = if device.is_active {
        energy_kwh(device.power_watts, device.active_seconds)
    } else {
        0.0
    };
    Device {
        is_active: false,
        active_seconds: 0,
        total_energy_kwh: device.total_energy_kwh + session,
        is_exceeding: false,
        ..device.clone()
    }
}
