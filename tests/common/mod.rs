//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use parking_lot::Mutex;

use electrack::config::MonitorConfig;
use electrack::dashboard::Dashboard;
use electrack::devices::{Device, DeviceIcon, SeedDevice};
use electrack::error::NotifyError;
use electrack::notify::{Notification, NotificationProvider};
use electrack::storage::MemoryStore;

pub type TestDashboard = Dashboard<Arc<MemoryStore>, RecordingNotifier>;

/// Notification provider that keeps every delivered notification.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub sent: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn count(&self) -> usize {
        self.sent.lock().len()
    }
}

impl NotificationProvider for RecordingNotifier {
    fn request_permission(&mut self) -> bool {
        true
    }

    fn notify(&mut self, notification: &Notification) -> Result<(), NotifyError> {
        self.sent.lock().push(notification.clone());
        Ok(())
    }
}

/// Household preset (four built-ins, 10 080 snapshot bound).
pub fn household_config() -> MonitorConfig {
    MonitorConfig::household()
}

/// Single 3.5 kW device with the shortest allowed time limit (five minutes).
pub fn quick_limit_config() -> MonitorConfig {
    MonitorConfig {
        devices: vec![SeedDevice {
            id: "ac".into(),
            name: "Air Conditioner".into(),
            icon: DeviceIcon::Wind,
            power_watts: 3500.0,
            healthy_limit_kwh: 8.0,
            max_active_minutes: 5,
        }],
        ..MonitorConfig::empty()
    }
}

/// Dashboard over a fresh in-memory store.
///
/// Returns `(dashboard, store, notifier)` so tests can inspect persisted state
/// and delivered notifications.
pub fn dashboard(config: &MonitorConfig) -> (TestDashboard, Arc<MemoryStore>, RecordingNotifier) {
    let store = Arc::new(MemoryStore::new());
    let notifier = RecordingNotifier::default();
    let dashboard = Dashboard::new(config, Arc::clone(&store), notifier.clone());
    (dashboard, store, notifier)
}

/// Epoch milliseconds for a UTC wall-clock time.
pub fn utc_ms(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> i64 {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0)
        .single()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_default()
}

/// Asserts the record-level invariants on every device.
pub fn assert_invariants(devices: &[Device]) {
    for d in devices {
        if !d.is_active {
            assert_eq!(d.active_seconds, 0, "{}: idle with a running timer", d.id);
            assert!(!d.is_exceeding, "{}: idle yet exceeding", d.id);
        }
        assert!(d.total_energy_kwh >= 0.0, "{}: negative energy", d.id);
    }
}
