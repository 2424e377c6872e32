//! Dashboard state that ties the registry, stores and notifier together.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::MonitorConfig;
use crate::devices::{Device, DeviceRegistry, DeviceUpdate, NewDevice};
use crate::error::ValidationError;
use crate::history::{ChartPoint, EnergySnapshot, daily_local, hourly_local};
use crate::notify::{Alert, NotificationProvider, Notifier};
use crate::storage::{HistoryStore, KeyValueStore, RateStore};
use crate::summary::UsageSummary;

/// Owns every piece of mutable monitoring state.
///
/// Time never advances on its own: callers drive it with [`Dashboard::tick`] and
/// [`Dashboard::sample`], either from [`crate::driver::Drivers`] or directly in tests.
pub struct Dashboard<S, N> {
    registry: DeviceRegistry,
    rates: RateStore<S>,
    history: HistoryStore<S>,
    notifier: Notifier<N>,
}

impl<S, N> Dashboard<S, N>
where
    S: KeyValueStore + Clone,
    N: NotificationProvider,
{
    /// Builds the dashboard from configuration, loading the rate and history from `store`.
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration (seed devices, history bound, default rate)
    /// * `store` - Persistence provider shared by the rate and history stores
    /// * `provider` - Notification sink; permission is requested immediately
    pub fn new(config: &MonitorConfig, store: S, provider: N) -> Self {
        let registry = DeviceRegistry::from_seeds(&config.devices);
        let rates = RateStore::load_or(store.clone(), config.monitor.default_rate_per_kwh);
        let history = HistoryStore::load(store, config.monitor.history_capacity);
        debug!(
            devices = registry.len(),
            rate_per_kwh = rates.rate(),
            snapshots = history.len(),
            "Dashboard ready"
        );
        Self {
            registry,
            rates,
            history,
            notifier: Notifier::new(provider),
        }
    }

    /// Consistent snapshot of the device collection.
    pub fn devices(&self) -> Arc<Vec<Device>> {
        self.registry.devices()
    }

    pub fn device(&self, id: &str) -> Option<&Device> {
        self.registry.get(id)
    }

    pub fn toggle(&mut self, id: &str) -> bool {
        let changed = self.registry.toggle(id);
        self.observe();
        changed
    }

    pub fn shutdown(&mut self, id: &str) -> bool {
        let changed = self.registry.shutdown(id);
        self.observe();
        changed
    }

    /// # Errors
    ///
    /// Returns a [`ValidationError`] if `minutes` is outside 5..=240.
    pub fn set_max_active_time(&mut self, id: &str, minutes: u32) -> Result<bool, ValidationError> {
        self.registry.set_max_active_time(id, minutes)
    }

    /// # Errors
    ///
    /// Returns a [`ValidationError`] if any field is out of range.
    pub fn add_device(&mut self, new: NewDevice) -> Result<String, ValidationError> {
        self.registry.add_device(new)
    }

    /// # Errors
    ///
    /// Returns a [`ValidationError`] if any supplied field is out of range.
    pub fn edit_device(&mut self, id: &str, update: DeviceUpdate) -> Result<bool, ValidationError> {
        self.registry.edit_device(id, update)
    }

    pub fn remove_device(&mut self, id: &str) -> bool {
        let removed = self.registry.remove_device(id);
        self.observe();
        removed
    }

    /// Advances active device timers by `delta_seconds` and returns any new alerts.
    pub fn tick(&mut self, delta_seconds: u64) -> Vec<Alert> {
        self.registry.tick(delta_seconds);
        self.observe()
    }

    /// Records every device's current energy at `now_ms` into the history and
    /// returns the stored snapshot.
    ///
    /// A `now_ms` older than the newest entry is moved up to that entry's timestamp.
    /// A failure to persist is logged; the snapshot is still kept in memory.
    pub fn sample(&mut self, now_ms: i64) -> EnergySnapshot {
        let timestamp = self
            .history
            .latest()
            .map_or(now_ms, |newest| newest.timestamp.max(now_ms));
        let snapshot = EnergySnapshot::capture(&self.registry.devices(), timestamp);
        if let Err(e) = self.history.append(snapshot.clone()) {
            warn!(error = %e, "Failed to persist energy history");
        }
        debug!(
            timestamp = snapshot.timestamp,
            total_kwh = snapshot.total_kwh(),
            "Captured snapshot"
        );
        snapshot
    }

    pub fn rate_per_kwh(&self) -> f64 {
        self.rates.rate()
    }

    /// Stores a new rate (clamped to be non-negative) and returns it.
    pub fn set_rate_per_kwh(&mut self, rate: f64) -> f64 {
        self.rates.set_rate(rate)
    }

    pub fn summary(&self) -> UsageSummary {
        UsageSummary::from_devices(&self.registry.devices(), self.rates.rate())
    }

    pub fn history(&self) -> &HistoryStore<S> {
        &self.history
    }

    /// Hourly chart series over the last `hours_back` hours, in local time.
    pub fn hourly(&self, hours_back: u32, now_ms: i64) -> Vec<ChartPoint> {
        hourly_local(&self.history.to_vec(), hours_back, now_ms)
    }

    /// Daily chart series over the last `days_back` days, in local time.
    pub fn daily(&self, days_back: u32, now_ms: i64) -> Vec<ChartPoint> {
        daily_local(&self.history.to_vec(), days_back, now_ms)
    }

    fn observe(&mut self) -> Vec<Alert> {
        let devices = self.registry.devices();
        self.notifier.observe(&devices)
    }
}
