//! Time-limit alerts, fired once per continuous exceed episode.

use std::collections::HashSet;

use tracing::{info, warn};

use crate::devices::Device;
use crate::error::NotifyError;

/// A user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    /// Replaces any earlier notification with the same tag.
    pub tag: String,
}

/// Delivers notifications to the user.
pub trait NotificationProvider: Send {
    /// Asks the user for permission to show notifications. Returns whether it is granted.
    fn request_permission(&mut self) -> bool;

    /// Shows `notification`. Must be a no-op when permission has not been granted.
    fn notify(&mut self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl NotificationProvider for TracingNotifier {
    fn request_permission(&mut self) -> bool {
        true
    }

    fn notify(&mut self, notification: &Notification) -> Result<(), NotifyError> {
        warn!(tag = %notification.tag, "{}: {}", notification.title, notification.body);
        Ok(())
    }
}

/// A device crossing its time limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub device_id: String,
    pub name: String,
    pub active_seconds: u64,
    pub max_active_minutes: u32,
}

impl Alert {
    fn from_device(device: &Device) -> Self {
        Self {
            device_id: device.id.clone(),
            name: device.name.clone(),
            active_seconds: device.active_seconds,
            max_active_minutes: device.max_active_minutes,
        }
    }

    pub fn notification(&self) -> Notification {
        Notification {
            title: format!("{}: time limit exceeded", self.name),
            body: format!(
                "Active for {}m, exceeding the {}m limit. Consider shutting it down.",
                self.active_seconds / 60,
                self.max_active_minutes
            ),
            tag: format!("electrack-{}", self.device_id),
        }
    }
}

/// Watches device collections and alerts once per exceed episode.
///
/// An id stays in the notified set while its device keeps exceeding; it is
/// re-armed as soon as the device goes idle or drops below its limit.
pub struct Notifier<P> {
    provider: P,
    notified: HashSet<String>,
    permitted: bool,
}

impl<P: NotificationProvider> Notifier<P> {
    /// Wraps `provider`, requesting notification permission once.
    pub fn new(mut provider: P) -> Self {
        let permitted = provider.request_permission();
        if !permitted {
            info!("Notification permission not granted, alerts will only be logged");
        }
        Self {
            provider,
            notified: HashSet::new(),
            permitted,
        }
    }

    /// Fires alerts for newly exceeding devices and re-arms recovered ones.
    ///
    /// Returns the alerts fired by this observation.
    pub fn observe(&mut self, devices: &[Device]) -> Vec<Alert> {
        let mut fired = Vec::new();
        for device in devices {
            if device.is_active && device.is_exceeding {
                if self.notified.insert(device.id.clone()) {
                    let alert = Alert::from_device(device);
                    self.deliver(&alert);
                    fired.push(alert);
                }
            } else {
                self.notified.remove(&device.id);
            }
        }
        self.notified
            .retain(|id| devices.iter().any(|d| &d.id == id));
        fired
    }

    pub fn is_notified(&self, id: &str) -> bool {
        self.notified.contains(id)
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    fn deliver(&mut self, alert: &Alert) {
        info!(
            device_id = %alert.device_id,
            active_seconds = alert.active_seconds,
            max_active_minutes = alert.max_active_minutes,
            "Device exceeded its time limit"
        );
        if !self.permitted {
            return;
        }
        if let Err(e) = self.provider.notify(&alert.notification()) {
            warn!(device_id = %alert.device_id, error = %e, "Failed to deliver notification");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::{DeviceRegistry, SeedDevice};

    #[derive(Default)]
    struct Recorder {
        granted: bool,
        sent: Vec<Notification>,
    }

    impl NotificationProvider for Recorder {
        fn request_permission(&mut self) -> bool {
            self.granted
        }

        fn notify(&mut self, notification: &Notification) -> Result<(), NotifyError> {
            self.sent.push(notification.clone());
            Ok(())
        }
    }

    fn quick_device() -> DeviceRegistry {
        let seed = SeedDevice {
            id: "ac".into(),
            name: "Air Conditioner".into(),
            icon: crate::devices::DeviceIcon::Wind,
            power_watts: 3500.0,
            healthy_limit_kwh: 8.0,
            max_active_minutes: 1,
        };
        DeviceRegistry::from_seeds(&[seed])
    }

    #[test]
    fn fires_once_per_episode() {
        let mut registry = quick_device();
        let mut notifier = Notifier::new(Recorder {
            granted: true,
            ..Recorder::default()
        });
        registry.toggle("ac");
        registry.tick(60);
        assert_eq!(notifier.observe(&registry.devices()).len(), 1);
        for _ in 0..5 {
            registry.tick(1);
            assert!(notifier.observe(&registry.devices()).is_empty());
        }
        assert_eq!(notifier.provider().sent.len(), 1);
    }

    #[test]
    fn cycling_the_device_rearms() {
        let mut registry = quick_device();
        let mut notifier = Notifier::new(Recorder {
            granted: true,
            ..Recorder::default()
        });
        registry.toggle("ac");
        registry.tick(60);
        notifier.observe(&registry.devices());
        registry.toggle("ac");
        notifier.observe(&registry.devices());
        assert!(!notifier.is_notified("ac"));
        registry.toggle("ac");
        registry.tick(60);
        let alerts = notifier.observe(&registry.devices());
        assert_eq!(alerts.len(), 1);
        assert_eq!(notifier.provider().sent.len(), 2);
    }

    #[test]
    fn notification_text() {
        let alert = Alert {
            device_id: "heater".into(),
            name: "Electric Heater".into(),
            active_seconds: 2759,
            max_active_minutes: 45,
        };
        let n = alert.notification();
        assert_eq!(n.title, "Electric Heater: time limit exceeded");
        assert_eq!(
            n.body,
            "Active for 45m, exceeding the 45m limit. Consider shutting it down."
        );
        assert_eq!(n.tag, "electrack-heater");
    }

    #[test]
    fn without_permission_alerts_are_tracked_but_not_sent() {
        let mut registry = quick_device();
        let mut notifier = Notifier::new(Recorder::default());
        registry.toggle("ac");
        registry.tick(60);
        assert_eq!(notifier.observe(&registry.devices()).len(), 1);
        assert!(notifier.provider().sent.is_empty());
        assert!(notifier.is_notified("ac"));
    }

    #[test]
    fn removed_devices_are_forgotten() {
        let mut registry = quick_device();
        let mut notifier = Notifier::new(Recorder {
            granted: true,
            ..Recorder::default()
        });
        registry.toggle("ac");
        registry.tick(60);
        notifier.observe(&registry.devices());
        notifier.observe(&[]);
        assert!(!notifier.is_notified("ac"));
    }
}
