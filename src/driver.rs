//! Periodic drivers: the device timer tick and the history sampler.
//!
//! Both run as tokio tasks sharing one [`Dashboard`] behind a mutex. Each iteration
//! runs on the blocking pool, since sampling writes the history through synchronous
//! storage. A panic inside one iteration is logged and later iterations still run.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::{self, JoinHandle};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::config::TimingConfig;
use crate::dashboard::Dashboard;
use crate::notify::NotificationProvider;
use crate::storage::KeyValueStore;

/// Dashboard shared between drivers and readers.
pub type SharedDashboard<S, N> = Arc<Mutex<Dashboard<S, N>>>;

/// Handle to the running drivers. Dropping it aborts them; [`Drivers::stop`]
/// shuts them down cleanly.
pub struct Drivers {
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl Drivers {
    /// Spawns the tick and sampler tasks on the current tokio runtime.
    ///
    /// The sampler captures a snapshot immediately and then every
    /// `sample_interval_secs`; the tick advances active devices by
    /// `tick_interval_secs` once per interval.
    pub fn spawn<S, N>(dashboard: &SharedDashboard<S, N>, timing: &TimingConfig) -> Self
    where
        S: KeyValueStore + Clone + 'static,
        N: NotificationProvider + 'static,
    {
        let (shutdown, rx) = watch::channel(false);
        let tick_secs = timing.tick_interval_secs.max(1);
        let sample_secs = timing.sample_interval_secs.max(1);

        let ticker = {
            let dashboard = Arc::clone(dashboard);
            run_periodic(
                "tick",
                Duration::from_secs(tick_secs),
                false,
                rx.clone(),
                move || {
                    let alerts = dashboard.lock().tick(tick_secs);
                    if !alerts.is_empty() {
                        debug!(count = alerts.len(), "Tick raised alerts");
                    }
                },
            )
        };
        let sampler = {
            let dashboard = Arc::clone(dashboard);
            run_periodic(
                "sample",
                Duration::from_secs(sample_secs),
                true,
                rx,
                move || {
                    dashboard.lock().sample(Utc::now().timestamp_millis());
                },
            )
        };

        info!(tick_secs, sample_secs, "Drivers started");
        Self {
            shutdown,
            tasks: vec![tokio::spawn(ticker), tokio::spawn(sampler)],
        }
    }

    /// Signals both drivers to stop and waits for them to finish.
    pub async fn stop(mut self) {
        if self.shutdown.send(true).is_err() {
            debug!("Drivers already gone");
        }
        for task in std::mem::take(&mut self.tasks) {
            if let Err(e) = task.await {
                error!(error = %e, "Driver task ended abnormally");
            }
        }
        info!("Drivers stopped");
    }
}

impl Drop for Drivers {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Calls `step` on the blocking pool once per `period` until `shutdown` fires.
///
/// With `immediate` set the first call happens right away, otherwise one period in.
/// An iteration finishes before the next one is scheduled.
async fn run_periodic(
    name: &'static str,
    period: Duration,
    immediate: bool,
    mut shutdown: watch::Receiver<bool>,
    step: impl Fn() + Send + Sync + 'static,
) {
    let step = Arc::new(step);
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    if !immediate {
        // The first tick of a tokio interval completes at once.
        interval.tick().await;
    }
    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = shutdown.changed() => break,
        }
        let step = Arc::clone(&step);
        match task::spawn_blocking(move || step()).await {
            Ok(()) => {}
            Err(e) if e.is_panic() => {
                error!(driver = name, "Driver iteration panicked, continuing");
            }
            Err(e) => {
                error!(driver = name, error = %e, "Driver iteration cancelled");
                break;
            }
        }
    }
    debug!(driver = name, "Driver loop exited");
}
