//! Capacity-bounded, time-ordered snapshot history.

use std::collections::VecDeque;

use serde_json::Value;
use tracing::{debug, warn};

use super::KeyValueStore;
use crate::error::StorageError;
use crate::history::EnergySnapshot;

/// Storage key for the history record.
pub const HISTORY_KEY: &str = "energy-history";
/// One week of one-per-minute snapshots.
pub const DEFAULT_HISTORY_CAPACITY: usize = 10_080;

/// Snapshot history kept in memory and written through on every append.
///
/// Timestamps never decrease from front to back, and at most `capacity`
/// entries are retained (oldest evicted first).
#[derive(Debug)]
pub struct HistoryStore<S> {
    store: S,
    snapshots: VecDeque<EnergySnapshot>,
    capacity: usize,
}

impl<S: KeyValueStore> HistoryStore<S> {
    /// Loads persisted history. Missing, unreadable, or malformed data yields an
    /// empty history; individual malformed entries are skipped.
    pub fn load(store: S, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let snapshots = match store.get(HISTORY_KEY) {
            Ok(Some(raw)) => parse_history(&raw),
            Ok(None) => VecDeque::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read energy history, starting empty");
                VecDeque::new()
            }
        };
        let mut history = Self {
            store,
            snapshots,
            capacity,
        };
        history.evict();
        debug!(entries = history.len(), capacity, "Loaded energy history");
        history
    }

    /// Appends a snapshot, evicts beyond capacity, and persists.
    ///
    /// A snapshot older than the newest entry is clamped to that entry's timestamp.
    /// The in-memory history is updated even if persisting fails.
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if the history could not be written.
    pub fn append(&mut self, mut snapshot: EnergySnapshot) -> Result<(), StorageError> {
        if let Some(newest) = self.snapshots.back()
            && snapshot.timestamp < newest.timestamp
        {
            snapshot.timestamp = newest.timestamp;
        }
        self.snapshots.push_back(snapshot);
        self.evict();
        self.persist()
    }

    pub fn snapshots(&self) -> &VecDeque<EnergySnapshot> {
        &self.snapshots
    }

    /// Contiguous copy for the aggregation functions.
    pub fn to_vec(&self) -> Vec<EnergySnapshot> {
        self.snapshots.iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<&EnergySnapshot> {
        self.snapshots.back()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn evict(&mut self) {
        while self.snapshots.len() > self.capacity {
            self.snapshots.pop_front();
        }
    }

    fn persist(&self) -> Result<(), StorageError> {
        let json = serde_json::to_string(&self.snapshots)?;
        self.store.set(HISTORY_KEY, &json)
    }
}

fn parse_history(raw: &str) -> VecDeque<EnergySnapshot> {
    let entries = match serde_json::from_str::<Vec<Value>>(raw) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, "Ignoring malformed energy history");
            return VecDeque::new();
        }
    };
    let total = entries.len();
    let mut snapshots: VecDeque<EnergySnapshot> = entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect();
    if snapshots.len() < total {
        warn!(
            skipped = total - snapshots.len(),
            "Skipped malformed energy history entries"
        );
    }
    snapshots
        .make_contiguous()
        .sort_by_key(|s: &EnergySnapshot| s.timestamp);
    snapshots
}
