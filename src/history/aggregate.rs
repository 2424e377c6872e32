//! Calendar bucketing of snapshot history for charting.
//!
//! Snapshots are grouped by local calendar hour or day. Energy values are cumulative
//! and non-decreasing, so a bucket reports the maximum observed value per device,
//! which is also its latest.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::{DateTime, Datelike, Local, TimeZone, Timelike};
use serde::Serialize;

use super::snapshot::EnergySnapshot;
use crate::devices::energy::round4;

/// Default look-back for the hourly chart.
pub const DEFAULT_HOURS_BACK: u32 = 24;
/// Default look-back for the daily chart.
pub const DEFAULT_DAYS_BACK: u32 = 7;

const MS_PER_HOUR: i64 = 3_600_000;
const MS_PER_DAY: i64 = 86_400_000;

/// One bar group on a chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    /// Local time of the bucket's first snapshot (`HH:MM`, or `Mon, Jan 5` for days).
    pub label: String,
    /// Earliest snapshot timestamp in the bucket (epoch ms).
    pub timestamp: i64,
    /// Device id to maximum kWh observed in the bucket, rounded to 4 decimals.
    pub values: BTreeMap<String, f64>,
}

impl ChartPoint {
    pub fn total_kwh(&self) -> f64 {
        round4(self.values.values().sum())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Granularity {
    Hour,
    Day,
}

impl Granularity {
    fn key<Tz: TimeZone>(self, at: &DateTime<Tz>) -> (i32, u32, u32, u32) {
        let hour = match self {
            Self::Hour => at.hour(),
            Self::Day => 0,
        };
        (at.year(), at.month(), at.day(), hour)
    }

    fn label_format(self) -> &'static str {
        match self {
            Self::Hour => "%H:%M",
            Self::Day => "%a, %b %-d",
        }
    }
}

struct Bucket {
    label: String,
    timestamp: i64,
    values: BTreeMap<String, f64>,
}

/// Groups snapshots from the last `hours_back` hours into local calendar hours.
///
/// Returns buckets sorted by their earliest snapshot, or an empty vector if no
/// snapshot falls inside the window.
pub fn bucket_by_hour<Tz>(
    history: &[EnergySnapshot],
    hours_back: u32,
    now_ms: i64,
    tz: &Tz,
) -> Vec<ChartPoint>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let window = i64::from(hours_back) * MS_PER_HOUR;
    bucket(history, now_ms.saturating_sub(window), tz, Granularity::Hour)
}

/// Groups snapshots from the last `days_back` days into local calendar days.
pub fn bucket_by_day<Tz>(
    history: &[EnergySnapshot],
    days_back: u32,
    now_ms: i64,
    tz: &Tz,
) -> Vec<ChartPoint>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let window = i64::from(days_back) * MS_PER_DAY;
    bucket(history, now_ms.saturating_sub(window), tz, Granularity::Day)
}

/// [`bucket_by_hour`] in the system's local time zone.
pub fn hourly_local(history: &[EnergySnapshot], hours_back: u32, now_ms: i64) -> Vec<ChartPoint> {
    bucket_by_hour(history, hours_back, now_ms, &Local)
}

/// [`bucket_by_day`] in the system's local time zone.
pub fn daily_local(history: &[EnergySnapshot], days_back: u32, now_ms: i64) -> Vec<ChartPoint> {
    bucket_by_day(history, days_back, now_ms, &Local)
}

fn bucket<Tz>(
    history: &[EnergySnapshot],
    cutoff_ms: i64,
    tz: &Tz,
    granularity: Granularity,
) -> Vec<ChartPoint>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut index: HashMap<(i32, u32, u32, u32), usize> = HashMap::new();
    let mut buckets: Vec<Bucket> = Vec::new();

    for snapshot in history.iter().filter(|s| s.timestamp >= cutoff_ms) {
        let Some(at) = DateTime::from_timestamp_millis(snapshot.timestamp) else {
            continue;
        };
        let at = at.with_timezone(tz);

        let slot = *index.entry(granularity.key(&at)).or_insert_with(|| {
            buckets.push(Bucket {
                label: at.format(granularity.label_format()).to_string(),
                timestamp: snapshot.timestamp,
                values: BTreeMap::new(),
            });
            buckets.len() - 1
        });
        let bucket = &mut buckets[slot];
        bucket.timestamp = bucket.timestamp.min(snapshot.timestamp);

        for (id, &kwh) in &snapshot.device_energies {
            bucket
                .values
                .entry(id.clone())
                .and_modify(|max| *max = max.max(kwh))
                .or_insert(kwh);
        }
    }

    buckets.sort_by_key(|b| b.timestamp);
    buckets
        .into_iter()
        .map(|b| ChartPoint {
            label: b.label,
            timestamp: b.timestamp,
            values: b.values.into_iter().map(|(id, v)| (id, round4(v))).collect(),
        })
        .collect()
}
