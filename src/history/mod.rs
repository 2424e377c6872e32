//! Usage snapshots and their aggregation into chart series.

pub mod aggregate;
mod snapshot;

pub use aggregate::{
    ChartPoint, DEFAULT_DAYS_BACK, DEFAULT_HOURS_BACK, bucket_by_day, bucket_by_hour, daily_local,
    hourly_local,
};
pub use snapshot::EnergySnapshot;
