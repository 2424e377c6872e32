/// CSV export of chart series and snapshot history.
pub mod export;
