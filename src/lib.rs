//! Household device energy monitor.
//!
//! Tracks on/off state, session time and cumulative energy of household devices,
//! converts consumption to cost, snapshots usage for charting, and alerts when a
//! device stays on past its time limit.

pub mod cli;
pub mod config;
/// Registry state container and its periodic operations.
pub mod dashboard;
pub mod devices;
/// Tokio drivers for the tick and sampler.
pub mod driver;
pub mod error;
pub mod history;
pub mod io;
pub mod notify;
pub mod storage;
pub mod summary;
