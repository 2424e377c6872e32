//! Device records, energy accounting, and the registry that mutates them.

/// Energy formula and rounding helpers.
pub mod energy;
pub mod registry;
/// Built-in devices present at startup.
pub mod seed;
pub mod types;
pub mod validation;

// Re-export the main types for convenience
pub use registry::DeviceRegistry;
pub use seed::{SeedDevice, builtin_devices};
pub use types::{Device, DeviceIcon, DeviceUpdate, NewDevice, format_active_time};
