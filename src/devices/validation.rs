//! Range checks for user-supplied device fields.

use std::ops::RangeInclusive;

use crate::error::ValidationError;

/// Maximum display-name length, in characters, after trimming.
pub const MAX_NAME_CHARS: usize = 50;
/// Accepted rated draw (W).
pub const POWER_WATTS_RANGE: RangeInclusive<f64> = 1.0..=50_000.0;
/// Accepted healthy energy ceiling (kWh).
pub const HEALTHY_LIMIT_KWH_RANGE: RangeInclusive<f64> = 0.01..=1000.0;
/// Accepted time ceiling before a device counts as exceeding (minutes).
pub const MAX_ACTIVE_MINUTES_RANGE: RangeInclusive<u32> = 5..=240;

/// Trims `name` and checks it is non-empty and at most [`MAX_NAME_CHARS`] long.
///
/// # Errors
///
/// Returns a [`ValidationError`] for `name` if the trimmed value is empty or too long.
pub fn validate_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new("name", "Name is required"));
    }
    if trimmed.chars().count() > MAX_NAME_CHARS {
        return Err(ValidationError::new(
            "name",
            format!("Name must be {MAX_NAME_CHARS} characters or fewer"),
        ));
    }
    Ok(trimmed.to_string())
}

/// # Errors
///
/// Returns a [`ValidationError`] if `watts` is not finite or outside [`POWER_WATTS_RANGE`].
pub fn validate_power_watts(watts: f64) -> Result<f64, ValidationError> {
    if watts.is_finite() && POWER_WATTS_RANGE.contains(&watts) {
        Ok(watts)
    } else {
        Err(ValidationError::new(
            "power_watts",
            "Must be between 1 and 50,000 W",
        ))
    }
}

/// # Errors
///
/// Returns a [`ValidationError`] if `kwh` is not finite or outside [`HEALTHY_LIMIT_KWH_RANGE`].
pub fn validate_healthy_limit_kwh(kwh: f64) -> Result<f64, ValidationError> {
    if kwh.is_finite() && HEALTHY_LIMIT_KWH_RANGE.contains(&kwh) {
        Ok(kwh)
    } else {
        Err(ValidationError::new(
            "healthy_limit_kwh",
            "Must be between 0.01 and 1,000 kWh",
        ))
    }
}

/// # Errors
///
/// Returns a [`ValidationError`] if `minutes` is outside [`MAX_ACTIVE_MINUTES_RANGE`].
pub fn validate_max_active_minutes(minutes: u32) -> Result<u32, ValidationError> {
    if MAX_ACTIVE_MINUTES_RANGE.contains(&minutes) {
        Ok(minutes)
    } else {
        Err(ValidationError::new(
            "max_active_minutes",
            "Must be between 5 and 240 minutes",
        ))
    }
}
