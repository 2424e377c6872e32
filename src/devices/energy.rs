//! Energy accounting primitives.

const SECONDS_PER_HOUR: f64 = 3600.0;
const WATTS_PER_KILOWATT: f64 = 1000.0;

/// Converts a constant draw held for some duration into kilowatt-hours.
///
/// # Examples
///
/// ```
/// use electrack::devices::energy::energy_kwh;
///
/// assert_eq!(energy_kwh(2000.0, 3600), 2.0);
/// assert_eq!(energy_kwh(500.0, 0), 0.0);
/// ```
pub fn energy_kwh(power_watts: f64, seconds: u64) -> f64 {
    (power_watts / WATTS_PER_KILOWATT) * (seconds as f64 / SECONDS_PER_HOUR)
}

/// Rounds to four decimal places, the precision used for charted values.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
