//! Numeric guards and physical-unit conversion.
//!
//! Every value that leaves the derivation engine passes through this module
//! one way or another: either through the scalar guards (`ensure_positive`)
//! or through the [`Sanitize`] visitor that each snapshot section implements.
//!
//! The kPa to PSI conversion deserves a warning: the correct operation is a
//! *multiplication* by [`KPA_TO_PSI`]. An earlier revision divided by the
//! constant instead, which inflated pressures by roughly 47x. Keep the tests
//! below green.

/// 1 kPa expressed in PSI.
pub const KPA_TO_PSI: f32 = 0.145_037_738;

/// 1 m/s expressed in mph.
const MPS_TO_MPH: f32 = 2.236_936_3;

/// 1 m/s expressed in km/h.
const MPS_TO_KPH: f32 = 3.6;

/// Display unit system requested by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayUnits {
    /// Fahrenheit / mph.
    #[default]
    Imperial,
    /// Celsius / km/h.
    Metric,
}

impl DisplayUnits {
    /// Decode the raw `DisplayUnits` field (0 = imperial, 1 = metric).
    pub fn from_raw(raw: i32) -> Self {
        if raw == 1 {
            DisplayUnits::Metric
        } else {
            DisplayUnits::Imperial
        }
    }
}

/// Clamp a float to a finite, non-negative value.
///
/// NaN, infinity and negative values all collapse to `0.0`. Idempotent.
pub fn ensure_positive(value: f32) -> f32 {
    if value.is_nan() || value.is_infinite() || value < 0.0 {
        0.0
    } else {
        value
    }
}

/// `f64` variant of [`ensure_positive`].
pub fn ensure_positive_f64(value: f64) -> f64 {
    if value.is_nan() || value.is_infinite() || value < 0.0 {
        0.0
    } else {
        value
    }
}

/// Clamp an integer to a non-negative value.
pub fn ensure_non_negative(value: i32) -> i32 {
    value.max(0)
}

/// `i64` variant of [`ensure_non_negative`].
pub fn ensure_non_negative_i64(value: i64) -> i64 {
    value.max(0)
}

/// Convert a pressure from kPa to PSI.
///
/// Non-positive and non-finite input returns `0.0`. This must multiply by
/// [`KPA_TO_PSI`]; dividing is the historical 47x bug.
pub fn kpa_to_psi(kpa: f32) -> f32 {
    if !kpa.is_finite() || kpa <= 0.0 {
        return 0.0;
    }
    kpa * KPA_TO_PSI
}

/// Convert a temperature reported in Celsius for display.
///
/// Imperial mode converts to Fahrenheit, metric passes through.
pub fn temp_for_display(celsius: f32, units: DisplayUnits) -> f32 {
    if !celsius.is_finite() {
        return 0.0;
    }
    match units {
        DisplayUnits::Imperial => celsius * 9.0 / 5.0 + 32.0,
        DisplayUnits::Metric => celsius,
    }
}

/// Convert a speed reported in m/s for display (mph or km/h).
pub fn speed_for_display(mps: f32, units: DisplayUnits) -> f32 {
    if !mps.is_finite() {
        return 0.0;
    }
    match units {
        DisplayUnits::Imperial => mps * MPS_TO_MPH,
        DisplayUnits::Metric => mps * MPS_TO_KPH,
    }
}

/// Convert an angle from radians to degrees.
pub fn angle_deg(radians: f32) -> f32 {
    if !radians.is_finite() {
        return 0.0;
    }
    radians.to_degrees()
}

/// Zero out any NaN or infinite float carried by a composite value.
///
/// Implemented by every section of the telemetry snapshot; the top-level
/// snapshot impl visits each section in turn. This is the final step before
/// a snapshot is handed to the broadcaster. Unlike [`ensure_positive`] this
/// only corrects non-finite values: negative readings are legitimate here
/// (deltas, accelerations, steering angles).
pub trait Sanitize {
    fn sanitize(&mut self);
}

/// Replace a non-finite float with zero in place.
pub fn scrub(value: &mut f32) {
    if !value.is_finite() {
        *value = 0.0;
    }
}

/// `f64` variant of [`scrub`].
pub fn scrub_f64(value: &mut f64) {
    if !value.is_finite() {
        *value = 0.0;
    }
}

/// Scrub every element of a float slice in place.
pub fn scrub_slice(values: &mut [f32]) {
    for v in values {
        scrub(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_kpa_to_psi_multiplies() {
        assert_eq!(kpa_to_psi(0.0), 0.0);
        assert_eq!(kpa_to_psi(-5.0), 0.0);
        // 200 kPa is about 29 PSI; the divide bug produced ~1378.
        let psi = kpa_to_psi(200.0);
        assert!((psi - 29.007_548).abs() < 1e-3, "got {psi}");
        assert!((kpa_to_psi(150.0) - 150.0 * KPA_TO_PSI).abs() < 1e-6);
    }

    #[test]
    fn test_ensure_positive_guards() {
        assert_eq!(ensure_positive(f32::NAN), 0.0);
        assert_eq!(ensure_positive(f32::INFINITY), 0.0);
        assert_eq!(ensure_positive(f32::NEG_INFINITY), 0.0);
        assert_eq!(ensure_positive(-1.0), 0.0);
        assert_eq!(ensure_positive(3.5), 3.5);
        assert_eq!(ensure_non_negative(-3), 0);
        assert_eq!(ensure_non_negative(7), 7);
        assert_eq!(ensure_non_negative_i64(-1), 0);
    }

    #[test]
    fn test_display_units_decode() {
        assert_eq!(DisplayUnits::from_raw(0), DisplayUnits::Imperial);
        assert_eq!(DisplayUnits::from_raw(1), DisplayUnits::Metric);
        assert_eq!(DisplayUnits::from_raw(42), DisplayUnits::Imperial);
    }

    #[test]
    fn test_temp_conversion() {
        assert_eq!(temp_for_display(100.0, DisplayUnits::Imperial), 212.0);
        assert_eq!(temp_for_display(100.0, DisplayUnits::Metric), 100.0);
        assert_eq!(temp_for_display(f32::NAN, DisplayUnits::Metric), 0.0);
    }

    #[test]
    fn test_speed_conversion() {
        assert!((speed_for_display(10.0, DisplayUnits::Metric) - 36.0).abs() < 1e-4);
        assert!((speed_for_display(10.0, DisplayUnits::Imperial) - 22.369_363).abs() < 1e-4);
        assert_eq!(speed_for_display(f32::INFINITY, DisplayUnits::Metric), 0.0);
    }

    #[test]
    fn test_angle_deg() {
        assert!((angle_deg(std::f32::consts::PI) - 180.0).abs() < 1e-4);
        assert_eq!(angle_deg(f32::NAN), 0.0);
    }

    #[test]
    fn test_scrub() {
        let mut v = f32::NAN;
        scrub(&mut v);
        assert_eq!(v, 0.0);
        let mut v = -4.5;
        scrub(&mut v);
        assert_eq!(v, -4.5);
        let mut arr = [1.0, f32::INFINITY, -2.0];
        scrub_slice(&mut arr);
        assert_eq!(arr, [1.0, 0.0, -2.0]);
    }

    proptest! {
        #[test]
        fn prop_ensure_positive_idempotent(v in proptest::num::f32::ANY) {
            let once = ensure_positive(v);
            prop_assert_eq!(ensure_positive(once), once);
        }

        #[test]
        fn prop_kpa_to_psi_linear(k in 0.0f32..10_000.0) {
            let psi = kpa_to_psi(k);
            prop_assert!((psi - k * KPA_TO_PSI).abs() <= f32::EPSILON * k.max(1.0));
        }
    }
}
