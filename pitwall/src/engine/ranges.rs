//! Plausibility checks for operator visibility.
//!
//! Implausible but finite readings are logged and passed through unchanged.
//! A crash or a flat tire produces genuine outliers; only NaN/Inf values get
//! corrected, and that happens in the sanitize pass, not here.

use tracing::warn;

use crate::model::TelemetrySnapshot;

const MAX_PLAUSIBLE_PRESSURE_PSI: f32 = 60.0;
const MAX_PLAUSIBLE_TEMP_C: f32 = 200.0;
const MAX_PLAUSIBLE_RPM: f32 = 25_000.0;
const MAX_PLAUSIBLE_SPEED_MPS: f32 = 150.0;
const MAX_PLAUSIBLE_ACCEL_G: f32 = 20.0;

pub(super) fn check(snap: &TelemetrySnapshot, speed_mps: f32) {
    for (i, wheel) in snap.tyres.wheels.iter().enumerate() {
        if wheel.pressure > MAX_PLAUSIBLE_PRESSURE_PSI {
            warn!(wheel = i, pressure = wheel.pressure, "implausible tyre pressure");
        }
        if wheel.temps.iter().any(|&t| t > MAX_PLAUSIBLE_TEMP_C) {
            warn!(wheel = i, temps = ?wheel.temps, "implausible tyre temperature");
        }
    }
    if snap.vehicle.rpm > MAX_PLAUSIBLE_RPM {
        warn!(rpm = snap.vehicle.rpm, "implausible engine rpm");
    }
    if speed_mps > MAX_PLAUSIBLE_SPEED_MPS {
        warn!(speed = speed_mps, "implausible speed");
    }
    let hf = &snap.high_freq;
    for (name, g) in [
        ("lat", hf.lat_accel),
        ("long", hf.long_accel),
        ("vert", hf.vert_accel),
    ] {
        if g.abs() > MAX_PLAUSIBLE_ACCEL_G * 9.81 {
            warn!(axis = name, accel = g, "implausible acceleration");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_never_mutates() {
        let mut snap = TelemetrySnapshot::default();
        snap.vehicle.rpm = 90_000.0;
        snap.tyres.wheels[0].pressure = 500.0;
        let before_rpm = snap.vehicle.rpm;
        check(&snap, 400.0);
        assert_eq!(snap.vehicle.rpm, before_rpm);
        assert_eq!(snap.tyres.wheels[0].pressure, 500.0);
    }
}
