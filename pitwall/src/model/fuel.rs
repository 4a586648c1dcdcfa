//! Fuel projection section and the status ladder.

use serde::Serialize;

use crate::units::{scrub, Sanitize};

/// Status classification carried on the wire as text plus a CSS class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelStatus {
    pub text: &'static str,
    pub class: &'static str,
}

impl Default for FuelStatus {
    fn default() -> Self {
        Self::OK
    }
}

impl FuelStatus {
    pub const EMPTY: FuelStatus = FuelStatus {
        text: "EMPTY",
        class: "status-danger",
    };
    pub const CRITICAL: FuelStatus = FuelStatus {
        text: "CRITICAL",
        class: "status-danger",
    };
    pub const WARNING: FuelStatus = FuelStatus {
        text: "WARNING",
        class: "status-warning",
    };
    pub const OK: FuelStatus = FuelStatus {
        text: "OK",
        class: "status-ok",
    };

    /// Ordered threshold ladder over fuel level and projected laps left.
    pub fn classify(fuel_level: f32, laps_remaining_on_fuel: f32) -> FuelStatus {
        if fuel_level <= 0.0 {
            FuelStatus::EMPTY
        } else if laps_remaining_on_fuel <= 1.0 {
            FuelStatus::CRITICAL
        } else if laps_remaining_on_fuel < 5.0 {
            FuelStatus::WARNING
        } else {
            FuelStatus::OK
        }
    }
}

/// Fuel accounting and end-of-race projection.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelProjection {
    pub level: f32,
    pub level_pct: f32,
    pub capacity: f32,
    pub level_lap_start: f32,
    pub used_total: f32,
    /// Estimated consumption for the lap in progress.
    pub current_lap_consumption: f32,
    pub last_lap_consumption: f32,
    /// Mean of the rolling FIFO, or the fallback total/laps estimate.
    pub rolling_average: f32,
    /// Duplicated from the session section; skipped on the wire so the
    /// flattened payload carries the key once.
    #[serde(skip_serializing)]
    pub laps_remaining_race: i32,
    /// Laps the tank covers at the rolling average rate.
    pub laps_remaining_average: f32,
    /// Laps the tank covers at the last completed lap's rate.
    pub laps_remaining_last_lap: f32,
    pub needed_to_finish: f32,
    pub recommended_refuel: f32,
    pub status: FuelStatus,
}

impl Sanitize for FuelProjection {
    fn sanitize(&mut self) {
        scrub(&mut self.level);
        scrub(&mut self.level_pct);
        scrub(&mut self.capacity);
        scrub(&mut self.level_lap_start);
        scrub(&mut self.used_total);
        scrub(&mut self.current_lap_consumption);
        scrub(&mut self.last_lap_consumption);
        scrub(&mut self.rolling_average);
        scrub(&mut self.laps_remaining_average);
        scrub(&mut self.laps_remaining_last_lap);
        scrub(&mut self.needed_to_finish);
        scrub(&mut self.recommended_refuel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_ladder() {
        assert_eq!(FuelStatus::classify(0.0, 10.0), FuelStatus::EMPTY);
        assert_eq!(FuelStatus::classify(2.0, 0.8), FuelStatus::CRITICAL);
        assert_eq!(FuelStatus::classify(2.0, 1.0), FuelStatus::CRITICAL);
        assert_eq!(FuelStatus::classify(8.0, 4.9), FuelStatus::WARNING);
        assert_eq!(FuelStatus::classify(30.0, 11.0), FuelStatus::OK);
        assert_eq!(FuelStatus::WARNING.class, "status-warning");
    }
}
