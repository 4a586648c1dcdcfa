//! Computed snapshot types.
//!
//! One [`TelemetrySnapshot`] is produced per tick by the derivation engine
//! and handed to the broadcaster immutably. The flat legacy reflection model
//! is replaced by explicit composite structs, each with its own
//! [`Sanitize`](crate::units::Sanitize) impl; the top-level impl visits every
//! sub-struct so the engine's final pass reaches all floating fields.

mod fuel;
mod radar;
mod session;
mod timing;
mod tyres;
mod vehicle;

pub use fuel::{FuelProjection, FuelStatus};
pub use radar::{RadarInfo, RelativeInfo};
pub use session::{EnvironmentInfo, SessionInfo};
pub use timing::LapTiming;
pub use tyres::{TyreSet, TyreSnapshot, Wheel, WheelState, WheelSummary};
pub use vehicle::{DamageInfo, HighFreqInfo, PitInfo, PowertrainInfo, SystemPerf, VehicleInfo};

use serde::Serialize;

use crate::session::{DriverEntry, SessionDescriptor, WeekendDescriptor};
use crate::units::Sanitize;

/// The full per-tick output of the derivation engine.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySnapshot {
    pub session: SessionInfo,
    pub vehicle: VehicleInfo,
    pub powertrain: PowertrainInfo,
    pub high_freq: HighFreqInfo,
    pub damage: DamageInfo,
    pub pit: PitInfo,
    pub environment: EnvironmentInfo,
    pub system: SystemPerf,
    pub tyres: TyreSet,
    pub timing: LapTiming,
    pub fuel: FuelProjection,
    pub radar: RadarInfo,
    pub relative: RelativeInfo,
    /// Nested per-wheel summary block reserved on the wire.
    pub tyre_snapshot: TyreSnapshot,
    /// Player entry from the descriptor roster, when known.
    pub player: Option<DriverEntry>,
    pub weekend: Option<WeekendDescriptor>,
    pub session_detail: Option<SessionDescriptor>,
    /// Source variables requested but never found this run, each once.
    pub missing_vars: Vec<String>,
}

impl Sanitize for TelemetrySnapshot {
    fn sanitize(&mut self) {
        self.session.sanitize();
        self.vehicle.sanitize();
        self.powertrain.sanitize();
        self.high_freq.sanitize();
        self.damage.sanitize();
        self.pit.sanitize();
        self.environment.sanitize();
        self.system.sanitize();
        self.tyres.sanitize();
        self.timing.sanitize();
        self.fuel.sanitize();
        self.radar.sanitize();
        self.relative.sanitize();
        self.tyre_snapshot.sanitize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_reaches_nested_fields() {
        let mut snap = TelemetrySnapshot::default();
        snap.vehicle.speed = f32::NAN;
        snap.tyres.wheels[2].pressure = f32::INFINITY;
        snap.fuel.rolling_average = f32::NEG_INFINITY;
        snap.timing.sector_times = vec![1.2, f32::NAN];
        snap.tyre_snapshot.wheels[0].core_temp = f32::NAN;
        snap.sanitize();
        assert_eq!(snap.vehicle.speed, 0.0);
        assert_eq!(snap.tyres.wheels[2].pressure, 0.0);
        assert_eq!(snap.fuel.rolling_average, 0.0);
        assert_eq!(snap.timing.sector_times, vec![1.2, 0.0]);
        assert_eq!(snap.tyre_snapshot.wheels[0].core_temp, 0.0);
    }
}
