//! Wire payload contracts.
//!
//! The full payload is one flat camelCase object: every section of the
//! snapshot flattened to top level, plus the reserved `telemetrySnapshot`
//! and `missingVars` keys. Field enumeration is explicit; nothing is
//! derived from runtime type inspection.
//!
//! The inputs payload is exactly four fields, serialized independently.
//! Subscribers on the inputs profile never receive a truncated full payload.

use serde::Serialize;

use crate::model::{
    DamageInfo, EnvironmentInfo, FuelProjection, HighFreqInfo, LapTiming, PitInfo, PowertrainInfo,
    RadarInfo, RelativeInfo, SessionInfo, SystemPerf, TelemetrySnapshot, TyreSet, TyreSnapshot,
    VehicleInfo,
};
use crate::session::{DriverEntry, SessionDescriptor, WeekendDescriptor};

/// The full snapshot, flattened for the wire.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontendPayload<'a> {
    #[serde(flatten)]
    session: &'a SessionInfo,
    #[serde(flatten)]
    vehicle: &'a VehicleInfo,
    #[serde(flatten)]
    powertrain: &'a PowertrainInfo,
    #[serde(flatten)]
    high_freq: &'a HighFreqInfo,
    #[serde(flatten)]
    damage: &'a DamageInfo,
    #[serde(flatten)]
    pit: &'a PitInfo,
    #[serde(flatten)]
    environment: &'a EnvironmentInfo,
    #[serde(flatten)]
    system: &'a SystemPerf,
    #[serde(flatten)]
    tyres: &'a TyreSet,
    #[serde(flatten)]
    timing: &'a LapTiming,
    #[serde(flatten)]
    fuel: &'a FuelProjection,
    #[serde(flatten)]
    radar: &'a RadarInfo,
    #[serde(flatten)]
    relative: &'a RelativeInfo,
    player: &'a Option<DriverEntry>,
    weekend: &'a Option<WeekendDescriptor>,
    session_detail: &'a Option<SessionDescriptor>,
    /// Reserved key: per-wheel summary block.
    telemetry_snapshot: &'a TyreSnapshot,
    /// Reserved key: source variables never found this run.
    missing_vars: &'a [String],
}

impl<'a> FrontendPayload<'a> {
    pub fn new(snap: &'a TelemetrySnapshot) -> Self {
        Self {
            session: &snap.session,
            vehicle: &snap.vehicle,
            powertrain: &snap.powertrain,
            high_freq: &snap.high_freq,
            damage: &snap.damage,
            pit: &snap.pit,
            environment: &snap.environment,
            system: &snap.system,
            tyres: &snap.tyres,
            timing: &snap.timing,
            fuel: &snap.fuel,
            radar: &snap.radar,
            relative: &snap.relative,
            player: &snap.player,
            weekend: &snap.weekend,
            session_detail: &snap.session_detail,
            telemetry_snapshot: &snap.tyre_snapshot,
            missing_vars: &snap.missing_vars,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Minimal control-inputs view: exactly these four fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputsPayload {
    pub throttle: f32,
    pub brake: f32,
    pub steering_wheel_angle: f32,
    pub gear: i32,
}

impl InputsPayload {
    pub fn from_snapshot(snap: &TelemetrySnapshot) -> Self {
        Self {
            throttle: snap.vehicle.throttle,
            brake: snap.vehicle.brake,
            steering_wheel_angle: snap.vehicle.steering_wheel_angle,
            gear: snap.vehicle.gear,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_inputs_payload_exactly_four_keys() {
        let mut snap = TelemetrySnapshot::default();
        snap.vehicle.throttle = 0.8;
        snap.vehicle.brake = 0.1;
        snap.vehicle.steering_wheel_angle = -12.5;
        snap.vehicle.gear = 4;
        let json = InputsPayload::from_snapshot(&snap).to_json().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 4);
        assert_eq!(obj["throttle"], 0.8f32 as f64);
        assert_eq!(obj["brake"], 0.1f32 as f64);
        assert_eq!(obj["steeringWheelAngle"], -12.5);
        assert_eq!(obj["gear"], 4);
    }

    #[test]
    fn test_full_payload_is_flat_with_reserved_keys() {
        let mut snap = TelemetrySnapshot::default();
        snap.vehicle.speed = 201.5;
        snap.timing.lap = 12;
        snap.missing_vars = vec!["RPM".to_string()];
        snap.radar.user_names = vec!["Someone".to_string()];
        let json = FrontendPayload::new(&snap).to_json().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        let obj = value.as_object().unwrap();

        // Flattened section fields sit at top level.
        assert_eq!(obj["speed"], 201.5);
        assert_eq!(obj["lap"], 12);
        assert_eq!(obj["carIdxUserNames"][0], "Someone");
        // Reserved keys.
        assert_eq!(obj["missingVars"][0], "RPM");
        assert!(obj["telemetrySnapshot"].is_object());
        assert!(obj["telemetrySnapshot"]["wheels"].is_array());
        // The nested sections themselves must not appear as keys.
        assert!(!obj.contains_key("vehicle"));
        assert!(!obj.contains_key("timing"));
    }
}
