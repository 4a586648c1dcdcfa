//! Scripted stand-in for the vendor simulator SDK.
//!
//! Produces a deterministic car circulating a 4.3 km track with slowly
//! draining fuel and a pit stop every 12 laps. Useful for running the full
//! service without a simulator attached and for end-to-end tests that need
//! multi-lap sequences.

use super::{RawSample, TelemetrySource, VarValue};

const LAP_SECONDS: f32 = 95.0;
const FUEL_PER_LAP: f32 = 2.6;
const TANK_LITRES: f32 = 60.0;
const PIT_EVERY_LAPS: i32 = 12;

/// Deterministic scripted telemetry source.
pub struct SimulatedSource {
    tick: i32,
    tick_seconds: f32,
    descriptor: String,
}

impl SimulatedSource {
    pub fn new(tick_interval_ms: u64) -> Self {
        Self {
            tick: 0,
            tick_seconds: tick_interval_ms as f32 / 1000.0,
            descriptor: default_descriptor().to_string(),
        }
    }

    fn elapsed(&self) -> f32 {
        self.tick as f32 * self.tick_seconds
    }
}

impl TelemetrySource for SimulatedSource {
    fn connected(&self) -> bool {
        true
    }

    fn started(&self) -> bool {
        true
    }

    fn poll(&mut self) -> Option<RawSample> {
        self.tick += 1;
        let t = self.elapsed();
        let lap = (t / LAP_SECONDS) as i32 + 1;
        let lap_pct = (t % LAP_SECONDS) / LAP_SECONDS;
        let pit_stops = lap / PIT_EVERY_LAPS;
        let on_pit_road = lap % PIT_EVERY_LAPS == 0 && lap_pct < 0.25;
        let fuel_used = lap as f32 * FUEL_PER_LAP * lap_pct.max(0.01);
        let fuel = (TANK_LITRES - (t / LAP_SECONDS) * FUEL_PER_LAP).max(0.0)
            + pit_stops as f32 * 20.0;
        let speed = if on_pit_road {
            22.0
        } else {
            45.0 + 18.0 * (lap_pct * std::f32::consts::TAU).sin()
        };

        let sample = RawSample::new(self.tick)
            .with_descriptor(self.descriptor.clone())
            .with_var("SessionNum", VarValue::Int(0))
            .with_var("SessionTime", VarValue::Double(t as f64))
            .with_var("SessionTimeRemain", VarValue::Double((3600.0 - t) as f64))
            .with_var("SessionState", VarValue::Int(4))
            .with_var("SessionFlags", VarValue::Int(0x4))
            .with_var("SessionUniqueID", VarValue::Long(1))
            .with_var("SessionTick", VarValue::Int(self.tick))
            .with_var("PlayerCarIdx", VarValue::Int(0))
            .with_var("DisplayUnits", VarValue::Int(1))
            .with_var("PaceMode", VarValue::Int(4))
            .with_var("Lap", VarValue::Int(lap))
            .with_var("LapDistPct", VarValue::Float(lap_pct))
            .with_var("Speed", VarValue::Float(speed))
            .with_var("RPM", VarValue::Float(5200.0 + speed * 40.0))
            .with_var("Gear", VarValue::Int(if on_pit_road { 2 } else { 5 }))
            .with_var("Throttle", VarValue::Float(0.4 + 0.5 * lap_pct))
            .with_var("Brake", VarValue::Float(if lap_pct > 0.9 { 0.6 } else { 0.0 }))
            .with_var("Clutch", VarValue::Float(0.0))
            .with_var("SteeringWheelAngle", VarValue::Float(0.4 * (lap_pct * 12.0).sin()))
            .with_var("FuelLevel", VarValue::Float(fuel))
            .with_var("FuelLevelPct", VarValue::Float(fuel / TANK_LITRES))
            .with_var("FuelCapacity", VarValue::Float(TANK_LITRES))
            .with_var("SessionFuelUsed", VarValue::Float(fuel_used))
            .with_var("FuelUsePerLap", VarValue::Float(FUEL_PER_LAP))
            .with_var("OnPitRoad", VarValue::Bool(on_pit_road))
            .with_var("PlayerCarPitStopCount", VarValue::Int(pit_stops))
            .with_var("LatAccel", VarValue::Float(1.8 * (lap_pct * 9.0).cos()))
            .with_var("LongAccel", VarValue::Float(0.6))
            .with_var("VertAccel", VarValue::Float(9.8))
            .with_var("YawRate", VarValue::Float(0.1))
            .with_var("LFpress", VarValue::Float(165.0 + 6.0 * lap_pct))
            .with_var("RFpress", VarValue::Float(167.0 + 6.0 * lap_pct))
            .with_var("LRpress", VarValue::Float(160.0 + 5.0 * lap_pct))
            .with_var("RRpress", VarValue::Float(161.0 + 5.0 * lap_pct))
            .with_var("LFtempCL", VarValue::Float(82.0))
            .with_var("LFtempCM", VarValue::Float(88.0))
            .with_var("LFtempCR", VarValue::Float(91.0))
            .with_var("RFtempCL", VarValue::Float(90.0))
            .with_var("RFtempCM", VarValue::Float(87.0))
            .with_var("RFtempCR", VarValue::Float(83.0))
            .with_var("LRtempCL", VarValue::Float(78.0))
            .with_var("LRtempCM", VarValue::Float(81.0))
            .with_var("LRtempCR", VarValue::Float(84.0))
            .with_var("RRtempCL", VarValue::Float(83.0))
            .with_var("RRtempCM", VarValue::Float(80.0))
            .with_var("RRtempCR", VarValue::Float(77.0))
            .with_var("CarIdxLapDistPct", VarValue::FloatArray(vec![lap_pct, (lap_pct + 0.03) % 1.0, (lap_pct + 0.96) % 1.0]))
            .with_var("CarIdxPosition", VarValue::IntArray(vec![2, 1, 3]))
            .with_var("CarIdxLap", VarValue::IntArray(vec![lap, lap, lap]))
            .with_var("CarIdxOnPitRoad", VarValue::BoolArray(vec![on_pit_road, false, false]))
            .with_var("CarIdxF2Time", VarValue::FloatArray(vec![0.0, 2.4, 1.9]));
        Some(sample)
    }
}

fn default_descriptor() -> &'static str {
    r#"WeekendInfo:
 TrackName: okayama full
 TrackDisplayName: Okayama International Circuit
 TrackConfigName: Full Course
 TrackLength: 3.70 km
 TrackNumTurns: 13
 SessionType: Race
 Skies: Partly Cloudy
 WindSpeed: 1.61 m/s
 WindDir: 0.00 rad
 AirTemp: 25.56 C
 AirPressure: 29.92 Hg
 RelativeHumidity: 55 %
 ChanceOfRain: 0 %
 NumCarClasses: 1
 WeekendOptions:
  IncidentLimit: 25
DriverInfo:
 Drivers:
 - CarIdx: 0
   UserName: Demo Driver
   TeamName: Pitwall Demo
   UserID: 100001
   CarNumberRaw: 85
   IRating: 2350
   LicString: A 3.41
   LicLevel: 18
   LicSubLevel: 341
   CarPath: demo_gt3
   CarClassID: 4000
   CarClassShortName: GT3
   CarClassEstLapTime: 95.2
 - CarIdx: 1
   UserName: Rival One
   CarNumberRaw: 7
   IRating: 2811
   LicString: A 4.20
   CarPath: demo_gt3
   CarClassID: 4000
   CarClassShortName: GT3
   CarClassEstLapTime: 94.8
 - CarIdx: 2
   UserName: Rival Two
   CarNumberRaw: 22
   IRating: 1990
   LicString: B 3.10
   CarPath: demo_gt3
   CarClassID: 4000
   CarClassShortName: GT3
   CarClassEstLapTime: 96.0
SessionInfo:
 Sessions:
 - SessionNum: 0
   SessionName: RACE
   SessionType: Race
   SessionLaps: 40
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_source_ticks_monotonically() {
        let mut src = SimulatedSource::new(16);
        let a = src.poll().unwrap();
        let b = src.poll().unwrap();
        assert!(b.tick > a.tick);
        assert!(a.descriptor.is_some());
        assert!(a.var("Speed").is_some());
    }
}
