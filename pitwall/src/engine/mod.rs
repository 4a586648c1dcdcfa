//! Stateful per-tick derivation.
//!
//! One [`DerivationEngine`] instance owns all carried-forward state and
//! turns each raw sample into a [`TelemetrySnapshot`]. Processing order is
//! load-bearing: later steps consume fields populated by earlier ones
//! (display units from the session step, pit occupancy before lap and tyre
//! accounting, sector estimates before the fuel projection).
//!
//! The engine performs no I/O. The service fetches and applies persisted
//! fuel figures through [`DerivationEngine::apply_stored`] and reads the
//! record to persist back via [`DerivationEngine::persist_record`].

mod fuel;
mod ranges;
mod relative;
mod sectors;
mod state;
mod tyres;

pub use state::EngineState;

use chrono::Utc;
use tracing::{debug, info};

use crate::decode;
use crate::model::{TelemetrySnapshot, Wheel};
use crate::session::DescriptorParser;
use crate::source::{RawSample, SampleReader};
use crate::store::FuelRecord;
use crate::units::{
    angle_deg, ensure_positive, speed_for_display, temp_for_display, DisplayUnits, Sanitize,
};

pub struct DerivationEngine {
    state: EngineState,
    parser: DescriptorParser,
}

impl Default for DerivationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DerivationEngine {
    pub fn new() -> Self {
        Self {
            state: EngineState::default(),
            parser: DescriptorParser::new(),
        }
    }

    /// Derive one snapshot from one raw sample, updating engine state.
    pub fn process(&mut self, sample: &RawSample) -> TelemetrySnapshot {
        let mut snap = TelemetrySnapshot::default();

        let units = self.session_step(sample, &mut snap);
        self.pit_step(sample, &mut snap);
        let speed_mps = self.vehicle_step(sample, &mut snap, units);
        fuel::lap_bookkeeping(&mut self.state, sample, &mut snap);
        tyres::apply(&mut self.state, sample, &mut snap);
        sectors::apply(&mut self.state, sample, &mut snap);
        relative::apply(&mut self.state, sample, &mut snap, speed_mps);
        fuel::project(&mut self.state, sample, &mut snap);
        self.environment_step(sample, &mut snap);
        ranges::check(&snap, speed_mps);

        self.assemble(&mut snap, speed_mps);
        snap.sanitize();
        snap
    }

    /// Car and track identity for the persistence key, once known.
    pub fn car_track_identity(&self) -> Option<(&str, &str)> {
        if self.state.car_path.is_empty() || self.state.track_name.is_empty() {
            return None;
        }
        Some((&self.state.car_path, &self.state.track_name))
    }

    /// Whether a persisted record should be fetched for the current
    /// identity. Set on session change, cleared by [`Self::apply_stored`].
    pub fn awaiting_stored(&self) -> bool {
        self.state.awaiting_stored
    }

    /// Seed fuel figures from the persistence store. Live values that are
    /// already established win over stored ones.
    pub fn apply_stored(&mut self, record: Option<&FuelRecord>) {
        if let Some(record) = record {
            if self.state.rolling_average <= 0.0 && record.avg_fuel_per_lap > 0.0 {
                self.state.rolling_average = record.avg_fuel_per_lap;
            }
            if self.state.last_lap_consumption <= 0.0 && record.last_lap_fuel > 0.0 {
                self.state.last_lap_consumption = record.last_lap_fuel;
            }
            info!(
                avg = record.avg_fuel_per_lap,
                last = record.last_lap_fuel,
                "stored fuel history applied"
            );
        }
        self.state.awaiting_stored = false;
    }

    /// Record to persist after a tick.
    pub fn persist_record(&self, snap: &TelemetrySnapshot) -> FuelRecord {
        FuelRecord {
            avg_fuel_per_lap: ensure_positive(snap.fuel.rolling_average),
            last_lap_fuel: ensure_positive(self.state.last_lap_consumption),
            fuel_capacity: ensure_positive(snap.fuel.capacity),
        }
    }

    /// Times the descriptor text parser actually ran (cache misses).
    pub fn descriptor_parse_count(&self) -> u64 {
        self.parser.parse_count()
    }

    fn session_step(&mut self, sample: &RawSample, snap: &mut TelemetrySnapshot) -> DisplayUnits {
        let state = &mut self.state;
        let (
            session_num,
            time,
            time_remain,
            time_total,
            session_state,
            pace_mode,
            flags,
            player_idx,
            display_units,
            unique_id,
            tick,
            race_laps,
            pits_open,
            incidents,
            pit_count,
        ) = {
            let mut reader = SampleReader::new(sample, &mut state.missing);
            (
                reader.i32("SessionNum"),
                reader.f64("SessionTime"),
                reader.f64("SessionTimeRemain"),
                reader.f32("SessionTimeTotal"),
                reader.i32("SessionState"),
                reader.i32("PaceMode"),
                reader.i32("SessionFlags"),
                reader.i32_non_neg("PlayerCarIdx"),
                reader.i32("DisplayUnits"),
                reader.i64_non_neg("SessionUniqueID"),
                reader.i32("SessionTick"),
                reader.i32_non_neg("RaceLaps"),
                reader.bool("PitsOpen"),
                reader.i32_non_neg("PlayerCarMyIncidentCount"),
                reader.i32_non_neg("PlayerCarPitStopCount"),
            )
        };

        if session_num != state.last_session_num {
            info!(
                from = state.last_session_num,
                to = session_num,
                "session change, per-session fuel state reset"
            );
            state.reset_session();
            state.last_session_num = session_num;
        }

        if let Some(text) = &sample.descriptor {
            if *text != state.last_descriptor_text {
                let parsed = self.parser.parse(text, player_idx, session_num, unique_id);
                state.last_descriptor_text = text.clone();
                if let Some(player) = &parsed.player {
                    state.car_path = player.car_path.clone();
                }
                if let Some(weekend) = &parsed.weekend {
                    state.track_name = weekend.track_name.clone();
                    state.track_length_km = weekend.track_length_km;
                }
                state.descriptor = parsed;
            }
            // The setup sheet only changes with a pit stop.
            if pit_count > state.last_pit_count {
                state.last_pit_count = pit_count;
                state.setup = self.parser.tire_setup(text);
                debug!(pit_count, "tire setup re-read from descriptor");
            }
        }

        let descriptor = &state.descriptor;
        let session = &mut snap.session;
        session.session_num = session_num;
        session.session_time = time;
        session.session_time_remain = time_remain;
        session.session_time_total = time_total;
        session.session_state = session_state;
        session.session_state_name = decode::session_state(session_state);
        session.pace_mode = pace_mode;
        session.pace_mode_name = decode::pace_mode(pace_mode);
        session.session_flags = flags;
        session.session_flag_names = decode::session_flags(flags);
        session.player_car_idx = player_idx;
        session.display_units = display_units;
        session.session_unique_id = unique_id;
        session.session_tick = tick;
        session.race_laps = race_laps;
        session.pits_open = pits_open;
        session.player_incident_count = incidents;
        if let Some(detail) = &descriptor.session {
            session.session_type = detail.session_type.clone();
            session.total_laps = detail.current_session_total_laps;
            session.incident_limit = detail.incident_limit;
        }

        DisplayUnits::from_raw(display_units)
    }

    fn pit_step(&mut self, sample: &RawSample, snap: &mut TelemetrySnapshot) {
        let mut reader = SampleReader::new(sample, &mut self.state.missing);
        let pit = &mut snap.pit;
        pit.on_pit_road = reader.bool("OnPitRoad");
        pit.pit_stop_count = reader.i32_non_neg("PlayerCarPitStopCount");
        pit.last_pit_time = reader.f32_pos("PlayerCarLastPitTime");
        pit.repair_left = reader.f32_pos("PitRepairLeft");
        pit.opt_repair_left = reader.f32_pos("PitOptRepairLeft");
    }

    /// Returns the raw speed in m/s for the gap and plausibility steps.
    fn vehicle_step(
        &mut self,
        sample: &RawSample,
        snap: &mut TelemetrySnapshot,
        units: DisplayUnits,
    ) -> f32 {
        let mut reader = SampleReader::new(sample, &mut self.state.missing);

        let speed_mps = reader.f32_pos("Speed");
        let vehicle = &mut snap.vehicle;
        vehicle.speed = speed_for_display(speed_mps, units);
        vehicle.rpm = reader.f32_pos("RPM");
        vehicle.throttle = reader.f32_pos("Throttle");
        vehicle.brake = reader.f32_pos("Brake");
        vehicle.clutch = reader.f32_pos("Clutch");
        vehicle.steering_wheel_angle = angle_deg(reader.f32("SteeringWheelAngle"));
        vehicle.gear = reader.i32("Gear");
        vehicle.on_track = reader.bool("IsOnTrack");
        vehicle.in_garage = reader.bool("IsInGarage");
        vehicle.brake_bias = reader.f32("dcBrakeBias");
        vehicle.abs_active = reader.bool("BrakeABSactive");
        vehicle.brake_line_press = [
            reader.f32_pos("LFbrakeLinePress"),
            reader.f32_pos("RFbrakeLinePress"),
            reader.f32_pos("LRbrakeLinePress"),
            reader.f32_pos("RRbrakeLinePress"),
        ];
        vehicle.brake_temp = reader.f32s_pos("BrakeTemp");

        let powertrain = &mut snap.powertrain;
        powertrain.water_temp = temp_for_display(reader.f32("WaterTemp"), units);
        powertrain.oil_temp = temp_for_display(reader.f32("OilTemp"), units);
        powertrain.oil_press = reader.f32_pos("OilPress");
        powertrain.fuel_press = reader.f32_pos("FuelPress");
        powertrain.manifold_press = reader.f32_pos("ManifoldPress");
        powertrain.engine_warnings = reader.i32("EngineWarnings");
        powertrain.engine_warning_names = decode::engine_warnings(powertrain.engine_warnings);
        powertrain.drs_status = reader.i32("DrsStatus");

        let hf = &mut snap.high_freq;
        hf.lat_accel = reader.f32("LatAccel");
        hf.long_accel = reader.f32("LongAccel");
        hf.vert_accel = reader.f32("VertAccel");
        hf.yaw = reader.f32("Yaw");
        hf.pitch = reader.f32("Pitch");
        hf.roll = reader.f32("Roll");
        hf.yaw_rate = reader.f32("YawRate");
        hf.pitch_rate = reader.f32("PitchRate");
        hf.roll_rate = reader.f32("RollRate");

        let damage = &mut snap.damage;
        damage.corner_damage = [
            reader.f32_pos("LFdamage"),
            reader.f32_pos("RFdamage"),
            reader.f32_pos("LRdamage"),
            reader.f32_pos("RRdamage"),
        ];
        damage.front_wing_damage = reader.f32_pos("FrontWingDamage");
        damage.rear_wing_damage = reader.f32_pos("RearWingDamage");
        damage.engine_damage = reader.f32_pos("EngineDamage");
        damage.gearbox_damage = reader.f32_pos("GearboxDamage");
        damage.suspension_damage = reader.f32_pos("SuspensionDamage");
        damage.chassis_damage = reader.f32_pos("ChassisDamage");

        speed_mps
    }

    fn environment_step(&mut self, sample: &RawSample, snap: &mut TelemetrySnapshot) {
        let state = &mut self.state;
        {
            let mut reader = SampleReader::new(sample, &mut state.missing);
            let env = &mut snap.environment;
            env.air_temp = reader.f32("AirTemp");
            env.track_surface_temp = reader.f32("TrackTemp");
            env.track_temp_crew = reader.f32("TrackTempCrew");
            env.wind_speed = reader.f32_pos("WindVel");
            env.wind_dir = reader.f32("WindDir");
            env.relative_humidity = reader.f32_pos("RelativeHumidity");
            env.air_pressure = reader.f32_pos("AirPressure");
            env.fog_level = reader.f32_pos("FogLevel");
            env.precipitation = reader.f32_pos("Precipitation");
            env.weather_declared_wet = reader.bool("WeatherDeclaredWet");
            env.track_wetness = reader.f32_pos("TrackWetness");
            env.session_time_of_day = reader.f32_pos("SessionTimeOfDay");

            let sys = &mut snap.system;
            sys.frame_rate = reader.f32_pos("FrameRate");
            sys.cpu_usage_fg = reader.f32_pos("CpuUsageFG");
            sys.cpu_usage_bg = reader.f32_pos("CpuUsageBG");
            sys.gpu_usage = reader.f32_pos("GpuUsage");
        }

        if let Some(weekend) = &state.descriptor.weekend {
            let env = &mut snap.environment;
            env.skies = weekend.skies.clone();
            env.forecast_type = weekend.forecast_type.clone();
            env.chance_of_rain = weekend.chance_of_rain;
            if env.air_temp == 0.0 {
                env.air_temp = weekend.track_air_temp;
            }
        }
    }

    fn assemble(&mut self, snap: &mut TelemetrySnapshot, speed_mps: f32) {
        let descriptor = &self.state.descriptor;
        snap.player = descriptor.player.clone();
        snap.weekend = descriptor.weekend.clone();
        snap.session_detail = descriptor.session.clone();

        let ts = &mut snap.tyre_snapshot;
        ts.timestamp = Some(Utc::now());
        ts.lap_number = snap.timing.lap;
        ts.lap_distance = snap.timing.lap_dist_pct;
        ts.speed = speed_mps;
        ts.rpm = snap.vehicle.rpm;
        ts.lateral_acceleration = snap.high_freq.lat_accel;
        ts.longitudinal_acceleration = snap.high_freq.long_accel;
        ts.vertical_acceleration = snap.high_freq.vert_accel;
        ts.tire_compound = snap.tyres.compound.clone();
        for wheel in Wheel::ALL {
            let state = snap.tyres.wheel(wheel);
            let summary = &mut ts.wheels[wheel as usize];
            summary.current_pressure = state.pressure;
            summary.last_hot_pressure = state.hot_pressure;
            summary.cold_pressure = state.cold_pressure;
            summary.current_temp_internal = state.temps[0];
            summary.current_temp_middle = state.temps[1];
            summary.current_temp_external = state.temps[2];
            summary.cold_temp =
                (state.cold_temps[0] + state.cold_temps[1] + state.cold_temps[2]) / 3.0;
            summary.core_temp = (state.temps[0] + state.temps[1] + state.temps[2]) / 3.0;
            summary.tread_remaining = state.tread_remaining;
            summary.start_tread = state.start_tread;
            summary.wear = if state.tread_remaining > 0.0 {
                1.0 - state.tread_remaining
            } else {
                0.0
            };
        }

        snap.missing_vars = self.state.missing.iter().cloned().collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{SimulatedSource, TelemetrySource, VarValue};

    #[test]
    fn test_missing_variable_surfaces_once() {
        let mut engine = DerivationEngine::new();
        // RPM is never provided across many ticks.
        for tick in 0..20 {
            let sample = RawSample::new(tick)
                .with_var("Speed", VarValue::Float(40.0))
                .with_var("Lap", VarValue::Int(1));
            let snap = engine.process(&sample);
            assert_eq!(snap.vehicle.rpm, 0.0);
            let count = snap.missing_vars.iter().filter(|v| *v == "RPM").count();
            assert_eq!(count, 1);
        }
    }

    #[test]
    fn test_negative_roster_slot_never_aborts_the_tick() {
        let descriptor = "DriverInfo:\n Drivers:\n - CarIdx: -1\n   UserName: Pace Car\n - CarIdx: 0\n   UserName: Test Driver\n   IRating: 2000\n";
        let mut engine = DerivationEngine::new();
        let sample = RawSample::new(1)
            .with_descriptor(descriptor)
            .with_var("PlayerCarIdx", VarValue::Int(0))
            .with_var("Lap", VarValue::Int(1));
        let snap = engine.process(&sample);
        assert_eq!(snap.radar.user_names, vec!["Test Driver"]);
    }

    #[test]
    fn test_descriptor_cached_across_identical_ticks() {
        let mut engine = DerivationEngine::new();
        let mut source = SimulatedSource::new(16);
        let first = source.poll().unwrap();
        let second = source.poll().unwrap();
        engine.process(&first);
        engine.process(&second);
        assert_eq!(engine.descriptor_parse_count(), 1);
    }

    #[test]
    fn test_session_change_resets_fuel_state() {
        let mut engine = DerivationEngine::new();
        let tick = |n: i32, session: i32, lap: i32, fuel: f32| {
            RawSample::new(n)
                .with_var("SessionNum", VarValue::Int(session))
                .with_var("Lap", VarValue::Int(lap))
                .with_var("FuelLevel", VarValue::Float(fuel))
        };
        engine.process(&tick(1, 0, 4, 40.0));
        // First-ever session also asks for stored data.
        assert!(engine.awaiting_stored());
        engine.apply_stored(None);
        let snap = engine.process(&tick(2, 0, 5, 37.5));
        assert!((snap.fuel.rolling_average - 2.5).abs() < 1e-3);
        assert!(!engine.awaiting_stored());

        let snap = engine.process(&tick(3, 1, 0, 37.5));
        assert_eq!(snap.fuel.rolling_average, 0.0);
        assert!(engine.awaiting_stored());
    }

    #[test]
    fn test_stored_record_seeds_average() {
        let mut engine = DerivationEngine::new();
        engine.process(&RawSample::new(1).with_var("FuelLevel", VarValue::Float(50.0)));
        assert!(engine.awaiting_stored());
        engine.apply_stored(Some(&FuelRecord {
            avg_fuel_per_lap: 2.8,
            last_lap_fuel: 2.7,
            fuel_capacity: 60.0,
        }));
        assert!(!engine.awaiting_stored());
        let snap = engine.process(&RawSample::new(2).with_var("FuelLevel", VarValue::Float(50.0)));
        assert!((snap.fuel.rolling_average - 2.8).abs() < 1e-6);
        assert!((snap.fuel.last_lap_consumption - 2.7).abs() < 1e-6);
    }

    #[test]
    fn test_simulated_source_end_to_end() {
        let mut engine = DerivationEngine::new();
        let mut source = SimulatedSource::new(16);
        let sample = source.poll().unwrap();
        let snap = engine.process(&sample);
        assert_eq!(snap.session.session_num, 0);
        assert!(snap.vehicle.speed > 0.0);
        assert_eq!(snap.timing.sector_count, 3);
        assert_eq!(snap.weekend.as_ref().unwrap().track_name, "okayama full");
        assert_eq!(engine.car_track_identity(), Some(("demo_gt3", "okayama full")));
        assert_eq!(snap.radar.user_names[1], "Rival One");
        assert!(snap.tyre_snapshot.wheels[0].current_pressure > 0.0);
    }
}
