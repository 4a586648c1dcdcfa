//! Tyre population and pit-transition baseline capture.
//!
//! Pressures and temperatures are trusted every tick. Wear and tread
//! readings are only trusted while the car sits on pit road; on track the
//! last pit-road capture is held instead.

use tracing::{debug, info};

use crate::model::{TelemetrySnapshot, Wheel};
use crate::source::{RawSample, SampleReader};
use crate::units::kpa_to_psi;

use super::state::EngineState;

/// Live readings for one wheel this tick.
#[derive(Debug, Clone, Copy, Default)]
struct WheelReading {
    /// PSI, converted from the source's kPa.
    pressure: f32,
    /// Inner, middle, outer carcass temperature, Celsius.
    temps: [f32; 3],
    /// Remaining tread per zone, 1.0 new; zero when unsupported off pit road.
    wear: [f32; 3],
    ride_height: f32,
}

impl WheelReading {
    fn tread(&self) -> f32 {
        (self.wear[0] + self.wear[1] + self.wear[2]) / 3.0
    }

    fn has_wear(&self) -> bool {
        self.wear.iter().sum::<f32>() > 0.0
    }
}

fn read_wheel(reader: &mut SampleReader<'_>, wheel: Wheel) -> WheelReading {
    let p = wheel.prefix();
    WheelReading {
        pressure: kpa_to_psi(reader.f32_pos(&format!("{p}press"))),
        temps: [
            reader.f32_pos(&format!("{p}tempCL")),
            reader.f32_pos(&format!("{p}tempCM")),
            reader.f32_pos(&format!("{p}tempCR")),
        ],
        wear: [
            reader.f32_pos(&format!("{p}wearL")),
            reader.f32_pos(&format!("{p}wearM")),
            reader.f32_pos(&format!("{p}wearR")),
        ],
        ride_height: reader.f32(&format!("{p}rideHeight")),
    }
}

pub(super) fn apply(state: &mut EngineState, sample: &RawSample, snap: &mut TelemetrySnapshot) {
    let readings = {
        let mut reader = SampleReader::new(sample, &mut state.missing);
        [
            read_wheel(&mut reader, Wheel::LeftFront),
            read_wheel(&mut reader, Wheel::RightFront),
            read_wheel(&mut reader, Wheel::LeftRear),
            read_wheel(&mut reader, Wheel::RightRear),
        ]
    };
    let on_pit_road = snap.pit.on_pit_road;

    // Wear is captured fresh only while stationary readings are plausible,
    // i.e. on pit road.
    if on_pit_road {
        for (baseline, reading) in state.wheels.iter_mut().zip(&readings) {
            if reading.has_wear() {
                baseline.last_wear = reading.wear;
                baseline.last_tread = reading.tread();
            }
        }
    }

    detect_transitions(state, &readings, on_pit_road);
    ensure_initial_values(state, &readings);

    for (i, wheel) in Wheel::ALL.into_iter().enumerate() {
        let reading = &readings[i];
        let baseline = &state.wheels[i];
        let out = snap.tyres.wheel_mut(wheel);
        out.pressure = reading.pressure;
        out.hot_pressure = baseline.hot_press;
        out.cold_pressure = baseline.cold_press;
        out.setup_pressure = state
            .setup
            .as_ref()
            .map(|s| s.cold_pressures[i])
            .unwrap_or(0.0);
        out.temps = reading.temps;
        out.cold_temps = baseline.cold_temp;
        out.last_temps = baseline.last_temp;
        out.wear = baseline.last_wear;
        out.wear_avg =
            (baseline.last_wear[0] + baseline.last_wear[1] + baseline.last_wear[2]) / 3.0;
        out.tread_remaining = baseline.last_tread;
        out.start_tread = baseline.start_tread;
    }

    if let Some(player) = &state.descriptor.player {
        snap.tyres.compound = player.tire_compound.clone();
    }
    if let Some(setup) = &state.setup {
        if snap.tyres.compound.is_empty() {
            snap.tyres.compound = setup.compound.clone();
        }
    }

    // Stagger in millimetres, right minus left.
    snap.tyres.front_stagger = (readings[1].ride_height - readings[0].ride_height) * 1000.0;
    snap.tyres.rear_stagger = (readings[3].ride_height - readings[2].ride_height) * 1000.0;
}

fn detect_transitions(state: &mut EngineState, readings: &[WheelReading; 4], on_pit_road: bool) {
    if !state.pit_flag_initialized {
        state.was_on_pit_road = on_pit_road;
        state.pit_flag_initialized = true;
        return;
    }

    if on_pit_road && !state.was_on_pit_road {
        for (baseline, reading) in state.wheels.iter_mut().zip(readings) {
            baseline.hot_press = reading.pressure;
            baseline.last_temp = reading.temps;
            if reading.has_wear() {
                baseline.last_wear = reading.wear;
                baseline.last_tread = reading.tread();
            }
        }
        info!(
            lf = state.wheels[0].hot_press,
            rf = state.wheels[1].hot_press,
            lr = state.wheels[2].hot_press,
            rr = state.wheels[3].hot_press,
            "pit entry, hot pressures captured"
        );
    } else if !on_pit_road && state.was_on_pit_road {
        for (baseline, reading) in state.wheels.iter_mut().zip(readings) {
            baseline.cold_press = reading.pressure;
            baseline.cold_temp = reading.temps;
            if reading.has_wear() {
                baseline.start_tread = reading.tread();
            } else if baseline.last_tread > 0.0 {
                baseline.start_tread = baseline.last_tread;
            }
        }
        info!(
            lf = state.wheels[0].cold_press,
            rf = state.wheels[1].cold_press,
            lr = state.wheels[2].cold_press,
            rr = state.wheels[3].cold_press,
            "pit exit, cold pressures captured"
        );
    }

    state.was_on_pit_road = on_pit_road;
}

/// Startup fallback: a baseline still at zero adopts the first positive
/// reading, covering a mid-session engine start with no pit transition yet.
fn ensure_initial_values(state: &mut EngineState, readings: &[WheelReading; 4]) {
    let mut updated = false;
    for (baseline, reading) in state.wheels.iter_mut().zip(readings) {
        if baseline.cold_press == 0.0 && reading.pressure > 0.0 {
            baseline.cold_press = reading.pressure;
            updated = true;
        }
        for z in 0..3 {
            if baseline.cold_temp[z] == 0.0 && reading.temps[z] > 0.0 {
                baseline.cold_temp[z] = reading.temps[z];
                updated = true;
            }
            if baseline.last_temp[z] == 0.0 && reading.temps[z] > 0.0 {
                baseline.last_temp[z] = reading.temps[z];
                updated = true;
            }
        }
        if baseline.last_wear[0] == 0.0 && reading.has_wear() {
            baseline.last_wear = reading.wear;
            baseline.last_tread = reading.tread();
            updated = true;
        }
        if baseline.start_tread == 0.0 && reading.tread() > 0.0 {
            baseline.start_tread = reading.tread();
            updated = true;
        }
    }
    if updated {
        debug!("tyre baselines seeded from first positive readings");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::VarValue;

    fn sample(pressure_kpa: f32, on_pit: bool) -> (RawSample, bool) {
        let mut s = RawSample::new(1);
        for p in ["LF", "RF", "LR", "RR"] {
            s.set_var(&format!("{p}press"), VarValue::Float(pressure_kpa));
            s.set_var(&format!("{p}tempCL"), VarValue::Float(80.0));
            s.set_var(&format!("{p}tempCM"), VarValue::Float(85.0));
            s.set_var(&format!("{p}tempCR"), VarValue::Float(90.0));
            s.set_var(&format!("{p}wearL"), VarValue::Float(0.97));
            s.set_var(&format!("{p}wearM"), VarValue::Float(0.96));
            s.set_var(&format!("{p}wearR"), VarValue::Float(0.95));
            s.set_var(&format!("{p}rideHeight"), VarValue::Float(0.05));
        }
        (s, on_pit)
    }

    fn run_tick(state: &mut EngineState, pressure_kpa: f32, on_pit: bool) -> TelemetrySnapshot {
        let (s, pit) = sample(pressure_kpa, on_pit);
        let mut snap = TelemetrySnapshot::default();
        snap.pit.on_pit_road = pit;
        apply(state, &s, &mut snap);
        snap
    }

    #[test]
    fn test_pit_transition_sequence_captures_baselines_once() {
        let mut state = EngineState::default();
        let flags = [false, false, true, true, false];
        let pressures_kpa = [160.0, 161.0, 162.0, 163.0, 150.0];
        for (flag, kpa) in flags.iter().zip(pressures_kpa) {
            run_tick(&mut state, kpa, *flag);
        }
        // Hot captured at the false->true tick (162 kPa), cold at the
        // true->false tick (150 kPa).
        assert!((state.wheels[0].hot_press - kpa_to_psi(162.0)).abs() < 1e-4);
        assert!((state.wheels[0].cold_press - kpa_to_psi(150.0)).abs() < 1e-4);
        // Further neutral ticks leave them alone.
        run_tick(&mut state, 175.0, false);
        assert!((state.wheels[0].hot_press - kpa_to_psi(162.0)).abs() < 1e-4);
        assert!((state.wheels[0].cold_press - kpa_to_psi(150.0)).abs() < 1e-4);
    }

    #[test]
    fn test_startup_fallback_seeds_first_positive() {
        let mut state = EngineState::default();
        let snap = run_tick(&mut state, 158.0, false);
        // No pit transition happened, yet baselines carry the first reading.
        assert!((state.wheels[2].cold_press - kpa_to_psi(158.0)).abs() < 1e-4);
        assert_eq!(state.wheels[2].cold_temp, [80.0, 85.0, 90.0]);
        assert!(snap.tyres.wheels[2].cold_pressure > 0.0);
    }

    #[test]
    fn test_wear_held_off_pit_road() {
        let mut state = EngineState::default();
        // Seed wear during a pit visit.
        run_tick(&mut state, 160.0, true);
        let seeded = state.wheels[0].last_wear;
        assert_eq!(seeded, [0.97, 0.96, 0.95]);

        // Off pit road, incoming wear values change but the baseline holds.
        let (mut s, _) = sample(160.0, false);
        for p in ["LF", "RF", "LR", "RR"] {
            s.set_var(&format!("{p}wearL"), VarValue::Float(0.50));
        }
        let mut snap = TelemetrySnapshot::default();
        snap.pit.on_pit_road = false;
        apply(&mut state, &s, &mut snap);
        assert_eq!(snap.tyres.wheels[0].wear, seeded);
    }
}
