//! Lap-boundary fuel accounting and the end-of-race projection.

use tracing::debug;

use crate::model::{FuelStatus, TelemetrySnapshot};
use crate::source::{RawSample, SampleReader};
use crate::units::ensure_non_negative;

use super::state::EngineState;

/// Laps that consumed less than this are ignored for the rolling average.
pub(crate) const MIN_VALID_LAP_FUEL: f32 = 0.05;

/// Estimated lap times at or beyond this are implausible (20 min), so a
/// time-limited race projection is skipped rather than poisoned.
const MAX_PLAUSIBLE_LAP_SECONDS: f32 = 1200.0;

/// Lap counters, lap times and the lap-boundary fuel hand-off. Runs before
/// the tyre and sector steps; the projection itself runs after them.
pub(super) fn lap_bookkeeping(
    state: &mut EngineState,
    sample: &RawSample,
    snap: &mut TelemetrySnapshot,
) {
    let (lap, lap_dist_pct, fuel_level, current, last, best, delta_best) = {
        let mut reader = SampleReader::new(sample, &mut state.missing);
        (
            reader.i32_non_neg("Lap"),
            reader.f32_pos("LapDistPct"),
            reader.f32_pos("FuelLevel"),
            reader.f32("LapCurrentLapTime"),
            reader.f32("LapLastLapTime"),
            reader.f32("LapBestLapTime"),
            reader.f32("LapDeltaToSessionBestLap"),
        )
    };
    let on_pit_road = snap.pit.on_pit_road;

    snap.timing.lap = lap;
    snap.timing.lap_dist_pct = lap_dist_pct;
    snap.timing.current_lap_time = current;
    snap.timing.last_lap_time = last;
    snap.timing.best_lap_time = best;
    snap.timing.delta_to_session_best = delta_best;
    snap.timing.delta_to_best = delta_best;

    if on_pit_road {
        state.lap_touched_pit = true;
    }

    if state.last_lap < 0 {
        state.last_lap = lap;
        state.fuel_at_lap_start = fuel_level;
        return;
    }

    if lap != state.last_lap {
        let consumed = state.fuel_at_lap_start - fuel_level;
        state.last_lap_consumption = consumed;
        if consumed >= MIN_VALID_LAP_FUEL && !state.lap_touched_pit {
            state.push_lap_fuel(consumed);
        } else {
            debug!(
                consumed,
                pit = state.lap_touched_pit,
                "lap consumption rejected from rolling history"
            );
        }
        state.fuel_at_lap_start = fuel_level;
        state.current_lap_consumption = 0.0;
        state.last_lap = lap;
        state.lap_touched_pit = on_pit_road;
    }
}

/// The fuel projection proper. Needs `timing.est_lap_time` from the sector
/// step and `session.total_laps` from the session step.
pub(super) fn project(state: &mut EngineState, sample: &RawSample, snap: &mut TelemetrySnapshot) {
    let (level, level_pct, capacity, sdk_per_lap, used_total) = {
        let mut reader = SampleReader::new(sample, &mut state.missing);
        (
            reader.f32_pos("FuelLevel"),
            reader.f32_pos("FuelLevelPct"),
            reader.f32_pos("FuelCapacity"),
            reader.f32_pos("FuelUsePerLap"),
            reader.f32_pos("SessionFuelUsed"),
        )
    };
    let on_pit_road = snap.pit.on_pit_road;
    let lap = snap.timing.lap;
    let lap_dist_pct = snap.timing.lap_dist_pct;

    // Measured delta since lap start wins; SDK figures only fill the gap.
    let measured = state.fuel_at_lap_start - level;
    if measured > 0.0 && !on_pit_road {
        state.current_lap_consumption = measured;
    }
    let mut current = state.current_lap_consumption;
    if current <= 0.0 && sdk_per_lap > 0.0 {
        current = sdk_per_lap;
    }

    let laps_on_current = if current > 0.0 { level / current } else { 0.0 };

    // Rolling average: FIFO mean first, total/effective-laps fallback once
    // at least half a lap has been run. Updates are suppressed on pit road;
    // refuelling would corrupt the trend.
    let effective_laps = lap as f32 + lap_dist_pct;
    let fresh = if !state.recent_lap_fuel.is_empty() {
        state.lap_fuel_mean()
    } else if effective_laps > 0.5 && used_total > 0.0 {
        used_total / effective_laps
    } else {
        0.0
    };
    if fresh > 0.0 && !on_pit_road {
        state.rolling_average = (fresh * 1000.0).round() / 1000.0;
    }
    let average = state.rolling_average;

    let est_lap_time = snap.timing.est_lap_time;
    let total_laps = snap.session.total_laps;
    let laps_remaining_race = if total_laps > 0 {
        ensure_non_negative(total_laps - lap)
    } else if snap.session.session_time_remain > 0.0
        && est_lap_time > 0.0
        && est_lap_time < MAX_PLAUSIBLE_LAP_SECONDS
    {
        (snap.session.session_time_remain / est_lap_time as f64).floor() as i32
    } else {
        0
    };
    snap.session.laps_remaining_race = laps_remaining_race;

    let projection_rate = if average > 0.0 { average } else { current };
    let needed = if laps_remaining_race > 0 && projection_rate > 0.0 {
        laps_remaining_race as f32 * projection_rate
    } else {
        0.0
    };

    let fuel = &mut snap.fuel;
    fuel.level = level;
    fuel.level_pct = level_pct;
    fuel.capacity = capacity;
    fuel.level_lap_start = state.fuel_at_lap_start;
    fuel.used_total = used_total;
    fuel.current_lap_consumption = current;
    fuel.last_lap_consumption = state.last_lap_consumption;
    fuel.rolling_average = average;
    fuel.laps_remaining_race = laps_remaining_race;
    fuel.laps_remaining_average = if average > 0.0 { level / average } else { 0.0 };
    fuel.laps_remaining_last_lap = if state.last_lap_consumption > 0.0 {
        level / state.last_lap_consumption
    } else {
        0.0
    };
    fuel.needed_to_finish = needed;
    fuel.recommended_refuel = (needed - level).max(0.0);
    fuel.status = FuelStatus::classify(level, laps_on_current);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::VarValue;

    fn sample(lap: i32, fuel: f32, pct: f32) -> RawSample {
        RawSample::new(1)
            .with_var("Lap", VarValue::Int(lap))
            .with_var("LapDistPct", VarValue::Float(pct))
            .with_var("FuelLevel", VarValue::Float(fuel))
            .with_var("FuelLevelPct", VarValue::Float(fuel / 60.0))
            .with_var("FuelCapacity", VarValue::Float(60.0))
            .with_var("FuelUsePerLap", VarValue::Float(2.6))
            .with_var("SessionFuelUsed", VarValue::Float(0.0))
    }

    fn tick(state: &mut EngineState, lap: i32, fuel: f32, pit: bool) -> TelemetrySnapshot {
        let s = sample(lap, fuel, 0.3);
        let mut snap = TelemetrySnapshot::default();
        snap.pit.on_pit_road = pit;
        lap_bookkeeping(state, &s, &mut snap);
        project(state, &s, &mut snap);
        snap
    }

    #[test]
    fn test_lap_transition_finalizes_consumption() {
        let mut state = EngineState::default();
        tick(&mut state, 5, 42.0, false);
        assert_eq!(state.fuel_at_lap_start, 42.0);

        let snap = tick(&mut state, 6, 38.5, false);
        assert!((state.last_lap_consumption - 3.5).abs() < 1e-5);
        assert_eq!(state.recent_lap_fuel.len(), 1);
        assert!((state.recent_lap_fuel[0] - 3.5).abs() < 1e-5);
        assert_eq!(state.fuel_at_lap_start, 38.5);
        assert!((snap.fuel.rolling_average - 3.5).abs() < 1e-3);
    }

    #[test]
    fn test_tiny_consumption_rejected() {
        let mut state = EngineState::default();
        tick(&mut state, 3, 40.0, false);
        tick(&mut state, 4, 39.99, false);
        assert!(state.recent_lap_fuel.is_empty());
    }

    #[test]
    fn test_pit_lap_rejected() {
        let mut state = EngineState::default();
        tick(&mut state, 3, 40.0, false);
        // The car visits pit road mid lap, then completes the lap on track.
        tick(&mut state, 3, 39.0, true);
        tick(&mut state, 4, 36.0, false);
        assert!(state.recent_lap_fuel.is_empty());
        // The following clean lap is accepted.
        tick(&mut state, 5, 33.4, false);
        assert_eq!(state.recent_lap_fuel.len(), 1);
        assert!((state.recent_lap_fuel[0] - 2.6).abs() < 1e-5);
    }

    #[test]
    fn test_average_suppressed_on_pit_road() {
        let mut state = EngineState::default();
        tick(&mut state, 3, 40.0, false);
        tick(&mut state, 4, 37.4, false);
        let before = state.rolling_average;
        assert!(before > 0.0);

        state.push_lap_fuel(9.0);
        let snap = tick(&mut state, 4, 37.0, true);
        // New mean would differ, but the pit-road tick keeps the old value.
        assert_eq!(snap.fuel.rolling_average, before);
    }

    #[test]
    fn test_lap_limited_race_projection() {
        let mut state = EngineState::default();
        tick(&mut state, 5, 42.0, false);
        let s = sample(6, 38.5, 0.0);
        let mut snap = TelemetrySnapshot::default();
        snap.session.total_laps = 20;
        lap_bookkeeping(&mut state, &s, &mut snap);
        project(&mut state, &s, &mut snap);
        assert_eq!(snap.fuel.laps_remaining_race, 14);
        assert!((snap.fuel.needed_to_finish - 14.0 * 3.5).abs() < 1e-2);
        assert!((snap.fuel.recommended_refuel - (14.0 * 3.5 - 38.5)).abs() < 1e-2);
        assert_eq!(snap.fuel.status, FuelStatus::OK);
    }

    #[test]
    fn test_empty_tank_status() {
        let mut state = EngineState::default();
        let snap = tick(&mut state, 2, 0.0, false);
        assert_eq!(snap.fuel.status, FuelStatus::EMPTY);
    }
}
