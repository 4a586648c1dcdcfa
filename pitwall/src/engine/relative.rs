//! Per-car arrays, iRating deltas and nearest ahead/behind gaps.

use tracing::debug;

use crate::decode;
use crate::model::TelemetrySnapshot;
use crate::source::{RawSample, SampleReader};

use super::state::EngineState;

/// F2 gap values at or beyond this are sentinel garbage, seconds.
const MAX_VALID_F2_GAP: f32 = 300.0;

/// Speeds below this are treated as stationary for gap conversion, m/s.
const MIN_GAP_SPEED: f32 = 0.1;

/// Signed lap-distance delta from `from_pct` to `to_pct`, folded onto the
/// shorter way around the lap. Positive means `to` is ahead of `from`.
pub(crate) fn wrap_delta(from_pct: f32, to_pct: f32) -> f32 {
    let mut delta = to_pct - from_pct;
    if delta > 0.5 {
        delta -= 1.0;
    } else if delta < -0.5 {
        delta += 1.0;
    }
    delta
}

pub(super) fn apply(
    state: &mut EngineState,
    sample: &RawSample,
    snap: &mut TelemetrySnapshot,
    speed_mps: f32,
) {
    {
        let mut reader = SampleReader::new(sample, &mut state.missing);
        let radar = &mut snap.radar;
        radar.lap_dist_pct = reader.f32s("CarIdxLapDistPct");
        radar.position = reader.i32s("CarIdxPosition");
        radar.lap = reader.i32s("CarIdxLap");
        radar.on_pit_road = reader.bools("CarIdxOnPitRoad");
        radar.track_surface = reader.i32s("CarIdxTrackSurface");
        radar.track_surface_names = radar
            .track_surface
            .iter()
            .map(|&s| decode::track_surface(s))
            .collect();
        radar.f2_time = reader.f32s("CarIdxF2Time");
        radar.last_lap_time = reader.f32s("CarIdxLastLapTime");
        radar.best_lap_time = reader.f32s("CarIdxBestLapTime");
        radar.gear = reader.i32s("CarIdxGear");
        radar.rpm = reader.f32s("CarIdxRPM");
    }

    populate_roster(state, snap);
    compute_distances(state, snap);
    compute_time_deltas(snap, speed_mps);
    name_neighbours(snap);
}

/// Roster arrays indexed by car slot, plus the per-car iRating delta from
/// each car's first-seen rating.
fn populate_roster(state: &mut EngineState, snap: &mut TelemetrySnapshot) {
    let drivers = &state.descriptor.drivers;
    // A malformed roster entry can carry a negative slot; it owns no
    // position in the per-car arrays.
    let size = drivers
        .iter()
        .filter_map(|d| usize::try_from(d.car_idx).ok())
        .map(|idx| idx + 1)
        .max()
        .unwrap_or(0);
    if size == 0 {
        return;
    }

    let radar = &mut snap.radar;
    radar.user_names.resize(size, String::new());
    radar.car_numbers.resize(size, String::new());
    radar.i_ratings.resize(size, 0);
    radar.i_rating_deltas.resize(size, 0);
    radar.lic_strings.resize(size, String::new());
    radar.car_class_short_names.resize(size, String::new());
    radar.tire_compounds.resize(size, String::new());
    if state.ir_start.len() < size {
        state.ir_start.resize(size, 0);
    }

    for driver in drivers {
        let Ok(idx) = usize::try_from(driver.car_idx) else {
            debug!(
                car_idx = driver.car_idx,
                user = %driver.user_name,
                "roster entry without a valid car slot skipped"
            );
            continue;
        };
        if idx >= size {
            continue;
        }
        radar.user_names[idx] = driver.user_name.clone();
        radar.car_numbers[idx] = driver.car_number.clone();
        radar.i_ratings[idx] = driver.i_rating;
        radar.lic_strings[idx] = driver.lic_string.clone();
        radar.car_class_short_names[idx] = driver.car_class_short_name.clone();
        radar.tire_compounds[idx] = driver.tire_compound.clone();
        // Baseline fixed at first sight of the car.
        if state.ir_start[idx] == 0 {
            state.ir_start[idx] = driver.i_rating;
        }
        radar.i_rating_deltas[idx] = driver.i_rating - state.ir_start[idx];
    }
}

/// Physical distance to the nearest car ahead and behind, via the wrapped
/// lap-distance delta and the track length.
fn compute_distances(state: &EngineState, snap: &mut TelemetrySnapshot) {
    let player = snap.session.player_car_idx as usize;
    let pcts = &snap.radar.lap_dist_pct;
    if state.track_length_km <= 0.0 || player >= pcts.len() {
        return;
    }
    let track_m = state.track_length_km * 1000.0;
    let my_pct = pcts[player];

    let mut ahead: Option<f32> = None;
    let mut behind: Option<f32> = None;
    for (i, &pct) in pcts.iter().enumerate() {
        if i == player || pct < 0.0 {
            continue;
        }
        let delta = wrap_delta(my_pct, pct);
        if delta > 0.0 && ahead.map_or(true, |d| delta < d) {
            ahead = Some(delta);
        } else if delta < 0.0 && behind.map_or(true, |d| -delta < d) {
            behind = Some(-delta);
        }
    }
    snap.relative.distance_ahead = ahead.unwrap_or(0.0) * track_m;
    snap.relative.distance_behind = behind.unwrap_or(0.0) * track_m;
}

/// Time gap to the cars one position ahead and behind: the source's F2 gap
/// when plausible, then distance over speed.
fn compute_time_deltas(snap: &mut TelemetrySnapshot, speed_mps: f32) {
    let player = snap.session.player_car_idx as usize;
    let positions = &snap.radar.position;
    let f2 = &snap.radar.f2_time;
    let mut ahead_idx = None;
    let mut behind_idx = None;

    if player < positions.len() && positions.len() == f2.len() {
        let my_pos = positions[player];
        for (i, &pos) in positions.iter().enumerate() {
            if ahead_idx.is_none() && pos == my_pos - 1 {
                let val = -f2[i];
                if val.abs() < MAX_VALID_F2_GAP {
                    snap.relative.time_delta_ahead = val;
                    ahead_idx = Some(i);
                }
            } else if behind_idx.is_none() && pos == my_pos + 1 {
                let val = f2[i];
                if val.abs() < MAX_VALID_F2_GAP {
                    snap.relative.time_delta_behind = val;
                    behind_idx = Some(i);
                }
            }
            if ahead_idx.is_some() && behind_idx.is_some() {
                break;
            }
        }
    }

    let speed = if speed_mps > MIN_GAP_SPEED {
        speed_mps
    } else {
        0.0
    };
    if ahead_idx.is_none() && snap.relative.distance_ahead > 0.0 && speed > 0.0 {
        snap.relative.time_delta_ahead = snap.relative.distance_ahead / speed;
    }
    if behind_idx.is_none() && snap.relative.distance_behind > 0.0 && speed > 0.0 {
        snap.relative.time_delta_behind = snap.relative.distance_behind / speed;
    }

    snap.relative.car_ahead_name = name_at(snap, ahead_idx);
    snap.relative.car_behind_name = name_at(snap, behind_idx);
}

/// Fill in neighbour names by race position when the gap path found none.
fn name_neighbours(snap: &mut TelemetrySnapshot) {
    let player = snap.session.player_car_idx as usize;
    let positions = &snap.radar.position;
    if player >= positions.len() {
        return;
    }
    let my_pos = positions[player];
    let mut ahead = None;
    let mut behind = None;
    for (i, &pos) in positions.iter().enumerate() {
        if pos == my_pos - 1 {
            ahead = Some(i);
        } else if pos == my_pos + 1 {
            behind = Some(i);
        }
        if ahead.is_some() && behind.is_some() {
            break;
        }
    }
    if snap.relative.car_ahead_name.is_empty() {
        snap.relative.car_ahead_name = name_at(snap, ahead);
    }
    if snap.relative.car_behind_name.is_empty() {
        snap.relative.car_behind_name = name_at(snap, behind);
    }
}

fn name_at(snap: &TelemetrySnapshot, idx: Option<usize>) -> String {
    idx.and_then(|i| snap.radar.user_names.get(i))
        .cloned()
        .unwrap_or_default()
}
