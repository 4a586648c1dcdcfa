//! Per-car arrays and the nearest ahead/behind gaps.

use serde::Serialize;

use crate::units::{scrub, scrub_slice, Sanitize};

/// Parallel per-car arrays, indexed by car slot.
///
/// Wire names keep the source's `carIdx` prefix so the flat payload cannot
/// collide with the player-scoped fields of the same name.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RadarInfo {
    #[serde(rename = "carIdxLapDistPct")]
    pub lap_dist_pct: Vec<f32>,
    #[serde(rename = "carIdxPosition")]
    pub position: Vec<i32>,
    #[serde(rename = "carIdxLap")]
    pub lap: Vec<i32>,
    #[serde(rename = "carIdxOnPitRoad")]
    pub on_pit_road: Vec<bool>,
    #[serde(rename = "carIdxTrackSurface")]
    pub track_surface: Vec<i32>,
    #[serde(rename = "carIdxTrackSurfaceNames")]
    pub track_surface_names: Vec<&'static str>,
    #[serde(rename = "carIdxF2Time")]
    pub f2_time: Vec<f32>,
    #[serde(rename = "carIdxLastLapTime")]
    pub last_lap_time: Vec<f32>,
    #[serde(rename = "carIdxBestLapTime")]
    pub best_lap_time: Vec<f32>,
    #[serde(rename = "carIdxGear")]
    pub gear: Vec<i32>,
    #[serde(rename = "carIdxRPM")]
    pub rpm: Vec<f32>,
    #[serde(rename = "carIdxUserNames")]
    pub user_names: Vec<String>,
    #[serde(rename = "carIdxCarNumbers")]
    pub car_numbers: Vec<String>,
    #[serde(rename = "carIdxIRatings")]
    pub i_ratings: Vec<i32>,
    /// Change since each car's first-seen rating.
    #[serde(rename = "carIdxIRatingDeltas")]
    pub i_rating_deltas: Vec<i32>,
    #[serde(rename = "carIdxLicStrings")]
    pub lic_strings: Vec<String>,
    #[serde(rename = "carIdxCarClassShortNames")]
    pub car_class_short_names: Vec<String>,
    #[serde(rename = "carIdxTireCompounds")]
    pub tire_compounds: Vec<String>,
}

impl Sanitize for RadarInfo {
    fn sanitize(&mut self) {
        scrub_slice(&mut self.lap_dist_pct);
        scrub_slice(&mut self.f2_time);
        scrub_slice(&mut self.last_lap_time);
        scrub_slice(&mut self.best_lap_time);
        scrub_slice(&mut self.rpm);
    }
}

/// Nearest car ahead and behind on track, by wrapped lap distance.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelativeInfo {
    /// Metres to the nearest car ahead, 0 when none.
    pub distance_ahead: f32,
    pub distance_behind: f32,
    /// Seconds; positive means the gap closes toward that car.
    pub time_delta_ahead: f32,
    pub time_delta_behind: f32,
    pub car_ahead_name: String,
    pub car_behind_name: String,
}

impl Sanitize for RelativeInfo {
    fn sanitize(&mut self) {
        scrub(&mut self.distance_ahead);
        scrub(&mut self.distance_behind);
        scrub(&mut self.time_delta_ahead);
        scrub(&mut self.time_delta_behind);
    }
}
