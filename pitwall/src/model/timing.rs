//! Lap and sector timing section.

use serde::Serialize;

use crate::units::{scrub, scrub_slice, Sanitize};

/// Lap counters, lap times and the per-sector arrays.
///
/// `sector_times`, `session_best_sector_times`, `sector_deltas` and
/// `sector_is_best` are parallel arrays of length `sector_count`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LapTiming {
    pub lap: i32,
    pub lap_dist_pct: f32,
    pub current_lap_time: f32,
    pub last_lap_time: f32,
    pub best_lap_time: f32,
    pub delta_to_session_best: f32,
    pub delta_to_best: f32,
    /// Sum of positive session-best sector times, 0 when unknown.
    pub est_lap_time: f32,
    pub sector_count: i32,
    pub sector_times: Vec<f32>,
    pub session_best_sector_times: Vec<f32>,
    pub sector_deltas: Vec<f32>,
    pub sector_is_best: Vec<bool>,
}

impl Sanitize for LapTiming {
    fn sanitize(&mut self) {
        scrub(&mut self.lap_dist_pct);
        scrub(&mut self.current_lap_time);
        scrub(&mut self.last_lap_time);
        scrub(&mut self.best_lap_time);
        scrub(&mut self.delta_to_session_best);
        scrub(&mut self.delta_to_best);
        scrub(&mut self.est_lap_time);
        scrub_slice(&mut self.sector_times);
        scrub_slice(&mut self.session_best_sector_times);
        scrub_slice(&mut self.sector_deltas);
    }
}
