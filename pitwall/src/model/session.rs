//! Session and environment snapshot sections.

use serde::Serialize;

use crate::units::{scrub, scrub_f64, Sanitize};

/// Session timers, counters and decoded state strings.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub session_num: i32,
    pub session_time: f64,
    pub session_time_remain: f64,
    pub session_time_total: f32,
    pub session_state: i32,
    /// Human-readable form of `session_state`.
    pub session_state_name: &'static str,
    pub pace_mode: i32,
    pub pace_mode_name: &'static str,
    pub session_flags: i32,
    pub session_flag_names: Vec<&'static str>,
    pub player_car_idx: i32,
    pub display_units: i32,
    pub session_unique_id: i64,
    pub session_tick: i32,
    pub session_type: String,
    /// Lap limit for the current session, 0 when time limited.
    pub total_laps: i32,
    pub laps_remaining_race: i32,
    pub race_laps: i32,
    pub pits_open: bool,
    pub incident_limit: i32,
    pub player_incident_count: i32,
}

impl Sanitize for SessionInfo {
    fn sanitize(&mut self) {
        scrub_f64(&mut self.session_time);
        scrub_f64(&mut self.session_time_remain);
        scrub(&mut self.session_time_total);
    }
}

/// Weather and track-surface conditions.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentInfo {
    pub air_temp: f32,
    pub track_surface_temp: f32,
    pub track_temp_crew: f32,
    pub wind_speed: f32,
    pub wind_dir: f32,
    pub relative_humidity: f32,
    pub chance_of_rain: f32,
    pub air_pressure: f32,
    pub fog_level: f32,
    pub precipitation: f32,
    pub weather_declared_wet: bool,
    pub track_wetness: f32,
    pub skies: String,
    pub forecast_type: String,
    pub session_time_of_day: f32,
}

impl Sanitize for EnvironmentInfo {
    fn sanitize(&mut self) {
        scrub(&mut self.air_temp);
        scrub(&mut self.track_surface_temp);
        scrub(&mut self.track_temp_crew);
        scrub(&mut self.wind_speed);
        scrub(&mut self.wind_dir);
        scrub(&mut self.relative_humidity);
        scrub(&mut self.chance_of_rain);
        scrub(&mut self.air_pressure);
        scrub(&mut self.fog_level);
        scrub(&mut self.precipitation);
        scrub(&mut self.track_wetness);
        scrub(&mut self.session_time_of_day);
    }
}
