//! Parsed session descriptor structures.
//!
//! Every field defaults to its zero value when the corresponding key is
//! missing from the descriptor text; whole sections may be absent.

use serde::Serialize;

/// One driver slot from the roster.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverEntry {
    pub car_idx: i32,
    pub user_name: String,
    pub team_name: String,
    pub user_id: i32,
    pub team_id: i32,
    pub car_number: String,
    pub i_rating: i32,
    pub lic_string: String,
    pub lic_level: i32,
    pub lic_sub_level: i32,
    pub car_path: String,
    pub car_class_id: i32,
    pub car_class_short_name: String,
    pub car_class_rel_speed: f32,
    pub car_class_est_lap_time: f32,
    pub tire_compound: String,
    pub team_incident_count: i32,
}

impl DriverEntry {
    /// Safety rating derived from the licence level fields.
    pub fn safety_rating(&self) -> f32 {
        self.lic_level as f32 + self.lic_sub_level as f32 / 1000.0
    }
}

/// Weekend/track metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekendDescriptor {
    pub track_name: String,
    pub track_display_name: String,
    pub track_config_name: String,
    /// Always kilometres, regardless of the unit in the descriptor text.
    pub track_length_km: f32,
    pub track_num_turns: String,
    pub session_type: String,
    pub skies: String,
    pub wind_speed: f32,
    pub wind_dir: f32,
    pub air_pressure: f32,
    pub relative_humidity: f32,
    pub chance_of_rain: f32,
    pub forecast_type: String,
    pub track_air_temp: f32,
    pub num_car_classes: i32,
}

/// One row from a session's results table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultPosition {
    pub position: i32,
    pub car_idx: i32,
    pub fastest_time: f32,
    pub last_time: f32,
    pub time: f32,
    pub interval: f32,
    pub on_pit_road: bool,
    pub in_garage: bool,
    pub pit_stop_count: i32,
    pub new_i_rating: i32,
}

/// One session entry from the descriptor's session list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetail {
    pub session_num: i32,
    pub session_name: String,
    pub session_type: String,
    /// 0 when the session is time-limited ("unlimited" laps).
    pub session_laps: i32,
    pub incident_limit: i32,
    pub results_positions: Vec<ResultPosition>,
}

/// The current session plus the full session list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDescriptor {
    pub session_num: i32,
    pub session_name: String,
    pub session_type: String,
    pub num_track_sessions: i32,
    pub all_sessions: Vec<SessionDetail>,
    /// From the current session, falling back to the weekend options.
    pub incident_limit: i32,
    pub current_session_total_laps: i32,
}

/// Per-sector best time records for the current session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorDescriptor {
    pub sector_count: i32,
    pub sector_times: Vec<f32>,
    pub best_sector_times: Vec<f32>,
}

/// Tire setup values from the player's `CarSetup` block.
///
/// Re-read whenever the pit stop counter advances, since the setup sheet is
/// the only place cold target pressures appear.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TireSetup {
    pub compound: String,
    /// Cold pressures in PSI, order LF, RF, LR, RR.
    pub cold_pressures: [f32; 4],
}

/// Complete parse output. Any section may be `None` when the corresponding
/// block is missing from the descriptor text.
#[derive(Debug, Clone, Default)]
pub struct ParsedDescriptor {
    pub player: Option<DriverEntry>,
    pub weekend: Option<WeekendDescriptor>,
    pub session: Option<SessionDescriptor>,
    pub sectors: Option<SectorDescriptor>,
    pub drivers: Vec<DriverEntry>,
}
