//! YAML descriptor parser with per-session caching.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use regex::Regex;
use tracing::debug;
use yaml_rust::{Yaml, YamlLoader};

use super::model::{
    DriverEntry, ParsedDescriptor, ResultPosition, SectorDescriptor, SessionDescriptor,
    SessionDetail, TireSetup, WeekendDescriptor,
};
use crate::units::kpa_to_psi;

const MILES_TO_KM: f32 = 1.609_344;

struct CacheEntry {
    text: String,
    parsed: Arc<ParsedDescriptor>,
}

/// Parses descriptor text into [`ParsedDescriptor`], memoized by session id.
///
/// A cache hit requires the stored raw text to be byte-identical to the
/// incoming text; otherwise the entry is re-parsed and overwritten. Missing
/// keys yield zero values and are logged at debug level at most once per
/// parse call.
pub struct DescriptorParser {
    cache: HashMap<i64, CacheEntry>,
    missing_keys: HashSet<String>,
    leading_float: Regex,
    parse_count: u64,
}

impl Default for DescriptorParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DescriptorParser {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
            missing_keys: HashSet::new(),
            // Leading numeric token of value-plus-unit fields ("12.5 kph").
            leading_float: Regex::new(r"[-+]?[0-9]*\.?[0-9]+").expect("static regex"),
            parse_count: 0,
        }
    }

    /// Number of times the text parser actually ran (cache misses).
    pub fn parse_count(&self) -> u64 {
        self.parse_count
    }

    /// Parse descriptor text, reusing the cached result when the text for
    /// this session id is unchanged.
    pub fn parse(
        &mut self,
        text: &str,
        player_car_idx: i32,
        session_num: i32,
        session_unique_id: i64,
    ) -> Arc<ParsedDescriptor> {
        self.missing_keys.clear();

        if text.trim().is_empty() {
            return Arc::new(ParsedDescriptor::default());
        }

        if let Some(entry) = self.cache.get(&session_unique_id) {
            if entry.text == text {
                return Arc::clone(&entry.parsed);
            }
        }

        let parsed = Arc::new(self.parse_uncached(text, player_car_idx, session_num));
        self.cache.insert(
            session_unique_id,
            CacheEntry {
                text: text.to_string(),
                parsed: Arc::clone(&parsed),
            },
        );
        parsed
    }

    fn parse_uncached(
        &mut self,
        text: &str,
        player_car_idx: i32,
        session_num: i32,
    ) -> ParsedDescriptor {
        self.parse_count += 1;

        let docs = match YamlLoader::load_from_str(text) {
            Ok(docs) => docs,
            Err(err) => {
                debug!(error = %err, "descriptor text failed to parse");
                return ParsedDescriptor::default();
            }
        };
        let Some(root) = docs.first() else {
            return ParsedDescriptor::default();
        };

        let drivers = self.parse_drivers(root);
        let player = drivers
            .iter()
            .find(|d| d.car_idx == player_car_idx)
            .cloned();

        ParsedDescriptor {
            player,
            weekend: self.parse_weekend(root),
            session: self.parse_session(root, session_num),
            sectors: self.parse_sectors(root, session_num),
            drivers,
        }
    }

    fn parse_drivers(&mut self, root: &Yaml) -> Vec<DriverEntry> {
        let Some(seq) = root["DriverInfo"]["Drivers"].as_vec() else {
            return Vec::new();
        };
        seq.iter().map(|node| self.parse_driver(node)).collect()
    }

    fn parse_driver(&mut self, node: &Yaml) -> DriverEntry {
        DriverEntry {
            car_idx: self.int(node, "CarIdx"),
            user_name: self.str(node, "UserName"),
            team_name: self.str(node, "TeamName"),
            user_id: self.int(node, "UserID"),
            team_id: self.int(node, "TeamID"),
            car_number: self.str(node, "CarNumberRaw"),
            i_rating: self.int(node, "IRating"),
            lic_string: self.str(node, "LicString"),
            lic_level: self.int(node, "LicLevel"),
            lic_sub_level: self.int(node, "LicSubLevel"),
            car_path: self.str(node, "CarPath"),
            car_class_id: self.int(node, "CarClassID"),
            car_class_short_name: self.str(node, "CarClassShortName"),
            car_class_rel_speed: self.float(node, "CarClassRelSpeed"),
            car_class_est_lap_time: self.float(node, "CarClassEstLapTime"),
            tire_compound: compound_of(node),
            team_incident_count: self.int(node, "TeamIncidentCount"),
        }
    }

    fn parse_weekend(&mut self, root: &Yaml) -> Option<WeekendDescriptor> {
        let node = &root["WeekendInfo"];
        if node.is_badvalue() {
            return None;
        }

        Some(WeekendDescriptor {
            track_name: self.str(node, "TrackName"),
            track_display_name: self.str(node, "TrackDisplayName"),
            track_config_name: self.str(node, "TrackConfigName"),
            track_length_km: self.track_length_km(node),
            track_num_turns: self.str(node, "TrackNumTurns"),
            session_type: self.str(node, "SessionType"),
            skies: self.str(node, "Skies"),
            wind_speed: self.unit_float(node, "WindSpeed"),
            wind_dir: self.unit_float(node, "WindDir"),
            air_pressure: self.unit_float(node, "AirPressure"),
            relative_humidity: self.unit_float(node, "RelativeHumidity"),
            chance_of_rain: self.unit_float(node, "ChanceOfRain"),
            forecast_type: self.str(node, "ForecastType"),
            track_air_temp: self.unit_float(node, "AirTemp"),
            num_car_classes: self.int(node, "NumCarClasses"),
        })
    }

    fn parse_session(&mut self, root: &Yaml, session_num: i32) -> Option<SessionDescriptor> {
        let seq = root["SessionInfo"]["Sessions"].as_vec()?;

        let all_sessions: Vec<SessionDetail> = seq
            .iter()
            .map(|node| {
                let results = node["ResultsPositions"]
                    .as_vec()
                    .map(|rows| {
                        rows.iter()
                            .map(|row| ResultPosition {
                                position: self.int(row, "Position"),
                                car_idx: self.int(row, "CarIdx"),
                                fastest_time: self.float(row, "FastestTime"),
                                last_time: self.float(row, "LastTime"),
                                time: self.float(row, "Time"),
                                interval: self.float(row, "Interval"),
                                on_pit_road: self.bool(row, "OnPitRoad"),
                                in_garage: self.bool(row, "InGarage"),
                                pit_stop_count: self.int(row, "PitStopCount"),
                                new_i_rating: self.int(row, "NewIRating"),
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                SessionDetail {
                    session_num: self.int(node, "SessionNum"),
                    session_name: self.str(node, "SessionName"),
                    session_type: self.str(node, "SessionType"),
                    session_laps: self.int(node, "SessionLaps"),
                    incident_limit: self.int(&node["ResultsPenalty"], "IncidentLimit"),
                    results_positions: results,
                }
            })
            .collect();

        let current = all_sessions.iter().find(|s| s.session_num == session_num);

        // Current session first, then the weekend options block.
        let mut incident_limit = current.map(|s| s.incident_limit).unwrap_or(0);
        if incident_limit == 0 {
            incident_limit = self.int(&root["WeekendInfo"]["WeekendOptions"], "IncidentLimit");
        }

        Some(SessionDescriptor {
            session_num,
            session_name: current.map(|s| s.session_name.clone()).unwrap_or_default(),
            session_type: current.map(|s| s.session_type.clone()).unwrap_or_default(),
            num_track_sessions: all_sessions.len() as i32,
            incident_limit,
            current_session_total_laps: current.map(|s| s.session_laps).unwrap_or(0),
            all_sessions,
        })
    }

    fn parse_sectors(&mut self, root: &Yaml, session_num: i32) -> Option<SectorDescriptor> {
        let seq = root["SessionInfo"]["Sessions"].as_vec()?;
        let node = seq
            .iter()
            .find(|s| int_of(s, "SessionNum") == Some(session_num))?;

        Some(SectorDescriptor {
            sector_count: self.int(node, "SectorCount"),
            sector_times: self.floats(node, "SectorTimes"),
            best_sector_times: self.floats(node, "BestSectorTimes"),
        })
    }

    /// Extract the player's tire setup block, if present.
    ///
    /// Cold pressures carry a kPa suffix and are converted to PSI; bare
    /// values above 100 are assumed to be kPa as well.
    pub fn tire_setup(&mut self, text: &str) -> Option<TireSetup> {
        let docs = YamlLoader::load_from_str(text).ok()?;
        let root = docs.first()?;
        let tires = &root["CarSetup"]["Tires"];
        if tires.is_badvalue() {
            return None;
        }

        let mut pressure = |wheel: &str| -> f32 {
            let node = &tires[wheel];
            let raw = str_of(node, "ColdPressure").unwrap_or_default();
            let value = self
                .leading_float
                .find(&raw)
                .and_then(|m| m.as_str().parse::<f32>().ok())
                .unwrap_or(0.0);
            if raw.contains("kPa") || value > 100.0 {
                kpa_to_psi(value)
            } else {
                value
            }
        };

        let cold_pressures = [
            pressure("LeftFront"),
            pressure("RightFront"),
            pressure("LeftRear"),
            pressure("RightRear"),
        ];
        let compound = str_of(tires, "CompoundName").unwrap_or_default();

        Some(TireSetup {
            compound,
            cold_pressures,
        })
    }

    fn track_length_km(&mut self, node: &Yaml) -> f32 {
        let raw = self.str(node, "TrackLength");
        let value = self
            .leading_float
            .find(&raw)
            .and_then(|m| m.as_str().parse::<f32>().ok())
            .unwrap_or(0.0);
        if raw.contains("mi") {
            value * MILES_TO_KM
        } else {
            value
        }
    }

    // Field helpers. Zero-value defaults; each distinct missing key is
    // logged once per parse call.

    fn log_missing(&mut self, key: &str) {
        if self.missing_keys.insert(key.to_string()) {
            debug!(key, "descriptor key not found");
        }
    }

    fn str(&mut self, node: &Yaml, key: &str) -> String {
        match str_of(node, key) {
            Some(s) => s,
            None => {
                self.log_missing(key);
                String::new()
            }
        }
    }

    fn int(&mut self, node: &Yaml, key: &str) -> i32 {
        match int_of(node, key) {
            Some(v) => v,
            None => {
                self.log_missing(key);
                0
            }
        }
    }

    fn float(&mut self, node: &Yaml, key: &str) -> f32 {
        match float_of(&node[key]) {
            Some(v) => v,
            None => {
                self.log_missing(key);
                0.0
            }
        }
    }

    /// Leading-numeric-token parse for value-plus-unit fields.
    fn unit_float(&mut self, node: &Yaml, key: &str) -> f32 {
        let raw = self.str(node, key);
        if raw.is_empty() {
            return 0.0;
        }
        self.leading_float
            .find(&raw)
            .and_then(|m| m.as_str().parse::<f32>().ok())
            .unwrap_or_else(|| {
                debug!(key, value = %raw, "unparsable numeric descriptor value");
                0.0
            })
    }

    fn bool(&mut self, node: &Yaml, key: &str) -> bool {
        match &node[key] {
            Yaml::Boolean(b) => *b,
            Yaml::Integer(i) => *i != 0,
            Yaml::String(s) => s.eq_ignore_ascii_case("true") || s == "1",
            _ => {
                self.log_missing(key);
                false
            }
        }
    }

    fn floats(&mut self, node: &Yaml, key: &str) -> Vec<f32> {
        match node[key].as_vec() {
            Some(seq) => seq
                .iter()
                .map(|item| float_of_value(item).unwrap_or(0.0))
                .collect(),
            None => {
                self.log_missing(key);
                Vec::new()
            }
        }
    }
}

fn str_of(node: &Yaml, key: &str) -> Option<String> {
    match &node[key] {
        Yaml::String(s) => Some(s.clone()),
        Yaml::Integer(i) => Some(i.to_string()),
        Yaml::Real(r) => Some(r.clone()),
        Yaml::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}

fn int_of(node: &Yaml, key: &str) -> Option<i32> {
    match &node[key] {
        Yaml::Integer(i) => Some(*i as i32),
        // "unlimited" marks a time-limited session: zero laps.
        Yaml::String(s) if s.eq_ignore_ascii_case("unlimited") => Some(0),
        Yaml::String(s) => s.trim().parse().ok().or(Some(0)),
        _ => None,
    }
}

fn float_of(value: &Yaml) -> Option<f32> {
    float_of_value(value)
}

fn float_of_value(value: &Yaml) -> Option<f32> {
    match value {
        Yaml::Real(r) => r.parse().ok(),
        Yaml::Integer(i) => Some(*i as f32),
        Yaml::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn compound_of(driver: &Yaml) -> String {
    str_of(&driver["CarSetup"]["Tires"], "CompoundName").unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIPTOR: &str = r#"WeekendInfo:
 TrackName: spa
 TrackDisplayName: Circuit de Spa-Francorchamps
 TrackLength: 7.00 km
 TrackNumTurns: 19
 SessionType: Race
 Skies: Overcast
 WindSpeed: 3.58 m/s
 RelativeHumidity: 74 %
 NumCarClasses: 2
 WeekendOptions:
  IncidentLimit: 17
DriverInfo:
 Drivers:
 - CarIdx: 0
   UserName: Alice Example
   CarNumberRaw: 11
   IRating: 3100
   LicString: A 4.99
   LicLevel: 20
   LicSubLevel: 499
   CarPath: mercedes_gt3
   CarClassID: 2708
   CarClassShortName: GT3
   CarClassEstLapTime: 141.2
 - CarIdx: 1
   UserName: Bob Example
   CarNumberRaw: 44
   IRating: 2400
   LicString: B 3.20
   CarPath: ferrari_gt3
   CarClassID: 2708
   CarClassShortName: GT3
   CarClassEstLapTime: 141.9
SessionInfo:
 Sessions:
 - SessionNum: 0
   SessionName: PRACTICE
   SessionType: Open Practice
   SessionLaps: unlimited
 - SessionNum: 1
   SessionName: RACE
   SessionType: Race
   SessionLaps: 22
   ResultsPositions:
   - Position: 1
     CarIdx: 1
     FastestTime: 140.881
     LastTime: 141.204
     PitStopCount: 1
"#;

    #[test]
    fn test_parse_sections() {
        let mut parser = DescriptorParser::new();
        let parsed = parser.parse(DESCRIPTOR, 0, 1, 99);

        let weekend = parsed.weekend.as_ref().unwrap();
        assert_eq!(weekend.track_name, "spa");
        assert!((weekend.track_length_km - 7.0).abs() < 1e-4);
        assert!((weekend.wind_speed - 3.58).abs() < 1e-4);
        assert!((weekend.relative_humidity - 74.0).abs() < 1e-4);

        let player = parsed.player.as_ref().unwrap();
        assert_eq!(player.user_name, "Alice Example");
        assert!((player.safety_rating() - 20.499).abs() < 1e-3);

        let session = parsed.session.as_ref().unwrap();
        assert_eq!(session.current_session_total_laps, 22);
        assert_eq!(session.incident_limit, 17);
        assert_eq!(session.num_track_sessions, 2);
        assert_eq!(session.all_sessions[0].session_laps, 0); // "unlimited"
        assert_eq!(session.all_sessions[1].results_positions.len(), 1);
        assert_eq!(session.all_sessions[1].results_positions[0].car_idx, 1);

        assert_eq!(parsed.drivers.len(), 2);
    }

    #[test]
    fn test_cache_hit_skips_reparse() {
        let mut parser = DescriptorParser::new();
        let first = parser.parse(DESCRIPTOR, 0, 1, 7);
        let second = parser.parse(DESCRIPTOR, 0, 1, 7);
        assert_eq!(parser.parse_count(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_changed_text_reparses() {
        let mut parser = DescriptorParser::new();
        parser.parse(DESCRIPTOR, 0, 1, 7);
        let changed = DESCRIPTOR.replace("Overcast", "Clear");
        let parsed = parser.parse(&changed, 0, 1, 7);
        assert_eq!(parser.parse_count(), 2);
        assert_eq!(parsed.weekend.as_ref().unwrap().skies, "Clear");
    }

    #[test]
    fn test_missing_sections_are_none() {
        let mut parser = DescriptorParser::new();
        let parsed = parser.parse("DriverInfo:\n Drivers: []\n", 0, 0, 1);
        assert!(parsed.weekend.is_none());
        assert!(parsed.session.is_none());
        assert!(parsed.drivers.is_empty());
        assert!(parser.parse("", 0, 0, 2).weekend.is_none());
    }

    #[test]
    fn test_track_length_miles_converted() {
        let mut parser = DescriptorParser::new();
        let text = "WeekendInfo:\n TrackLength: 2.50 mi\n";
        let parsed = parser.parse(text, 0, 0, 3);
        let km = parsed.weekend.as_ref().unwrap().track_length_km;
        assert!((km - 4.023_36).abs() < 1e-3);
    }

    #[test]
    fn test_tire_setup_pressures() {
        let mut parser = DescriptorParser::new();
        let text = "CarSetup:\n Tires:\n  CompoundName: Soft\n  LeftFront:\n   ColdPressure: 152 kPa\n  RightFront:\n   ColdPressure: 152 kPa\n  LeftRear:\n   ColdPressure: 145 kPa\n  RightRear:\n   ColdPressure: 145 kPa\n";
        let setup = parser.tire_setup(text).unwrap();
        assert_eq!(setup.compound, "Soft");
        assert!((setup.cold_pressures[0] - 22.045_736).abs() < 1e-3);
        assert!((setup.cold_pressures[2] - 21.030_472).abs() < 1e-3);
    }
}
