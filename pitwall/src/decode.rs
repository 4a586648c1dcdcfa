//! Human-readable decodings for simulator enum and bitfield values.
//!
//! The raw source reports session state, pace mode and the various flag
//! words as bare integers; overlays want names. Unknown values decode to
//! `"Unknown"` rather than failing.

/// Decode the session state enum.
pub fn session_state(state: i32) -> &'static str {
    match state {
        0 => "Invalid",
        1 => "GetInCar",
        2 => "Warmup",
        3 => "ParadeLaps",
        4 => "Racing",
        5 => "Checkered",
        6 => "CoolDown",
        _ => "Unknown",
    }
}

/// Decode the pacing mode enum.
pub fn pace_mode(mode: i32) -> &'static str {
    match mode {
        0 => "SingleFileStart",
        1 => "DoubleFileStart",
        2 => "SingleFileRestart",
        3 => "DoubleFileRestart",
        4 => "NotPacing",
        5 => "Pacing",
        6 => "CautionLap",
        7 => "LastLap",
        _ => "Unknown",
    }
}

/// Decode the track surface / location enum for a car.
pub fn track_surface(surface: i32) -> &'static str {
    match surface {
        0 => "OffTrack",
        1 => "InPitStall",
        2 => "ApproachingPits",
        3 => "OnTrack",
        4 => "NotInWorld",
        5 => "InGarage",
        6 => "ApproachingGrid",
        7 => "OnGrid",
        _ => "Unknown",
    }
}

/// Expand the session flag bitfield into flag names.
pub fn session_flags(flags: i32) -> Vec<&'static str> {
    const TABLE: &[(i32, &str)] = &[
        (0x0000_0001, "Checkered"),
        (0x0000_0002, "White"),
        (0x0000_0004, "Green"),
        (0x0000_0008, "Yellow"),
        (0x0000_0010, "Red"),
        (0x0000_0020, "Blue"),
        (0x0000_0040, "Debris"),
        (0x0000_0080, "Crossed"),
        (0x0000_0100, "Black"),
        (0x0000_0200, "DQ"),
        (0x0000_0400, "Servicible"),
        (0x0000_1000, "Meatball"),
        (0x0100_0000, "Caution"),
        (0x0200_0000, "CautionWaving"),
    ];
    TABLE
        .iter()
        .filter(|(bit, _)| flags & bit != 0)
        .map(|&(_, name)| name)
        .collect()
}

/// Expand the engine warning bitfield into warning names.
pub fn engine_warnings(warnings: i32) -> Vec<&'static str> {
    const TABLE: &[(i32, &str)] = &[
        (0x01, "WaterTemp"),
        (0x02, "FuelPressure"),
        (0x04, "OilPressure"),
        (0x08, "EngineStalled"),
        (0x10, "PitSpeedLimiter"),
        (0x20, "RevLimiterActive"),
        (0x40, "OilTemp"),
    ];
    TABLE
        .iter()
        .filter(|(bit, _)| warnings & bit != 0)
        .map(|&(_, name)| name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_state_names() {
        assert_eq!(session_state(4), "Racing");
        assert_eq!(session_state(99), "Unknown");
    }

    #[test]
    fn test_track_surface_names() {
        assert_eq!(track_surface(1), "InPitStall");
        assert_eq!(track_surface(3), "OnTrack");
        assert_eq!(track_surface(-1), "Unknown");
    }

    #[test]
    fn test_session_flags_expand() {
        let flags = session_flags(0x0000_0004 | 0x0100_0000);
        assert_eq!(flags, vec!["Green", "Caution"]);
        assert!(session_flags(0).is_empty());
    }

    #[test]
    fn test_engine_warnings_expand() {
        assert_eq!(engine_warnings(0x30), vec!["PitSpeedLimiter", "RevLimiterActive"]);
    }
}
