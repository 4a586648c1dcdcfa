//! Sector timing and the session-best comparison arrays.

use crate::model::TelemetrySnapshot;
use crate::source::{RawSample, SampleReader};

use super::state::EngineState;

/// Two lap times within this tolerance count as the same time.
const SECTOR_EPSILON: f32 = 1e-4;

/// Fallback sector count when no source reports one.
const DEFAULT_SECTOR_COUNT: usize = 3;

/// Sum of session-best sectors above this is treated as garbage (20 min).
const MAX_PLAUSIBLE_LAP_SECONDS: f32 = 1200.0;

pub(super) fn apply(state: &mut EngineState, sample: &RawSample, snap: &mut TelemetrySnapshot) {
    // Live array fields first, aliases in priority order, then the cached
    // descriptor's sector block.
    let (mut lap_times, mut best_times) = {
        let mut reader = SampleReader::new(sample, &mut state.missing);
        let lap = first_non_empty(&mut reader, &["LapAllSectorTimes", "SectorTimes"]);
        let best = first_non_empty(
            &mut reader,
            &["SessionBestSectorTimes", "BestSectorTimes"],
        );
        (lap, best)
    };

    let descriptor_sectors = state.descriptor.sectors.as_ref();
    if let Some(sectors) = descriptor_sectors {
        if lap_times.is_empty() {
            lap_times = sectors.sector_times.clone();
        }
        if best_times.is_empty() {
            best_times = sectors.best_sector_times.clone();
        }
    }

    let mut count = lap_times
        .len()
        .max(best_times.len())
        .max(descriptor_sectors.map(|s| s.sector_count as usize).unwrap_or(0));
    if count == 0 {
        count = DEFAULT_SECTOR_COUNT;
    }
    lap_times.resize(count, 0.0);
    best_times.resize(count, 0.0);

    let deltas: Vec<f32> = lap_times
        .iter()
        .zip(&best_times)
        .map(|(lap, best)| lap - best)
        .collect();
    let is_best: Vec<bool> = lap_times
        .iter()
        .zip(&best_times)
        .map(|(&lap, &best)| lap > 0.0 && (lap - best).abs() < SECTOR_EPSILON)
        .collect();

    let timing = &mut snap.timing;
    timing.sector_count = count as i32;
    if best_times.iter().any(|&t| t > 0.0) {
        let est = best_times.iter().sum();
        if est < MAX_PLAUSIBLE_LAP_SECONDS {
            timing.est_lap_time = est;
        }
    }
    timing.sector_times = lap_times;
    timing.session_best_sector_times = best_times;
    timing.sector_deltas = deltas;
    timing.sector_is_best = is_best;
}

fn first_non_empty(reader: &mut SampleReader<'_>, names: &[&str]) -> Vec<f32> {
    for name in names {
        let values = reader.f32s(name);
        if !values.is_empty() {
            return values;
        }
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::VarValue;

    fn run(sample: RawSample, state: &mut EngineState) -> TelemetrySnapshot {
        let mut snap = TelemetrySnapshot::default();
        apply(state, &sample, &mut snap);
        snap
    }

    #[test]
    fn test_sector_is_best_flag() {
        let sample = RawSample::new(1)
            .with_var(
                "LapAllSectorTimes",
                VarValue::FloatArray(vec![30.123, 0.0, 28.400]),
            )
            .with_var(
                "SessionBestSectorTimes",
                VarValue::FloatArray(vec![30.123, 29.0, 28.100]),
            );
        let mut state = EngineState::default();
        let snap = run(sample, &mut state);
        // Equal within epsilon and positive, zero lap time, slower lap time.
        assert_eq!(snap.timing.sector_is_best, vec![true, false, false]);
        assert!((snap.timing.sector_deltas[2] - 0.3).abs() < 1e-4);
        assert!((snap.timing.est_lap_time - 87.223).abs() < 1e-3);
    }

    #[test]
    fn test_count_defaults_to_three() {
        let mut state = EngineState::default();
        let snap = run(RawSample::new(1), &mut state);
        assert_eq!(snap.timing.sector_count, 3);
        assert_eq!(snap.timing.sector_times, vec![0.0; 3]);
        assert_eq!(snap.timing.est_lap_time, 0.0);
    }

    #[test]
    fn test_implausible_best_sum_ignored_for_estimate() {
        let sample = RawSample::new(1).with_var(
            "SessionBestSectorTimes",
            VarValue::FloatArray(vec![900.0, 900.0]),
        );
        let mut state = EngineState::default();
        let snap = run(sample, &mut state);
        assert_eq!(snap.timing.est_lap_time, 0.0);
    }
}
