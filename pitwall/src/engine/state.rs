//! Carried-forward engine memory.

use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

use crate::session::{ParsedDescriptor, TireSetup};

/// Rolling fuel FIFO depth: the last three completed laps.
pub(crate) const FUEL_HISTORY_DEPTH: usize = 3;

/// Event-captured baselines for one wheel.
///
/// Fields mutate only on pit entry, pit exit, or the first positive reading
/// after startup; every other tick they are copied into the snapshot as-is.
#[derive(Debug, Clone, Default)]
pub(crate) struct WheelBaseline {
    /// Pressure at the last pit entry, PSI.
    pub hot_press: f32,
    /// Pressure at the last pit exit, PSI.
    pub cold_press: f32,
    /// Temperatures at the last pit exit, inner/middle/outer.
    pub cold_temp: [f32; 3],
    /// Temperatures at the last pit entry.
    pub last_temp: [f32; 3],
    /// Wear zones captured at the last pit-road visit.
    pub last_wear: [f32; 3],
    /// Mean remaining tread at the last pit-road visit.
    pub last_tread: f32,
    /// Remaining tread at the last pit exit.
    pub start_tread: f32,
}

/// All state the derivation engine carries between ticks.
///
/// Exclusively owned by the engine; neither the broadcaster nor the
/// transport ever sees it.
#[derive(Debug)]
pub struct EngineState {
    /// Source variables requested but never found this run.
    pub(crate) missing: BTreeSet<String>,

    // Lap and fuel bookkeeping.
    pub(crate) last_lap: i32,
    pub(crate) fuel_at_lap_start: f32,
    pub(crate) current_lap_consumption: f32,
    pub(crate) last_lap_consumption: f32,
    pub(crate) recent_lap_fuel: VecDeque<f32>,
    pub(crate) rolling_average: f32,
    /// True if the car touched pit road at any point during the current lap.
    pub(crate) lap_touched_pit: bool,

    // Pit transition tracking.
    pub(crate) pit_flag_initialized: bool,
    pub(crate) was_on_pit_road: bool,
    pub(crate) wheels: [WheelBaseline; 4],
    pub(crate) setup: Option<TireSetup>,
    pub(crate) last_pit_count: i32,

    // Per-car iRating baselines, indexed by car slot.
    pub(crate) ir_start: Vec<i32>,

    // Session identity and descriptor tracking.
    pub(crate) last_session_num: i32,
    pub(crate) last_descriptor_text: String,
    pub(crate) descriptor: Arc<ParsedDescriptor>,
    pub(crate) track_length_km: f32,
    pub(crate) car_path: String,
    pub(crate) track_name: String,
    /// Set on session change, cleared once the service has applied the
    /// persisted record for the new car/track identity.
    pub(crate) awaiting_stored: bool,
}

impl Default for EngineState {
    fn default() -> Self {
        Self {
            missing: BTreeSet::new(),
            last_lap: -1,
            fuel_at_lap_start: 0.0,
            current_lap_consumption: 0.0,
            last_lap_consumption: 0.0,
            recent_lap_fuel: VecDeque::with_capacity(FUEL_HISTORY_DEPTH),
            rolling_average: 0.0,
            lap_touched_pit: false,
            pit_flag_initialized: false,
            was_on_pit_road: false,
            wheels: Default::default(),
            setup: None,
            last_pit_count: -1,
            ir_start: Vec::new(),
            last_session_num: -1,
            last_descriptor_text: String::new(),
            descriptor: Arc::new(ParsedDescriptor::default()),
            track_length_km: 0.0,
            car_path: String::new(),
            track_name: String::new(),
            awaiting_stored: false,
        }
    }
}

impl EngineState {
    /// Push one completed lap's consumption, evicting the oldest beyond the
    /// FIFO depth.
    pub(crate) fn push_lap_fuel(&mut self, consumption: f32) {
        if self.recent_lap_fuel.len() == FUEL_HISTORY_DEPTH {
            self.recent_lap_fuel.pop_front();
        }
        self.recent_lap_fuel.push_back(consumption);
    }

    /// Arithmetic mean of the FIFO, 0 when empty.
    pub(crate) fn lap_fuel_mean(&self) -> f32 {
        if self.recent_lap_fuel.is_empty() {
            return 0.0;
        }
        self.recent_lap_fuel.iter().sum::<f32>() / self.recent_lap_fuel.len() as f32
    }

    /// Reset everything scoped to one session. Tyre baselines survive; the
    /// car does not change between sessions of the same event.
    pub(crate) fn reset_session(&mut self) {
        self.last_lap = -1;
        self.fuel_at_lap_start = 0.0;
        self.current_lap_consumption = 0.0;
        self.last_lap_consumption = 0.0;
        self.recent_lap_fuel.clear();
        self.rolling_average = 0.0;
        self.lap_touched_pit = false;
        self.awaiting_stored = true;
    }
}
