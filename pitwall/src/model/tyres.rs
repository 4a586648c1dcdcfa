//! Per-wheel tyre state, baselines and the nested wire summary.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::units::{scrub, scrub_slice, Sanitize};

/// Wheel positions in storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wheel {
    LeftFront = 0,
    RightFront = 1,
    LeftRear = 2,
    RightRear = 3,
}

impl Wheel {
    pub const ALL: [Wheel; 4] = [
        Wheel::LeftFront,
        Wheel::RightFront,
        Wheel::LeftRear,
        Wheel::RightRear,
    ];

    /// Source variable prefix ("LF", "RF", "LR", "RR").
    pub fn prefix(self) -> &'static str {
        match self {
            Wheel::LeftFront => "LF",
            Wheel::RightFront => "RF",
            Wheel::LeftRear => "LR",
            Wheel::RightRear => "RR",
        }
    }
}

/// One wheel's live readings plus its event-captured baselines.
///
/// The baseline fields (`hot_*`, `cold_*`, `start_tread`) are copies of
/// engine state: mutated only on pit transitions or the first positive
/// reading, never per tick.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WheelState {
    /// Current pressure in PSI.
    pub pressure: f32,
    /// Pressure captured at the last pit entry.
    pub hot_pressure: f32,
    /// Pressure captured at the last pit exit.
    pub cold_pressure: f32,
    /// Cold target pressure from the setup sheet, PSI.
    pub setup_pressure: f32,
    /// Carcass temperatures inner, middle, outer. Celsius from the source,
    /// converted for display units downstream.
    pub temps: [f32; 3],
    pub cold_temps: [f32; 3],
    pub last_temps: [f32; 3],
    /// Remaining tread per zone, 1.0 new.
    pub wear: [f32; 3],
    pub wear_avg: f32,
    pub tread_remaining: f32,
    pub start_tread: f32,
}

impl Sanitize for WheelState {
    fn sanitize(&mut self) {
        scrub(&mut self.pressure);
        scrub(&mut self.hot_pressure);
        scrub(&mut self.cold_pressure);
        scrub(&mut self.setup_pressure);
        scrub_slice(&mut self.temps);
        scrub_slice(&mut self.cold_temps);
        scrub_slice(&mut self.last_temps);
        scrub_slice(&mut self.wear);
        scrub(&mut self.wear_avg);
        scrub(&mut self.tread_remaining);
        scrub(&mut self.start_tread);
    }
}

/// All four wheels plus compound and stagger.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TyreSet {
    /// Order LF, RF, LR, RR; index with [`Wheel`].
    pub wheels: [WheelState; 4],
    pub compound: String,
    pub front_stagger: f32,
    pub rear_stagger: f32,
}

impl TyreSet {
    pub fn wheel(&self, w: Wheel) -> &WheelState {
        &self.wheels[w as usize]
    }

    pub fn wheel_mut(&mut self, w: Wheel) -> &mut WheelState {
        &mut self.wheels[w as usize]
    }
}

impl Sanitize for TyreSet {
    fn sanitize(&mut self) {
        for wheel in &mut self.wheels {
            wheel.sanitize();
        }
        scrub(&mut self.front_stagger);
        scrub(&mut self.rear_stagger);
    }
}

/// One wheel inside the reserved nested wire block.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WheelSummary {
    pub current_pressure: f32,
    pub last_hot_pressure: f32,
    pub cold_pressure: f32,
    pub current_temp_internal: f32,
    pub current_temp_middle: f32,
    pub current_temp_external: f32,
    pub cold_temp: f32,
    pub core_temp: f32,
    /// 1 minus average remaining tread.
    pub wear: f32,
    pub start_tread: f32,
    pub tread_remaining: f32,
}

impl Sanitize for WheelSummary {
    fn sanitize(&mut self) {
        scrub(&mut self.current_pressure);
        scrub(&mut self.last_hot_pressure);
        scrub(&mut self.cold_pressure);
        scrub(&mut self.current_temp_internal);
        scrub(&mut self.current_temp_middle);
        scrub(&mut self.current_temp_external);
        scrub(&mut self.cold_temp);
        scrub(&mut self.core_temp);
        scrub(&mut self.wear);
        scrub(&mut self.start_tread);
        scrub(&mut self.tread_remaining);
    }
}

/// Reserved `telemetrySnapshot` wire block: wheel summaries plus a short
/// dynamics digest.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TyreSnapshot {
    pub timestamp: Option<DateTime<Utc>>,
    pub lap_number: i32,
    pub lap_distance: f32,
    /// Order LF, RF, LR, RR.
    pub wheels: [WheelSummary; 4],
    pub speed: f32,
    pub rpm: f32,
    pub lateral_acceleration: f32,
    pub longitudinal_acceleration: f32,
    pub vertical_acceleration: f32,
    pub tire_compound: String,
}

impl Sanitize for TyreSnapshot {
    fn sanitize(&mut self) {
        scrub(&mut self.lap_distance);
        for wheel in &mut self.wheels {
            wheel.sanitize();
        }
        scrub(&mut self.speed);
        scrub(&mut self.rpm);
        scrub(&mut self.lateral_acceleration);
        scrub(&mut self.longitudinal_acceleration);
        scrub(&mut self.vertical_acceleration);
    }
}
