//! Vehicle, powertrain, damage, pit and chassis snapshot sections.

use serde::Serialize;

use crate::units::{scrub, scrub_slice, Sanitize};

/// Driver controls plus the primary speed and brake channels.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleInfo {
    pub speed: f32,
    pub rpm: f32,
    pub throttle: f32,
    pub brake: f32,
    pub clutch: f32,
    /// Degrees, converted from the source's radians.
    pub steering_wheel_angle: f32,
    pub gear: i32,
    pub on_track: bool,
    pub in_garage: bool,
    pub brake_line_press: [f32; 4],
    pub brake_temp: Vec<f32>,
    pub brake_bias: f32,
    pub abs_active: bool,
}

impl Sanitize for VehicleInfo {
    fn sanitize(&mut self) {
        scrub(&mut self.speed);
        scrub(&mut self.rpm);
        scrub(&mut self.throttle);
        scrub(&mut self.brake);
        scrub(&mut self.clutch);
        scrub(&mut self.steering_wheel_angle);
        scrub_slice(&mut self.brake_line_press);
        scrub_slice(&mut self.brake_temp);
        scrub(&mut self.brake_bias);
    }
}

/// Engine vitals and warning bits.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PowertrainInfo {
    pub water_temp: f32,
    pub oil_temp: f32,
    pub oil_press: f32,
    pub fuel_press: f32,
    pub manifold_press: f32,
    pub engine_warnings: i32,
    pub engine_warning_names: Vec<&'static str>,
    pub drs_status: i32,
}

impl Sanitize for PowertrainInfo {
    fn sanitize(&mut self) {
        scrub(&mut self.water_temp);
        scrub(&mut self.oil_temp);
        scrub(&mut self.oil_press);
        scrub(&mut self.fuel_press);
        scrub(&mut self.manifold_press);
    }
}

/// High-frequency chassis dynamics.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HighFreqInfo {
    pub lat_accel: f32,
    pub long_accel: f32,
    pub vert_accel: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
    pub yaw_rate: f32,
    pub pitch_rate: f32,
    pub roll_rate: f32,
}

impl Sanitize for HighFreqInfo {
    fn sanitize(&mut self) {
        scrub(&mut self.lat_accel);
        scrub(&mut self.long_accel);
        scrub(&mut self.vert_accel);
        scrub(&mut self.yaw);
        scrub(&mut self.pitch);
        scrub(&mut self.roll);
        scrub(&mut self.yaw_rate);
        scrub(&mut self.pitch_rate);
        scrub(&mut self.roll_rate);
    }
}

/// Component damage fractions, 0 intact to 1 destroyed.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DamageInfo {
    /// LF, RF, LR, RR corner damage.
    pub corner_damage: [f32; 4],
    pub front_wing_damage: f32,
    pub rear_wing_damage: f32,
    pub engine_damage: f32,
    pub gearbox_damage: f32,
    pub suspension_damage: f32,
    pub chassis_damage: f32,
}

impl Sanitize for DamageInfo {
    fn sanitize(&mut self) {
        scrub_slice(&mut self.corner_damage);
        scrub(&mut self.front_wing_damage);
        scrub(&mut self.rear_wing_damage);
        scrub(&mut self.engine_damage);
        scrub(&mut self.gearbox_damage);
        scrub(&mut self.suspension_damage);
        scrub(&mut self.chassis_damage);
    }
}

/// Pit road occupancy and repair state.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PitInfo {
    pub on_pit_road: bool,
    pub pit_stop_count: i32,
    pub last_pit_time: f32,
    pub repair_left: f32,
    pub opt_repair_left: f32,
}

impl Sanitize for PitInfo {
    fn sanitize(&mut self) {
        scrub(&mut self.last_pit_time);
        scrub(&mut self.repair_left);
        scrub(&mut self.opt_repair_left);
    }
}

/// Host performance counters reported by the source.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemPerf {
    pub frame_rate: f32,
    pub cpu_usage_fg: f32,
    pub cpu_usage_bg: f32,
    pub gpu_usage: f32,
}

impl Sanitize for SystemPerf {
    fn sanitize(&mut self) {
        scrub(&mut self.frame_rate);
        scrub(&mut self.cpu_usage_fg);
        scrub(&mut self.cpu_usage_bg);
        scrub(&mut self.gpu_usage);
    }
}
