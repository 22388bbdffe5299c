//! Red Pocket - single-pocket, two-colour billiards
//!
//! Core modules:
//! - `sim`: Deterministic disc physics (table, discs, fixed-step integration)
//! - `ai`: Shot search engine (rollouts, situational classifier, strategies)
//! - `round`: Turn management over a live world (racks, rounds, match score)
//! - `settings`: Pocket presets and match configuration

pub mod ai;
pub mod round;
pub mod settings;
pub mod sim;

pub use ai::{AiLevel, ShotDecision, ShotPlanner, decide_shot};
pub use round::{MatchState, Round, RoundOutcome};
pub use settings::{PocketSize, Settings};

use glam::Vec2;

/// Table and physics constants
pub mod consts {
    /// Fixed simulation timestep (the live loop caps frame time to this)
    pub const SIM_DT: f32 = 0.016;

    /// Table dimensions
    pub const TABLE_WIDTH: f32 = 912.0;
    pub const TABLE_HEIGHT: f32 = 532.0;

    /// Disc defaults
    pub const DISC_RADIUS: f32 = 14.0;

    /// Pocket radius at the default (Pro) preset
    pub const BASE_POCKET_RADIUS: f32 = 34.0;

    /// Linear friction deceleration (units/s²)
    pub const FRICTION: f32 = 110.0;
    pub const WALL_RESTITUTION: f32 = 0.88;
    pub const DISC_RESTITUTION: f32 = 0.99;
    /// Speed below which a disc snaps to rest (units/s)
    pub const STOP_SPEED: f32 = 2.5;

    /// Launch speed at power 1.0 (units/s)
    pub const POWER_MULTIPLIER: f32 = 1800.0;

    /// Trail bookkeeping (display only)
    pub const TRAIL_MIN_SPEED: f32 = 50.0;
    pub const TRAIL_LENGTH: usize = 8;
    pub const TRAIL_FADE_PER_TICK: f32 = 0.05;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Unit vector from `from` toward `to`, or zero when the points coincide
#[inline]
pub fn direction(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).normalize_or_zero()
}

/// Launch velocity for a shot at `angle` (radians) and normalized `power`
#[inline]
pub fn launch_velocity(angle: f32, power: f32) -> Vec2 {
    polar_to_cartesian(power * consts::POWER_MULTIPLIER, angle)
}

/// Recover (angle, power) from a launch velocity
#[inline]
pub fn shot_params(velocity: Vec2) -> (f32, f32) {
    (
        velocity.y.atan2(velocity.x),
        velocity.length() / consts::POWER_MULTIPLIER,
    )
}

/// Reflect a direction off a surface with the given unit normal
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect(v: Vec2, normal: Vec2) -> Vec2 {
    v - 2.0 * v.dot(normal) * normal
}
