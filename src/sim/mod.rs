//! Deterministic simulation module
//!
//! All table physics lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - No randomness
//! - Stable iteration order (by disc id)
//! - No rendering or platform dependencies

pub mod collision;
pub mod state;
pub mod tick;

pub use collision::{CollisionResult, WallHit, disc_disc_collision, first_wall_hit};
pub use state::{Disc, Owner, PhysicsConstants, Side, Table, TrailPoint, World};
pub use tick::{StepEvent, advance, run_until_settled, step};
