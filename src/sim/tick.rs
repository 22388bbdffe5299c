//! Fixed timestep simulation step
//!
//! Advances every active disc deterministically: integrate, friction,
//! cushions, disc pairs, pocket. Used by the live round and, disposably, by
//! every rollout in the shot search.

use glam::Vec2;

use super::collision::{
    clamp_to_table, cushion_collision, disc_disc_collision, disc_pocket_collision,
    resolve_disc_pair,
};
use super::state::{Disc, World};

/// Notifications produced by a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepEvent {
    /// Two discs touched (ids in ascending order)
    Contact { a: u32, b: u32 },
    /// A disc bounced off a cushion
    Cushion { id: u32 },
    /// A disc fell into the pocket
    Captured { id: u32 },
}

/// Linear deceleration opposing velocity; snaps to rest below `stop_speed`
#[inline]
fn apply_friction(disc: &mut Disc, decel: f32, stop_speed: f32) {
    let speed = disc.speed();
    if speed > 0.0 {
        let new_speed = (speed - decel).max(0.0);
        disc.vel *= new_speed / speed;
        if new_speed < stop_speed {
            disc.vel = Vec2::ZERO;
        }
    }
}

/// Advance the world by one fixed timestep
///
/// Events are appended to `events`; the buffer is not cleared so callers can
/// reuse one allocation across a whole rollout.
pub fn step(world: &mut World, dt: f32, events: &mut Vec<StepEvent>) {
    let table = world.table;
    let physics = table.physics;
    let decel = physics.friction * dt;

    // Integrate, friction, cushions
    for disc in world.discs.iter_mut().filter(|d| d.active) {
        disc.pos += disc.vel * dt;
        apply_friction(disc, decel, physics.stop_speed);
        if cushion_collision(disc, &table, physics.wall_restitution) {
            events.push(StepEvent::Cushion { id: disc.id });
        }
    }

    // Pairwise disc contacts
    let n = world.discs.len();
    for i in 0..n {
        if !world.discs[i].active {
            continue;
        }
        for j in (i + 1)..n {
            let (left, right) = world.discs.split_at_mut(j);
            let a = &mut left[i];
            let b = &mut right[0];
            if !b.active {
                continue;
            }

            let contact = disc_disc_collision(a.pos, a.radius, b.pos, b.radius);
            if contact.hit {
                resolve_disc_pair(a, b, &contact, physics.disc_restitution);
                events.push(StepEvent::Contact {
                    a: a.id.min(b.id),
                    b: a.id.max(b.id),
                });
            }
        }
    }

    // Separation may have pushed a disc into a cushion
    for disc in world.discs.iter_mut().filter(|d| d.active) {
        clamp_to_table(disc, &table);
    }

    // Pocket
    for disc in world.discs.iter_mut().filter(|d| d.active) {
        if disc_pocket_collision(disc, &table) {
            disc.capture();
            events.push(StepEvent::Captured { id: disc.id });
        }
    }
}

/// Live-loop step: update display trails, then advance physics
pub fn advance(world: &mut World, dt: f32, events: &mut Vec<StepEvent>) {
    for disc in world.discs.iter_mut().filter(|d| d.active) {
        disc.update_trail();
    }
    step(world, dt, events);
}

/// Step until the world settles or `max_steps` is reached
///
/// Returns the number of steps taken.
pub fn run_until_settled(world: &mut World, dt: f32, max_steps: u32, events: &mut Vec<StepEvent>) -> u32 {
    let mut steps = 0;
    while steps < max_steps && !world.is_settled() {
        step(world, dt, events);
        steps += 1;
    }
    steps
}
