//! Collision detection and response for discs on a rectangular table
//!
//! Cushions are axis-aligned, so wall handling is per-axis. Disc pairs are
//! resolved with a 50/50 positional split and an exchange of the normal
//! velocity components.

use glam::Vec2;

use super::state::{Disc, Table};
use crate::reflect;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Contact normal (from the first body toward the second)
    pub normal: Vec2,
    /// Overlap depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Check overlap between two circles
///
/// Coincident centers report the canonical +X normal so resolution never
/// divides by a zero distance.
pub fn disc_disc_collision(a_pos: Vec2, a_radius: f32, b_pos: Vec2, b_radius: f32) -> CollisionResult {
    let delta = b_pos - a_pos;
    let dist = delta.length();
    let min_dist = a_radius + b_radius;

    if dist >= min_dist {
        return CollisionResult::miss();
    }

    let normal = if dist > f32::EPSILON {
        delta / dist
    } else {
        Vec2::X
    };

    CollisionResult {
        hit: true,
        normal,
        penetration: min_dist - dist,
    }
}

/// Separate two overlapping discs and exchange their normal velocities
///
/// Tangential components are left unchanged; the exchanged normal
/// components are scaled by `restitution`.
pub fn resolve_disc_pair(a: &mut Disc, b: &mut Disc, contact: &CollisionResult, restitution: f32) {
    let n = contact.normal;
    let push = n * contact.penetration * 0.5;
    a.pos -= push;
    b.pos += push;

    let a_n = a.vel.dot(n);
    let b_n = b.vel.dot(n);
    let a_t = a.vel - n * a_n;
    let b_t = b.vel - n * b_n;

    a.vel = a_t + n * (b_n * restitution);
    b.vel = b_t + n * (a_n * restitution);
}

/// Bounce a disc off the cushions
///
/// Clamps the center inside `[r, width - r] × [r, height - r]` and turns the
/// offending velocity component back into the table, scaled by
/// `restitution`. Returns true if any cushion was touched.
pub fn cushion_collision(disc: &mut Disc, table: &Table, restitution: f32) -> bool {
    let r = disc.radius;
    let mut hit = false;

    if disc.pos.x - r < 0.0 {
        disc.pos.x = r;
        disc.vel.x = disc.vel.x.abs() * restitution;
        hit = true;
    } else if disc.pos.x + r > table.width {
        disc.pos.x = table.width - r;
        disc.vel.x = -disc.vel.x.abs() * restitution;
        hit = true;
    }

    if disc.pos.y - r < 0.0 {
        disc.pos.y = r;
        disc.vel.y = disc.vel.y.abs() * restitution;
        hit = true;
    } else if disc.pos.y + r > table.height {
        disc.pos.y = table.height - r;
        disc.vel.y = -disc.vel.y.abs() * restitution;
        hit = true;
    }

    hit
}

/// Position-only clamp inside the cushions (velocity untouched)
#[inline]
pub fn clamp_to_table(disc: &mut Disc, table: &Table) {
    let r = disc.radius;
    disc.pos.x = disc.pos.x.clamp(r, (table.width - r).max(r));
    disc.pos.y = disc.pos.y.clamp(r, (table.height - r).max(r));
}

/// Check if a disc center fell into the pocket
#[inline]
pub fn disc_pocket_collision(disc: &Disc, table: &Table) -> bool {
    table.in_pocket(disc.pos)
}

/// First cushion a disc would touch travelling along `dir`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallHit {
    /// Disc center at the moment of contact
    pub point: Vec2,
    /// Inward-facing cushion normal
    pub normal: Vec2,
    /// Travel distance to contact
    pub distance: f32,
}

impl WallHit {
    /// Direction after bouncing off this cushion
    pub fn bounce(&self, dir: Vec2) -> Vec2 {
        reflect(dir, self.normal)
    }
}

/// Cast a disc of `radius` from `pos` along unit `dir`, up to `max_distance`
///
/// Used for the aim preview line; other discs are ignored.
pub fn first_wall_hit(pos: Vec2, radius: f32, dir: Vec2, max_distance: f32, table: &Table) -> Option<WallHit> {
    let min = Vec2::splat(radius);
    let max = Vec2::new(table.width - radius, table.height - radius);
    let mut best: Option<WallHit> = None;

    let mut consider = |t: f32, normal: Vec2| {
        if t <= 0.0 || t >= max_distance {
            return;
        }
        let point = pos + dir * t;
        let inside = point.x >= min.x - 1e-3
            && point.x <= max.x + 1e-3
            && point.y >= min.y - 1e-3
            && point.y <= max.y + 1e-3;
        if inside && best.is_none_or(|b| t < b.distance) {
            best = Some(WallHit {
                point,
                normal,
                distance: t,
            });
        }
    };

    if dir.x < 0.0 {
        consider((min.x - pos.x) / dir.x, Vec2::X);
    } else if dir.x > 0.0 {
        consider((max.x - pos.x) / dir.x, -Vec2::X);
    }
    if dir.y < 0.0 {
        consider((min.y - pos.y) / dir.y, Vec2::Y);
    } else if dir.y > 0.0 {
        consider((max.y - pos.y) / dir.y, -Vec2::Y);
    }

    best
}
