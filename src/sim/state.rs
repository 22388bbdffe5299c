//! World state and core simulation types
//!
//! The live world and every speculative rollout share these types. A rollout
//! always works on a [`World::snapshot`], never on the live value.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// One of the two players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Opens every round
    White,
    Black,
}

impl Side {
    pub fn opponent(self) -> Self {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::White => "White",
            Side::Black => "Black",
        }
    }
}

/// Who a disc belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Owner {
    Player(Side),
    /// The single shared target disc
    Target,
}

impl Owner {
    pub fn side(self) -> Option<Side> {
        match self {
            Owner::Player(side) => Some(side),
            Owner::Target => None,
        }
    }

    pub fn is_target(self) -> bool {
        self == Owner::Target
    }
}

/// Trail point for disc rendering
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrailPoint {
    pub pos: Vec2,
    pub alpha: f32,
}

/// A disc entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Disc {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub owner: Owner,
    /// False once captured by the pocket (permanent)
    pub active: bool,
    /// Trail history for rendering (oldest first)
    #[serde(skip)]
    pub trail: Vec<TrailPoint>,
}

impl Disc {
    pub fn new(id: u32, pos: Vec2, owner: Owner) -> Self {
        Self {
            id,
            pos,
            vel: Vec2::ZERO,
            radius: DISC_RADIUS,
            owner,
            active: true,
            trail: Vec::new(),
        }
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    /// Whether this disc belongs to `side`
    #[inline]
    pub fn is_owned_by(&self, side: Side) -> bool {
        self.owner == Owner::Player(side)
    }

    /// Record the current position and fade older points (call once per live tick)
    pub fn update_trail(&mut self) {
        if self.speed() > TRAIL_MIN_SPEED {
            self.trail.push(TrailPoint {
                pos: self.pos,
                alpha: 1.0,
            });
            if self.trail.len() > TRAIL_LENGTH {
                self.trail.remove(0);
            }
        }
        for point in &mut self.trail {
            point.alpha -= TRAIL_FADE_PER_TICK;
        }
        self.trail.retain(|p| p.alpha > 0.0);
    }

    /// Remove the disc from play
    pub fn capture(&mut self) {
        self.active = false;
        self.vel = Vec2::ZERO;
        self.trail.clear();
    }
}

/// Physical constants shared by every simulation on a table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsConstants {
    /// Linear deceleration magnitude (units/s²)
    pub friction: f32,
    pub wall_restitution: f32,
    pub disc_restitution: f32,
    /// Speeds below this snap to zero
    pub stop_speed: f32,
}

impl Default for PhysicsConstants {
    fn default() -> Self {
        Self {
            friction: FRICTION,
            wall_restitution: WALL_RESTITUTION,
            disc_restitution: DISC_RESTITUTION,
            stop_speed: STOP_SPEED,
        }
    }
}

/// Table geometry, immutable for the length of a round
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub width: f32,
    pub height: f32,
    /// Pocket center (table center)
    pub pocket: Vec2,
    pub pocket_radius: f32,
    pub physics: PhysicsConstants,
}

impl Default for Table {
    fn default() -> Self {
        Self::new(BASE_POCKET_RADIUS)
    }
}

impl Table {
    /// Standard-size table with the given pocket radius
    pub fn new(pocket_radius: f32) -> Self {
        Self::with_size(TABLE_WIDTH, TABLE_HEIGHT, pocket_radius)
    }

    pub fn with_size(width: f32, height: f32, pocket_radius: f32) -> Self {
        Self {
            width,
            height,
            pocket: Vec2::new(width / 2.0, height / 2.0),
            pocket_radius,
            physics: PhysicsConstants::default(),
        }
    }

    pub fn with_physics(mut self, physics: PhysicsConstants) -> Self {
        self.physics = physics;
        self
    }

    /// Length of the table diagonal (upper bound for any distance on it)
    #[inline]
    pub fn diagonal(&self) -> f32 {
        Vec2::new(self.width, self.height).length()
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    #[inline]
    pub fn distance_to_pocket(&self, pos: Vec2) -> f32 {
        pos.distance(self.pocket)
    }

    /// Whether a center position lies inside the pocket capture circle
    #[inline]
    pub fn in_pocket(&self, pos: Vec2) -> bool {
        self.distance_to_pocket(pos) < self.pocket_radius
    }
}

/// Complete world state: table plus discs (sorted by id)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    pub table: Table,
    pub discs: Vec<Disc>,
    /// Next disc id
    next_id: u32,
}

impl World {
    /// Empty table
    pub fn new(table: Table) -> Self {
        Self {
            table,
            discs: Vec::new(),
            next_id: 1,
        }
    }

    /// Table with the opening rack: two discs per side and the target
    pub fn racked(table: Table) -> Self {
        let mut world = Self::new(table);
        let center = table.center();
        let target_y = center.y + (table.height - DISC_RADIUS - center.y) / 2.0;

        world.add_disc(center + Vec2::new(-180.0, -40.0), Owner::Player(Side::White));
        world.add_disc(center + Vec2::new(-180.0, 40.0), Owner::Player(Side::White));
        world.add_disc(center + Vec2::new(180.0, -40.0), Owner::Player(Side::Black));
        world.add_disc(center + Vec2::new(180.0, 40.0), Owner::Player(Side::Black));
        world.add_disc(Vec2::new(center.x, target_y), Owner::Target);
        world
    }

    /// Place a resting disc and return its id
    ///
    /// A table holds at most one target.
    pub fn add_disc(&mut self, pos: Vec2, owner: Owner) -> u32 {
        debug_assert!(
            !(owner.is_target() && self.target().is_some()),
            "world already has a target disc"
        );
        let id = self.next_id;
        self.next_id += 1;
        self.discs.push(Disc::new(id, pos, owner));
        id
    }

    pub fn disc(&self, id: u32) -> Option<&Disc> {
        self.discs.iter().find(|d| d.id == id)
    }

    pub fn disc_mut(&mut self, id: u32) -> Option<&mut Disc> {
        self.discs.iter_mut().find(|d| d.id == id)
    }

    /// The target disc, whether or not it is still in play
    pub fn target(&self) -> Option<&Disc> {
        self.discs.iter().find(|d| d.owner.is_target())
    }

    /// The target disc if it is still in play
    pub fn active_target(&self) -> Option<&Disc> {
        self.target().filter(|d| d.active)
    }

    pub fn active_discs(&self) -> impl Iterator<Item = &Disc> {
        self.discs.iter().filter(|d| d.active)
    }

    /// Active discs belonging to `side`
    pub fn side_discs(&self, side: Side) -> impl Iterator<Item = &Disc> {
        self.active_discs().filter(move |d| d.is_owned_by(side))
    }

    pub fn active_count(&self, side: Side) -> usize {
        self.side_discs(side).count()
    }

    /// Active player-owned discs (the target is not counted)
    pub fn active_player_discs(&self) -> usize {
        self.active_discs().filter(|d| !d.owner.is_target()).count()
    }

    /// True when no active disc is moving faster than the stop threshold
    pub fn is_settled(&self) -> bool {
        let stop = self.table.physics.stop_speed;
        self.active_discs().all(|d| d.speed() <= stop)
    }

    /// Value copy of the active discs for speculative simulation
    ///
    /// Disc ids are preserved so events can be attributed after the copy.
    /// Trails are dropped; they carry no physics.
    pub fn snapshot(&self) -> World {
        World {
            table: self.table,
            discs: self
                .active_discs()
                .map(|d| Disc {
                    trail: Vec::new(),
                    ..d.clone()
                })
                .collect(),
            next_id: self.next_id,
        }
    }

    /// Ensure discs are sorted by id for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.discs.sort_by_key(|d| d.id);
    }
}
