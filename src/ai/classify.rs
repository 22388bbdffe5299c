//! Situational classifier
//!
//! Labels the live table from the searching side's point of view so the
//! dispatcher can pick specialised strategies. Several conditions can hold at
//! once; [`classify`] returns the one with the highest precedence.

use serde::{Deserialize, Serialize};

use crate::direction;
use crate::sim::{Side, World};

/// Coarse situation label, declared in precedence order (highest first)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SituationLabel {
    /// Target sits right next to the pocket
    TargetCritical,
    TargetDangerous,
    NumericDisadvantage,
    NumericAdvantage,
    /// We have exactly one disc left
    LastDisc,
    OwnDiscsInDanger,
    /// One of our discs lines up behind the target toward the pocket
    GeometryFavorable,
    /// Nothing has been captured yet
    OpeningPosition,
    Endgame,
    Standard,
}

impl SituationLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SituationLabel::TargetCritical => "target-critical",
            SituationLabel::TargetDangerous => "target-dangerous",
            SituationLabel::NumericDisadvantage => "numeric-disadvantage",
            SituationLabel::NumericAdvantage => "numeric-advantage",
            SituationLabel::LastDisc => "last-disc",
            SituationLabel::OwnDiscsInDanger => "own-discs-in-danger",
            SituationLabel::GeometryFavorable => "geometry-favorable",
            SituationLabel::OpeningPosition => "opening",
            SituationLabel::Endgame => "endgame",
            SituationLabel::Standard => "standard",
        }
    }
}

/// Distances are expressed in pocket radii so they scale with the preset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub target_critical: f32,
    pub target_dangerous: f32,
    pub own_danger: f32,
    /// Minimum cosine between striker→target and target→pocket
    pub alignment_cos: f32,
    /// Maximum striker→target distance for an aligned shot (table units)
    pub alignment_reach: f32,
    /// Player discs remaining at or below which the game is an endgame
    pub endgame_discs: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            target_critical: 2.5,
            target_dangerous: 3.5,
            own_danger: 2.5,
            alignment_cos: 0.95,
            alignment_reach: 300.0,
            endgame_discs: 2,
        }
    }
}

/// Every condition that holds, sorted by precedence
pub fn assess(world: &World, side: Side) -> Vec<SituationLabel> {
    assess_with(world, side, &Thresholds::default())
}

pub fn assess_with(world: &World, side: Side, limits: &Thresholds) -> Vec<SituationLabel> {
    let table = &world.table;
    let pocket_r = table.pocket_radius;
    let mut labels = Vec::new();

    if let Some(target) = world.active_target() {
        let dist = table.distance_to_pocket(target.pos);
        if dist < pocket_r * limits.target_critical {
            labels.push(SituationLabel::TargetCritical);
        } else if dist < pocket_r * limits.target_dangerous {
            labels.push(SituationLabel::TargetDangerous);
        }

        let to_pocket = direction(target.pos, table.pocket);
        let aligned = world.side_discs(side).any(|d| {
            d.pos.distance(target.pos) < limits.alignment_reach
                && direction(d.pos, target.pos).dot(to_pocket) > limits.alignment_cos
        });
        if aligned {
            labels.push(SituationLabel::GeometryFavorable);
        }
    }

    let ours = world.active_count(side);
    let theirs = world.active_count(side.opponent());
    if ours < theirs {
        labels.push(SituationLabel::NumericDisadvantage);
    } else if ours > theirs {
        labels.push(SituationLabel::NumericAdvantage);
    }
    if ours == 1 {
        labels.push(SituationLabel::LastDisc);
    }

    if world
        .side_discs(side)
        .any(|d| table.distance_to_pocket(d.pos) < pocket_r * limits.own_danger)
    {
        labels.push(SituationLabel::OwnDiscsInDanger);
    }

    if !world.discs.is_empty() && world.discs.iter().all(|d| d.active) {
        labels.push(SituationLabel::OpeningPosition);
    }
    if world.active_player_discs() <= limits.endgame_discs {
        labels.push(SituationLabel::Endgame);
    }

    labels.sort();
    labels
}

/// Highest-precedence label for the live world
pub fn classify(world: &World, side: Side) -> SituationLabel {
    assess(world, side)
        .first()
        .copied()
        .unwrap_or(SituationLabel::Standard)
}
