//! Shot rollout simulator
//!
//! A rollout copies the world, launches one disc, steps the physics until
//! everything rests (or a step budget runs out) and scores the typed event
//! log from the point of view of the searching side.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::SIM_DT;
use crate::sim::{Owner, Side, StepEvent, World, step};

/// What happened during a rollout, relative to the searching side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// One of our discs touched the target
    DiscHitTarget,
    /// One of our discs touched an opponent disc
    DiscHitOpponent,
    TargetCaptured,
    OpponentCaptured,
    /// One of our own discs fell in
    OwnCaptured,
}

/// A single log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimEvent {
    pub kind: EventKind,
    /// 1-based step index at which the event happened
    pub step: u32,
    /// Disc the event is about (the captured disc, or the disc that was hit)
    pub disc: u32,
}

/// Heuristic scoring weights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub target_captured: f32,
    /// (step threshold, bonus): first tier whose threshold exceeds the capture step applies
    pub early_capture: [(u32, f32); 3],
    pub opponent_captured: f32,
    /// Legacy deterrent; search strategies also hard-filter self-captures
    pub own_captured: f32,
    /// Once, when the target is touched at all
    pub target_contact: f32,
    /// Once, when an opponent disc is struck within `early_hit_window` steps
    pub early_opponent_hit: f32,
    pub early_hit_window: u32,
    /// Partial credit for a target left near (not in) the pocket
    pub near_pocket: f32,
    /// Near-pocket zone radius, in pocket radii
    pub near_pocket_span: f32,
    /// Per unit the target ends further from the pocket, only when nothing fell
    pub push_away: f32,
    /// Per capture beyond the first
    pub combo_bonus: f32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            target_captured: 1000.0,
            early_capture: [(60, 300.0), (120, 200.0), (240, 100.0)],
            opponent_captured: 400.0,
            own_captured: -10_000.0,
            target_contact: 40.0,
            early_opponent_hit: 60.0,
            early_hit_window: 40,
            near_pocket: 200.0,
            near_pocket_span: 4.0,
            push_away: 0.0,
            combo_bonus: 0.0,
        }
    }
}

/// Rollout parameters shared by every candidate of one search
#[derive(Debug, Clone, Copy)]
pub struct RolloutParams {
    pub side: Side,
    pub max_steps: u32,
    pub weights: ScoreWeights,
    /// Stop as soon as one of our discs falls in (the candidate is discarded anyway)
    pub abort_on_self_capture: bool,
}

impl RolloutParams {
    pub fn new(side: Side, max_steps: u32) -> Self {
        Self {
            side,
            max_steps,
            weights: ScoreWeights::default(),
            abort_on_self_capture: false,
        }
    }
}

/// Result of a rollout
#[derive(Debug, Clone)]
pub struct RolloutOutcome {
    /// Predicted world once the shot has played out
    pub world: World,
    pub events: Vec<SimEvent>,
    pub score: f32,
    pub steps: u32,
    /// False when the step budget ran out first
    pub settled: bool,
}

impl RolloutOutcome {
    pub fn has_self_capture(&self) -> bool {
        has_self_capture(&self.events)
    }

    pub fn target_captured(&self) -> bool {
        self.events.iter().any(|e| e.kind == EventKind::TargetCaptured)
    }

    /// Number of target and opponent captures
    pub fn captures(&self) -> usize {
        count_captures(&self.events)
    }
}

pub fn has_self_capture(events: &[SimEvent]) -> bool {
    events.iter().any(|e| e.kind == EventKind::OwnCaptured)
}

fn count_captures(events: &[SimEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e.kind, EventKind::TargetCaptured | EventKind::OpponentCaptured))
        .count()
}

/// Translate a physics notification into a log entry for `side`
fn classify_event(world: &World, side: Side, event: StepEvent, step: u32) -> Option<SimEvent> {
    let owner_of = |id: u32| world.disc(id).map(|d| d.owner);
    match event {
        StepEvent::Captured { id } => {
            let kind = match owner_of(id)? {
                Owner::Target => EventKind::TargetCaptured,
                Owner::Player(s) if s == side => EventKind::OwnCaptured,
                Owner::Player(_) => EventKind::OpponentCaptured,
            };
            Some(SimEvent { kind, step, disc: id })
        }
        StepEvent::Contact { a, b } => {
            let (oa, ob) = (owner_of(a)?, owner_of(b)?);
            let ours = Owner::Player(side);
            let (other, other_id) = if oa == ours {
                (ob, b)
            } else if ob == ours {
                (oa, a)
            } else {
                return None;
            };
            let kind = match other {
                Owner::Target => EventKind::DiscHitTarget,
                Owner::Player(s) if s != side => EventKind::DiscHitOpponent,
                Owner::Player(_) => return None,
            };
            Some(SimEvent {
                kind,
                step,
                disc: other_id,
            })
        }
        StepEvent::Cushion { .. } => None,
    }
}

/// Score an event log plus the settled position
///
/// `before` is the world the shot was played from, `after` the predicted result.
pub fn score_outcome(before: &World, after: &World, events: &[SimEvent], weights: &ScoreWeights) -> f32 {
    let mut score = 0.0;

    for event in events {
        match event.kind {
            EventKind::TargetCaptured => {
                score += weights.target_captured;
                if let Some(&(_, bonus)) = weights
                    .early_capture
                    .iter()
                    .find(|(threshold, _)| event.step < *threshold)
                {
                    score += bonus;
                }
            }
            EventKind::OpponentCaptured => score += weights.opponent_captured,
            EventKind::OwnCaptured => score += weights.own_captured,
            EventKind::DiscHitTarget | EventKind::DiscHitOpponent => {}
        }
    }

    if events.iter().any(|e| e.kind == EventKind::DiscHitTarget) {
        score += weights.target_contact;
    }
    let first_opponent_hit = events.iter().find(|e| e.kind == EventKind::DiscHitOpponent);
    if first_opponent_hit.is_some_and(|hit| hit.step < weights.early_hit_window) {
        score += weights.early_opponent_hit;
    }

    let captures = count_captures(events);
    if captures > 1 {
        score += weights.combo_bonus * (captures - 1) as f32;
    }

    // Positional terms only apply while the target is still on the table
    if let Some(target) = after.active_target() {
        let table = &after.table;
        let dist = table.distance_to_pocket(target.pos);
        let zone = table.pocket_radius * weights.near_pocket_span;
        if zone > 0.0 && dist < zone {
            score += weights.near_pocket * (1.0 - dist / zone);
        }

        let quiet = captures == 0 && !has_self_capture(events);
        if quiet && weights.push_away != 0.0 {
            if let Some(start) = before.active_target() {
                let gained = dist - table.distance_to_pocket(start.pos);
                if gained > 0.0 {
                    score += weights.push_away * gained;
                }
            }
        }
    }

    score
}

/// Simulate striking `strike_id` with `velocity` on a copy of `world`
///
/// Every other disc starts at rest. Running out of `max_steps` is a normal
/// outcome; whatever was logged so far is scored.
pub fn rollout(world: &World, strike_id: u32, velocity: Vec2, params: &RolloutParams) -> RolloutOutcome {
    let mut sim = world.snapshot();
    for disc in &mut sim.discs {
        disc.vel = if disc.id == strike_id { velocity } else { Vec2::ZERO };
    }

    let mut events = Vec::new();
    let mut step_events = Vec::with_capacity(8);
    let mut steps = 0;
    let mut settled = sim.is_settled();

    while !settled && steps < params.max_steps {
        step_events.clear();
        step(&mut sim, SIM_DT, &mut step_events);
        steps += 1;

        events.extend(
            step_events
                .iter()
                .filter_map(|&e| classify_event(&sim, params.side, e, steps)),
        );
        if params.abort_on_self_capture && has_self_capture(&events) {
            break;
        }
        settled = sim.is_settled();
    }

    let score = score_outcome(world, &sim, &events, &params.weights);
    log::trace!(
        "rollout disc={} v=({:.1},{:.1}) steps={} settled={} events={} score={:.1}",
        strike_id,
        velocity.x,
        velocity.y,
        steps,
        settled,
        events.len(),
        score
    );

    RolloutOutcome {
        world: sim,
        events,
        score,
        steps,
        settled,
    }
}
