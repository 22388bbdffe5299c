//! Bounded grid shot search
//!
//! Every strategy is the same procedure: enumerate (disc, angle, power),
//! roll each shot out on its own world copy, drop the ones that sink one of
//! our discs and keep the best survivor. A [`SearchConfig`] carries what
//! differs between strategies.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::rollout::{RolloutParams, ScoreWeights, SimEvent, rollout};
use crate::sim::{Side, World};
use crate::{direction, launch_velocity, normalize_angle};

/// Closed set of search strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyKind {
    /// Exhaustive pass that always yields a shot
    Baseline,
    EmergencyRescue,
    AggressivePrecision,
    Defensive,
    Perfection,
    Lookahead,
    ComboHunt,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Baseline => "baseline",
            StrategyKind::EmergencyRescue => "emergency-rescue",
            StrategyKind::AggressivePrecision => "aggressive-precision",
            StrategyKind::Defensive => "defensive",
            StrategyKind::Perfection => "perfection",
            StrategyKind::Lookahead => "lookahead",
            StrategyKind::ComboHunt => "combo-hunt",
        }
    }
}

/// Which angles are tried for each disc
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AimFilter {
    /// The whole circle
    Full,
    /// Only angles within `cone_deg` of the line toward another active disc
    TowardDiscs { cone_deg: f32 },
}

/// Evenly spaced normalized power levels, both ends inclusive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerSweep {
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl PowerSweep {
    pub const fn new(min: f32, max: f32, step: f32) -> Self {
        Self { min, max, step }
    }

    /// A single power level
    pub const fn fixed(power: f32) -> Self {
        Self::new(power, power, 1.0)
    }

    pub fn levels(&self) -> Vec<f32> {
        if self.step.is_nan() || self.step <= 0.0 || self.max < self.min {
            return vec![self.min.clamp(0.0, 1.0)];
        }
        // Integer count so float drift never drops the last level
        let count = ((self.max - self.min) / self.step + 1e-4).floor() as usize + 1;
        (0..count)
            .map(|i| (self.min + i as f32 * self.step).clamp(0.0, 1.0))
            .collect()
    }
}

/// Second-shot evaluation for the lookahead strategy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LookaheadConfig {
    /// Weight for the target ending close to the pocket
    pub target_weight: f32,
    /// Weight for our nearest disc ending close to the target
    pub own_support_weight: f32,
    /// Penalty weight for the opponent's nearest disc ending close to the target
    pub opponent_weight: f32,
    /// How many of the best first shots get a follow-up search (0 disables)
    pub refine: usize,
    pub refine_angle_step_deg: f32,
    pub refine_powers: PowerSweep,
    pub refine_max_steps: u32,
    /// Share of the follow-up's best score added to the first shot
    pub refine_discount: f32,
}

/// Everything that distinguishes one strategy from another
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    pub kind: StrategyKind,
    pub angle_step_deg: f32,
    pub aim: AimFilter,
    pub powers: PowerSweep,
    pub max_steps: u32,
    pub weights: ScoreWeights,
    /// Minimum score the dispatcher accepts; `None` accepts anything
    pub acceptance_floor: Option<f32>,
    pub lookahead: Option<LookaheadConfig>,
    /// Return the best self-capturing shot when no clean shot exists
    pub allow_self_capture_fallback: bool,
    /// Target and opponent captures a shot needs before it can be picked
    #[serde(default)]
    pub min_captures: usize,
}

impl SearchConfig {
    /// Full-circle pass with no floor and the self-capture fallback enabled
    pub fn baseline(angle_step_deg: f32, powers: PowerSweep, max_steps: u32) -> Self {
        Self {
            kind: StrategyKind::Baseline,
            angle_step_deg,
            aim: AimFilter::Full,
            powers,
            max_steps,
            weights: ScoreWeights::default(),
            acceptance_floor: None,
            lookahead: None,
            allow_self_capture_fallback: true,
            min_captures: 0,
        }
    }

    /// Specialised pass with the hard self-capture filter and no floor yet
    pub fn strategy(kind: StrategyKind, angle_step_deg: f32, aim: AimFilter, powers: PowerSweep, max_steps: u32) -> Self {
        Self {
            kind,
            angle_step_deg,
            aim,
            powers,
            max_steps,
            weights: ScoreWeights::default(),
            acceptance_floor: None,
            lookahead: None,
            allow_self_capture_fallback: false,
            min_captures: 0,
        }
    }

    pub fn accepts(&self, score: f32) -> bool {
        self.acceptance_floor.is_none_or(|floor| score >= floor)
    }

    fn angle_step(&self) -> f32 {
        if self.angle_step_deg.is_finite() && self.angle_step_deg > 0.0 {
            self.angle_step_deg.to_radians()
        } else {
            TAU
        }
    }
}

/// Seeded noise added to every candidate's ranking score
///
/// Noise is drawn in enumeration order from one stream, so a given seed
/// always perturbs the same shot by the same amount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreJitter {
    /// Total spread; each shot moves by up to half of it either way
    pub amplitude: f32,
    pub seed: u64,
}

impl ScoreJitter {
    fn offsets(&self, count: usize) -> Vec<f32> {
        let mut rng = Pcg32::seed_from_u64(self.seed);
        (0..count)
            .map(|_| (rng.random::<f32>() - 0.5) * self.amplitude)
            .collect()
    }
}

/// A scored shot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotCandidate {
    pub disc_id: u32,
    pub angle: f32,
    pub power: f32,
    pub velocity: Vec2,
    pub score: f32,
    pub strategy: StrategyKind,
    /// Event log of the winning rollout (diagnostics only)
    pub events: Vec<SimEvent>,
}

/// Output of one strategy pass
#[derive(Debug, Clone, Default)]
pub struct SearchResult {
    pub best: Option<ShotCandidate>,
    /// Number of rollouts in the enumerated grid
    pub evaluated: usize,
}

/// Ids of the active discs `side` may strike
pub fn candidate_discs(world: &World, side: Side) -> Vec<u32> {
    world.side_discs(side).map(|d| d.id).collect()
}

#[derive(Debug, Clone, Copy)]
struct Shot {
    disc: u32,
    angle: f32,
    power: f32,
}

impl Shot {
    fn velocity(&self) -> Vec2 {
        launch_velocity(self.angle, self.power)
    }
}

#[derive(Debug, Clone, Copy)]
struct Scored {
    score: f32,
    self_capture: bool,
    captures: usize,
}

/// Angles tried for `disc_id`
///
/// Cone angles are sorted and deduplicated where cones overlap.
pub fn aim_angles(world: &World, disc_id: u32, cfg: &SearchConfig) -> Vec<f32> {
    let step = cfg.angle_step();
    let full = || {
        let n = (TAU / step).round().max(1.0) as usize;
        (0..n).map(|i| normalize_angle(i as f32 * TAU / n as f32)).collect::<Vec<_>>()
    };

    let AimFilter::TowardDiscs { cone_deg } = cfg.aim else {
        return full();
    };
    let Some(striker) = world.disc(disc_id) else {
        return Vec::new();
    };

    let half_width = (cone_deg.max(0.0).to_radians() / step + 1e-4).floor() as i32;
    let mut angles: Vec<f32> = world
        .active_discs()
        .filter(|d| d.id != disc_id)
        .filter_map(|d| {
            let dir = direction(striker.pos, d.pos);
            (dir != Vec2::ZERO).then(|| dir.y.atan2(dir.x))
        })
        .flat_map(|base| (-half_width..=half_width).map(move |k| normalize_angle(base + k as f32 * step)))
        .collect();

    if angles.is_empty() {
        return full();
    }
    angles.sort_by(f32::total_cmp);
    angles.dedup_by(|a, b| (*a - *b).abs() < 1e-4);
    angles
}

fn enumerate_shots(world: &World, discs: &[u32], cfg: &SearchConfig) -> Vec<Shot> {
    let powers = cfg.powers.levels();
    let mut shots = Vec::new();
    for &disc in discs {
        if !world.disc(disc).is_some_and(|d| d.active) {
            continue;
        }
        for angle in aim_angles(world, disc, cfg) {
            shots.extend(powers.iter().map(|&power| Shot { disc, angle, power }));
        }
    }
    shots
}

/// How good the resting position is for our next shot
///
/// Each term is a closeness in `[0, 1]` relative to the table diagonal.
/// A captured target leaves nothing to set up, so the proxy is zero.
pub fn positional_proxy(world: &World, side: Side, cfg: &LookaheadConfig) -> f32 {
    let Some(target) = world.active_target() else {
        return 0.0;
    };
    let table = &world.table;
    let diagonal = table.diagonal();
    let closeness = |dist: f32| (1.0 - dist / diagonal).max(0.0);
    let nearest = |s: Side| {
        world
            .side_discs(s)
            .map(|d| d.pos.distance(target.pos))
            .min_by(f32::total_cmp)
    };

    let mut score = cfg.target_weight * closeness(table.distance_to_pocket(target.pos));
    if let Some(dist) = nearest(side) {
        score += cfg.own_support_weight * closeness(dist);
    }
    if let Some(dist) = nearest(side.opponent()) {
        score -= cfg.opponent_weight * closeness(dist);
    }
    score
}

/// Index of the highest score; ties keep the earliest index
fn best_index(scored: &[Scored], clean_only: bool, min_captures: usize) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, s) in scored.iter().enumerate() {
        if (clean_only && s.self_capture) || s.captures < min_captures {
            continue;
        }
        if best.is_none_or(|b| s.score > scored[b].score) {
            best = Some(i);
        }
    }
    best
}

/// Follow-up searches for the most promising first shots
fn refine(world: &World, side: Side, shots: &[Shot], scored: &mut [Scored], cfg: &SearchConfig, la: &LookaheadConfig) {
    if la.refine == 0 {
        return;
    }
    let mut order: Vec<usize> = (0..scored.len()).filter(|&i| !scored[i].self_capture).collect();
    order.sort_by(|&a, &b| scored[b].score.total_cmp(&scored[a].score).then(a.cmp(&b)));
    order.truncate(la.refine);

    let params = RolloutParams {
        side,
        max_steps: cfg.max_steps,
        weights: cfg.weights,
        abort_on_self_capture: true,
    };
    let follow = SearchConfig {
        angle_step_deg: la.refine_angle_step_deg,
        aim: AimFilter::Full,
        powers: la.refine_powers,
        max_steps: la.refine_max_steps,
        acceptance_floor: None,
        lookahead: None,
        allow_self_capture_fallback: false,
        min_captures: 0,
        ..cfg.clone()
    };

    let bonuses: Vec<(usize, f32)> = order
        .par_iter()
        .map(|&i| {
            let shot = shots[i];
            let outcome = rollout(world, shot.disc, shot.velocity(), &params);
            if outcome.target_captured() {
                return (i, 0.0);
            }
            let discs = candidate_discs(&outcome.world, side);
            let next = search(&outcome.world, side, &discs, &follow);
            (i, next.best.map_or(0.0, |c| c.score * la.refine_discount))
        })
        .collect();

    for (i, bonus) in bonuses {
        scored[i].score += bonus;
    }
}

/// Run one strategy pass over `discs`
///
/// Returns no candidate when `discs` is empty, or when every shot sinks one
/// of our discs and the config has no self-capture fallback.
pub fn search(world: &World, side: Side, discs: &[u32], cfg: &SearchConfig) -> SearchResult {
    search_jittered(world, side, discs, cfg, None)
}

/// [`search`] with optional seeded noise on the ranking
///
/// The noise only decides which shot wins; the returned candidate keeps its
/// simulated score.
pub fn search_jittered(
    world: &World,
    side: Side,
    discs: &[u32],
    cfg: &SearchConfig,
    jitter: Option<ScoreJitter>,
) -> SearchResult {
    let shots = enumerate_shots(world, discs, cfg);
    if shots.is_empty() {
        return SearchResult::default();
    }

    let params = RolloutParams {
        side,
        max_steps: cfg.max_steps,
        weights: cfg.weights,
        abort_on_self_capture: !cfg.allow_self_capture_fallback,
    };

    let mut scored: Vec<Scored> = shots
        .par_iter()
        .map(|shot| {
            let outcome = rollout(world, shot.disc, shot.velocity(), &params);
            let self_capture = outcome.has_self_capture();
            let proxy = match &cfg.lookahead {
                Some(la) if !self_capture => positional_proxy(&outcome.world, side, la),
                _ => 0.0,
            };
            Scored {
                score: outcome.score + proxy,
                self_capture,
                captures: outcome.captures(),
            }
        })
        .collect();

    if let Some(la) = &cfg.lookahead {
        refine(world, side, &shots, &mut scored, cfg, la);
    }

    let ranked = match jitter.filter(|j| j.amplitude > 0.0) {
        Some(j) => {
            let mut noisy = scored.clone();
            for (s, offset) in noisy.iter_mut().zip(j.offsets(scored.len())) {
                s.score += offset;
            }
            noisy
        }
        None => scored.clone(),
    };

    let pick = best_index(&ranked, true, cfg.min_captures).or_else(|| {
        if cfg.allow_self_capture_fallback {
            best_index(&ranked, false, cfg.min_captures)
        } else {
            None
        }
    });

    let best = pick.map(|i| {
        let shot = shots[i];
        let velocity = shot.velocity();
        // Replay the winner for its event log
        let outcome = rollout(world, shot.disc, velocity, &params);
        ShotCandidate {
            disc_id: shot.disc,
            angle: shot.angle,
            power: shot.power,
            velocity,
            score: scored[i].score,
            strategy: cfg.kind,
            events: outcome.events,
        }
    });

    match &best {
        Some(c) => log::debug!(
            "{}: {} shots, best disc={} angle={:.3} power={:.2} score={:.1}",
            cfg.kind.as_str(),
            shots.len(),
            c.disc_id,
            c.angle,
            c.power,
            c.score
        ),
        None => log::debug!("{}: {} shots, nothing usable", cfg.kind.as_str(), shots.len()),
    }

    SearchResult {
        best,
        evaluated: shots.len(),
    }
}
