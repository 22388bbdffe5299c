//! Strategy dispatcher
//!
//! Turns a live world into a single decided shot. The situation label picks
//! an ordered list of specialised strategies; the first whose best shot
//! clears its floor wins, and the baseline pass closes every list.

use glam::Vec2;
use serde::Serialize;

use super::classify::{SituationLabel, classify};
use super::profile::{AiLevel, AiProfile};
use super::search::{ScoreJitter, ShotCandidate, StrategyKind, candidate_discs, search_jittered};
use crate::sim::{Side, World};

/// Dispatcher progress, logged on every transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DispatchPhase {
    Idle,
    Classifying,
    StrategySelected,
    Searching,
    Decided,
}

/// Specialised strategies to try for a label, in order (baseline not included)
pub fn strategies_for(label: SituationLabel) -> &'static [StrategyKind] {
    match label {
        SituationLabel::TargetCritical => &[StrategyKind::EmergencyRescue],
        SituationLabel::TargetDangerous => &[StrategyKind::ComboHunt, StrategyKind::Defensive],
        SituationLabel::NumericDisadvantage => &[StrategyKind::AggressivePrecision],
        SituationLabel::NumericAdvantage => &[StrategyKind::Lookahead],
        SituationLabel::LastDisc => &[StrategyKind::Perfection],
        SituationLabel::OwnDiscsInDanger => &[StrategyKind::Defensive],
        SituationLabel::GeometryFavorable => &[StrategyKind::ComboHunt],
        SituationLabel::OpeningPosition => &[StrategyKind::Lookahead],
        SituationLabel::Endgame => &[StrategyKind::Perfection],
        SituationLabel::Standard => &[],
    }
}

/// One strategy pass as seen by the dispatcher
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyAttempt {
    pub kind: StrategyKind,
    /// Best surviving score, if the pass produced a shot
    pub score: Option<f32>,
    pub accepted: bool,
    /// Rollouts enumerated by the pass
    pub evaluated: usize,
}

/// Diagnostic record of a decision; never fed back into the engine
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DecisionTrace {
    /// `None` when the profile skips the classifier
    pub situation: Option<SituationLabel>,
    pub attempts: Vec<StrategyAttempt>,
    pub chosen: Option<ShotCandidate>,
}

/// The shot handed back to the host
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShotDecision {
    pub disc_id: u32,
    pub angle: f32,
    pub power: f32,
    pub velocity: Vec2,
    pub trace: DecisionTrace,
}

impl ShotDecision {
    pub fn strategy(&self) -> Option<StrategyKind> {
        self.trace.chosen.as_ref().map(|c| c.strategy)
    }

    pub fn score(&self) -> Option<f32> {
        self.trace.chosen.as_ref().map(|c| c.score)
    }
}

/// Single-use state machine for one decision
pub struct Dispatcher<'a> {
    profile: &'a AiProfile,
    phase: DispatchPhase,
    noise_seed: Option<u64>,
}

impl<'a> Dispatcher<'a> {
    pub fn new(profile: &'a AiProfile) -> Self {
        Self {
            profile,
            phase: DispatchPhase::Idle,
            noise_seed: None,
        }
    }

    /// Seed for the profile's baseline score noise; without one the pick is exact
    pub fn with_noise_seed(mut self, seed: u64) -> Self {
        self.noise_seed = Some(seed);
        self
    }

    fn jitter_for(&self, kind: StrategyKind) -> Option<ScoreJitter> {
        if kind != StrategyKind::Baseline || self.profile.score_noise <= 0.0 {
            return None;
        }
        self.noise_seed.map(|seed| ScoreJitter {
            amplitude: self.profile.score_noise,
            seed,
        })
    }

    pub fn phase(&self) -> DispatchPhase {
        self.phase
    }

    fn enter(&mut self, phase: DispatchPhase) {
        log::debug!("{}: {:?} -> {:?}", self.profile.name, self.phase, phase);
        self.phase = phase;
    }

    /// Decide a shot for `side`, or `None` when it has no disc to strike
    pub fn run(&mut self, world: &World, side: Side) -> Option<ShotDecision> {
        let discs = candidate_discs(world, side);
        if discs.is_empty() {
            self.enter(DispatchPhase::Decided);
            log::info!("{} ({}): no disc to strike", self.profile.name, side.as_str());
            return None;
        }

        let mut trace = DecisionTrace::default();
        let mut plan: Vec<StrategyKind> = Vec::new();
        if self.profile.situational {
            self.enter(DispatchPhase::Classifying);
            let label = classify(world, side);
            trace.situation = Some(label);
            plan.extend(
                strategies_for(label)
                    .iter()
                    .copied()
                    .filter(|&kind| self.profile.strategy(kind).is_some()),
            );
        }
        plan.push(StrategyKind::Baseline);
        self.enter(DispatchPhase::StrategySelected);
        log::debug!(
            "{}: situation={} plan={:?}",
            self.profile.name,
            trace.situation.map_or("unclassified", |l| l.as_str()),
            plan
        );

        self.enter(DispatchPhase::Searching);
        for kind in plan {
            let Some(cfg) = self.profile.strategy(kind) else {
                continue;
            };
            let result = search_jittered(world, side, &discs, cfg, self.jitter_for(kind));
            let score = result.best.as_ref().map(|c| c.score);
            // The baseline closes the list and takes whatever it found
            let accepted = match score {
                Some(s) => kind == StrategyKind::Baseline || cfg.accepts(s),
                None => false,
            };
            trace.attempts.push(StrategyAttempt {
                kind,
                score,
                accepted,
                evaluated: result.evaluated,
            });
            if accepted {
                trace.chosen = result.best;
                break;
            }
        }
        self.enter(DispatchPhase::Decided);

        let chosen = trace.chosen.clone()?;
        log::info!(
            "{} ({}): disc {} angle={:.3} power={:.2} via {} score={:.1}",
            self.profile.name,
            side.as_str(),
            chosen.disc_id,
            chosen.angle,
            chosen.power,
            chosen.strategy.as_str(),
            chosen.score
        );
        Some(ShotDecision {
            disc_id: chosen.disc_id,
            angle: chosen.angle,
            power: chosen.power,
            velocity: chosen.velocity,
            trace,
        })
    }
}

/// Decide the next shot for `side` at the given tier
pub fn decide_shot(world: &World, side: Side, level: AiLevel) -> Option<ShotDecision> {
    decide_shot_with(world, side, &AiProfile::for_level(level))
}

/// Decide with an explicit profile
pub fn decide_shot_with(world: &World, side: Side, profile: &AiProfile) -> Option<ShotDecision> {
    Dispatcher::new(profile).run(world, side)
}

/// Decide with an explicit profile and its score noise seeded by `seed`
pub fn decide_shot_seeded(world: &World, side: Side, profile: &AiProfile, seed: u64) -> Option<ShotDecision> {
    Dispatcher::new(profile).with_noise_seed(seed).run(world, side)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::rollout::{EventKind, RolloutParams, has_self_capture, rollout};
    use crate::ai::search::{AimFilter, PowerSweep, SearchConfig};
    use crate::sim::{Owner, Table};

    fn coarse_profile() -> AiProfile {
        let mut profile = AiProfile::for_level(AiLevel::Dumb);
        profile.baseline = SearchConfig::baseline(90.0, PowerSweep::fixed(0.6), 600);
        profile
    }

    /// Terminator's tables with `kind` narrowed to direct lines at one power
    fn narrowed_terminator(kind: StrategyKind, power: f32, max_steps: u32) -> AiProfile {
        let mut profile = AiProfile::for_level(AiLevel::Terminator);
        profile.baseline = SearchConfig::baseline(90.0, PowerSweep::fixed(0.6), 300);
        for cfg in profile.strategies.iter_mut().filter(|c| c.kind == kind) {
            cfg.angle_step_deg = 1.0;
            cfg.aim = AimFilter::TowardDiscs { cone_deg: 0.0 };
            cfg.powers = PowerSweep::fixed(power);
            cfg.max_steps = max_steps;
        }
        profile
    }

    #[test]
    fn test_every_label_maps_to_known_strategies() {
        let terminator = AiProfile::for_level(AiLevel::Terminator);
        for label in [
            SituationLabel::TargetCritical,
            SituationLabel::TargetDangerous,
            SituationLabel::NumericDisadvantage,
            SituationLabel::NumericAdvantage,
            SituationLabel::LastDisc,
            SituationLabel::OwnDiscsInDanger,
            SituationLabel::GeometryFavorable,
            SituationLabel::OpeningPosition,
            SituationLabel::Endgame,
        ] {
            let kinds = strategies_for(label);
            assert!(!kinds.is_empty());
            assert!(kinds.iter().all(|&k| terminator.strategy(k).is_some()));
            assert!(!kinds.contains(&StrategyKind::Baseline));
        }
        assert!(strategies_for(SituationLabel::Standard).is_empty());
    }

    #[test]
    fn test_no_disc_means_no_decision() {
        let mut world = World::racked(Table::default());
        world.disc_mut(1).unwrap().capture();
        world.disc_mut(2).unwrap().capture();
        let profile = coarse_profile();
        let mut dispatcher = Dispatcher::new(&profile);
        assert!(dispatcher.run(&world, Side::White).is_none());
        assert_eq!(dispatcher.phase(), DispatchPhase::Decided);
    }

    #[test]
    fn test_baseline_only_profile_skips_classifier() {
        let world = World::racked(Table::default());
        let profile = coarse_profile();
        let mut dispatcher = Dispatcher::new(&profile);
        let decision = dispatcher.run(&world, Side::White).expect("white has discs");

        assert_eq!(dispatcher.phase(), DispatchPhase::Decided);
        assert!(decision.trace.situation.is_none());
        assert_eq!(decision.trace.attempts.len(), 1);
        assert_eq!(decision.strategy(), Some(StrategyKind::Baseline));
        assert!(world.disc(decision.disc_id).unwrap().is_owned_by(Side::White));
        assert_eq!(decision.velocity, crate::launch_velocity(decision.angle, decision.power));
    }

    #[test]
    fn test_rejected_strategy_falls_through_to_baseline() {
        let mut world = World::racked(Table::default());
        // Black down to one disc: White is ahead on count, Black is on its last disc
        world.disc_mut(3).unwrap().capture();

        let mut profile = coarse_profile();
        profile.situational = true;
        let mut perfection = SearchConfig::strategy(
            StrategyKind::Perfection,
            30.0,
            AimFilter::TowardDiscs { cone_deg: 0.0 },
            PowerSweep::fixed(0.7),
            400,
        );
        perfection.acceptance_floor = Some(f32::INFINITY);
        profile.strategies = vec![perfection];

        let decision = decide_shot_with(&world, Side::Black, &profile).expect("black has a disc");
        assert_eq!(decision.disc_id, 4);
        assert_eq!(decision.trace.situation, Some(SituationLabel::NumericDisadvantage));
        // AggressivePrecision is not configured, so only the baseline ran
        assert_eq!(decision.trace.attempts.len(), 1);

        // White sees NumericAdvantage, whose Lookahead is also missing
        let decision = decide_shot_with(&world, Side::White, &profile).unwrap();
        assert_eq!(decision.strategy(), Some(StrategyKind::Baseline));
    }

    #[test]
    fn test_critical_target_is_rescued() {
        let mut world = World::new(Table::default());
        let pocket = world.table.pocket;
        let striker = world.add_disc(pocket - Vec2::new(156.0, 0.0), Owner::Player(Side::White));
        world.add_disc(Vec2::new(800.0, 80.0), Owner::Player(Side::Black));
        // 60 units out, inside 2.5 pocket radii
        let target = world.add_disc(pocket - Vec2::new(60.0, 0.0), Owner::Target);

        let profile = narrowed_terminator(StrategyKind::EmergencyRescue, 0.15, 120);
        let decision = decide_shot_with(&world, Side::White, &profile).expect("white has a disc");
        assert_eq!(decision.trace.situation, Some(SituationLabel::TargetCritical));
        let attempts = &decision.trace.attempts;
        assert_eq!(attempts[0].kind, StrategyKind::EmergencyRescue);
        assert!(attempts[0].accepted);
        assert_eq!(attempts.len(), 1);
        assert_eq!(decision.strategy(), Some(StrategyKind::EmergencyRescue));

        let chosen = decision.trace.chosen.as_ref().unwrap();
        assert_eq!(chosen.disc_id, striker);
        assert!(chosen.score >= 900.0);
        assert!(chosen.events.iter().any(|e| e.kind == EventKind::TargetCaptured && e.disc == target));
    }

    #[test]
    fn test_own_disc_in_danger_plays_defensive() {
        let mut world = World::new(Table::default());
        let pocket = world.table.pocket;
        // 70 units above the pocket, inside 2.5 pocket radii
        world.add_disc(pocket - Vec2::new(0.0, 70.0), Owner::Player(Side::White));
        let pusher = world.add_disc(pocket - Vec2::new(96.0, 0.0), Owner::Player(Side::White));
        world.add_disc(Vec2::new(800.0, 80.0), Owner::Player(Side::Black));
        world.add_disc(Vec2::new(800.0, 450.0), Owner::Player(Side::Black));
        let target = world.add_disc(pocket - Vec2::new(156.0, 0.0), Owner::Target);

        let profile = narrowed_terminator(StrategyKind::Defensive, 0.15, 60);
        let decision = decide_shot_with(&world, Side::White, &profile).expect("white has discs");
        assert_eq!(decision.trace.situation, Some(SituationLabel::OwnDiscsInDanger));
        let attempts = &decision.trace.attempts;
        assert_eq!(attempts[0].kind, StrategyKind::Defensive);
        assert!(attempts[0].accepted);
        assert_eq!(decision.strategy(), Some(StrategyKind::Defensive));

        let chosen = decision.trace.chosen.as_ref().unwrap();
        assert!(chosen.score >= 40.0);
        assert!(!has_self_capture(&chosen.events));

        // The pusher's straight shot drives the target away from the pocket
        let cfg = profile.strategy(StrategyKind::Defensive).unwrap();
        let params = RolloutParams {
            side: Side::White,
            max_steps: cfg.max_steps,
            weights: cfg.weights,
            abort_on_self_capture: true,
        };
        let push = rollout(&world, pusher, crate::launch_velocity(-std::f32::consts::PI, 0.15), &params);
        let before = world.table.distance_to_pocket(world.disc(target).unwrap().pos);
        let after = world.table.distance_to_pocket(push.world.disc(target).unwrap().pos);
        assert!(after > before);
        assert!(push.score > 40.0);
        assert!(chosen.score >= push.score - 1.0);
    }

    #[test]
    fn test_floor_rejection_is_traced() {
        let mut world = World::new(Table::default());
        world.add_disc(Vec2::new(150.0, 100.0), Owner::Player(Side::White));
        world.add_disc(Vec2::new(700.0, 400.0), Owner::Player(Side::Black));
        world.add_disc(Vec2::new(300.0, 450.0), Owner::Target);
        // White and Black each have one disc: LastDisc for either side

        let mut profile = coarse_profile();
        profile.situational = true;
        let mut perfection = SearchConfig::strategy(
            StrategyKind::Perfection,
            30.0,
            AimFilter::TowardDiscs { cone_deg: 0.0 },
            PowerSweep::fixed(0.7),
            400,
        );
        perfection.acceptance_floor = Some(f32::INFINITY);
        profile.strategies = vec![perfection];

        let decision = decide_shot_with(&world, Side::White, &profile).expect("baseline always answers");
        assert_eq!(decision.trace.situation, Some(SituationLabel::LastDisc));
        let attempts = &decision.trace.attempts;
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].kind, StrategyKind::Perfection);
        assert!(!attempts[0].accepted);
        assert_eq!(attempts[1].kind, StrategyKind::Baseline);
        assert!(attempts[1].accepted);
        assert_eq!(decision.strategy(), Some(StrategyKind::Baseline));
    }
}
