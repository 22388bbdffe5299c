//! Shot decision engine
//!
//! Deterministic search over simulated shots. The only randomness is what
//! [`ShotPlanner`] adds for the weaker tiers (score noise on the baseline
//! pick and aim imprecision), and it is seeded so whole matches replay
//! exactly.

pub mod classify;
pub mod dispatch;
pub mod profile;
pub mod rollout;
pub mod search;

use std::f32::consts::PI;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

pub use classify::{SituationLabel, assess, classify};
pub use dispatch::{
    DecisionTrace, DispatchPhase, Dispatcher, ShotDecision, StrategyAttempt, decide_shot, decide_shot_seeded,
    decide_shot_with,
};
pub use profile::{AiLevel, AiProfile};
pub use rollout::{EventKind, RolloutOutcome, RolloutParams, ScoreWeights, SimEvent, rollout};
pub use search::{
    AimFilter, LookaheadConfig, PowerSweep, ScoreJitter, SearchConfig, SearchResult, ShotCandidate, StrategyKind,
    search, search_jittered,
};

use crate::launch_velocity;
use crate::sim::{Side, World};

/// Lowest power an imprecise shot can degrade to
const MIN_PERTURBED_POWER: f32 = 0.2;

/// A tier's decision maker with its own aim-error stream
pub struct ShotPlanner {
    profile: AiProfile,
    rng: Pcg32,
}

impl ShotPlanner {
    pub fn new(level: AiLevel, seed: u64) -> Self {
        Self::with_profile(AiProfile::for_level(level), seed)
    }

    pub fn with_profile(profile: AiProfile, seed: u64) -> Self {
        Self {
            profile,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn profile(&self) -> &AiProfile {
        &self.profile
    }

    /// Decide a shot, then apply the tier's aim error
    ///
    /// Tiers with score noise draw a fresh noise seed from the planner's
    /// stream for every decision. The trace still describes the shot the
    /// search chose.
    pub fn plan(&mut self, world: &World, side: Side) -> Option<ShotDecision> {
        let mut decision = if self.profile.score_noise > 0.0 {
            let seed: u64 = self.rng.random();
            decide_shot_seeded(world, side, &self.profile, seed)?
        } else {
            decide_shot_with(world, side, &self.profile)?
        };
        let error = 1.0 - self.profile.accuracy.clamp(0.0, 1.0);
        if error > 0.0 {
            let u_angle: f32 = self.rng.random();
            let u_power: f32 = self.rng.random();
            decision.angle += (u_angle - 0.5) * error * (PI / 6.0);
            decision.power =
                (decision.power + (u_power - 0.5) * error * 0.3).clamp(MIN_PERTURBED_POWER, 1.0);
            decision.velocity = launch_velocity(decision.angle, decision.power);
            log::debug!(
                "{}: aim error applied, angle={:.3} power={:.2}",
                self.profile.name,
                decision.angle,
                decision.power
            );
        }
        Some(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Table;

    fn coarse(level: AiLevel) -> AiProfile {
        let mut profile = AiProfile::for_level(level);
        profile.baseline = SearchConfig::baseline(90.0, PowerSweep::fixed(0.6), 500);
        profile.situational = false;
        profile.strategies.clear();
        profile.score_noise = 0.0;
        profile
    }

    #[test]
    fn test_exact_tier_plays_the_decided_shot() {
        let world = World::racked(Table::default());
        let profile = coarse(AiLevel::Terminator);
        let exact = decide_shot_with(&world, Side::White, &profile).unwrap();
        let planned = ShotPlanner::with_profile(profile, 7).plan(&world, Side::White).unwrap();
        assert_eq!(planned, exact);
    }

    #[test]
    fn test_aim_error_is_bounded_and_seeded() {
        let world = World::racked(Table::default());
        let profile = coarse(AiLevel::Dumb);
        let exact = decide_shot_with(&world, Side::White, &profile).unwrap();

        let a = ShotPlanner::with_profile(profile.clone(), 42).plan(&world, Side::White).unwrap();
        let b = ShotPlanner::with_profile(profile, 42).plan(&world, Side::White).unwrap();
        assert_eq!(a, b);

        // accuracy 0.5: at most ±π/24 on angle, ±0.075 on power
        assert_eq!(a.disc_id, exact.disc_id);
        assert!((a.angle - exact.angle).abs() <= PI / 24.0 + 1e-5);
        assert!((a.power - exact.power).abs() <= 0.075 + 1e-5);
        assert!(a.power >= MIN_PERTURBED_POWER && a.power <= 1.0);
        assert_eq!(a.velocity, launch_velocity(a.angle, a.power));
    }

    #[test]
    fn test_score_noise_is_seeded() {
        let world = World::racked(Table::default());
        let mut profile = coarse(AiLevel::Dumb);
        profile.score_noise = 200.0;
        profile.accuracy = 1.0;

        let a = ShotPlanner::with_profile(profile.clone(), 3).plan(&world, Side::White).unwrap();
        let b = ShotPlanner::with_profile(profile.clone(), 3).plan(&world, Side::White).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.strategy(), Some(StrategyKind::Baseline));

        // The planner's first draw is the noise seed
        let seed: u64 = Pcg32::seed_from_u64(3).random();
        assert_eq!(decide_shot_seeded(&world, Side::White, &profile, seed).unwrap(), a);
    }

    #[test]
    fn test_noiseless_tier_ignores_the_seed() {
        let world = World::racked(Table::default());
        let profile = coarse(AiLevel::Terminator);
        let exact = decide_shot_with(&world, Side::White, &profile).unwrap();
        for seed in [0, 1, 99] {
            assert_eq!(decide_shot_seeded(&world, Side::White, &profile, seed).unwrap(), exact);
        }
        assert_eq!(AiProfile::for_level(AiLevel::Terminator).score_noise, 0.0);
    }
}
