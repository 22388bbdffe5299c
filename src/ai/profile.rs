//! Difficulty tiers
//!
//! Each tier maps to a fixed bundle of search configurations. Nothing here is
//! computed from the world; the dispatcher only looks things up.

use serde::{Deserialize, Serialize};

use super::rollout::ScoreWeights;
use super::search::{AimFilter, LookaheadConfig, PowerSweep, SearchConfig, StrategyKind};

/// AI difficulty tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AiLevel {
    Dumb,
    #[default]
    Smart,
    Terminator,
}

impl AiLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AiLevel::Dumb => "Dumb",
            AiLevel::Smart => "Smart",
            AiLevel::Terminator => "Terminator",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "dumb" | "easy" => Some(AiLevel::Dumb),
            "smart" | "medium" => Some(AiLevel::Smart),
            "terminator" | "hard" => Some(AiLevel::Terminator),
            _ => None,
        }
    }

    /// Display name shown to the player
    pub fn name(&self) -> &'static str {
        match self {
            AiLevel::Dumb => "IA DUMB",
            AiLevel::Smart => "IA SMART",
            AiLevel::Terminator => "IA TERMINATOR",
        }
    }
}

/// Static configuration bundle for one tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiProfile {
    pub level: AiLevel,
    pub name: String,
    /// Presentation delay for the host; the search never waits on it
    pub thinking_time_ms: u64,
    /// 1.0 plays the decided shot exactly
    pub accuracy: f32,
    /// Spread of the seeded noise added to baseline scores before the pick
    #[serde(default)]
    pub score_noise: f32,
    /// Consult the situational classifier and the specialised strategies
    pub situational: bool,
    pub baseline: SearchConfig,
    pub strategies: Vec<SearchConfig>,
}

impl AiProfile {
    pub fn for_level(level: AiLevel) -> Self {
        match level {
            AiLevel::Dumb => Self {
                level,
                name: level.name().to_string(),
                thinking_time_ms: 1000,
                accuracy: 0.5,
                score_noise: 200.0,
                situational: false,
                baseline: baseline(45.0, PowerSweep::new(0.3, 0.9, 0.3), 1000, -2000.0),
                strategies: Vec::new(),
            },
            AiLevel::Smart => Self {
                level,
                name: level.name().to_string(),
                thinking_time_ms: 2000,
                accuracy: 0.8,
                score_noise: 50.0,
                situational: false,
                baseline: baseline(20.0, PowerSweep::new(0.3, 0.9, 0.2), 1000, -5000.0),
                strategies: Vec::new(),
            },
            AiLevel::Terminator => Self {
                level,
                name: level.name().to_string(),
                thinking_time_ms: 3000,
                accuracy: 1.0,
                score_noise: 0.0,
                situational: true,
                baseline: baseline(10.0, PowerSweep::new(0.3, 1.0, 0.1), 2000, -10_000.0),
                strategies: terminator_strategies(),
            },
        }
    }

    /// Configured strategy of the given kind, if this tier has one
    pub fn strategy(&self, kind: StrategyKind) -> Option<&SearchConfig> {
        if kind == StrategyKind::Baseline {
            return Some(&self.baseline);
        }
        self.strategies.iter().find(|s| s.kind == kind)
    }
}

fn baseline(angle_step_deg: f32, powers: PowerSweep, max_steps: u32, own_captured: f32) -> SearchConfig {
    let mut cfg = SearchConfig::baseline(angle_step_deg, powers, max_steps);
    cfg.weights.own_captured = own_captured;
    cfg
}

fn with_floor(mut cfg: SearchConfig, floor: f32, weights: ScoreWeights) -> SearchConfig {
    cfg.acceptance_floor = Some(floor);
    cfg.weights = weights;
    cfg
}

fn terminator_strategies() -> Vec<SearchConfig> {
    let base = ScoreWeights::default();
    let cone = |cone_deg| AimFilter::TowardDiscs { cone_deg };

    let emergency = with_floor(
        SearchConfig::strategy(
            StrategyKind::EmergencyRescue,
            2.0,
            AimFilter::Full,
            PowerSweep::new(0.4, 1.0, 0.1),
            2000,
        ),
        900.0,
        base,
    );

    let aggressive = with_floor(
        SearchConfig::strategy(
            StrategyKind::AggressivePrecision,
            1.0,
            cone(12.0),
            PowerSweep::new(0.7, 1.0, 0.05),
            2000,
        ),
        350.0,
        ScoreWeights {
            opponent_captured: 600.0,
            ..base
        },
    );

    // Low power, reward moving the target away and penalise leaving it close
    let defensive = with_floor(
        SearchConfig::strategy(
            StrategyKind::Defensive,
            5.0,
            AimFilter::Full,
            PowerSweep::new(0.15, 0.5, 0.05),
            2000,
        ),
        40.0,
        ScoreWeights {
            push_away: 1.5,
            near_pocket: -200.0,
            ..base
        },
    );

    let perfection = with_floor(
        SearchConfig::strategy(
            StrategyKind::Perfection,
            0.5,
            cone(20.0),
            PowerSweep::new(0.3, 1.0, 0.05),
            2000,
        ),
        900.0,
        base,
    );

    let mut lookahead = with_floor(
        SearchConfig::strategy(
            StrategyKind::Lookahead,
            15.0,
            AimFilter::Full,
            PowerSweep::new(0.3, 0.9, 0.2),
            2000,
        ),
        150.0,
        base,
    );
    lookahead.lookahead = Some(LookaheadConfig {
        target_weight: 150.0,
        own_support_weight: 80.0,
        opponent_weight: 80.0,
        refine: 3,
        refine_angle_step_deg: 30.0,
        refine_powers: PowerSweep::new(0.4, 1.0, 0.3),
        refine_max_steps: 1000,
        refine_discount: 0.5,
    });

    // Only shots that sink two or more discs count as combos
    let mut combo = with_floor(
        SearchConfig::strategy(
            StrategyKind::ComboHunt,
            1.0,
            cone(15.0),
            PowerSweep::new(0.5, 1.0, 0.1),
            2000,
        ),
        1300.0,
        ScoreWeights {
            combo_bonus: 500.0,
            ..base
        },
    );

    combo.min_captures = 2;

    vec![emergency, aggressive, defensive, perfection, lookahead, combo]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_round_trip_names() {
        for level in [AiLevel::Dumb, AiLevel::Smart, AiLevel::Terminator] {
            assert_eq!(AiLevel::from_str(level.as_str()), Some(level));
        }
        assert_eq!(AiLevel::from_str("HARD"), Some(AiLevel::Terminator));
        assert_eq!(AiLevel::from_str("godlike"), None);
    }

    #[test]
    fn test_weaker_tiers_run_baseline_only() {
        for level in [AiLevel::Dumb, AiLevel::Smart] {
            let profile = AiProfile::for_level(level);
            assert!(!profile.situational);
            assert!(profile.strategies.is_empty());
            assert!(profile.strategy(StrategyKind::Perfection).is_none());
            assert!(profile.accuracy < 1.0);
        }
        let dumb = AiProfile::for_level(AiLevel::Dumb);
        let smart = AiProfile::for_level(AiLevel::Smart);
        assert_eq!(dumb.score_noise, 200.0);
        assert_eq!(smart.score_noise, 50.0);
        assert_eq!(dumb.baseline.powers.levels().len(), 3);
        assert_eq!(dumb.baseline.max_steps, 1000);
        assert_eq!(dumb.thinking_time_ms, 1000);
    }

    #[test]
    fn test_terminator_has_every_strategy() {
        let profile = AiProfile::for_level(AiLevel::Terminator);
        assert!(profile.situational);
        assert_eq!(profile.accuracy, 1.0);
        assert_eq!(profile.score_noise, 0.0);
        for kind in [
            StrategyKind::Baseline,
            StrategyKind::EmergencyRescue,
            StrategyKind::AggressivePrecision,
            StrategyKind::Defensive,
            StrategyKind::Perfection,
            StrategyKind::Lookahead,
            StrategyKind::ComboHunt,
        ] {
            let cfg = profile.strategy(kind).expect("configured");
            assert_eq!(cfg.kind, kind);
        }
        // Only the baseline may fall back to a self-capturing shot
        assert!(profile.baseline.allow_self_capture_fallback);
        assert!(profile.baseline.acceptance_floor.is_none());
        assert!(profile.strategies.iter().all(|s| !s.allow_self_capture_fallback));
        assert!(profile.strategies.iter().all(|s| s.acceptance_floor.is_some()));
        assert_eq!(profile.baseline.weights.own_captured, -10_000.0);

        let combo = profile.strategy(StrategyKind::ComboHunt).unwrap();
        assert_eq!(combo.min_captures, 2);
        assert_eq!(profile.strategies.iter().filter(|s| s.min_captures > 0).count(), 1);
    }

    #[test]
    fn test_profile_serializes() {
        let profile = AiProfile::for_level(AiLevel::Terminator);
        let json = serde_json::to_string(&profile).unwrap();
        let back: AiProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, profile);
    }
}
