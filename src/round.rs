//! Turn management for rounds and matches
//!
//! A [`Round`] owns the live world. The engine only ever borrows it to
//! decide a shot; the round applies that shot, plays it out on the fixed
//! tick and decides what happens next.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ai::ShotDecision;
use crate::consts::SIM_DT;
use crate::sim::{Side, StepEvent, Table, World, advance};

/// Steps allowed for one shot to come to rest before discs are stopped by force
const SETTLE_GUARD: u32 = 20_000;

/// Shots after which an undecided round is called a draw
pub const DEFAULT_MAX_SHOTS: u32 = 200;

/// How a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOutcome {
    Winner(Side),
    /// Shot cap reached with the round still open
    Draw,
}

/// Rejected round actions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoundError {
    #[error("round is already over")]
    RoundOver,
    #[error("no active disc with id {0}")]
    UnknownDisc(u32),
    #[error("disc {disc} cannot be played by {side:?}")]
    NotYourDisc { disc: u32, side: Side },
    #[error("discs are still moving")]
    NotSettled,
}

/// What one shot did
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShotReport {
    pub side: Side,
    /// `None` for a passed turn
    pub disc_id: Option<u32>,
    /// Discs that fell during the shot, in capture order
    pub fallen: Vec<u32>,
    pub steps: u32,
    /// Cushion bounces during the shot
    pub cushions: u32,
    pub target_captured: bool,
    pub outcome: Option<RoundOutcome>,
}

/// What the live world did while coming to rest
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Playout {
    /// Captured disc ids, in capture order
    pub fallen: Vec<u32>,
    pub steps: u32,
    pub cushions: u32,
}

/// A single round: rack, alternate shots, resolve
#[derive(Debug, Clone)]
pub struct Round {
    pub world: World,
    turn: Side,
    shots: u32,
    max_shots: u32,
    outcome: Option<RoundOutcome>,
}

impl Round {
    /// Fresh rack; White opens
    pub fn new(table: Table, max_shots: u32) -> Self {
        Self::with_world(World::racked(table), max_shots)
    }

    /// Round over an arbitrary starting position
    pub fn with_world(mut world: World, max_shots: u32) -> Self {
        world.normalize_order();
        Self {
            world,
            turn: Side::White,
            shots: 0,
            max_shots,
            outcome: None,
        }
    }

    pub fn turn(&self) -> Side {
        self.turn
    }

    pub fn shots(&self) -> u32 {
        self.shots
    }

    pub fn outcome(&self) -> Option<RoundOutcome> {
        self.outcome
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// Write a launch velocity onto one of the current side's discs
    pub fn apply_shot(&mut self, disc_id: u32, velocity: Vec2) -> Result<(), RoundError> {
        if self.is_over() {
            return Err(RoundError::RoundOver);
        }
        if !self.world.is_settled() {
            return Err(RoundError::NotSettled);
        }
        let side = self.turn;
        let disc = self
            .world
            .disc_mut(disc_id)
            .filter(|d| d.active)
            .ok_or(RoundError::UnknownDisc(disc_id))?;
        if !disc.is_owned_by(side) {
            return Err(RoundError::NotYourDisc { disc: disc_id, side });
        }
        disc.vel = velocity;
        Ok(())
    }

    /// Run the live world until it rests
    pub fn settle(&mut self) -> Playout {
        let mut events = Vec::new();
        let mut playout = Playout::default();
        while !self.world.is_settled() {
            if playout.steps >= SETTLE_GUARD {
                log::warn!("shot did not settle after {} steps, stopping discs", playout.steps);
                for disc in &mut self.world.discs {
                    disc.vel = Vec2::ZERO;
                }
                break;
            }
            events.clear();
            advance(&mut self.world, SIM_DT, &mut events);
            playout.steps += 1;
            for event in &events {
                match event {
                    StepEvent::Captured { id } => playout.fallen.push(*id),
                    StepEvent::Cushion { .. } => playout.cushions += 1,
                    StepEvent::Contact { .. } => {}
                }
            }
        }
        playout
    }

    /// Apply a decided shot, play it out and resolve the turn
    pub fn play(&mut self, decision: &ShotDecision) -> Result<ShotReport, RoundError> {
        let side = self.turn;
        self.apply_shot(decision.disc_id, decision.velocity)?;
        let Playout { fallen, steps, cushions } = self.settle();
        let target_captured = fallen
            .iter()
            .any(|&id| self.world.disc(id).is_some_and(|d| d.owner.is_target()));
        let outcome = self.finish_turn(target_captured);
        Ok(ShotReport {
            side,
            disc_id: Some(decision.disc_id),
            fallen,
            steps,
            cushions,
            target_captured,
            outcome,
        })
    }

    /// Skip the current side's turn (it had nothing to strike)
    pub fn pass(&mut self) -> Result<ShotReport, RoundError> {
        if self.is_over() {
            return Err(RoundError::RoundOver);
        }
        let side = self.turn;
        let outcome = self.finish_turn(false);
        Ok(ShotReport {
            side,
            disc_id: None,
            fallen: Vec::new(),
            steps: 0,
            cushions: 0,
            target_captured: false,
            outcome,
        })
    }

    fn finish_turn(&mut self, target_captured: bool) -> Option<RoundOutcome> {
        let shooter = self.turn;
        self.shots += 1;

        let outcome = if target_captured {
            Some(RoundOutcome::Winner(shooter))
        } else if self.world.active_count(Side::White) == 0 {
            Some(RoundOutcome::Winner(Side::Black))
        } else if self.world.active_count(Side::Black) == 0 {
            Some(RoundOutcome::Winner(Side::White))
        } else if self.shots >= self.max_shots {
            Some(RoundOutcome::Draw)
        } else {
            None
        };

        match outcome {
            Some(result) => {
                log::info!("round over after {} shots: {:?}", self.shots, result);
                self.outcome = Some(result);
            }
            None => self.turn = shooter.opponent(),
        }
        outcome
    }
}

/// Running score of a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchState {
    /// Indexed White, Black
    pub rounds_won: [u32; 2],
    pub rounds_to_win: u32,
    pub rounds_played: u32,
    pub draws: u32,
    pub shots_total: u32,
}

impl MatchState {
    pub fn new(rounds_to_win: u32) -> Self {
        Self {
            rounds_won: [0, 0],
            rounds_to_win: rounds_to_win.max(1),
            rounds_played: 0,
            draws: 0,
            shots_total: 0,
        }
    }

    fn slot(side: Side) -> usize {
        match side {
            Side::White => 0,
            Side::Black => 1,
        }
    }

    pub fn wins(&self, side: Side) -> u32 {
        self.rounds_won[Self::slot(side)]
    }

    pub fn record(&mut self, outcome: RoundOutcome, shots: u32) {
        self.rounds_played += 1;
        self.shots_total += shots;
        match outcome {
            RoundOutcome::Winner(side) => self.rounds_won[Self::slot(side)] += 1,
            RoundOutcome::Draw => self.draws += 1,
        }
    }

    pub fn winner(&self) -> Option<Side> {
        [Side::White, Side::Black]
            .into_iter()
            .find(|&side| self.wins(side) >= self.rounds_to_win)
    }

    /// Decided, or out of rounds (endless draws cannot stall a match)
    pub fn is_over(&self) -> bool {
        self.winner().is_some() || self.rounds_played >= self.max_rounds()
    }

    pub fn max_rounds(&self) -> u32 {
        self.rounds_to_win * 3
    }
}

impl Default for MatchState {
    fn default() -> Self {
        Self::new(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launch_velocity;
    use crate::sim::Owner;

    fn decision(disc_id: u32, velocity: Vec2) -> ShotDecision {
        let (angle, power) = crate::shot_params(velocity);
        ShotDecision {
            disc_id,
            angle,
            power,
            velocity,
            trace: Default::default(),
        }
    }

    #[test]
    fn test_white_opens() {
        let round = Round::new(Table::default(), DEFAULT_MAX_SHOTS);
        assert_eq!(round.turn(), Side::White);
        assert_eq!(round.world.discs.len(), 5);
        assert!(!round.is_over());
    }

    #[test]
    fn test_rejects_illegal_shots() {
        let mut round = Round::new(Table::default(), DEFAULT_MAX_SHOTS);
        assert_eq!(
            round.apply_shot(3, Vec2::X),
            Err(RoundError::NotYourDisc {
                disc: 3,
                side: Side::White
            })
        );
        assert_eq!(round.apply_shot(5, Vec2::X), Err(RoundError::NotYourDisc { disc: 5, side: Side::White }));
        assert_eq!(round.apply_shot(99, Vec2::X), Err(RoundError::UnknownDisc(99)));

        round.apply_shot(1, Vec2::new(300.0, 0.0)).unwrap();
        assert_eq!(round.apply_shot(2, Vec2::X), Err(RoundError::NotSettled));
    }

    #[test]
    fn test_quiet_shot_passes_turn() {
        let mut round = Round::new(Table::default(), DEFAULT_MAX_SHOTS);
        let report = round.play(&decision(1, Vec2::new(10.0, 0.0))).unwrap();
        assert!(report.fallen.is_empty());
        assert!(report.outcome.is_none());
        assert_eq!(round.turn(), Side::Black);
        assert_eq!(round.shots(), 1);
        assert!(round.world.is_settled());
    }

    #[test]
    fn test_cushion_bounces_are_counted() {
        let mut world = World::new(Table::default());
        let striker = world.add_disc(Vec2::new(100.0, 100.0), Owner::Player(Side::White));
        world.add_disc(Vec2::new(800.0, 450.0), Owner::Player(Side::Black));
        world.add_disc(Vec2::new(456.0, 480.0), Owner::Target);

        let mut round = Round::with_world(world, DEFAULT_MAX_SHOTS);
        let report = round.play(&decision(striker, Vec2::new(-400.0, 0.0))).unwrap();
        assert!(report.cushions >= 1);
        assert!(report.fallen.is_empty());
        assert!(report.outcome.is_none());

        let report = round.pass().unwrap();
        assert_eq!(report.cushions, 0);
    }

    #[test]
    fn test_capturing_target_wins() {
        let mut world = World::new(Table::default());
        let striker = world.add_disc(Vec2::new(100.0, 266.0), Owner::Player(Side::White));
        world.add_disc(Vec2::new(800.0, 100.0), Owner::Player(Side::Black));
        let target = world.add_disc(Vec2::new(300.0, 266.0), Owner::Target);

        let mut round = Round::with_world(world, DEFAULT_MAX_SHOTS);
        let report = round.play(&decision(striker, launch_velocity(0.0, 1.0))).unwrap();
        assert!(report.target_captured);
        assert!(report.fallen.contains(&target));
        assert_eq!(report.outcome, Some(RoundOutcome::Winner(Side::White)));
        assert_eq!(round.play(&decision(striker, Vec2::X)), Err(RoundError::RoundOver));
    }

    #[test]
    fn test_losing_last_disc_loses_round() {
        let mut world = World::new(Table::default());
        let pocket = world.table.pocket;
        let own = world.add_disc(pocket - Vec2::new(120.0, 0.0), Owner::Player(Side::White));
        world.add_disc(Vec2::new(800.0, 100.0), Owner::Player(Side::Black));
        world.add_disc(Vec2::new(100.0, 60.0), Owner::Target);

        let mut round = Round::with_world(world, DEFAULT_MAX_SHOTS);
        let report = round.play(&decision(own, launch_velocity(0.0, 0.5))).unwrap();
        assert_eq!(report.fallen, vec![own]);
        assert_eq!(round.outcome(), Some(RoundOutcome::Winner(Side::Black)));
    }

    #[test]
    fn test_shot_cap_draws() {
        let mut round = Round::new(Table::default(), 2);
        round.play(&decision(1, Vec2::new(10.0, 0.0))).unwrap();
        let report = round.pass().unwrap();
        assert_eq!(report.side, Side::Black);
        assert_eq!(report.outcome, Some(RoundOutcome::Draw));
        assert!(round.pass().is_err());
    }

    #[test]
    fn test_match_first_to_two() {
        let mut state = MatchState::default();
        state.record(RoundOutcome::Winner(Side::Black), 12);
        state.record(RoundOutcome::Draw, 200);
        assert!(!state.is_over());
        state.record(RoundOutcome::Winner(Side::Black), 8);
        assert_eq!(state.winner(), Some(Side::Black));
        assert_eq!(state.wins(Side::White), 0);
        assert_eq!(state.shots_total, 220);
        assert_eq!(state.draws, 1);
        assert!(state.is_over());
    }

    #[test]
    fn test_endless_draws_end_match() {
        let mut state = MatchState::new(1);
        for _ in 0..3 {
            state.record(RoundOutcome::Draw, 1);
        }
        assert!(state.winner().is_none());
        assert!(state.is_over());
    }
}
