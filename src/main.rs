//! Red Pocket entry point
//!
//! Plays AI-vs-AI matches on the native target and prints what each shot did.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use red_pocket::ai::ShotPlanner;
use red_pocket::round::ShotReport;
use red_pocket::sim::Side;
use red_pocket::{AiLevel, MatchState, PocketSize, Round, RoundOutcome, Settings};

#[derive(Parser, Debug)]
#[command(name = "red-pocket")]
#[command(about = "Single-pocket billiards: run an AI-vs-AI match")]
struct Cli {
    /// Settings file (JSON); flags below override it
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, value_enum)]
    pocket: Option<CliPocket>,
    #[arg(long, value_enum)]
    white: Option<CliLevel>,
    #[arg(long, value_enum)]
    black: Option<CliLevel>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    rounds_to_win: Option<u32>,
    #[arg(long)]
    max_shots: Option<u32>,
    /// Print every decision trace as a JSON line
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliLevel {
    Dumb,
    Smart,
    Terminator,
}

impl From<CliLevel> for AiLevel {
    fn from(value: CliLevel) -> Self {
        match value {
            CliLevel::Dumb => AiLevel::Dumb,
            CliLevel::Smart => AiLevel::Smart,
            CliLevel::Terminator => AiLevel::Terminator,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliPocket {
    Noob,
    Pro,
    Legend,
}

impl From<CliPocket> for PocketSize {
    fn from(value: CliPocket) -> Self {
        match value {
            CliPocket::Noob => PocketSize::Noob,
            CliPocket::Pro => PocketSize::Pro,
            CliPocket::Legend => PocketSize::Legend,
        }
    }
}

fn resolve_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load(path).with_context(|| format!("failed to load {}", path.display()))?,
        None => Settings::default(),
    };
    if let Some(pocket) = cli.pocket {
        settings.pocket = pocket.into();
    }
    if let Some(level) = cli.white {
        settings.white_ai = level.into();
    }
    if let Some(level) = cli.black {
        settings.black_ai = level.into();
    }
    if let Some(seed) = cli.seed {
        settings.seed = seed;
    }
    if let Some(rounds) = cli.rounds_to_win {
        settings.rounds_to_win = rounds;
    }
    if let Some(shots) = cli.max_shots {
        settings.max_shots_per_round = shots;
    }
    settings.validate().context("invalid settings")?;
    Ok(settings)
}

fn describe(report: &ShotReport) -> String {
    let shot = match report.disc_id {
        Some(id) => format!("disc {id}"),
        None => "pass".to_string(),
    };
    if report.fallen.is_empty() {
        format!("{} {} ({} steps)", report.side.as_str(), shot, report.steps)
    } else {
        format!(
            "{} {} ({} steps), fallen {:?}",
            report.side.as_str(),
            shot,
            report.steps,
            report.fallen
        )
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let settings = resolve_settings(&cli)?;
    log::info!(
        "Red Pocket: {} vs {} on {} pocket, seed {}",
        settings.white_ai.name(),
        settings.black_ai.name(),
        settings.pocket.as_str(),
        settings.seed
    );

    let mut planners = [
        ShotPlanner::new(settings.white_ai, settings.seed),
        ShotPlanner::new(settings.black_ai, settings.seed.wrapping_add(1)),
    ];
    let mut score = MatchState::new(settings.rounds_to_win);

    while !score.is_over() {
        let mut round = Round::new(settings.table(), settings.max_shots_per_round);
        println!("Round {}", score.rounds_played + 1);

        while !round.is_over() {
            let side = round.turn();
            let planner = &mut planners[if side == Side::White { 0 } else { 1 }];
            let report = match planner.plan(&round.world, side) {
                Some(decision) => {
                    if cli.json {
                        let line = serde_json::to_string(&decision).context("failed to encode decision")?;
                        println!("{line}");
                    }
                    round.play(&decision).context("engine chose an illegal shot")?
                }
                None => round.pass().context("cannot pass a finished round")?,
            };
            println!("  {}", describe(&report));
        }

        let outcome = round.outcome().unwrap_or(RoundOutcome::Draw);
        match outcome {
            RoundOutcome::Winner(side) => println!("  -> {} wins the round", side.as_str()),
            RoundOutcome::Draw => println!("  -> draw"),
        }
        score.record(outcome, round.shots());
    }

    println!(
        "Match over: White {} - {} Black ({} draws, {} shots)",
        score.wins(Side::White),
        score.wins(Side::Black),
        score.draws,
        score.shots_total
    );
    match score.winner() {
        Some(side) => println!("{} takes the match", side.as_str()),
        None => println!("No winner"),
    }
    Ok(())
}
