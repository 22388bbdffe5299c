//! Match settings
//!
//! Stored as JSON. Missing fields fall back to their defaults so older
//! files keep loading.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ai::AiLevel;
use crate::consts::BASE_POCKET_RADIUS;
use crate::round::DEFAULT_MAX_SHOTS;
use crate::sim::{Side, Table};

/// Pocket size preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PocketSize {
    /// Large pocket
    Noob,
    #[default]
    Pro,
    /// Small pocket
    Legend,
}

impl PocketSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            PocketSize::Noob => "Noob",
            PocketSize::Pro => "Pro",
            PocketSize::Legend => "Legend",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "noob" | "large" => Some(PocketSize::Noob),
            "pro" | "normal" => Some(PocketSize::Pro),
            "legend" | "small" => Some(PocketSize::Legend),
            _ => None,
        }
    }

    /// Capture radius for this preset
    pub fn radius(&self) -> f32 {
        match self {
            PocketSize::Noob => BASE_POCKET_RADIUS * 1.5,
            PocketSize::Pro => BASE_POCKET_RADIUS,
            PocketSize::Legend => BASE_POCKET_RADIUS * 0.75,
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Match configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub pocket: PocketSize,
    pub white_ai: AiLevel,
    pub black_ai: AiLevel,
    /// Round wins needed to take the match
    pub rounds_to_win: u32,
    /// Shots after which a round is drawn
    pub max_shots_per_round: u32,
    /// Seed for the aim-error streams
    pub seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pocket: PocketSize::Pro,
            white_ai: AiLevel::Smart,
            black_ai: AiLevel::Terminator,
            rounds_to_win: 2,
            max_shots_per_round: DEFAULT_MAX_SHOTS,
            seed: 0,
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.rounds_to_win == 0 {
            return Err(SettingsError::Invalid("rounds_to_win must be at least 1".into()));
        }
        if self.max_shots_per_round == 0 {
            return Err(SettingsError::Invalid("max_shots_per_round must be at least 1".into()));
        }
        Ok(())
    }

    /// Standard table with this pocket preset
    pub fn table(&self) -> Table {
        Table::new(self.pocket.radius())
    }

    pub fn ai_for(&self, side: Side) -> AiLevel {
        match side {
            Side::White => self.white_ai,
            Side::Black => self.black_ai,
        }
    }
}
