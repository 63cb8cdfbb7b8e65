//! Error types for the trade engine

use crate::models::{PlayerId, TeamId};
use thiserror::Error;

/// Result type for trade engine operations
pub type Result<T> = std::result::Result<T, TradeEngineError>;

/// Structural failures and configuration problems.
///
/// Data-quality problems (missing age, unknown development trait, unknown
/// position) never surface here; they degrade to neutral defaults.
#[derive(Error, Debug)]
pub enum TradeEngineError {
    #[error("Unknown player: {player_id} is not on either roster")]
    UnknownPlayer { player_id: PlayerId },

    #[error("Malformed trade: {reason}")]
    MalformedTrade { reason: String },

    #[error("Roster for team {team_id} has no players")]
    EmptyRoster { team_id: TeamId },

    #[error("Team mismatch: request is for {expected} but the roster belongs to {found}")]
    TeamMismatch { expected: TeamId, found: TeamId },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TradeEngineError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        TradeEngineError::MalformedTrade { reason: reason.into() }
    }

    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        TradeEngineError::InvalidConfig { message: message.into() }
    }
}
