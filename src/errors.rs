use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entities::{AuctionId, PlayerId, PropertyId, TradeId};

/// Coarse classification of engine failures. The transport layer maps these
/// to wire-level responses; the engine itself only ever reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    NotFound,
    Precondition,
    InsufficientFunds,
    InvalidState,
    Forbidden,
}

/// Top-level error type for the rules engine
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineError {
    #[error("Game not found: {game_id}")]
    GameNotFound { game_id: String },

    #[error("Player not found: {player_id}")]
    PlayerNotFound { player_id: PlayerId },

    #[error("Property not found: {property_id}")]
    PropertyNotFound { property_id: PropertyId },

    #[error("Trade not found: {trade_id}")]
    TradeNotFound { trade_id: TradeId },

    #[error("Auction not found: {auction_id}")]
    AuctionNotFound { auction_id: AuctionId },

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: String },

    #[error("No cards available in the requested deck")]
    DeckEmpty,

    #[error("Game is not in the required status: expected {expected}, found {found}")]
    WrongGameStatus { expected: String, found: String },

    #[error("Not player's turn: current={current:?}, attempted={attempted}")]
    NotPlayerTurn {
        current: Option<PlayerId>,
        attempted: PlayerId,
    },

    #[error("Game rule violation: {rule}")]
    RuleViolation { rule: String },

    #[error("Trade already processed: {trade_id}")]
    TradeAlreadyProcessed { trade_id: TradeId },

    #[error("Auction is not active: {auction_id}")]
    AuctionNotActive { auction_id: AuctionId },

    #[error(
        "Insufficient funds for player {player_id}: required {required}, available {available}"
    )]
    InsufficientFunds {
        player_id: PlayerId,
        required: i64,
        available: i64,
    },

    #[error("Invalid state: {details}")]
    InvalidState { details: String },

    #[error("Forbidden: {details}")]
    Forbidden { details: String },
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::GameNotFound { .. }
            | EngineError::PlayerNotFound { .. }
            | EngineError::PropertyNotFound { .. }
            | EngineError::TradeNotFound { .. }
            | EngineError::AuctionNotFound { .. }
            | EngineError::UserNotFound { .. } => ErrorKind::NotFound,
            EngineError::DeckEmpty
            | EngineError::WrongGameStatus { .. }
            | EngineError::NotPlayerTurn { .. }
            | EngineError::RuleViolation { .. }
            | EngineError::TradeAlreadyProcessed { .. }
            | EngineError::AuctionNotActive { .. } => ErrorKind::Precondition,
            EngineError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            EngineError::InvalidState { .. } => ErrorKind::InvalidState,
            EngineError::Forbidden { .. } => ErrorKind::Forbidden,
        }
    }

    pub fn rule_violation(rule: impl Into<String>) -> Self {
        Self::RuleViolation { rule: rule.into() }
    }

    pub fn invalid_state(details: impl Into<String>) -> Self {
        Self::InvalidState {
            details: details.into(),
        }
    }

    pub fn forbidden(details: impl Into<String>) -> Self {
        Self::Forbidden {
            details: details.into(),
        }
    }

    pub fn insufficient_funds(player_id: PlayerId, required: i64, available: i64) -> Self {
        Self::InsufficientFunds {
            player_id,
            required,
            available,
        }
    }
}

/// Result type alias used by every engine operation
pub type EngineResult<T> = Result<T, EngineError>;
