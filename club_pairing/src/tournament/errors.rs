//! Tournament and pairing error types.

use super::models::{GameId, PlayerId, TournamentStatus};
use thiserror::Error;

/// Errors raised by the pairing generator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PairingError {
    /// Fewer than two active players
    #[error("At least 2 active players are needed to pair a round, found {active}")]
    InsufficientPlayers { active: usize },

    /// The requested round already has games
    #[error("Round {0} already exists")]
    RoundAlreadyExists(u32),

    /// Round-robin roster changed after the schedule was fixed
    #[error("Roster is locked once a round-robin schedule has started")]
    RosterLocked,

    /// Rounds must be generated in order
    #[error("Round {requested} requested, but the next round is {expected}")]
    RoundOutOfSequence { expected: u32, requested: u32 },

    /// Round-robin schedule has no more rounds
    #[error("Round-robin schedule has only {total} rounds")]
    ScheduleExhausted { total: u32 },
}

impl PairingError {
    /// Stable error code sent to clients
    pub fn code(&self) -> &'static str {
        match self {
            PairingError::InsufficientPlayers { .. } => "INSUFFICIENT_PLAYERS",
            PairingError::RoundAlreadyExists(_) => "ROUND_ALREADY_EXISTS",
            PairingError::RosterLocked => "ROSTER_LOCKED",
            PairingError::RoundOutOfSequence { .. } => "ROUND_OUT_OF_SEQUENCE",
            PairingError::ScheduleExhausted { .. } => "SCHEDULE_EXHAUSTED",
        }
    }
}

/// Errors raised by tournament state transitions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TournamentError {
    #[error("Need at least 2 active players to start, found {active}")]
    NotEnoughPlayers { active: usize },

    #[error("Tournament has already started")]
    AlreadyStarted,

    #[error("Tournament is not ongoing (status: {status})")]
    NotOngoing { status: TournamentStatus },

    #[error("Game {0} not found")]
    GameNotFound(GameId),

    #[error("Game {0} is a bye and takes no result")]
    ByeHasNoResult(GameId),

    #[error("Round {round} still has {pending} game(s) without a result")]
    RoundIncomplete { round: u32, pending: usize },

    #[error("At least one round must be complete before finishing")]
    NoCompletedRound,

    #[error("Player {0} is already in the tournament")]
    PlayerAlreadyInTournament(PlayerId),

    #[error("Player {0} not found in the tournament")]
    PlayerNotFound(PlayerId),

    #[error(transparent)]
    Pairing(#[from] PairingError),
}

impl TournamentError {
    /// Stable error code sent to clients
    pub fn code(&self) -> &'static str {
        match self {
            TournamentError::NotEnoughPlayers { .. } => "NOT_ENOUGH_PLAYERS",
            TournamentError::AlreadyStarted => "ALREADY_STARTED",
            TournamentError::NotOngoing { .. } => "TOURNAMENT_NOT_ONGOING",
            TournamentError::GameNotFound(_) => "GAME_NOT_FOUND",
            TournamentError::ByeHasNoResult(_) => "BYE_HAS_NO_RESULT",
            TournamentError::RoundIncomplete { .. } => "ROUND_INCOMPLETE",
            TournamentError::NoCompletedRound => "NO_COMPLETED_ROUND",
            TournamentError::PlayerAlreadyInTournament(_) => "PLAYER_ALREADY_IN_TOURNAMENT",
            TournamentError::PlayerNotFound(_) => "PLAYER_NOT_FOUND",
            TournamentError::Pairing(e) => e.code(),
        }
    }
}

pub type TournamentResult<T> = Result<T, TournamentError>;
