use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::tournament::models::{Game, GameId, GameResult, Player, PlayerId, PlayerProfile, Tournament};

/// A command from a client to its tournament room.
///
/// Everything except [`ClientCommand::Ping`] and
/// [`ClientCommand::RequestSnapshot`] mutates the tournament and is only
/// accepted from the organizer.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientCommand {
    /// Lock in the format and generate round 1.
    StartTournament,
    /// Record (or correct) the result of a game.
    SubmitResult { game_id: GameId, result: GameResult },
    /// Close the current round and pair the next one, or finish the
    /// tournament after its last round.
    AdvanceRound,
    /// Finish the tournament early.
    FinishTournament,
    /// Wipe all games and return to the roster stage.
    ResetTournament,
    /// Add a player. The directory's copy of the profile wins over the
    /// client's.
    AddPlayer { player: PlayerProfile },
    /// Remove a player (withdraws them in a running Swiss).
    RemovePlayer { player_id: PlayerId },
    /// Liveness probe, answered with [`ServerEvent::Pong`].
    Ping,
    /// Ask for a fresh [`ServerEvent::FullStateSnapshot`].
    RequestSnapshot,
}

impl ClientCommand {
    /// Whether this command changes tournament state
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Self::Ping | Self::RequestSnapshot)
    }

    /// Wire tag of the command, used for logs and metrics labels
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StartTournament => "start_tournament",
            Self::SubmitResult { .. } => "submit_result",
            Self::AdvanceRound => "advance_round",
            Self::FinishTournament => "finish_tournament",
            Self::ResetTournament => "reset_tournament",
            Self::AddPlayer { .. } => "add_player",
            Self::RemovePlayer { .. } => "remove_player",
            Self::Ping => "ping",
            Self::RequestSnapshot => "request_snapshot",
        }
    }

    /// Check the payload shape before the command reaches the state machine.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::SubmitResult { game_id, result } => {
                if *game_id <= 0 {
                    return Err(format!("Invalid game id {game_id}"));
                }
                if *result == GameResult::Unset {
                    return Err("Result must be white_win, black_win or draw".to_string());
                }
            }
            Self::AddPlayer { player } => {
                if player.id <= 0 {
                    return Err(format!("Invalid player id {}", player.id));
                }
            }
            Self::RemovePlayer { player_id } => {
                if *player_id <= 0 {
                    return Err(format!("Invalid player id {player_id}"));
                }
            }
            _ => {}
        }
        Ok(())
    }
}

impl fmt::Display for ClientCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartTournament => write!(f, "started the tournament"),
            Self::SubmitResult { game_id, result } => {
                write!(f, "submitted {result} for game {game_id}")
            }
            Self::AdvanceRound => write!(f, "advanced the round"),
            Self::FinishTournament => write!(f, "finished the tournament"),
            Self::ResetTournament => write!(f, "reset the tournament"),
            Self::AddPlayer { player } => write!(f, "added {}", player.nickname),
            Self::RemovePlayer { player_id } => write!(f, "removed player {player_id}"),
            Self::Ping => write!(f, "pinged"),
            Self::RequestSnapshot => write!(f, "requested a snapshot"),
        }
    }
}

/// An event from a tournament room to its clients.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    TournamentStarted {
        started_at: DateTime<Utc>,
    },
    RoundGenerated {
        round_number: u32,
        games: Vec<Game>,
    },
    ResultUpdated {
        game_id: GameId,
        result: GameResult,
    },
    TournamentFinished {
        finished_at: DateTime<Utc>,
    },
    TournamentReset,
    PlayerAdded {
        player: Player,
    },
    PlayerRemoved {
        player_id: PlayerId,
    },
    /// Sent only to the connection whose command failed.
    Error {
        code: String,
        message: String,
    },
    /// Complete state; always the first event of a new connection.
    FullStateSnapshot {
        tournament: Tournament,
    },
    Pong,
}

impl ServerEvent {
    /// Wire tag of the event, used for logs and metrics labels
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TournamentStarted { .. } => "tournament_started",
            Self::RoundGenerated { .. } => "round_generated",
            Self::ResultUpdated { .. } => "result_updated",
            Self::TournamentFinished { .. } => "tournament_finished",
            Self::TournamentReset => "tournament_reset",
            Self::PlayerAdded { .. } => "player_added",
            Self::PlayerRemoved { .. } => "player_removed",
            Self::Error { .. } => "error",
            Self::FullStateSnapshot { .. } => "full_state_snapshot",
            Self::Pong => "pong",
        }
    }

    /// Build an error event
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ServerEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::TournamentStarted { started_at } => {
                write!(f, "tournament started at {}", started_at.format("%H:%M:%S"))
            }
            Self::RoundGenerated {
                round_number,
                games,
            } => write!(f, "round {round_number} paired ({} boards)", games.len()),
            Self::ResultUpdated { game_id, result } => write!(f, "game {game_id}: {result}"),
            Self::TournamentFinished { .. } => write!(f, "tournament finished"),
            Self::TournamentReset => write!(f, "tournament reset"),
            Self::PlayerAdded { player } => {
                write!(f, "{} ({}) joined", player.nickname, player.rating)
            }
            Self::PlayerRemoved { player_id } => write!(f, "player {player_id} left"),
            Self::Error { code, message } => write!(f, "error {code}: {message}"),
            Self::FullStateSnapshot { tournament } => write!(
                f,
                "snapshot of '{}' ({}, round {})",
                tournament.name, tournament.status, tournament.current_round
            ),
            Self::Pong => write!(f, "pong"),
        }
    }
}
