//! Pairing generator for round-robin and Swiss rounds.
//!
//! Both formats are pure functions of the tournament snapshot: the same
//! snapshot and round number always produce the same games.

mod history;
pub mod round_robin;
pub mod swiss;

pub use history::PairingHistory;

use super::{
    errors::PairingError,
    models::{Game, GameResult, PlayerId, Tournament, TournamentFormat},
};

/// One board of a round before game IDs are assigned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pairing {
    pub white: PlayerId,
    pub black: Option<PlayerId>,
}

impl Pairing {
    pub fn new(white: PlayerId, black: PlayerId) -> Self {
        Self {
            white,
            black: Some(black),
        }
    }

    pub fn bye(player: PlayerId) -> Self {
        Self {
            white: player,
            black: None,
        }
    }
}

/// Generate the games of `round_number` for the tournament's format.
///
/// # Errors
///
/// - `RoundAlreadyExists` if the round already has games
/// - `RoundOutOfSequence` if `round_number` is not the next round
/// - `InsufficientPlayers` with fewer than 2 active players
/// - Round-robin only: `RosterLocked`, `ScheduleExhausted`
pub fn generate_round(tournament: &Tournament, round_number: u32) -> Result<Vec<Game>, PairingError> {
    if tournament.round_games(round_number).next().is_some() {
        return Err(PairingError::RoundAlreadyExists(round_number));
    }

    let expected = tournament.latest_round() + 1;
    if round_number != expected {
        return Err(PairingError::RoundOutOfSequence {
            expected,
            requested: round_number,
        });
    }

    let active = tournament.active_players().count();
    if active < 2 {
        return Err(PairingError::InsufficientPlayers { active });
    }

    let pairings = match tournament.format {
        TournamentFormat::RoundRobin => round_robin::pair_round(tournament, round_number)?,
        TournamentFormat::Swiss => swiss::pair_round(tournament, round_number),
    };

    log::debug!(
        "Tournament {}: paired round {} ({} boards)",
        tournament.id,
        round_number,
        pairings.len()
    );

    let first_id = tournament.next_game_id();
    Ok(pairings
        .into_iter()
        .zip(first_id..)
        .map(|(pairing, id)| Game {
            id,
            round_number,
            white_player_id: pairing.white,
            black_player_id: pairing.black,
            result: GameResult::Unset,
        })
        .collect())
}
