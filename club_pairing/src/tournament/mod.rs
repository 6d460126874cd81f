//! Tournament model, pairing generator and lifecycle state machine.
//!
//! ## Example
//!
//! ```
//! use club_pairing::net::messages::ClientCommand;
//! use club_pairing::tournament::{NewTournament, PlayerProfile, Tournament, TournamentFormat};
//!
//! let mut tournament = Tournament::from_new(
//!     1,
//!     NewTournament {
//!         name: "Thursday blitz".to_string(),
//!         organizer_id: 10,
//!         format: TournamentFormat::RoundRobin,
//!         total_rounds: None,
//!         players: (1..=4)
//!             .map(|id| PlayerProfile { id, nickname: format!("p{id}"), rating: 1500 })
//!             .collect(),
//!     },
//! );
//!
//! let events = tournament
//!     .apply(&ClientCommand::StartTournament, chrono::Utc::now())
//!     .unwrap();
//! assert_eq!(events.len(), 2);
//! assert_eq!(tournament.total_rounds, Some(3));
//! ```

pub mod errors;
pub mod models;
pub mod pairing;
mod state_machine;

pub use errors::{PairingError, TournamentError, TournamentResult};
pub use models::{
    Game, GameId, GameResult, NewTournament, Player, PlayerId, PlayerProfile, Tournament,
    TournamentFormat, TournamentId, TournamentStatus, UserId,
};
pub use pairing::generate_round;
