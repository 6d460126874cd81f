//! Client-side mirror of a tournament, kept in sync from server events.

use super::messages::ServerEvent;
use crate::tournament::models::Tournament;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReplicaError {
    /// An incremental event arrived before any snapshot
    #[error("Received '{0}' before the first snapshot")]
    NotSynchronized(&'static str),
}

/// Local copy of the authoritative tournament.
///
/// Feed it every event received from the room. The first event of a
/// connection is always a full snapshot; after that incremental events are
/// folded in with the same code the server uses.
#[derive(Debug, Default, Clone)]
pub struct TournamentReplica {
    tournament: Option<Tournament>,
    last_error: Option<(String, String)>,
}

impl TournamentReplica {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one server event
    pub fn apply(&mut self, event: &ServerEvent) -> Result<(), ReplicaError> {
        match event {
            ServerEvent::FullStateSnapshot { tournament } => {
                self.tournament = Some(tournament.clone());
            }
            ServerEvent::Error { code, message } => {
                self.last_error = Some((code.clone(), message.clone()));
            }
            ServerEvent::Pong => {}
            event => {
                let tournament = self
                    .tournament
                    .as_mut()
                    .ok_or(ReplicaError::NotSynchronized(event.kind()))?;
                tournament.apply_event(event);
            }
        }
        Ok(())
    }

    pub fn tournament(&self) -> Option<&Tournament> {
        self.tournament.as_ref()
    }

    pub fn is_synchronized(&self) -> bool {
        self.tournament.is_some()
    }

    /// Code and message of the last error event, if any
    pub fn last_error(&self) -> Option<(&str, &str)> {
        self.last_error
            .as_ref()
            .map(|(code, message)| (code.as_str(), message.as_str()))
    }
}
