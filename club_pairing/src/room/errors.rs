//! Room and registry error types.

use crate::net::{errors::SerializationError, messages::ServerEvent};
use crate::services::ServiceError;
use crate::tournament::{
    errors::TournamentError,
    models::{PlayerId, TournamentId},
};
use thiserror::Error;

/// Why a command was not applied
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Malformed or invalid payload
    #[error("{message}")]
    Validation { code: &'static str, message: String },

    /// Illegal in the current tournament state (pairing failures included)
    #[error(transparent)]
    State(#[from] TournamentError),

    /// Sender is not the organizer
    #[error("Only the tournament organizer may send {0}")]
    Authorization(String),

    /// Referenced tournament or player does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// Snapshot could not be saved, nothing was applied
    #[error("Tournament state could not be saved")]
    Persistence(#[source] ServiceError),

    /// A collaborator failed before the command was applied
    #[error("Service error: {0}")]
    Service(#[source] ServiceError),

    /// The room stopped before answering
    #[error("Tournament room {0} is closed")]
    RoomClosed(TournamentId),
}

impl DispatchError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            code: "INVALID_COMMAND",
            message: message.into(),
        }
    }

    /// Stable error code sent to clients
    pub fn code(&self) -> &'static str {
        match self {
            DispatchError::Validation { code, .. } => *code,
            DispatchError::State(e) => e.code(),
            DispatchError::Authorization(_) => "NOT_ORGANIZER",
            DispatchError::NotFound(_) => "NOT_FOUND",
            DispatchError::Persistence(_) => "PERSISTENCE_UNAVAILABLE",
            DispatchError::Service(_) => "SERVICE_UNAVAILABLE",
            DispatchError::RoomClosed(_) => "ROOM_CLOSED",
        }
    }

    /// Client-safe message
    pub fn client_message(&self) -> String {
        match self {
            DispatchError::Persistence(_) => {
                "Tournament state could not be saved, please retry".to_string()
            }
            DispatchError::Service(e) => e.client_message(),
            _ => self.to_string(),
        }
    }

    /// The unicast `error` event for the offending connection
    pub fn to_event(&self) -> ServerEvent {
        ServerEvent::error(self.code(), self.client_message())
    }
}

impl From<SerializationError> for DispatchError {
    fn from(error: SerializationError) -> Self {
        Self::Validation {
            code: error.code(),
            message: error.to_string(),
        }
    }
}

/// Errors from registry lookups, joins and creation
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Tournament {0} not found")]
    TournamentNotFound(TournamentId),

    #[error("Player {0} not found")]
    PlayerNotFound(PlayerId),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("Tournament room {0} is closed")]
    RoomClosed(TournamentId),
}

impl RegistryError {
    pub fn code(&self) -> &'static str {
        match self {
            RegistryError::TournamentNotFound(_) | RegistryError::PlayerNotFound(_) => "NOT_FOUND",
            RegistryError::Service(ServiceError::InvalidTournament(_)) => "INVALID_TOURNAMENT",
            RegistryError::Service(_) => "SERVICE_UNAVAILABLE",
            RegistryError::RoomClosed(_) => "ROOM_CLOSED",
        }
    }

    pub fn client_message(&self) -> String {
        match self {
            RegistryError::Service(e) => e.client_message(),
            _ => self.to_string(),
        }
    }
}

impl From<RegistryError> for DispatchError {
    fn from(error: RegistryError) -> Self {
        match error {
            RegistryError::TournamentNotFound(id) => Self::NotFound(format!("Tournament {id}")),
            RegistryError::PlayerNotFound(id) => Self::NotFound(format!("Player {id}")),
            RegistryError::Service(e) => Self::Service(e),
            RegistryError::RoomClosed(id) => Self::RoomClosed(id),
        }
    }
}
