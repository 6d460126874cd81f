//! Errors from external collaborators (directory, store, authorizer).

use crate::tournament::models::TournamentId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored snapshot could not be (de)serialized
    #[error("Snapshot serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Snapshot to update does not exist
    #[error("Tournament {0} has no stored snapshot")]
    MissingSnapshot(TournamentId),

    /// Invalid creation request
    #[error("Invalid tournament: {0}")]
    InvalidTournament(String),

    /// Backend is temporarily unreachable
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl ServiceError {
    /// Client-safe message that does not leak backend details
    pub fn client_message(&self) -> String {
        match self {
            ServiceError::Database(_) | ServiceError::Serialization(_) => {
                "Internal server error".to_string()
            }
            ServiceError::MissingSnapshot(_) => "Tournament not found".to_string(),
            ServiceError::Unavailable(_) => "Service temporarily unavailable".to_string(),
            ServiceError::InvalidTournament(_) => self.to_string(),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
