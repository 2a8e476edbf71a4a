//! Error types for rank allocation and board state

use thiserror::Error;

/// Result type for board operations
pub type Result<T> = std::result::Result<T, BoardError>;

/// Errors that can occur while parsing ranks or talking to the authoritative store
#[derive(Debug, Error)]
pub enum BoardError {
    /// A rank string is not a valid `bucket|payload:` key
    #[error("invalid rank '{rank}': {message}")]
    InvalidRank { rank: String, message: String },

    /// Board not found
    #[error("board not found: {id}")]
    BoardNotFound { id: String },

    /// List not found
    #[error("list not found: {id}")]
    ListNotFound { id: String },

    /// Card not found
    #[error("card not found: {id}")]
    CardNotFound { id: String },

    /// The authoritative store rejected the request or could not be reached
    #[error("remote request failed: {message}")]
    Remote { message: String },

    /// Configuration could not be loaded
    #[error("failed to load configuration: {0}")]
    Config(#[from] Box<figment::Error>),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BoardError {
    /// Create an invalid rank error
    pub fn invalid_rank(rank: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRank {
            rank: rank.into(),
            message: message.into(),
        }
    }

    /// Create a remote failure
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
        }
    }

    /// Check if this error came from the authoritative side rather than local input
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Remote { .. }
                | Self::BoardNotFound { .. }
                | Self::ListNotFound { .. }
                | Self::CardNotFound { .. }
        )
    }
}

impl From<figment::Error> for BoardError {
    fn from(error: figment::Error) -> Self {
        Self::Config(Box::new(error))
    }
}
