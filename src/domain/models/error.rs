use thiserror::Error;

use super::Surface;

/// Failures of a single chat turn or of cross-surface delivery.
///
/// `ConfigurationMissing`, `TransportFailure`, `ServerError` and
/// `InvalidResponse` abort the turn and end up as one error message in the
/// conversation. `DecodeSkipped` never leaves the decoder other than as a
/// log line. `RelayUndeliverable` drops the cached route to the surface.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error("LLM settings not found: {0}")]
    ConfigurationMissing(String),

    #[error("Unable to reach the model server: {0}")]
    TransportFailure(String),

    #[error("Model server returned {status}: {body}")]
    ServerError { status: u16, body: String },

    #[error("Invalid response received from the model server: {0}")]
    InvalidResponse(String),

    #[error("Skipped malformed stream line ({reason}): {line}")]
    DecodeSkipped { line: String, reason: String },

    #[error("Unable to deliver message, the {0} surface is not open")]
    RelayUndeliverable(Surface),

    #[error("A response is still streaming, wait for it to finish before sending another message")]
    TurnInProgress,
}

impl ChatError {
    /// Errors that end the current turn with an error message.
    pub fn aborts_turn(&self) -> bool {
        return matches!(
            self,
            ChatError::ConfigurationMissing(_)
                | ChatError::TransportFailure(_)
                | ChatError::ServerError { .. }
                | ChatError::InvalidResponse(_)
        );
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> ChatError {
        return ChatError::TransportFailure(err.to_string());
    }
}
