use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutboxError {
    #[error("Invalid outbox configuration: {0}")]
    Config(String),

    #[error("Invalid action ID: {0}")]
    InvalidActionId(String),

    #[error("Invalid action type: {0}")]
    InvalidActionType(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<bridge_traits::BridgeError> for OutboxError {
    fn from(e: bridge_traits::BridgeError) -> Self {
        Self::Storage(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, OutboxError>;
