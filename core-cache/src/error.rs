use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Invalid router configuration: {0}")]
    Config(String),

    #[error("Invalid partition name: {0}")]
    InvalidPartition(String),

    #[error("Cache storage error: {0}")]
    Storage(String),
}

impl From<bridge_traits::BridgeError> for CacheError {
    fn from(err: bridge_traits::BridgeError) -> Self {
        CacheError::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;
