use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error(transparent)]
    Cache(#[from] core_cache::CacheError),

    #[error(transparent)]
    Outbox(#[from] core_outbox::OutboxError),

    #[error(transparent)]
    Connectivity(#[from] core_connectivity::ConnectivityError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
