use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConnectivityError {
    #[error("Failed to subscribe to network changes: {0}")]
    Subscribe(String),

    #[error("Observer already shut down")]
    ShutDown,
}

impl From<bridge_traits::BridgeError> for ConnectivityError {
    fn from(e: bridge_traits::BridgeError) -> Self {
        Self::Subscribe(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConnectivityError>;
