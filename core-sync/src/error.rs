use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Change feed error: {0}")]
    Feed(#[from] BridgeError),

    #[error("Realtime sync is not running")]
    NotRunning,

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;
