use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WayfinderError {
    #[error("Action '{action}' is not valid while the session is {state}")]
    InvalidAction { state: String, action: &'static str },

    #[error("Session has already shut down")]
    SessionClosed,

    #[error("Destination not found: {0}")]
    DestinationNotFound(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

// Hosting UIs receive errors as plain strings
impl Serialize for WayfinderError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, WayfinderError>;
