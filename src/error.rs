//! Error types for jet clustering and grooming operations

use thiserror::Error;

#[derive(Error, Debug)]
pub enum JetError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Malformed particle at index {index}: {reason}")]
    MalformedParticle { index: usize, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for JetError {
    fn from(err: serde_json::Error) -> Self {
        JetError::Serialization(err.to_string())
    }
}
