use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to decode envelope: {0}")]
    Decode(String),

    #[error("failed to encode envelope: {0}")]
    Encode(String),

    #[error("unknown message type: {0}")]
    UnknownMessageType(String),

    #[error("unknown layout mode: {0}")]
    UnknownLayout(String),

    #[error("unknown group kind: {0}")]
    UnknownGroupKind(String),

    #[error("invalid model: {0}")]
    Invalid(String),
}

pub type ModelResult<T> = Result<T, ModelError>;
