use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("publish to '{channel}' failed: {reason}")]
    Publish { channel: String, reason: String },

    #[error("subscribe to '{channel}' failed: {reason}")]
    Subscribe { channel: String, reason: String },

    #[error("encode error: {0}")]
    Encode(String),

    #[error("transport closed")]
    Closed,
}
