use thiserror::Error;

use mw_model::ModelError;

use crate::transport::TransportError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("routing error: {0}")]
    Routing(String),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("runtime closed: {0}")]
    Closed(String),
}
