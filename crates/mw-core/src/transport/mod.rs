//! Transport capability used by screens and controllers.
//!
//! A transport delivers opaque byte payloads to every subscriber of `(channel, event)`.
//! It gives no ordering, no delivery guarantee and no back-pressure signal; everything
//! above it (sequencing, timer, state machine) never branches on which implementation is
//! active.
mod error;
pub use error::TransportError;

mod local;
pub use local::LocalBroadcast;

use std::sync::Arc;

use async_trait::async_trait;
use mw_model::{Envelope, ROTATION_EVENT};
use tokio::sync::mpsc;

use crate::router::{ChannelName, ChannelScheme};

/// Default buffer of a subscription queue.
pub const SUBSCRIPTION_BUFFER: usize = 256;

/// Pub/sub capability.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Transport name used in logs and metrics labels.
    fn name(&self) -> &'static str;

    /// Channel naming scheme this transport expects.
    fn scheme(&self) -> ChannelScheme;

    /// Hand one payload to the transport.
    ///
    /// Returns once the transport accepted the message; subscribers are never awaited.
    async fn publish(
        &self,
        channel: &ChannelName,
        event: &str,
        payload: &[u8],
    ) -> Result<(), TransportError>;

    /// Start receiving payloads published on `(channel, event)` from now on.
    async fn subscribe(
        &self,
        channel: &ChannelName,
        event: &str,
    ) -> Result<Subscription, TransportError>;
}

/// Shared handle to a transport implementation.
pub type TransportHandle = Arc<dyn Transport>;

/// Encode `envelope` and publish it as a rotation event.
pub async fn publish_envelope(
    transport: &dyn Transport,
    channel: &ChannelName,
    envelope: &Envelope,
) -> Result<(), TransportError> {
    let payload = envelope
        .encode()
        .map_err(|e| TransportError::Encode(e.to_string()))?;
    transport.publish(channel, ROTATION_EVENT, &payload).await
}

/// Stream of payloads for one `(channel, event)` pair.
///
/// Dropping the subscription unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::Receiver<Vec<u8>>,
}

impl Subscription {
    /// Create a subscription and the sender feeding it.
    pub fn channel(buffer: usize) -> (mpsc::Sender<Vec<u8>>, Self) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (tx, Self { rx })
    }

    /// Next payload, `None` once the transport side is gone.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.rx.recv().await
    }
}
