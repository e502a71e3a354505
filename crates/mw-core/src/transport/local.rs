use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

use super::{SUBSCRIPTION_BUFFER, Subscription, Transport, TransportError};
use crate::router::{ChannelName, ChannelScheme};

type Topic = (String, String);

/// Same-process broadcast transport.
///
/// Every `(channel, event)` pair maps to one `tokio::sync::broadcast` sender created by
/// the first subscriber and dropped with the last. Slow subscribers lose the oldest
/// payloads; the sequencer upstream tolerates the gaps. Also serves as the fan-out hub of the relay server.
#[derive(Clone)]
pub struct LocalBroadcast {
    topics: Arc<Mutex<HashMap<Topic, broadcast::Sender<Vec<u8>>>>>,
    scheme: ChannelScheme,
    capacity: usize,
}

impl LocalBroadcast {
    pub fn new() -> Self {
        Self::with_scheme(ChannelScheme::local())
    }

    pub fn with_scheme(scheme: ChannelScheme) -> Self {
        Self {
            topics: Arc::new(Mutex::new(HashMap::new())),
            scheme,
            capacity: SUBSCRIPTION_BUFFER,
        }
    }

    /// Per-topic broadcast capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Number of live receivers on a topic.
    pub fn subscriber_count(&self, channel: &ChannelName, event: &str) -> usize {
        let topics = self.topics.lock().unwrap_or_else(|e| e.into_inner());
        topics
            .get(&topic(channel, event))
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    /// Number of topics with a live or lingering sender.
    pub fn topic_count(&self) -> usize {
        self.topics.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Existing sender of a topic; publishing never creates one.
    fn sender(&self, channel: &ChannelName, event: &str) -> Option<broadcast::Sender<Vec<u8>>> {
        let topics = self.topics.lock().unwrap_or_else(|e| e.into_inner());
        topics.get(&topic(channel, event)).cloned()
    }

    /// New receiver on a topic, creating the topic under the same lock as `prune`.
    fn receiver(&self, key: &Topic) -> broadcast::Receiver<Vec<u8>> {
        let mut topics = self.topics.lock().unwrap_or_else(|e| e.into_inner());
        topics
            .entry(key.clone())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }
}

fn topic(channel: &ChannelName, event: &str) -> Topic {
    (channel.as_str().to_string(), event.to_string())
}

/// Drop `key` once its last receiver is gone.
fn prune(topics: &Mutex<HashMap<Topic, broadcast::Sender<Vec<u8>>>>, key: &Topic) {
    let mut topics = topics.lock().unwrap_or_else(|e| e.into_inner());
    if topics.get(key).is_some_and(|tx| tx.receiver_count() == 0) {
        topics.remove(key);
    }
}

impl Default for LocalBroadcast {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for LocalBroadcast {
    fn name(&self) -> &'static str {
        "local"
    }

    fn scheme(&self) -> ChannelScheme {
        self.scheme.clone()
    }

    async fn publish(
        &self,
        channel: &ChannelName,
        event: &str,
        payload: &[u8],
    ) -> Result<(), TransportError> {
        // No receivers is not a failure: nobody listening yet.
        let delivered = match self.sender(channel, event) {
            Some(tx) => tx.send(payload.to_vec()).unwrap_or(0),
            None => 0,
        };
        trace!(%channel, event, delivered, "payload broadcast");
        Ok(())
    }

    async fn subscribe(
        &self,
        channel: &ChannelName,
        event: &str,
    ) -> Result<Subscription, TransportError> {
        let key = topic(channel, event);
        let mut rx = self.receiver(&key);
        let (tx, sub) = Subscription::channel(self.capacity);
        let name = channel.to_string();
        let topics = Arc::clone(&self.topics);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    msg = rx.recv() => match msg {
                        Ok(payload) => {
                            if tx.send(payload).await.is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(channel = %name, skipped, "subscriber lagged, payloads dropped");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
            drop(rx);
            prune(&topics, &key);
            debug!(channel = %name, "local subscription closed");
        });

        debug!(%channel, event, "subscribed");
        Ok(sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ch(name: &str) -> ChannelName {
        ChannelName::from_raw(name)
    }

    #[tokio::test]
    async fn delivers_to_every_subscriber() {
        let hub = LocalBroadcast::new();
        let mut a = hub.subscribe(&ch("c"), "e").await.unwrap();
        let mut b = hub.subscribe(&ch("c"), "e").await.unwrap();

        hub.publish(&ch("c"), "e", b"hello").await.unwrap();

        assert_eq!(a.recv().await.unwrap(), b"hello".to_vec());
        assert_eq!(b.recv().await.unwrap(), b"hello".to_vec());
    }

    #[tokio::test]
    async fn topics_are_isolated() {
        let hub = LocalBroadcast::new();
        let mut other = hub.subscribe(&ch("other"), "e").await.unwrap();
        let mut wrong_event = hub.subscribe(&ch("c"), "x").await.unwrap();
        let mut mine = hub.subscribe(&ch("c"), "e").await.unwrap();

        hub.publish(&ch("c"), "e", b"1").await.unwrap();
        assert_eq!(mine.recv().await.unwrap(), b"1".to_vec());

        hub.publish(&ch("other"), "e", b"2").await.unwrap();
        assert_eq!(other.recv().await.unwrap(), b"2".to_vec());

        hub.publish(&ch("c"), "x", b"3").await.unwrap();
        assert_eq!(wrong_event.recv().await.unwrap(), b"3".to_vec());
    }

    #[tokio::test]
    async fn publish_without_subscribers_succeeds() {
        let hub = LocalBroadcast::new();
        assert!(hub.publish(&ch("nobody"), "e", b"x").await.is_ok());
        assert_eq!(hub.subscriber_count(&ch("nobody"), "e"), 0);
    }

    #[tokio::test]
    async fn publishing_to_unknown_topics_allocates_nothing() {
        let hub = LocalBroadcast::new();
        for i in 0..100 {
            hub.publish(&ch(&format!("c{i}")), "e", b"x").await.unwrap();
        }
        assert_eq!(hub.topic_count(), 0);
    }

    #[tokio::test]
    async fn topic_is_dropped_with_its_last_subscriber() {
        let hub = LocalBroadcast::new();
        let a = hub.subscribe(&ch("c"), "e").await.unwrap();
        let b = hub.subscribe(&ch("c"), "e").await.unwrap();
        assert_eq!(hub.topic_count(), 1);

        drop(a);
        wait_until(|| hub.subscriber_count(&ch("c"), "e") == 1).await;
        assert_eq!(hub.topic_count(), 1);

        drop(b);
        wait_until(|| hub.topic_count() == 0).await;
        assert_eq!(hub.subscriber_count(&ch("c"), "e"), 0);
    }

    async fn wait_until(done: impl Fn() -> bool) {
        for _ in 0..200 {
            if done() {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        panic!("condition never met");
    }
}
