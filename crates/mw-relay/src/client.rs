use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use mw_core::{
    router::{ChannelName, ChannelScheme},
    transport::{SUBSCRIPTION_BUFFER, Subscription, Transport, TransportError},
};
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::{error::RelayError, server::TriggerRequest};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const PUBLISH_TIMEOUT: Duration = Duration::from_secs(10);

/// [`Transport`] backed by a remote [`RelayServer`](crate::RelayServer).
///
/// Publishing is one `POST /trigger` per payload, never retried. Subscribing opens one
/// long-lived NDJSON stream per `(channel, event)`; a broken stream ends the
/// subscription and the caller decides whether to reconnect.
#[derive(Debug, Clone)]
pub struct RelayTransport {
    client: Client,
    base: Url,
    scheme: ChannelScheme,
    publish_timeout: Duration,
}

impl RelayTransport {
    /// Client for the relay reachable at `endpoint` (e.g. `http://wall-relay:3000`).
    pub fn new(endpoint: &str) -> Result<Self, RelayError> {
        let invalid = |reason: String| RelayError::Endpoint {
            endpoint: endpoint.to_string(),
            reason,
        };
        let base = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(invalid("not a base url".into()));
        }

        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| RelayError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base,
            scheme: ChannelScheme::relay(),
            publish_timeout: PUBLISH_TIMEOUT,
        })
    }

    pub fn with_scheme(mut self, scheme: ChannelScheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn with_publish_timeout(mut self, timeout: Duration) -> Self {
        self.publish_timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.base
    }

    /// `GET /channels/{channel}/events/{event}` on the relay.
    fn stream_url(&self, channel: &ChannelName, event: &str) -> Url {
        self.url(&["channels", channel.as_str(), "events", event])
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // Checked in `new`: the base always accepts path segments.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

#[async_trait]
impl Transport for RelayTransport {
    fn name(&self) -> &'static str {
        "relay"
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
        let failed = |reason: String| TransportError::Publish {
            channel: channel.to_string(),
            reason,
        };
        let payload: Value =
            serde_json::from_slice(payload).map_err(|e| TransportError::Encode(e.to_string()))?;
        let body = TriggerRequest {
            channel: Some(channel.to_string()),
            event: Some(event.to_string()),
            payload,
        };

        let resp = self
            .client
            .post(self.url(&["trigger"]))
            .timeout(self.publish_timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(failed(format!("{status}: {detail}")));
        }

        trace!(%channel, event, "payload handed to relay");
        Ok(())
    }

    async fn subscribe(
        &self,
        channel: &ChannelName,
        event: &str,
    ) -> Result<Subscription, TransportError> {
        let failed = |reason: String| TransportError::Subscribe {
            channel: channel.to_string(),
            reason,
        };
        let resp = self
            .client
            .get(self.stream_url(channel, event))
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(failed(format!("relay answered {status}")));
        }

        let (tx, sub) = Subscription::channel(SUBSCRIPTION_BUFFER);
        let mut body = Box::pin(resp.bytes_stream());
        let name = channel.to_string();

        tokio::spawn(async move {
            let mut buf = Vec::new();
            'stream: loop {
                let chunk = tokio::select! {
                    _ = tx.closed() => break,
                    chunk = body.next() => chunk,
                };
                match chunk {
                    Some(Ok(bytes)) => {
                        buf.extend_from_slice(&bytes);
                        for line in split_lines(&mut buf) {
                            if tx.send(line).await.is_err() {
                                break 'stream;
                            }
                        }
                    }
                    Some(Err(e)) => {
                        warn!(channel = %name, error = %e, "relay stream broken");
                        break;
                    }
                    None => break,
                }
            }
            debug!(channel = %name, "relay subscription closed");
        });

        debug!(%channel, event, relay = %self.base, "subscribed");
        Ok(sub)
    }
}

/// Drain every complete line from `buf`, leaving a trailing partial line in place.
fn split_lines(buf: &mut Vec<u8>) -> Vec<Vec<u8>> {
    let mut lines = Vec::new();
    while let Some(pos) = buf.iter().position(|b| *b == b'\n') {
        let mut line: Vec<u8> = buf.drain(..=pos).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        if !line.iter().all(u8::is_ascii_whitespace) {
            lines.push(line);
        }
    }
    lines
}
