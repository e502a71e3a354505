use std::{convert::Infallible, sync::Arc};

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
};
use futures_util::stream;
use mw_core::{
    MetricsBackend,
    router::ChannelName,
    transport::{Subscription, Transport, TransportHandle},
};
use mw_prometheus::PrometheusMetrics;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::RelayError;

const NDJSON: &str = "application/x-ndjson";

struct RelayState {
    hub: TransportHandle,
    metrics: Option<PrometheusMetrics>,
}

/// HTTP relay service builder.
pub struct RelayServer {
    hub: TransportHandle,
    metrics: Option<PrometheusMetrics>,
}

impl RelayServer {
    /// Create a relay fanning payloads out through `hub`.
    pub fn new(hub: TransportHandle) -> Self {
        Self { hub, metrics: None }
    }

    /// Expose `metrics` on `GET /metrics` and count fan-out failures into it.
    pub fn with_metrics(mut self, metrics: PrometheusMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build axum router with mounted endpoints.
    ///
    /// Routes:
    /// - POST /trigger - Publish one payload
    /// - GET /channels/{channel}/events/{event} - NDJSON stream of payloads
    /// - GET /health - Liveness probe
    /// - GET /metrics - Prometheus text exposition
    pub fn router(self) -> Router {
        let state = Arc::new(RelayState {
            hub: self.hub,
            metrics: self.metrics,
        });
        Router::new()
            .route("/trigger", post(trigger))
            .route("/channels/{channel}/events/{event}", get(stream_events))
            .route("/health", get(health))
            .route("/metrics", get(metrics))
            .with_state(state)
    }
}

/// Serve `router` on `listener` until `cancel` fires.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    cancel: CancellationToken,
) -> Result<(), RelayError> {
    let addr = listener.local_addr()?;
    info!(%addr, "relay listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;

    info!(%addr, "relay stopped");
    Ok(())
}

// ============================================================================
// Request/Response types
// ============================================================================

/// Body of `POST /trigger`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerRequest {
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub payload: Value,
}

fn required(field: &str, value: Option<String>) -> Result<String, RelayError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(RelayError::InvalidRequest(format!("missing {field}"))),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /trigger
async fn trigger(
    State(state): State<Arc<RelayState>>,
    Json(req): Json<TriggerRequest>,
) -> Result<impl IntoResponse, RelayError> {
    let event = required("event", req.event)?;
    let channel = ChannelName::from_raw(required("channel", req.channel)?);

    let payload =
        serde_json::to_vec(&req.payload).map_err(|e| RelayError::InvalidRequest(e.to_string()))?;

    if let Err(e) = state.hub.publish(&channel, &event, &payload).await {
        error!(%channel, event, error = %e, "relay fan-out failed");
        if let Some(m) = &state.metrics {
            m.record_publish_failure("relay");
        }
        return Err(e.into());
    }

    debug!(%channel, event, bytes = payload.len(), "payload relayed");
    Ok(Json(json!({ "ok": true })))
}

/// GET /channels/{channel}/events/{event}
///
/// One JSON document per line, in arrival order, until the client disconnects.
async fn stream_events(
    State(state): State<Arc<RelayState>>,
    Path((channel, event)): Path<(String, String)>,
) -> Result<impl IntoResponse, RelayError> {
    if channel.trim().is_empty() || event.trim().is_empty() {
        return Err(RelayError::InvalidRequest(
            "channel and event cannot be empty".into(),
        ));
    }
    let channel = ChannelName::from_raw(channel);
    let sub = state.hub.subscribe(&channel, &event).await?;
    info!(%channel, event, "stream opened");

    let body = Body::from_stream(ndjson(sub));
    Ok(([(header::CONTENT_TYPE, NDJSON)], body))
}

fn ndjson(sub: Subscription) -> impl futures_util::Stream<Item = Result<Vec<u8>, Infallible>> {
    stream::unfold(sub, |mut sub| async move {
        let mut line = sub.recv().await?;
        line.push(b'\n');
        Some((Ok(line), sub))
    })
}

/// GET /health
async fn health() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

/// GET /metrics
async fn metrics(State(state): State<Arc<RelayState>>) -> Result<impl IntoResponse, RelayError> {
    let text = match &state.metrics {
        Some(m) => m
            .encode_text()
            .map_err(|e| RelayError::Metrics(e.to_string()))?,
        None => String::new(),
    };
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        text,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_missing_and_blank() {
        assert!(required("event", None).is_err());
        assert!(required("event", Some("  ".into())).is_err());
        assert_eq!(required("event", Some("e".into())).unwrap(), "e");
    }

    #[test]
    fn trigger_request_tolerates_missing_fields() {
        let req: TriggerRequest = serde_json::from_str(r#"{"event":"e"}"#).unwrap();
        assert_eq!(req.event.as_deref(), Some("e"));
        assert!(req.channel.is_none());
        assert!(req.payload.is_null());
    }
}
