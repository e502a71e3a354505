use mw_model::{ControllerState, Envelope, LayoutMode, ROTATION_EVENT};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, trace, warn};

use super::{Controller, Reconciled};
use crate::{
    clock::ClockHandle,
    error::CoreError,
    metrics::{EnvelopeOutcome, MetricsHandle, noop_metrics},
    router::ChannelName,
    transport::{Subscription, TransportHandle, publish_envelope},
};

const ROLE: &str = "controller";
const COMMAND_BUFFER: usize = 32;

/// Operator command.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerAction {
    Start,
    Stop,
    Reset,
    SetInterval(i64),
    SetProducts(String),
    SetLayout(LayoutMode),
    SetProductionMode(bool),
    /// Read the current edit state without publishing.
    Snapshot,
}

type Reply = oneshot::Sender<Result<ControllerState, CoreError>>;

/// Handle used by an operator surface to drive a [`ControllerRuntime`].
#[derive(Clone)]
pub struct ControllerClient {
    tx: mpsc::Sender<(ControllerAction, Reply)>,
}

impl ControllerClient {
    /// Submit `action` and wait until its envelopes were handed to the transport.
    ///
    /// Publish failures come back as [`CoreError::Transport`]; nothing is retried.
    pub async fn send(&self, action: ControllerAction) -> Result<ControllerState, CoreError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send((action, reply))
            .await
            .map_err(|_| CoreError::Closed("controller runtime".into()))?;
        rx.await
            .map_err(|_| CoreError::Closed("controller runtime".into()))?
    }

    pub async fn start(&self) -> Result<ControllerState, CoreError> {
        self.send(ControllerAction::Start).await
    }

    pub async fn stop(&self) -> Result<ControllerState, CoreError> {
        self.send(ControllerAction::Stop).await
    }
}

/// Async driver of one controller: operator commands in, envelopes out, peer sync in.
pub struct ControllerRuntime {
    controller: Controller,
    transport: TransportHandle,
    channel: ChannelName,
    clock: ClockHandle,
    metrics: MetricsHandle,
    rx: mpsc::Receiver<(ControllerAction, Reply)>,
}

impl ControllerRuntime {
    pub fn new(
        controller: Controller,
        transport: TransportHandle,
        channel: ChannelName,
        clock: ClockHandle,
    ) -> (Self, ControllerClient) {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let runtime = Self {
            controller,
            transport,
            channel,
            clock,
            metrics: noop_metrics(),
            rx,
        };
        (runtime, ControllerClient { tx })
    }

    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    /// Run until `cancel` fires or every client is dropped.
    ///
    /// Without a peer subscription the controller keeps working; it just stops converging
    /// with other consoles.
    #[instrument(level = "debug", skip_all, fields(channel = %self.channel, session = self.controller.session().short()))]
    pub async fn run(mut self, cancel: CancellationToken) -> Controller {
        let mut peers = match self.transport.subscribe(&self.channel, ROTATION_EVENT).await {
            Ok(sub) => Some(sub),
            Err(e) => {
                warn!(transport = self.transport.name(), error = %e, "peer sync disabled");
                None
            }
        };
        info!(transport = self.transport.name(), "controller ready");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                cmd = self.rx.recv() => match cmd {
                    Some((action, reply)) => {
                        let result = self.execute(action).await;
                        let _ = reply.send(result);
                    }
                    None => break,
                },
                msg = recv_opt(&mut peers) => match msg {
                    Some(payload) => self.on_peer(&payload),
                    None => {
                        debug!("peer subscription closed");
                        peers = None;
                    }
                },
            }
        }

        debug!("controller runtime stopped");
        self.controller
    }

    async fn execute(&mut self, action: ControllerAction) -> Result<ControllerState, CoreError> {
        let now = self.clock.now_ms();
        let envelopes = match action {
            ControllerAction::Start => self.controller.start(now),
            ControllerAction::Stop => self.controller.stop(now),
            ControllerAction::Reset => self.controller.reset(now),
            ControllerAction::SetInterval(seconds) => self.controller.set_interval_secs(seconds, now),
            ControllerAction::SetProducts(raw) => self.controller.set_products(raw, now),
            ControllerAction::SetLayout(layout) => self.controller.set_layout(layout, now),
            ControllerAction::SetProductionMode(on) => {
                self.controller.set_production_mode(on, now)
            }
            ControllerAction::Snapshot => Vec::new(),
        };

        let mut first_err = None;
        for env in &envelopes {
            if let Err(e) = self.publish(env).await {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(self.controller.state().clone()),
        }
    }

    async fn publish(&self, env: &Envelope) -> Result<(), CoreError> {
        match publish_envelope(self.transport.as_ref(), &self.channel, env).await {
            Ok(()) => {
                debug!(kind = %env.kind, sequence = env.sequence, "envelope published");
                Ok(())
            }
            Err(e) => {
                self.metrics.record_publish_failure(self.transport.name());
                error!(kind = %env.kind, sequence = env.sequence, error = %e, "publish failed");
                Err(e.into())
            }
        }
    }

    fn on_peer(&mut self, payload: &[u8]) {
        let env = match Envelope::decode(payload) {
            Ok(env) => env,
            Err(e) => {
                self.metrics.record_envelope(ROLE, EnvelopeOutcome::Malformed);
                warn!(error = %e, "malformed envelope ignored");
                return;
            }
        };

        let outcome = match self.controller.apply_remote(&env) {
            Reconciled::Applied { session_changed } => {
                if session_changed {
                    info!(session = env.session_id.short(), "peer controller took over");
                }
                EnvelopeOutcome::Accepted
            }
            Reconciled::Stale { last } => {
                trace!(sequence = env.sequence, last, "stale peer edit discarded");
                EnvelopeOutcome::Stale
            }
            Reconciled::SelfEcho => EnvelopeOutcome::SelfEcho,
            Reconciled::Ignored => EnvelopeOutcome::Ignored,
        };
        self.metrics.record_envelope(ROLE, outcome);
    }
}

async fn recv_opt(sub: &mut Option<Subscription>) -> Option<Vec<u8>> {
    match sub {
        Some(sub) => sub.recv().await,
        None => std::future::pending().await,
    }
}
