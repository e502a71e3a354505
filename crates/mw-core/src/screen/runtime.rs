use std::time::Duration;

use mw_model::{EpochMs, ROTATION_EVENT};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::{
    frame::{Frame, ScreenStatus},
    state::{ScreenEffect, ScreenEvent, ScreenSyncState},
};
use crate::{
    clock::ClockHandle,
    error::CoreError,
    rotation::Transition,
    router::ChannelName,
    transport::TransportHandle,
};

/// Display surface of a screen.
pub trait Presenter: Send {
    /// Draw a settled frame.
    fn render(&mut self, frame: &Frame);
    /// Start animating towards `frame`; the runtime reports completion after the
    /// configured transition time.
    fn begin_transition(&mut self, transition: &Transition, frame: &Frame);
    fn status(&mut self, status: ScreenStatus);
}

/// Presenter that writes every frame to the log.
#[derive(Debug, Default)]
pub struct LogPresenter;

impl Presenter for LogPresenter {
    fn render(&mut self, frame: &Frame) {
        match &frame.slides {
            Some(slides) => info!(
                item = frame.item,
                of = frame.len,
                prev = %slides.prev,
                curr = %slides.curr,
                next = %slides.next,
                "render"
            ),
            None => info!("render: no products"),
        }
    }

    fn begin_transition(&mut self, transition: &Transition, frame: &Frame) {
        info!(
            from = transition.from,
            to = transition.to,
            curr = frame.current().unwrap_or(""),
            "transition"
        );
    }

    fn status(&mut self, status: ScreenStatus) {
        info!(%status, "status");
    }
}

/// Async driver of one screen: subscription, timers and transition completion.
pub struct ScreenRuntime<P: Presenter> {
    state: ScreenSyncState,
    transport: TransportHandle,
    channel: ChannelName,
    clock: ClockHandle,
    presenter: P,
    transition_ms: u64,
    in_flight: Option<(u64, EpochMs)>,
}

impl<P: Presenter> ScreenRuntime<P> {
    pub fn new(
        state: ScreenSyncState,
        transport: TransportHandle,
        channel: ChannelName,
        clock: ClockHandle,
        presenter: P,
        transition_ms: u64,
    ) -> Self {
        Self {
            state,
            transport,
            channel,
            clock,
            presenter,
            transition_ms,
            in_flight: None,
        }
    }

    pub fn state(&self) -> &ScreenSyncState {
        &self.state
    }

    /// Run until `cancel` fires.
    ///
    /// A failed subscription is logged and leaves the screen waiting; it is not retried.
    #[instrument(level = "debug", skip_all, fields(screen = %self.state.identity(), channel = %self.channel))]
    pub async fn run(mut self, cancel: CancellationToken) -> Result<ScreenSyncState, CoreError> {
        let effects = self.state.initial_effects();
        self.apply(effects);

        let mut sub = match self.transport.subscribe(&self.channel, ROTATION_EVENT).await {
            Ok(sub) => sub,
            Err(e) => {
                warn!(transport = self.transport.name(), error = %e, "subscribe failed, screen stays waiting");
                self.presenter.status(ScreenStatus::Waiting);
                cancel.cancelled().await;
                return Ok(self.state);
            }
        };
        info!(transport = self.transport.name(), "screen subscribed");

        loop {
            let now = self.clock.now_ms();
            let timer_in = self.state.next_deadline().map(|d| d.saturating_sub(now));
            let done_in = self.in_flight.map(|(_, at)| at.saturating_sub(now));

            let effects = tokio::select! {
                _ = cancel.cancelled() => break,
                msg = sub.recv() => match msg {
                    Some(payload) => self.state.handle(ScreenEvent::Inbound(payload), self.clock.now_ms()),
                    None => {
                        warn!("subscription closed");
                        cancel.cancelled().await;
                        break;
                    }
                },
                _ = sleep_for(timer_in) => self.state.run(self.clock.now_ms()),
                _ = sleep_for(done_in) => match self.in_flight.take() {
                    Some((id, _)) => self.state.handle(ScreenEvent::TransitionDone(id), self.clock.now_ms()),
                    None => Vec::new(),
                },
            };
            self.apply(effects);
        }

        debug!("screen runtime stopped");
        Ok(self.state)
    }

    fn apply(&mut self, effects: Vec<ScreenEffect>) {
        for effect in effects {
            match effect {
                ScreenEffect::Render(frame) => {
                    self.in_flight = self
                        .in_flight
                        .filter(|(id, _)| self.state.rotation().in_flight() == Some(*id));
                    self.presenter.render(&frame);
                }
                ScreenEffect::BeginTransition { transition, frame } => {
                    let done_at = self.clock.now_ms() + self.transition_ms;
                    self.in_flight = Some((transition.id, done_at));
                    self.presenter.begin_transition(&transition, &frame);
                }
                ScreenEffect::Status(status) => self.presenter.status(status),
            }
        }
    }
}

async fn sleep_for(ms: Option<u64>) {
    match ms {
        Some(ms) => tokio::time::sleep(Duration::from_millis(ms)).await,
        None => std::future::pending().await,
    }
}
