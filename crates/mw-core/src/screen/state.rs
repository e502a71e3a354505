use std::collections::VecDeque;

use mw_model::{
    DEFAULT_INTERVAL_MS, EpochMs, Envelope, Flag, Group, GroupKind, IntervalMs, LayoutMode,
    MessageType, ScreenIdentity, content,
};

use super::{
    frame::{Frame, ScreenStatus},
    journal::{Outcome, log_outcome},
};
use crate::{
    metrics::{EnvelopeOutcome, MetricsHandle, noop_metrics},
    rotation::{RotationMachine, Transition},
    sequence::{Sequencer, Verdict},
    timer::{DEFAULT_DRIFT_CHECK_MS, Epoch, EpochTimer, TimerFire},
};

const ROLE: &str = "screen";

/// Default duration of an animated transition.
pub const DEFAULT_TRANSITION_MS: u64 = 700;

/// Screen tuning knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenConfig {
    /// Period of the drift check.
    pub drift_check_ms: u64,
    /// How long the presenter animates one transition.
    pub transition_ms: u64,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            drift_check_ms: DEFAULT_DRIFT_CHECK_MS,
            transition_ms: DEFAULT_TRANSITION_MS,
        }
    }
}

/// Input of the screen state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenEvent {
    /// Raw payload received on the group channel.
    Inbound(Vec<u8>),
    /// One of the autonomous timers fired.
    Timer(TimerFire),
    /// The presenter finished transition `id`.
    TransitionDone(u64),
}

/// Output of the screen state machine, applied by a presenter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenEffect {
    /// Draw a settled frame without animation.
    Render(Frame),
    /// Animate towards `frame`, then report [`ScreenEvent::TransitionDone`].
    BeginTransition { transition: Transition, frame: Frame },
    Status(ScreenStatus),
}

/// All synchronization state of one screen.
///
/// Events are queued with [`push`](Self::push) and processed in order by
/// [`run`](Self::run), which also fires every timer deadline already due. Time is always
/// passed in, so several screens can be driven side by side from one simulated clock.
pub struct ScreenSyncState {
    identity: ScreenIdentity,
    kind: GroupKind,
    products: Vec<String>,
    layout: LayoutMode,
    production_mode: Flag,
    interval_ms: IntervalMs,
    status: ScreenStatus,
    sequencer: Sequencer,
    timer: EpochTimer,
    rotation: RotationMachine,
    queue: VecDeque<ScreenEvent>,
    metrics: MetricsHandle,
}

impl ScreenSyncState {
    /// Build the state from the group loaded at startup, if the snapshot had one.
    pub fn new(identity: ScreenIdentity, group: Option<&Group>, config: &ScreenConfig) -> Self {
        let (kind, products, layout, production_mode, interval_ms) = match group {
            Some(g) => (
                g.kind,
                content::for_layout(&g.products, g.layout_mode),
                g.layout_mode,
                g.production_mode,
                g.interval_ms().unwrap_or(DEFAULT_INTERVAL_MS),
            ),
            None => (
                GroupKind::Carousel,
                Vec::new(),
                LayoutMode::default(),
                Flag::default(),
                DEFAULT_INTERVAL_MS,
            ),
        };

        let mut state = Self {
            identity,
            kind,
            products,
            layout,
            production_mode,
            interval_ms,
            status: ScreenStatus::Waiting,
            sequencer: Sequencer::follow(),
            timer: EpochTimer::new(config.drift_check_ms),
            rotation: RotationMachine::new(),
            queue: VecDeque::new(),
            metrics: noop_metrics(),
        };
        if state.is_static() {
            state.status = ScreenStatus::showing(&state.frame());
        }
        state
    }

    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn identity(&self) -> &ScreenIdentity {
        &self.identity
    }

    pub fn status(&self) -> ScreenStatus {
        self.status
    }

    pub fn products(&self) -> &[String] {
        &self.products
    }

    pub fn interval_ms(&self) -> IntervalMs {
        self.interval_ms
    }

    /// Returns `true` while the autonomous timer is armed.
    pub fn is_running(&self) -> bool {
        self.timer.is_armed()
    }

    pub fn epoch(&self) -> Option<Epoch> {
        self.timer.epoch()
    }

    pub fn rotation(&self) -> &RotationMachine {
        &self.rotation
    }

    /// Global index currently rendered as settled.
    pub fn displayed_index(&self) -> i64 {
        self.rotation.committed()
    }

    /// Settled frame at the displayed index.
    pub fn frame(&self) -> Frame {
        self.frame_at(self.rotation.committed())
    }

    /// Effects that draw the current state from scratch.
    pub fn initial_effects(&self) -> Vec<ScreenEffect> {
        vec![ScreenEffect::Render(self.frame()), ScreenEffect::Status(self.status)]
    }

    /// Earliest timer deadline, `None` when no timer is armed.
    pub fn next_deadline(&self) -> Option<EpochMs> {
        self.timer.next_deadline()
    }

    pub fn push(&mut self, event: ScreenEvent) {
        self.queue.push_back(event);
    }

    /// Process queued events, then every timer deadline due at `now`.
    pub fn run(&mut self, now: EpochMs) -> Vec<ScreenEffect> {
        let mut effects = Vec::new();
        loop {
            if let Some(event) = self.queue.pop_front() {
                self.step(event, now, &mut effects);
            } else if let Some(fire) = self.timer.poll(now) {
                self.step(ScreenEvent::Timer(fire), now, &mut effects);
            } else {
                break;
            }
        }
        effects
    }

    /// Queue `event` and run.
    pub fn handle(&mut self, event: ScreenEvent, now: EpochMs) -> Vec<ScreenEffect> {
        self.push(event);
        self.run(now)
    }

    /// Cancel both timers and freeze the displayed index.
    ///
    /// A running transition is cut short at its destination; a coalesced pending index is
    /// dropped, never shown. Stopping a stopped screen is a no-op.
    pub fn stop(&mut self) -> Vec<ScreenEffect> {
        let mut effects = Vec::new();
        if self.status == ScreenStatus::Stopped {
            return effects;
        }

        self.timer.disarm();
        let animating_to = self.rotation.animating_to();
        let was_transitioning = animating_to.is_some();
        let index = animating_to.unwrap_or_else(|| self.rotation.committed());
        self.rotation.snap(index);
        self.note(Outcome::Stopped { index });

        if was_transitioning {
            effects.push(ScreenEffect::Render(self.frame()));
        }
        self.set_status(ScreenStatus::Stopped, &mut effects);
        effects
    }

    fn step(&mut self, event: ScreenEvent, now: EpochMs, effects: &mut Vec<ScreenEffect>) {
        match event {
            ScreenEvent::Inbound(bytes) => self.on_inbound(&bytes, now, effects),
            ScreenEvent::Timer(TimerFire::Tick) => self.on_tick_timer(now, effects),
            ScreenEvent::Timer(TimerFire::DriftCheck) => self.on_drift_check(now, effects),
            ScreenEvent::TransitionDone(id) => self.on_transition_done(id, effects),
        }
    }

    fn on_inbound(&mut self, bytes: &[u8], now: EpochMs, effects: &mut Vec<ScreenEffect>) {
        let env = match Envelope::decode(bytes) {
            Ok(env) => env,
            Err(e) => {
                self.metrics.record_envelope(ROLE, EnvelopeOutcome::Malformed);
                self.note(Outcome::Malformed {
                    reason: e.to_string(),
                });
                return;
            }
        };

        let for_me = env.is_for(&self.identity.instance_id, &self.identity.group_id);
        let wanted = match env.kind {
            MessageType::ControllerSync => false,
            kind if kind.is_rotation() => !self.is_static(),
            _ => true,
        };
        if !for_me || !wanted {
            self.metrics.record_envelope(ROLE, EnvelopeOutcome::Ignored);
            self.note(Outcome::Ignored { kind: env.kind });
            return;
        }

        match self.sequencer.inspect(&env.session_id, env.sequence) {
            Verdict::Accepted { session_changed } => {
                self.metrics.record_envelope(ROLE, EnvelopeOutcome::Accepted);
                if session_changed {
                    self.note(Outcome::SessionChanged {
                        session: env.session_id.short().to_string(),
                    });
                }
            }
            Verdict::Stale { last } => {
                self.metrics.record_envelope(ROLE, EnvelopeOutcome::Stale);
                self.note(Outcome::Stale {
                    sequence: env.sequence,
                    last,
                });
                return;
            }
            Verdict::SelfEcho => {
                self.metrics.record_envelope(ROLE, EnvelopeOutcome::SelfEcho);
                return;
            }
        }

        match env.kind {
            MessageType::Init => self.apply_init(&env, now, effects),
            MessageType::Tick => self.apply_tick(&env, now, effects),
            MessageType::Stop => effects.extend(self.stop()),
            MessageType::ConfigUpdate => self.apply_config(&env, now, effects),
            MessageType::ControllerSync => {}
        }
    }

    fn apply_init(&mut self, env: &Envelope, now: EpochMs, effects: &mut Vec<ScreenEffect>) {
        self.adopt(env);
        self.interval_ms = env.effective_interval_ms();
        if self.products.is_empty() {
            self.go_empty(effects);
            return;
        }

        let epoch = match env.start_time {
            Some(start_time) => Epoch::new(start_time, self.interval_ms),
            None => Epoch::anchored(env.start_index, self.interval_ms, now),
        };
        self.timer.arm(epoch, now);
        let index = epoch.index_at(now);
        self.rotation.snap(index);
        self.note(Outcome::Synchronized {
            index,
            start_time: epoch.start_time,
            interval_ms: epoch.interval_ms,
        });

        effects.push(ScreenEffect::Render(self.frame()));
        self.set_status(ScreenStatus::Synchronized, effects);
    }

    fn apply_tick(&mut self, env: &Envelope, now: EpochMs, effects: &mut Vec<ScreenEffect>) {
        self.adopt(env);
        if self.products.is_empty() {
            self.go_empty(effects);
            return;
        }

        // A known epoch outranks the publisher's counter.
        let target = match self.timer.epoch() {
            Some(epoch) => epoch.index_at(now),
            None => i64::try_from(env.start_index).unwrap_or(i64::MAX),
        };
        self.request_transition(target, effects);
    }

    fn apply_config(&mut self, env: &Envelope, now: EpochMs, effects: &mut Vec<ScreenEffect>) {
        self.adopt(env);
        self.interval_ms = env.effective_interval_ms();
        if self.products.is_empty() {
            self.go_empty(effects);
            return;
        }

        let index = match self.timer.epoch() {
            Some(current) => {
                let start_time = env.start_time.unwrap_or(current.start_time);
                let epoch = Epoch::new(start_time, self.interval_ms);
                self.timer.arm(epoch, now);
                epoch.index_at(now)
            }
            None => self.rotation.target(),
        };
        self.rotation.snap(index);
        self.note(Outcome::Reconfigured {
            index,
            interval_ms: self.interval_ms,
        });

        let frame = self.frame();
        let status = match self.status {
            ScreenStatus::Stopped => ScreenStatus::Stopped,
            _ => ScreenStatus::showing(&frame),
        };
        effects.push(ScreenEffect::Render(frame));
        self.set_status(status, effects);
    }

    fn on_tick_timer(&mut self, now: EpochMs, effects: &mut Vec<ScreenEffect>) {
        let Some(epoch) = self.timer.epoch() else {
            return;
        };
        if self.products.is_empty() {
            return;
        }
        self.request_transition(epoch.index_at(now), effects);
    }

    fn on_drift_check(&mut self, now: EpochMs, effects: &mut Vec<ScreenEffect>) {
        let Some(epoch) = self.timer.epoch() else {
            return;
        };
        if self.products.is_empty() {
            return;
        }

        let index = epoch.index_at(now);
        if self.rotation.is_transitioning() {
            if self.rotation.target() != index {
                self.request_transition(index, effects);
            }
            return;
        }

        let shown = self.rotation.committed();
        if shown == index {
            return;
        }
        self.rotation.snap(index);
        self.metrics
            .record_drift_correction(index.abs_diff(shown));
        self.note(Outcome::DriftCorrected {
            from: shown,
            to: index,
        });

        let frame = self.frame();
        let status = ScreenStatus::showing(&frame);
        effects.push(ScreenEffect::Render(frame));
        self.set_status(status, effects);
    }

    fn on_transition_done(&mut self, id: u64, effects: &mut Vec<ScreenEffect>) {
        if self.rotation.in_flight() != Some(id) {
            return;
        }
        let next = self.rotation.complete(id);
        self.note(Outcome::TransitionCompleted {
            index: self.rotation.committed(),
        });

        let frame = self.frame();
        let status = ScreenStatus::showing(&frame);
        effects.push(ScreenEffect::Render(frame));
        self.set_status(status, effects);

        if let Some(transition) = next {
            self.begin(transition, effects);
        }
    }

    fn request_transition(&mut self, target: i64, effects: &mut Vec<ScreenEffect>) {
        match self.rotation.request(target) {
            Some(transition) => self.begin(transition, effects),
            None if self.rotation.pending() == Some(target) => {
                self.note(Outcome::TransitionCoalesced { to: target });
            }
            None => {}
        }
    }

    fn begin(&mut self, transition: Transition, effects: &mut Vec<ScreenEffect>) {
        self.metrics.record_transition();
        self.note(Outcome::TransitionStarted {
            from: transition.from,
            to: transition.to,
        });
        effects.push(ScreenEffect::BeginTransition {
            transition,
            frame: self.frame_at(transition.to),
        });
    }

    fn go_empty(&mut self, effects: &mut Vec<ScreenEffect>) {
        self.timer.disarm();
        self.rotation.snap(0);
        self.note(Outcome::Emptied);
        effects.push(ScreenEffect::Render(self.frame()));
        self.set_status(ScreenStatus::Waiting, effects);
    }

    fn adopt(&mut self, env: &Envelope) {
        self.products = content::for_layout(&env.products, env.layout_mode);
        self.layout = env.layout_mode;
        self.production_mode = env.production_mode;
    }

    fn set_status(&mut self, status: ScreenStatus, effects: &mut Vec<ScreenEffect>) {
        if self.status != status {
            self.status = status;
            effects.push(ScreenEffect::Status(status));
        }
    }

    fn frame_at(&self, global: i64) -> Frame {
        if self.is_static() {
            Frame::fixed(&self.products, self.layout, self.production_mode)
        } else {
            Frame::at(
                &self.products,
                global,
                self.identity.position,
                self.layout,
                self.production_mode,
            )
        }
    }

    fn is_static(&self) -> bool {
        self.kind == GroupKind::Static
    }

    fn note(&self, outcome: Outcome) {
        log_outcome(self.identity.position, &outcome);
    }
}

#[cfg(test)]
mod tests {
    use mw_model::{GroupId, InstanceId, SessionId};

    use super::*;

    const T0: EpochMs = 1_700_000_000_000;

    fn identity(position: u32) -> ScreenIdentity {
        ScreenIdentity::new(InstanceId::from("acme"), GroupId::from("lobby"), position)
    }

    fn screen(position: u32) -> ScreenSyncState {
        ScreenSyncState::new(identity(position), None, &ScreenConfig::default())
    }

    fn abc() -> Vec<String> {
        vec!["A".into(), "B".into(), "C".into()]
    }

    fn envelope(kind: MessageType, session: &str, seq: u64) -> Envelope {
        Envelope::new(kind, SessionId::from(session), seq)
            .with_products(abc())
            .with_interval_ms(10_000)
    }

    fn bytes(env: &Envelope) -> ScreenEvent {
        ScreenEvent::Inbound(env.encode().unwrap())
    }

    fn init(seq: u64, start_time: EpochMs) -> ScreenEvent {
        bytes(&envelope(MessageType::Init, "ctl", seq).with_start_time(start_time))
    }

    fn transitions(effects: &[ScreenEffect]) -> Vec<Transition> {
        effects
            .iter()
            .filter_map(|e| match e {
                ScreenEffect::BeginTransition { transition, .. } => Some(*transition),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn starts_waiting() {
        let s = screen(0);
        assert_eq!(s.status(), ScreenStatus::Waiting);
        assert!(!s.is_running());
        assert!(s.frame().is_empty());
    }

    #[test]
    fn init_snaps_to_global_index_and_arms_timer() {
        let mut s = screen(0);
        let effects = s.handle(init(1, T0), T0 + 25_000);

        assert_eq!(s.displayed_index(), 2);
        assert_eq!(s.frame().current(), Some("C"));
        assert_eq!(s.status(), ScreenStatus::Synchronized);
        assert!(transitions(&effects).is_empty());
        assert!(effects.contains(&ScreenEffect::Status(ScreenStatus::Synchronized)));
        assert_eq!(s.next_deadline(), Some(T0 + 30_000));
    }

    #[test]
    fn timer_tick_animates_at_the_boundary() {
        let mut s = screen(0);
        s.handle(init(1, T0), T0 + 25_000);

        assert!(s.run(T0 + 29_999).is_empty());
        let effects = s.run(T0 + 30_000);
        let started = transitions(&effects);
        assert_eq!(started.len(), 1);
        assert_eq!((started[0].from, started[0].to), (2, 3));

        let done = s.handle(ScreenEvent::TransitionDone(started[0].id), T0 + 30_700);
        assert_eq!(s.displayed_index(), 3);
        assert_eq!(s.frame().current(), Some("A"));
        assert!(done.contains(&ScreenEffect::Status(ScreenStatus::Showing { item: 1, of: 3 })));
    }

    #[test]
    fn init_without_start_time_anchors_start_index() {
        let mut s = screen(0);
        let env = envelope(MessageType::Init, "ctl", 1);
        let env = Envelope { start_index: 4, ..env };
        s.handle(bytes(&env), T0);

        assert_eq!(s.displayed_index(), 4);
        assert_eq!(s.frame().current(), Some("B"));
    }

    #[test]
    fn malformed_and_foreign_envelopes_are_ignored() {
        let mut s = screen(0);
        assert!(s.handle(ScreenEvent::Inbound(b"{not json".to_vec()), T0).is_empty());
        assert!(
            s.handle(ScreenEvent::Inbound(br#"{"type":"init"}"#.to_vec()), T0)
                .is_empty()
        );

        let foreign = envelope(MessageType::Init, "ctl", 1)
            .with_start_time(T0)
            .with_target(InstanceId::from("acme"), GroupId::from("other"));
        assert!(s.handle(bytes(&foreign), T0).is_empty());

        let sync = envelope(MessageType::ControllerSync, "ctl", 2);
        assert!(s.handle(bytes(&sync), T0).is_empty());

        assert_eq!(s.status(), ScreenStatus::Waiting);
        assert_eq!(s.handle(init(1, T0), T0).len(), 2);
    }

    #[test]
    fn reordered_duplicates_do_not_regress() {
        let mut s = screen(0);
        s.handle(init(200, T0), T0 + 5_000);
        let stale = envelope(MessageType::Init, "ctl", 100).with_start_time(T0 - 20_000);

        assert!(s.handle(bytes(&stale), T0 + 5_000).is_empty());
        assert_eq!(s.epoch().map(|e| e.start_time), Some(T0));
    }

    #[test]
    fn higher_sequence_from_other_session_wins_lower_is_dropped() {
        let mut s = screen(0);
        let a = envelope(MessageType::Init, "ctl-a", 100).with_start_time(T0);
        let b = envelope(MessageType::Stop, "ctl-b", 99);

        s.handle(bytes(&a), T0 + 1_000);
        assert!(s.handle(bytes(&b), T0 + 1_000).is_empty());
        assert!(s.is_running());
    }

    #[test]
    fn stop_is_idempotent() {
        let mut s = screen(1);
        s.handle(init(1, T0), T0 + 1_000);

        let first = s.stop();
        assert_eq!(first, vec![ScreenEffect::Status(ScreenStatus::Stopped)]);
        let index = s.displayed_index();
        let deadline = s.next_deadline();

        assert!(s.stop().is_empty());
        assert_eq!(s.displayed_index(), index);
        assert_eq!(s.next_deadline(), deadline);
        assert_eq!(deadline, None);
        assert!(s.run(T0 + 100_000).is_empty());
    }

    #[test]
    fn stop_during_transition_snaps_to_target() {
        let mut s = screen(0);
        s.handle(init(1, T0), T0);
        assert!(s.run(T0 + 5_000).is_empty());
        let started = transitions(&s.run(T0 + 10_000));
        assert_eq!(started.len(), 1);

        let effects = s.handle(bytes(&envelope(MessageType::Stop, "ctl", 2)), T0 + 10_100);
        assert_eq!(s.displayed_index(), 1);
        assert!(matches!(effects.first(), Some(ScreenEffect::Render(_))));
        assert!(s.handle(ScreenEvent::TransitionDone(started[0].id), T0 + 10_700).is_empty());
    }

    #[test]
    fn stop_drops_coalesced_pending_index() {
        let mut s = screen(0);
        s.handle(init(1, T0), T0);
        s.run(T0 + 5_000);
        let started = transitions(&s.run(T0 + 10_000));
        assert_eq!((started[0].from, started[0].to), (0, 1));

        s.push(ScreenEvent::Timer(TimerFire::DriftCheck));
        s.run_queue_only(T0 + 30_500);
        assert_eq!(s.rotation().pending(), Some(3));

        let effects = s.handle(bytes(&envelope(MessageType::Stop, "ctl", 2)), T0 + 30_600);
        assert_eq!(s.displayed_index(), 1);
        assert_eq!(s.rotation().pending(), None);
        assert!(effects.contains(&ScreenEffect::Status(ScreenStatus::Stopped)));
    }

    #[test]
    fn start_time_beyond_i64_is_handled() {
        let mut s = screen(1);
        let env = envelope(MessageType::Init, "ctl", 1).with_start_time(1u64 << 63);
        s.handle(bytes(&env), T0);

        assert!(s.is_running());
        assert!(s.displayed_index() < 0);
        assert!(s.frame().current().is_some());
        assert!(s.next_deadline().is_some_and(|d| d > T0));
    }

    #[test]
    fn legacy_tick_with_huge_start_index_is_handled() {
        for start_index in [i64::MAX as u64, u64::MAX] {
            let mut s = screen(1);
            let tick = Envelope {
                start_index,
                ..envelope(MessageType::Tick, "ctl", 1)
            };
            let started = transitions(&s.handle(bytes(&tick), T0));
            assert_eq!(started.len(), 1);
            assert_eq!(started[0].to, i64::MAX);

            s.handle(ScreenEvent::TransitionDone(started[0].id), T0 + 700);
            assert_eq!(s.displayed_index(), i64::MAX);
            assert!(s.frame().current().is_some());
        }
    }

    #[test]
    fn drift_check_converges_after_a_stall() {
        let mut s = ScreenSyncState::new(
            identity(0),
            None,
            &ScreenConfig {
                drift_check_ms: 5_000,
                ..ScreenConfig::default()
            },
        );
        s.handle(init(1, T0), T0);

        // Deliver only the drift check: the tick deadline is artificially skipped.
        let stall_end = T0 + 3_600_000 + 4_321;
        s.push(ScreenEvent::Timer(TimerFire::DriftCheck));
        let effects = s.run_queue_only(stall_end);

        assert_eq!(s.displayed_index(), 360);
        assert!(matches!(effects.first(), Some(ScreenEffect::Render(_))));
    }

    #[test]
    fn drift_during_transition_is_coalesced() {
        let mut s = screen(0);
        s.handle(init(1, T0), T0);
        s.run(T0 + 5_000);
        let started = transitions(&s.run(T0 + 10_000));
        assert_eq!(started.len(), 1);

        s.push(ScreenEvent::Timer(TimerFire::DriftCheck));
        assert!(transitions(&s.run_queue_only(T0 + 20_500)).is_empty());
        assert_eq!(s.rotation().pending(), Some(2));

        let next = transitions(&s.handle(ScreenEvent::TransitionDone(started[0].id), T0 + 20_600));
        assert_eq!(next.len(), 1);
        assert_eq!((next[0].from, next[0].to), (1, 2));
    }

    #[test]
    fn empty_products_wait_and_never_schedule() {
        let mut s = screen(0);
        let env = Envelope::new(MessageType::Init, SessionId::from("ctl"), 1).with_start_time(T0);
        s.handle(bytes(&env), T0 + 50_000);

        assert_eq!(s.status(), ScreenStatus::Waiting);
        assert_eq!(s.displayed_index(), 0);
        assert_eq!(s.next_deadline(), None);
    }

    #[test]
    fn zero_interval_falls_back_to_default() {
        let mut s = screen(0);
        let env = envelope(MessageType::Init, "ctl", 1)
            .with_interval_ms(0)
            .with_start_time(T0);
        s.handle(bytes(&env), T0 + 25_000);

        assert_eq!(s.interval_ms(), DEFAULT_INTERVAL_MS);
        assert_eq!(s.displayed_index(), 2);
    }

    #[test]
    fn config_update_keeps_epoch_and_applies_interval() {
        let mut s = screen(0);
        s.handle(init(1, T0), T0 + 25_000);

        let update = envelope(MessageType::ConfigUpdate, "ctl", 2).with_interval_ms(5_000);
        s.handle(bytes(&update), T0 + 25_000);

        assert_eq!(s.epoch(), Some(Epoch::new(T0, 5_000)));
        assert_eq!(s.displayed_index(), 5);
        assert_eq!(s.next_deadline(), Some(T0 + 30_000));
    }

    #[test]
    fn legacy_tick_without_epoch_uses_start_index() {
        let mut s = screen(0);
        let tick = Envelope {
            start_index: 1,
            ..envelope(MessageType::Tick, "ctl", 1)
        };
        let started = transitions(&s.handle(bytes(&tick), T0));
        assert_eq!(started.len(), 1);
        assert_eq!(started[0].to, 1);
    }

    #[test]
    fn static_group_ignores_rotation() {
        let group = Group {
            id: GroupId::from("lobby"),
            name: "Lobby".into(),
            kind: GroupKind::Static,
            products: abc(),
            layout_mode: LayoutMode::Card,
            production_mode: Flag::disabled(),
            interval_seconds: None,
        };
        let mut s = ScreenSyncState::new(identity(2), Some(&group), &ScreenConfig::default());

        assert_eq!(s.frame().current(), Some("A"));
        assert!(s.handle(init(1, T0), T0 + 25_000).is_empty());
        assert!(!s.is_running());
        assert_eq!(s.frame().current(), Some("A"));
    }

    impl ScreenSyncState {
        /// Drain the queue without polling timers.
        fn run_queue_only(&mut self, now: EpochMs) -> Vec<ScreenEffect> {
            let mut effects = Vec::new();
            while let Some(event) = self.queue.pop_front() {
                self.step(event, now, &mut effects);
            }
            effects
        }
    }
}
