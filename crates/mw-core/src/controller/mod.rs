//! Operator console side of the engine.
//!
//! A [`Controller`] owns the edit state of one console and turns every operator command into
//! the envelopes to publish. Peers running against the same group converge through
//! `controller-sync` envelopes merged by the [`Reconciler`].
mod reconcile;
pub use reconcile::{Reconciled, Reconciler};

mod runtime;
pub use runtime::{ControllerAction, ControllerClient, ControllerRuntime};

use mw_model::{
    ControllerState, EpochMs, Envelope, GroupId, InstanceId, LayoutMode, MessageType, SessionId,
    content,
};
use tracing::debug;

use crate::sequence::SequenceClock;

pub struct Controller {
    instance: InstanceId,
    group: GroupId,
    session: SessionId,
    sequence: SequenceClock,
    state: ControllerState,
    start_index: u64,
    start_time: Option<EpochMs>,
    reconciler: Reconciler,
}

impl Controller {
    /// Controller with a freshly minted session.
    pub fn new(instance: InstanceId, group: GroupId, state: ControllerState) -> Self {
        Self::with_session(instance, group, state, SessionId::generate())
    }

    pub fn with_session(
        instance: InstanceId,
        group: GroupId,
        state: ControllerState,
        session: SessionId,
    ) -> Self {
        Self {
            instance,
            group,
            reconciler: Reconciler::new(session.clone()),
            session,
            sequence: SequenceClock::new(),
            state,
            start_index: 0,
            start_time: None,
        }
    }

    pub fn session(&self) -> &SessionId {
        &self.session
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    pub fn start_index(&self) -> u64 {
        self.start_index
    }

    /// Epoch of the last published `init`.
    pub fn start_time(&self) -> Option<EpochMs> {
        self.start_time
    }

    /// Begin rotation from the first item with a new epoch.
    pub fn start(&mut self, now: EpochMs) -> Vec<Envelope> {
        self.start_index = 0;
        self.state.is_running = true;
        self.start_time = Some(now);
        vec![self.compose(MessageType::Init, now)]
    }

    pub fn stop(&mut self, now: EpochMs) -> Vec<Envelope> {
        self.state.is_running = false;
        vec![self.compose(MessageType::Stop, now)]
    }

    /// Restart the rotation from the first item with a new epoch.
    pub fn reset(&mut self, now: EpochMs) -> Vec<Envelope> {
        self.start_index = 0;
        self.start_time = Some(now);
        vec![self.compose(MessageType::Init, now)]
    }

    pub fn set_interval_secs(&mut self, seconds: i64, now: EpochMs) -> Vec<Envelope> {
        self.state.interval_seconds = seconds;
        self.edited(now)
    }

    pub fn set_products(&mut self, raw: impl Into<String>, now: EpochMs) -> Vec<Envelope> {
        self.state.products = raw.into();
        self.edited(now)
    }

    /// Switch layout; a running rotation restarts from the first item.
    pub fn set_layout(&mut self, layout: LayoutMode, now: EpochMs) -> Vec<Envelope> {
        self.state.layout_mode = layout;
        if self.state.is_running {
            self.start_index = 0;
            self.start_time = Some(now);
        }
        self.edited(now)
    }

    pub fn set_production_mode(&mut self, enabled: bool, now: EpochMs) -> Vec<Envelope> {
        self.state.production_mode = enabled.into();
        self.edited(now)
    }

    /// Merge an envelope received from the group channel.
    pub fn apply_remote(&mut self, env: &Envelope) -> Reconciled {
        if !env.is_for(&self.instance, &self.group) {
            return Reconciled::Ignored;
        }
        let outcome = self.reconciler.reconcile(&mut self.state, env);
        if let Reconciled::Applied { .. } = outcome {
            debug!(
                from = env.session_id.short(),
                sequence = env.sequence,
                "edit state synced from peer controller"
            );
        }
        outcome
    }

    /// Every edit is mirrored to peers; running screens get a fresh `init` with the
    /// current epoch.
    fn edited(&mut self, now: EpochMs) -> Vec<Envelope> {
        let mut out = vec![self.compose(MessageType::ControllerSync, now)];
        if self.state.is_running {
            let start_time = *self.start_time.get_or_insert(now);
            debug!(start_time, "republishing init after edit");
            out.push(self.compose(MessageType::Init, now));
        }
        out
    }

    fn compose(&mut self, kind: MessageType, now: EpochMs) -> Envelope {
        let sequence = self.sequence.next(now);
        self.reconciler.observe_local(sequence);

        let items = self.state.items();
        // Peers get the raw items back; screens get them reduced for the layout.
        let products = match kind {
            MessageType::ControllerSync => items,
            _ => content::for_layout(&items, self.state.layout_mode),
        };

        let mut env = Envelope::new(kind, self.session.clone(), sequence)
            .with_target(self.instance.clone(), self.group.clone())
            .with_products(products)
            .with_interval_ms(self.state.interval_ms());
        env.ts = now as f64;
        env.start_index = self.start_index;
        env.layout_mode = self.state.layout_mode;
        env.production_mode = self.state.production_mode;
        if kind == MessageType::Init {
            env.start_time = self.start_time;
        }
        env
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: EpochMs = 1_700_000_000_000;

    fn controller(session: &str) -> Controller {
        let state = ControllerState {
            products: "A\n\nB\n\nC".into(),
            ..ControllerState::default()
        };
        Controller::with_session(
            InstanceId::from("acme"),
            GroupId::from("lobby"),
            state,
            SessionId::from(session),
        )
    }

    fn kinds(envs: &[Envelope]) -> Vec<MessageType> {
        envs.iter().map(|e| e.kind).collect()
    }

    #[test]
    fn start_publishes_init_with_fresh_epoch() {
        let mut c = controller("me");
        let out = c.start(T0);

        assert_eq!(kinds(&out), vec![MessageType::Init]);
        let init = &out[0];
        assert_eq!(init.start_time, Some(T0));
        assert_eq!(init.start_index, 0);
        assert_eq!(init.interval_ms, 10_000);
        assert_eq!(init.products, vec!["A", "B", "C"]);
        assert_eq!(init.instance_id.as_str(), "acme");
        assert_eq!(init.group_id.as_str(), "lobby");
        assert!(c.is_running());
    }

    #[test]
    fn sequences_strictly_increase_within_one_millisecond() {
        let mut c = controller("me");
        let a = c.start(T0);
        let b = c.set_interval_secs(5, T0);
        let seqs: Vec<u64> = a.iter().chain(b.iter()).map(|e| e.sequence).collect();
        assert_eq!(seqs, vec![T0, T0 + 1, T0 + 2]);
    }

    #[test]
    fn edits_while_idle_only_sync_peers() {
        let mut c = controller("me");
        let out = c.set_products("X\n\nY", T0);
        assert_eq!(kinds(&out), vec![MessageType::ControllerSync]);
        assert_eq!(out[0].products, vec!["X", "Y"]);
        assert_eq!(out[0].start_time, None);
    }

    #[test]
    fn edits_while_running_keep_the_epoch() {
        let mut c = controller("me");
        c.start(T0);
        let out = c.set_interval_secs(0, T0 + 42_000);

        assert_eq!(kinds(&out), vec![MessageType::ControllerSync, MessageType::Init]);
        assert_eq!(out[1].start_time, Some(T0));
        assert_eq!(out[1].interval_ms, 10_000);
    }

    #[test]
    fn oversized_interval_publishes_the_default() {
        let mut c = controller("me");
        c.start(T0);
        let out = c.set_interval_secs(99_999_999_999_999_999, T0 + 1_000);

        assert_eq!(kinds(&out), vec![MessageType::ControllerSync, MessageType::Init]);
        assert!(out.iter().all(|e| e.interval_ms == 10_000));
    }

    #[test]
    fn layout_change_while_running_restarts_rotation() {
        let mut c = controller("me");
        c.start(T0);
        c.set_products("<div><img src=\"a.webp\"></div>\n\nplain", T0 + 1);
        let out = c.set_layout(LayoutMode::Image, T0 + 30_000);

        let init = &out[1];
        assert_eq!(init.start_time, Some(T0 + 30_000));
        assert_eq!(init.start_index, 0);
        assert_eq!(init.layout_mode, LayoutMode::Image);
        assert_eq!(init.products, vec!["<img src=\"a.webp\">", "plain"]);
        assert_eq!(out[0].products[0], "<div><img src=\"a.webp\"></div>");
    }

    #[test]
    fn stop_keeps_edit_state() {
        let mut c = controller("me");
        c.start(T0);
        let out = c.stop(T0 + 5);
        assert_eq!(kinds(&out), vec![MessageType::Stop]);
        assert!(!c.is_running());
        assert_eq!(c.state().items().len(), 3);
    }

    #[test]
    fn converges_with_peer_and_ignores_own_echo() {
        let mut a = controller("a");
        let mut b = controller("b");

        let out = a.set_products("Q", T0);
        assert_eq!(b.apply_remote(&out[0]), Reconciled::Applied { session_changed: false });
        assert_eq!(b.state().products, "Q");
        assert_eq!(a.apply_remote(&out[0]), Reconciled::SelfEcho);
        assert!(!b.is_running());
    }

    #[test]
    fn later_local_edit_beats_earlier_peer_edit() {
        let mut a = controller("a");
        let mut b = controller("b");

        let from_a = a.set_products("from a", T0);
        b.set_products("from b", T0 + 10);

        assert!(matches!(b.apply_remote(&from_a[0]), Reconciled::Stale { .. }));
        assert_eq!(b.state().products, "from b");
    }
}
