use mw_model::{ControllerState, Envelope, MessageType, Sequence, SessionId};

use crate::sequence::{Sequencer, Verdict};

/// What a controller did with a peer envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled {
    /// Peer state merged into the local edit state.
    Applied { session_changed: bool },
    /// Older than something already applied or published locally.
    Stale { last: Sequence },
    /// Our own envelope echoed back by the transport.
    SelfEcho,
    /// Not a `controller-sync` envelope, or addressed elsewhere.
    Ignored,
}

/// Last-writer-wins merge of peer `controller-sync` envelopes.
///
/// Local publishes raise the same high-water mark as accepted peer envelopes, so a peer
/// edit older than our latest one is never applied over it.
#[derive(Debug, Clone)]
pub struct Reconciler {
    sequencer: Sequencer,
}

impl Reconciler {
    pub fn new(own: SessionId) -> Self {
        Self {
            sequencer: Sequencer::merge(own),
        }
    }

    /// Record a locally published sequence.
    pub fn observe_local(&mut self, sequence: Sequence) {
        self.sequencer.observe_local(sequence);
    }

    pub fn last_accepted(&self) -> Option<Sequence> {
        self.sequencer.last_accepted()
    }

    /// Run `env` through the sequencing rule and merge it into `state` on acceptance.
    ///
    /// `is_running` is never taken from a peer.
    pub fn reconcile(&mut self, state: &mut ControllerState, env: &Envelope) -> Reconciled {
        if env.kind != MessageType::ControllerSync {
            return Reconciled::Ignored;
        }
        match self.sequencer.inspect(&env.session_id, env.sequence) {
            Verdict::SelfEcho => Reconciled::SelfEcho,
            Verdict::Stale { last } => Reconciled::Stale { last },
            Verdict::Accepted { session_changed } => {
                merge(state, env);
                Reconciled::Applied { session_changed }
            }
        }
    }
}

fn merge(state: &mut ControllerState, env: &Envelope) {
    if env.interval_ms > 0 {
        state.interval_seconds = env.interval_ms / 1_000;
    }
    state.products = env.products.join("\n\n");
    state.layout_mode = env.layout_mode;
    state.production_mode = env.production_mode;
}
