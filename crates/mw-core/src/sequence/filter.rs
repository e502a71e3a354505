use mw_model::{Sequence, SessionId};
use tracing::{debug, trace};

/// How a receiver treats envelopes from a session other than the one it follows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdoptionPolicy {
    /// Screens: always adopt the newest publisher silently (controller failover).
    Follow,
    /// Controllers: merge forward-moving peer state, ignore own echoes.
    Merge { own: SessionId },
}

/// Result of running one envelope through the [`Sequencer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Envelope is newer than anything seen; `session_changed` reports a publisher switch.
    Accepted { session_changed: bool },
    /// Sequence at or below the high-water mark: duplicate or reordered delivery.
    Stale { last: Sequence },
    /// Envelope published by this very receiver.
    SelfEcho,
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted { .. })
    }
}

/// Staleness filter with a single high-water mark per receiver.
///
/// The mark is shared across sessions: once a receiver accepted sequence `n` from any
/// publisher, nothing at or below `n` is accepted again, whichever session sent it.
#[derive(Debug, Clone)]
pub struct Sequencer {
    policy: AdoptionPolicy,
    session: Option<SessionId>,
    last: Option<Sequence>,
}

impl Sequencer {
    pub fn new(policy: AdoptionPolicy) -> Self {
        Self {
            policy,
            session: None,
            last: None,
        }
    }

    /// Sequencer for screens.
    pub fn follow() -> Self {
        Self::new(AdoptionPolicy::Follow)
    }

    /// Sequencer for a controller owning `own`.
    pub fn merge(own: SessionId) -> Self {
        Self::new(AdoptionPolicy::Merge { own })
    }

    /// Session currently followed, if any.
    pub fn session(&self) -> Option<&SessionId> {
        self.session.as_ref()
    }

    /// Highest accepted sequence, if any.
    pub fn last_accepted(&self) -> Option<Sequence> {
        self.last
    }

    /// Decide on an inbound envelope and, on acceptance, advance the tracked state.
    pub fn inspect(&mut self, session: &SessionId, sequence: Sequence) -> Verdict {
        if let AdoptionPolicy::Merge { own } = &self.policy {
            if own == session {
                trace!(session = session.short(), sequence, "own envelope echoed back");
                return Verdict::SelfEcho;
            }
        }

        if let Some(last) = self.last {
            if sequence <= last {
                trace!(session = session.short(), sequence, last, "stale envelope");
                return Verdict::Stale { last };
            }
        }

        let session_changed = match &self.session {
            Some(current) => current != session,
            None => false,
        };
        if session_changed {
            debug!(
                from = self.session.as_ref().map(|s| s.short()).unwrap_or("-"),
                to = session.short(),
                sequence,
                "publisher session changed"
            );
        }

        self.session = Some(session.clone());
        self.last = Some(sequence);
        Verdict::Accepted { session_changed }
    }

    /// Raise the high-water mark for a locally published change.
    ///
    /// Controllers call this for their own edits so that older peer state can never
    /// overwrite them.
    pub fn observe_local(&mut self, sequence: Sequence) {
        if self.last.is_none_or(|last| sequence > last) {
            self.last = Some(sequence);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(id: &str) -> SessionId {
        SessionId::from(id)
    }

    #[test]
    fn first_envelope_is_accepted_without_session_change() {
        let mut seq = Sequencer::follow();
        assert_eq!(
            seq.inspect(&s("a"), 10),
            Verdict::Accepted {
                session_changed: false
            }
        );
        assert_eq!(seq.session(), Some(&s("a")));
        assert_eq!(seq.last_accepted(), Some(10));
    }

    #[test]
    fn duplicates_and_regressions_are_stale() {
        let mut seq = Sequencer::follow();
        seq.inspect(&s("a"), 10);

        assert_eq!(seq.inspect(&s("a"), 10), Verdict::Stale { last: 10 });
        assert_eq!(seq.inspect(&s("a"), 9), Verdict::Stale { last: 10 });
        assert_eq!(seq.last_accepted(), Some(10));
    }

    #[test]
    fn reordered_pair_ends_in_the_same_state() {
        let mut forward = Sequencer::follow();
        forward.inspect(&s("a"), 1);
        forward.inspect(&s("a"), 2);

        let mut backward = Sequencer::follow();
        assert!(backward.inspect(&s("a"), 2).is_accepted());
        assert!(!backward.inspect(&s("a"), 1).is_accepted());

        assert_eq!(forward.last_accepted(), backward.last_accepted());
        assert_eq!(forward.session(), backward.session());
    }

    #[test]
    fn screens_adopt_newer_sessions() {
        let mut seq = Sequencer::follow();
        seq.inspect(&s("a"), 100);

        assert_eq!(
            seq.inspect(&s("b"), 101),
            Verdict::Accepted {
                session_changed: true
            }
        );
        assert_eq!(seq.session(), Some(&s("b")));
    }

    #[test]
    fn older_sequence_from_another_session_is_discarded() {
        let mut seq = Sequencer::follow();
        seq.inspect(&s("controller-a"), 100);

        assert_eq!(
            seq.inspect(&s("controller-b"), 99),
            Verdict::Stale { last: 100 }
        );
        assert_eq!(seq.session(), Some(&s("controller-a")));
    }

    #[test]
    fn controllers_ignore_their_own_echo() {
        let mut seq = Sequencer::merge(s("me"));
        assert_eq!(seq.inspect(&s("me"), 500), Verdict::SelfEcho);
        assert_eq!(seq.last_accepted(), None);
    }

    #[test]
    fn local_edits_shield_against_older_peer_state() {
        let mut seq = Sequencer::merge(s("me"));
        seq.observe_local(200);

        assert_eq!(seq.inspect(&s("peer"), 150), Verdict::Stale { last: 200 });
        assert!(seq.inspect(&s("peer"), 250).is_accepted());

        seq.observe_local(100);
        assert_eq!(seq.last_accepted(), Some(250));
    }
}
