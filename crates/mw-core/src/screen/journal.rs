//! Structured logging of screen state changes.
//!
//! Every outcome of the state machine goes through [`log_outcome`], which picks the level
//! and attaches the screen position plus outcome-specific fields.
use mw_model::{MessageType, Position, Sequence};
use tracing::{debug, info, trace, warn};

/// One observable result of processing a screen event.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Malformed { reason: String },
    Ignored { kind: MessageType },
    Stale { sequence: Sequence, last: Sequence },
    SessionChanged { session: String },
    Synchronized { index: i64, start_time: u64, interval_ms: u64 },
    Emptied,
    Stopped { index: i64 },
    Reconfigured { index: i64, interval_ms: u64 },
    TransitionStarted { from: i64, to: i64 },
    TransitionCoalesced { to: i64 },
    TransitionCompleted { index: i64 },
    DriftCorrected { from: i64, to: i64 },
}

impl Outcome {
    fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::Malformed { .. } => OutcomeKind::Malformed,
            Outcome::Ignored { .. } => OutcomeKind::Ignored,
            Outcome::Stale { .. } => OutcomeKind::Stale,
            Outcome::SessionChanged { .. } => OutcomeKind::SessionChanged,
            Outcome::Synchronized { .. } => OutcomeKind::Synchronized,
            Outcome::Emptied => OutcomeKind::Emptied,
            Outcome::Stopped { .. } => OutcomeKind::Stopped,
            Outcome::Reconfigured { .. } => OutcomeKind::Reconfigured,
            Outcome::TransitionStarted { .. } => OutcomeKind::TransitionStarted,
            Outcome::TransitionCoalesced { .. } => OutcomeKind::TransitionCoalesced,
            Outcome::TransitionCompleted { .. } => OutcomeKind::TransitionCompleted,
            Outcome::DriftCorrected { .. } => OutcomeKind::DriftCorrected,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutcomeKind {
    Malformed,
    Ignored,
    Stale,
    SessionChanged,
    Synchronized,
    Emptied,
    Stopped,
    Reconfigured,
    TransitionStarted,
    TransitionCoalesced,
    TransitionCompleted,
    DriftCorrected,
}

pub(crate) fn log_outcome(position: Position, outcome: &Outcome) {
    let msg = message_for(outcome.kind());

    match outcome {
        // Protocol noise
        Outcome::Malformed { reason } => warn!(position, reason = %reason, "{msg}"),
        Outcome::Ignored { kind } => trace!(position, kind = %kind, "{msg}"),
        Outcome::Stale { sequence, last } => trace!(position, sequence, last, "{msg}"),
        Outcome::SessionChanged { session } => info!(position, session = %session, "{msg}"),

        // Lifecycle
        Outcome::Synchronized {
            index,
            start_time,
            interval_ms,
        } => info!(position, index, start_time, interval_ms, "{msg}"),
        Outcome::Emptied => info!(position, "{msg}"),
        Outcome::Stopped { index } => info!(position, index, "{msg}"),
        Outcome::Reconfigured { index, interval_ms } => {
            debug!(position, index, interval_ms, "{msg}")
        }

        // Rotation
        Outcome::TransitionStarted { from, to } => debug!(position, from, to, "{msg}"),
        Outcome::TransitionCoalesced { to } => debug!(position, to, "{msg}"),
        Outcome::TransitionCompleted { index } => trace!(position, index, "{msg}"),
        Outcome::DriftCorrected { from, to } => warn!(position, from, to, "{msg}"),
    }
}

#[inline]
fn message_for(kind: OutcomeKind) -> &'static str {
    match kind {
        OutcomeKind::Malformed => "malformed envelope ignored",
        OutcomeKind::Ignored => "envelope not meant for this screen",
        OutcomeKind::Stale => "stale envelope discarded",
        OutcomeKind::SessionChanged => "following a new controller session",

        OutcomeKind::Synchronized => "synchronized to published epoch",
        OutcomeKind::Emptied => "no products, waiting for controller",
        OutcomeKind::Stopped => "rotation stopped",
        OutcomeKind::Reconfigured => "configuration updated",

        OutcomeKind::TransitionStarted => "transition started",
        OutcomeKind::TransitionCoalesced => "transition request coalesced into pending",
        OutcomeKind::TransitionCompleted => "transition completed",
        OutcomeKind::DriftCorrected => "timer drift corrected",
    }
}
