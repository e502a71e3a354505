use tracing::trace;

/// Rendered rotation state of one screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationState {
    Idle { index: i64 },
    Transitioning { from: i64, to: i64 },
}

/// An animated change the presenter has to run and then report back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub id: u64,
    pub from: i64,
    pub to: i64,
}

/// Committed/pending index pair with at most one transition in flight.
///
/// Indices are global (before the screen offset is applied).
#[derive(Debug, Clone)]
pub struct RotationMachine {
    state: RotationState,
    pending: Option<i64>,
    current_id: u64,
    next_id: u64,
}

impl RotationMachine {
    pub fn new() -> Self {
        Self {
            state: RotationState::Idle { index: 0 },
            pending: None,
            current_id: 0,
            next_id: 1,
        }
    }

    pub fn state(&self) -> RotationState {
        self.state
    }

    /// Index currently rendered as settled.
    pub fn committed(&self) -> i64 {
        match self.state {
            RotationState::Idle { index } => index,
            RotationState::Transitioning { from, .. } => from,
        }
    }

    /// Index the screen is converging to.
    pub fn target(&self) -> i64 {
        match self.state {
            RotationState::Idle { index } => self.pending.unwrap_or(index),
            RotationState::Transitioning { to, .. } => self.pending.unwrap_or(to),
        }
    }

    /// Destination of the running transition, ignoring anything pending behind it.
    pub fn animating_to(&self) -> Option<i64> {
        match self.state {
            RotationState::Transitioning { to, .. } => Some(to),
            RotationState::Idle { .. } => None,
        }
    }

    pub fn pending(&self) -> Option<i64> {
        self.pending
    }

    pub fn is_transitioning(&self) -> bool {
        matches!(self.state, RotationState::Transitioning { .. })
    }

    /// Id of the running transition.
    pub fn in_flight(&self) -> Option<u64> {
        self.is_transitioning().then_some(self.current_id)
    }

    /// Jump to `index` without animation, abandoning any running transition.
    pub fn snap(&mut self, index: i64) {
        trace!(index, "rotation snapped");
        self.state = RotationState::Idle { index };
        self.pending = None;
        self.current_id = 0;
    }

    /// Ask for an animated move to `to`.
    ///
    /// Returns the transition to start, or `None` when nothing has to change now: either
    /// the screen already shows `to`, or a transition is running and the request was
    /// coalesced into the pending slot.
    pub fn request(&mut self, to: i64) -> Option<Transition> {
        match self.state {
            RotationState::Idle { index } if index == to => {
                self.pending = None;
                None
            }
            RotationState::Idle { index } => Some(self.begin(index, to)),
            RotationState::Transitioning { to: running, .. } => {
                self.pending = (running != to).then_some(to);
                None
            }
        }
    }

    /// Report the end of transition `id`.
    ///
    /// Stale ids are ignored. A pending request is started right away if it still differs
    /// from the index just reached.
    pub fn complete(&mut self, id: u64) -> Option<Transition> {
        let RotationState::Transitioning { to, .. } = self.state else {
            return None;
        };
        if id != self.current_id {
            trace!(id, current = self.current_id, "stale transition completion");
            return None;
        }

        self.state = RotationState::Idle { index: to };
        self.current_id = 0;
        match self.pending.take() {
            Some(next) if next != to => Some(self.begin(to, next)),
            _ => None,
        }
    }

    fn begin(&mut self, from: i64, to: i64) -> Transition {
        let id = self.next_id;
        self.next_id += 1;
        self.current_id = id;
        self.pending = None;
        self.state = RotationState::Transitioning { from, to };
        Transition { id, from, to }
    }
}

impl Default for RotationMachine {
    fn default() -> Self {
        Self::new()
    }
}
