//! Screen side of the engine.
//!
//! [`ScreenSyncState`] is a synchronous state machine fed through an event queue;
//! [`ScreenRuntime`] connects it to a transport, a clock and a [`Presenter`].
mod frame;
pub use frame::{Frame, ScreenStatus, Slides};

mod journal;

mod state;
pub use state::{DEFAULT_TRANSITION_MS, ScreenConfig, ScreenEffect, ScreenEvent, ScreenSyncState};

mod runtime;
pub use runtime::{LogPresenter, Presenter, ScreenRuntime};
