pub mod clock;
pub mod controller;
pub mod error;
pub mod metrics;
pub mod rotation;
pub mod router;
pub mod screen;
pub mod sequence;
pub mod timer;
pub mod transport;

pub use metrics::{EnvelopeOutcome, MetricsBackend, MetricsHandle, NoOpMetrics, noop_metrics};

pub mod prelude {
    pub use crate::clock::{Clock, ClockHandle, ManualClock, SystemClock};
    pub use crate::controller::{Controller, ControllerAction, ControllerClient, ControllerRuntime};
    pub use crate::error::CoreError;
    pub use crate::router::{ChannelName, ChannelRouter, ChannelScheme};
    pub use crate::screen::{Frame, LogPresenter, Presenter, ScreenRuntime, ScreenSyncState};
    pub use crate::transport::{LocalBroadcast, Subscription, Transport, TransportError, TransportHandle};
}
