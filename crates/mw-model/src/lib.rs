mod domain;
pub use domain::{
    DEFAULT_INTERVAL_MS, DEFAULT_LOCAL_PREFIX, DEFAULT_RELAY_PREFIX, ROTATION_EVENT,
};
pub use domain::{EpochMs, Flag, GroupId, InstanceId, IntervalMs, Position, Sequence, SessionId};

mod error;
pub use error::{ModelError, ModelResult};

mod envelope;
pub use envelope::{Envelope, MessageType};

mod group;
pub use group::{ConfigSnapshot, Group, GroupKind, LayoutMode, ScreenIdentity};

mod state;
pub use state::ControllerState;

pub mod content;
