mod ids;
pub use ids::{GroupId, InstanceId, SessionId};

mod flag;
pub use flag::Flag;

mod constants;
pub use constants::{DEFAULT_INTERVAL_MS, DEFAULT_LOCAL_PREFIX, DEFAULT_RELAY_PREFIX, ROTATION_EVENT};

/// Per-session logical clock value carried by every envelope.
///
/// Derived from wall-clock milliseconds with a +1 tie-break, so it is strictly increasing
/// within one publishing process but carries no meaning across unrelated sessions.
pub type Sequence = u64;

/// Wall-clock instant in milliseconds since UNIX epoch.
pub type EpochMs = u64;

/// Rotation interval in milliseconds.
pub type IntervalMs = u64;

/// Rotation phase offset of a screen within its group.
pub type Position = u32;
