//! Well-known protocol constants shared by publishers and receivers.

/// Interval substituted when an envelope carries no usable `intervalMs`.
pub const DEFAULT_INTERVAL_MS: u64 = 10_000;

/// Event name every rotation envelope is published under.
pub const ROTATION_EVENT: &str = "rotation-event";

/// Channel prefix used on the hosted relay (`<prefix>-<instance>-<group>`).
pub const DEFAULT_RELAY_PREFIX: &str = "rotation";

/// Channel prefix used by the same-device broadcast (`<prefix>::<instance>::<group>`).
pub const DEFAULT_LOCAL_PREFIX: &str = "multiwall";
