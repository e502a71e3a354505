//! Channel router deriving one broadcast channel per `(instance, group)` pair.
//!
//! Naming follows the active transport's scheme:
//! - relay: `<prefix>-<instance>-<group>`
//! - local: `<prefix>::<instance>::<group>`
//!
//! Id components are escaped (`_` → `__`, `-` → `_-`, `:` → `_:`) before joining, so the
//! mapping stays injective even when ids contain the separator characters.
use std::fmt;

use mw_model::{DEFAULT_LOCAL_PREFIX, DEFAULT_RELAY_PREFIX, GroupId, InstanceId};
use tracing::trace;

use crate::error::CoreError;

/// Channel naming scheme of a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelScheme {
    /// Hosted pub/sub relay reachable across devices.
    Relay { prefix: String },
    /// Same-device broadcast.
    Local { prefix: String },
}

impl ChannelScheme {
    pub fn relay() -> Self {
        Self::Relay {
            prefix: DEFAULT_RELAY_PREFIX.to_string(),
        }
    }

    pub fn local() -> Self {
        Self::Local {
            prefix: DEFAULT_LOCAL_PREFIX.to_string(),
        }
    }

    fn prefix(&self) -> &str {
        match self {
            ChannelScheme::Relay { prefix } | ChannelScheme::Local { prefix } => prefix,
        }
    }

    fn separator(&self) -> &'static str {
        match self {
            ChannelScheme::Relay { .. } => "-",
            ChannelScheme::Local { .. } => "::",
        }
    }
}

/// Fully derived channel name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelName(String);

impl ChannelName {
    /// Wrap an already derived name (e.g. one received over HTTP).
    pub fn from_raw(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Deterministic, side-effect free channel derivation.
#[derive(Debug, Clone)]
pub struct ChannelRouter {
    scheme: ChannelScheme,
}

impl ChannelRouter {
    pub fn new(scheme: ChannelScheme) -> Self {
        Self { scheme }
    }

    pub fn scheme(&self) -> &ChannelScheme {
        &self.scheme
    }

    /// Derive the channel for a tenant instance and content group.
    ///
    /// Both ids must be non-empty; an empty component would make the group
    /// indistinguishable from a sibling scope.
    pub fn channel_for(
        &self,
        instance: &InstanceId,
        group: &GroupId,
    ) -> Result<ChannelName, CoreError> {
        if instance.is_empty() {
            return Err(CoreError::Routing("instance id is empty".into()));
        }
        if group.is_empty() {
            return Err(CoreError::Routing("group id is empty".into()));
        }

        let sep = self.scheme.separator();
        let name = format!(
            "{prefix}{sep}{instance}{sep}{group}",
            prefix = self.scheme.prefix(),
            instance = escape(instance.as_str()),
            group = escape(group.as_str()),
        );
        trace!(channel = %name, "channel derived");
        Ok(ChannelName(name))
    }
}

fn escape(component: &str) -> String {
    let mut out = String::with_capacity(component.len());
    for ch in component.chars() {
        if matches!(ch, '_' | '-' | ':') {
            out.push('_');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(i: &str, g: &str) -> (InstanceId, GroupId) {
        (InstanceId::from(i), GroupId::from(g))
    }

    #[test]
    fn relay_and_local_names_follow_their_scheme() {
        let (i, g) = ids("shop1", "lobby");

        let relay = ChannelRouter::new(ChannelScheme::relay());
        assert_eq!(relay.channel_for(&i, &g).unwrap().as_str(), "rotation-shop1-lobby");

        let local = ChannelRouter::new(ChannelScheme::local());
        assert_eq!(
            local.channel_for(&i, &g).unwrap().as_str(),
            "multiwall::shop1::lobby"
        );
    }

    #[test]
    fn derivation_is_deterministic() {
        let router = ChannelRouter::new(ChannelScheme::relay());
        let (i, g) = ids("a", "b");
        assert_eq!(
            router.channel_for(&i, &g).unwrap(),
            router.channel_for(&i, &g).unwrap()
        );
    }

    #[test]
    fn separator_in_ids_does_not_collide() {
        for scheme in [ChannelScheme::relay(), ChannelScheme::local()] {
            let router = ChannelRouter::new(scheme);
            let pairs = [
                ids("a-b", "c"),
                ids("a", "b-c"),
                ids("a_", "-c"),
                ids("a::b", "c"),
                ids("a", "b::c"),
                ids("a:", ":c"),
            ];
            let names: Vec<_> = pairs
                .iter()
                .map(|(i, g)| router.channel_for(i, g).unwrap())
                .collect();
            for (x, a) in names.iter().enumerate() {
                for b in names.iter().skip(x + 1) {
                    assert_ne!(a, b);
                }
            }
        }
    }

    #[test]
    fn empty_ids_are_rejected() {
        let router = ChannelRouter::new(ChannelScheme::relay());
        let (i, g) = ids("", "g");
        assert!(matches!(router.channel_for(&i, &g), Err(CoreError::Routing(_))));
        let (i, g) = ids("i", "");
        assert!(router.channel_for(&i, &g).is_err());
    }
}
