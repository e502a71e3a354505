//! Group configuration as consumed from the CRUD layer.
//!
//! Screens fetch a [`ConfigSnapshot`] once at startup to learn which group (and therefore
//! which channel) they belong to; afterwards only envelopes change their configuration.
mod layout;
pub use layout::LayoutMode;

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    domain::{Flag, GroupId, InstanceId, IntervalMs, Position},
    error::{ModelError, ModelResult},
};

/// Whether a group rotates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GroupKind {
    /// Items rotate on a shared epoch.
    #[default]
    Carousel,
    /// `products[0]` is shown forever; rotation envelopes are ignored.
    Static,
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GroupKind::Carousel => "carousel",
            GroupKind::Static => "static",
        })
    }
}

impl FromStr for GroupKind {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "carousel" => Ok(GroupKind::Carousel),
            "static" => Ok(GroupKind::Static),
            other => Err(ModelError::UnknownGroupKind(other.to_string())),
        }
    }
}

/// One content group.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: GroupId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub kind: GroupKind,
    #[serde(default)]
    pub products: Vec<String>,
    #[serde(default)]
    pub layout_mode: LayoutMode,
    #[serde(default)]
    pub production_mode: Flag,
    /// Mandatory for carousel groups, ignored for static ones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_seconds: Option<u64>,
}

impl Group {
    /// Validate kind-specific invariants.
    ///
    /// Rules:
    /// - `id` is not empty;
    /// - carousel groups carry a positive `intervalSeconds` whose milliseconds fit an `i64`.
    pub fn validate(&self) -> ModelResult<()> {
        if self.id.is_empty() {
            return Err(ModelError::Invalid("group id is empty".into()));
        }
        if self.kind == GroupKind::Carousel && !matches!(self.interval_seconds, Some(s) if s > 0) {
            return Err(ModelError::Invalid(format!(
                "carousel group '{}' requires a positive intervalSeconds",
                self.id
            )));
        }
        if self.kind == GroupKind::Carousel && self.interval_ms().is_none() {
            return Err(ModelError::Invalid(format!(
                "carousel group '{}' has an out-of-range intervalSeconds",
                self.id
            )));
        }
        Ok(())
    }

    /// Rotation interval in milliseconds, `None` for static groups.
    pub fn interval_ms(&self) -> Option<IntervalMs> {
        match self.kind {
            GroupKind::Carousel => self
                .interval_seconds
                .and_then(|s| s.checked_mul(1_000))
                .filter(|ms| i64::try_from(*ms).is_ok()),
            GroupKind::Static => None,
        }
    }

    pub fn is_static(&self) -> bool {
        self.kind == GroupKind::Static
    }
}

/// Where one screen sits in the wall.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenIdentity {
    pub instance_id: InstanceId,
    pub group_id: GroupId,
    /// Phase offset relative to screen 0 of the same group.
    pub position: Position,
}

impl ScreenIdentity {
    pub fn new(instance_id: InstanceId, group_id: GroupId, position: Position) -> Self {
        Self {
            instance_id,
            group_id,
            position,
        }
    }
}

impl fmt::Display for ScreenIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.instance_id, self.group_id, self.position)
    }
}

/// Read-only configuration fetched once per screen at startup.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSnapshot {
    #[serde(default)]
    pub ad_groups: Vec<Group>,
    /// Screen position to group assignment.
    #[serde(default)]
    pub screen_assignments: BTreeMap<Position, GroupId>,
}

impl ConfigSnapshot {
    /// Parse a snapshot from JSON and validate every group.
    pub fn from_json(bytes: &[u8]) -> ModelResult<Self> {
        let snapshot: Self =
            serde_json::from_slice(bytes).map_err(|e| ModelError::Decode(e.to_string()))?;
        for group in &snapshot.ad_groups {
            group.validate()?;
        }
        Ok(snapshot)
    }

    /// Look up a group by id.
    pub fn group(&self, id: &GroupId) -> Option<&Group> {
        self.ad_groups.iter().find(|g| &g.id == id)
    }

    /// Resolve the group assigned to a screen position.
    pub fn group_for_position(&self, position: Position) -> Option<&Group> {
        self.screen_assignments
            .get(&position)
            .and_then(|id| self.group(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn carousel(id: &str, secs: Option<u64>) -> Group {
        Group {
            id: GroupId::from(id),
            name: id.to_uppercase(),
            kind: GroupKind::Carousel,
            products: vec!["A".into(), "B".into()],
            layout_mode: LayoutMode::Card,
            production_mode: Flag::disabled(),
            interval_seconds: secs,
        }
    }

    #[test]
    fn carousel_requires_interval() {
        assert!(carousel("g", Some(10)).validate().is_ok());
        assert!(carousel("g", None).validate().is_err());
        assert!(carousel("g", Some(0)).validate().is_err());
    }

    #[test]
    fn oversized_interval_is_rejected_not_overflowed() {
        let huge = carousel("g", Some(u64::MAX / 10));
        assert_eq!(huge.interval_ms(), None);
        assert!(matches!(huge.validate(), Err(ModelError::Invalid(_))));
    }

    #[test]
    fn static_group_ignores_interval() {
        let mut g = carousel("g", None);
        g.kind = GroupKind::Static;
        assert!(g.validate().is_ok());
        assert_eq!(g.interval_ms(), None);
    }

    #[test]
    fn snapshot_resolves_position_to_group() {
        let raw = br#"{
            "adGroups": [
                {"id": "lobby", "kind": "carousel", "products": ["A","B","C"], "intervalSeconds": 10},
                {"id": "menu", "kind": "static", "products": ["M"]}
            ],
            "screenAssignments": {"0": "lobby", "1": "lobby", "2": "menu"}
        }"#;
        let snapshot = ConfigSnapshot::from_json(raw).unwrap();

        assert_eq!(snapshot.group_for_position(1).unwrap().id.as_str(), "lobby");
        assert!(snapshot.group_for_position(2).unwrap().is_static());
        assert!(snapshot.group_for_position(9).is_none());
        assert_eq!(snapshot.group(&GroupId::from("lobby")).unwrap().interval_ms(), Some(10_000));
    }

    #[test]
    fn snapshot_rejects_invalid_groups() {
        let raw = br#"{"adGroups": [{"id": "lobby", "kind": "carousel"}]}"#;
        assert!(matches!(
            ConfigSnapshot::from_json(raw),
            Err(ModelError::Invalid(_))
        ));
    }
}
