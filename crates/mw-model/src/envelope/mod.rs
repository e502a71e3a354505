//! Sequenced envelope wrapping every state change on a group channel.
//!
//! The wire format is a flat camelCase JSON object. Receivers ignore unknown fields and
//! fill absent optional ones with defaults (`intervalMs` = 10000, `layoutMode` = "card").
//! Only `type`, `sessionId` and `sequence` are required; an envelope without them is malformed.
mod kind;
pub use kind::MessageType;

use serde::{Deserialize, Serialize};

use crate::{
    DEFAULT_INTERVAL_MS,
    domain::{EpochMs, Flag, GroupId, InstanceId, Sequence, SessionId},
    error::{ModelError, ModelResult},
    group::LayoutMode,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Logical message type.
    #[serde(rename = "type")]
    pub kind: MessageType,
    /// Publisher-local timestamp, informational only.
    #[serde(default)]
    pub ts: f64,
    /// Publishing session.
    pub session_id: SessionId,
    /// Per-session logical clock value.
    pub sequence: Sequence,
    /// Index the publisher considers current when no epoch is supplied.
    #[serde(default)]
    pub start_index: u64,
    /// Rotation interval; non-positive values are replaced by the default on use.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: i64,
    /// Content items in rotation order.
    #[serde(default)]
    pub products: Vec<String>,
    #[serde(default)]
    pub layout_mode: LayoutMode,
    /// Target group; empty means "whatever group this channel belongs to".
    #[serde(default)]
    pub group_id: GroupId,
    /// Target tenant; empty means "whatever tenant this channel belongs to".
    #[serde(default)]
    pub instance_id: InstanceId,
    #[serde(default)]
    pub production_mode: Flag,
    /// Shared rotation epoch in wall-clock milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<EpochMs>,
}

fn default_interval_ms() -> i64 {
    DEFAULT_INTERVAL_MS as i64
}

impl Envelope {
    /// Create an envelope with every optional field at its default.
    pub fn new(kind: MessageType, session_id: SessionId, sequence: Sequence) -> Self {
        Self {
            kind,
            ts: 0.0,
            session_id,
            sequence,
            start_index: 0,
            interval_ms: default_interval_ms(),
            products: Vec::new(),
            layout_mode: LayoutMode::default(),
            group_id: GroupId::default(),
            instance_id: InstanceId::default(),
            production_mode: Flag::default(),
            start_time: None,
        }
    }

    /// Decode an envelope from raw transport bytes.
    pub fn decode(bytes: &[u8]) -> ModelResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| ModelError::Decode(e.to_string()))
    }

    /// Encode the envelope as a JSON object.
    pub fn encode(&self) -> ModelResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| ModelError::Encode(e.to_string()))
    }

    /// Interval to schedule with: the carried value if positive, the default otherwise.
    pub fn effective_interval_ms(&self) -> u64 {
        if self.interval_ms > 0 {
            self.interval_ms as u64
        } else {
            DEFAULT_INTERVAL_MS
        }
    }

    /// Returns `true` if the envelope is addressed to the given tenant and group.
    ///
    /// Empty ids on the envelope act as wildcards; channel scoping already did the routing.
    pub fn is_for(&self, instance: &InstanceId, group: &GroupId) -> bool {
        (self.instance_id.is_empty() || &self.instance_id == instance)
            && (self.group_id.is_empty() || &self.group_id == group)
    }

    pub fn with_products(mut self, products: Vec<String>) -> Self {
        self.products = products;
        self
    }

    pub fn with_interval_ms(mut self, interval_ms: u64) -> Self {
        self.interval_ms = i64::try_from(interval_ms).unwrap_or(i64::MAX);
        self
    }

    pub fn with_start_time(mut self, start_time: EpochMs) -> Self {
        self.start_time = Some(start_time);
        self
    }

    pub fn with_target(mut self, instance: InstanceId, group: GroupId) -> Self {
        self.instance_id = instance;
        self.group_id = group;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_envelope_fills_defaults() {
        let raw = br#"{"type":"init","sessionId":"s-1","sequence":42}"#;
        let env = Envelope::decode(raw).unwrap();

        assert_eq!(env.kind, MessageType::Init);
        assert_eq!(env.sequence, 42);
        assert_eq!(env.interval_ms, 10_000);
        assert_eq!(env.layout_mode, LayoutMode::Card);
        assert!(env.products.is_empty());
        assert!(env.start_time.is_none());
        assert!(env.production_mode.is_disabled());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let raw = br#"{"type":"stop","sessionId":"s","sequence":1,"shinyNewField":{"a":1}}"#;
        assert!(Envelope::decode(raw).is_ok());
    }

    #[test]
    fn missing_required_fields_are_malformed() {
        for raw in [
            br#"{"sessionId":"s","sequence":1}"#.as_slice(),
            br#"{"type":"init","sequence":1}"#.as_slice(),
            br#"{"type":"init","sessionId":"s"}"#.as_slice(),
            br#"not json"#.as_slice(),
        ] {
            let res = Envelope::decode(raw);
            assert!(matches!(res, Err(ModelError::Decode(_))), "accepted {raw:?}");
        }
    }

    #[test]
    fn full_envelope_uses_camel_case_keys() {
        let env = Envelope::new(MessageType::Init, SessionId::from("abc"), 7)
            .with_products(vec!["A".into()])
            .with_interval_ms(5_000)
            .with_start_time(1_000)
            .with_target(InstanceId::from("shop"), GroupId::from("lobby"));

        let value: serde_json::Value = serde_json::from_slice(&env.encode().unwrap()).unwrap();
        assert_eq!(value["type"], "init");
        assert_eq!(value["sessionId"], "abc");
        assert_eq!(value["intervalMs"], 5_000);
        assert_eq!(value["startTime"], 1_000);
        assert_eq!(value["groupId"], "lobby");
        assert_eq!(value["instanceId"], "shop");
        assert_eq!(value["layoutMode"], "card");
    }

    #[test]
    fn non_positive_interval_falls_back_to_default() {
        let mut env = Envelope::new(MessageType::Init, SessionId::from("s"), 1);
        env.interval_ms = 0;
        assert_eq!(env.effective_interval_ms(), DEFAULT_INTERVAL_MS);
        env.interval_ms = -300;
        assert_eq!(env.effective_interval_ms(), DEFAULT_INTERVAL_MS);
        env.interval_ms = 2_500;
        assert_eq!(env.effective_interval_ms(), 2_500);
    }

    #[test]
    fn empty_target_matches_any_group() {
        let inst = InstanceId::from("shop");
        let group = GroupId::from("lobby");

        let open = Envelope::new(MessageType::Tick, SessionId::from("s"), 1);
        assert!(open.is_for(&inst, &group));

        let other = open.with_target(inst.clone(), GroupId::from("bar"));
        assert!(!other.is_for(&inst, &group));
    }
}
