use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Logical type of a sequenced envelope.
///
/// - `Init`: new shared epoch; receivers snap to the derived index and arm their timers.
/// - `Tick`: explicit advance hint from older publishers.
/// - `Stop`: cancel timers and freeze the displayed index.
/// - `ConfigUpdate`: replace group configuration without touching the epoch.
/// - `ControllerSync`: full controller edit state, consumed by peer controllers only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageType {
    Init,
    Tick,
    Stop,
    ConfigUpdate,
    ControllerSync,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Init => "init",
            MessageType::Tick => "tick",
            MessageType::Stop => "stop",
            MessageType::ConfigUpdate => "config-update",
            MessageType::ControllerSync => "controller-sync",
        }
    }

    /// Returns `true` for types that drive screen rotation (`init`, `tick`, `stop`).
    pub fn is_rotation(&self) -> bool {
        matches!(
            self,
            MessageType::Init | MessageType::Tick | MessageType::Stop
        )
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "init" => Ok(MessageType::Init),
            "tick" => Ok(MessageType::Tick),
            "stop" => Ok(MessageType::Stop),
            "config-update" => Ok(MessageType::ConfigUpdate),
            "controller-sync" => Ok(MessageType::ControllerSync),
            other => Err(ModelError::UnknownMessageType(other.to_string())),
        }
    }
}
