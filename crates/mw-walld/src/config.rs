use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::Context;
use mw_core::{
    router::ChannelScheme,
    screen::{DEFAULT_TRANSITION_MS, ScreenConfig},
    timer::DEFAULT_DRIFT_CHECK_MS,
};
use mw_model::{DEFAULT_LOCAL_PREFIX, DEFAULT_RELAY_PREFIX, InstanceId};
use mw_observe::LoggerConfig;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Daemon configuration file; every section may be omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WallConfig {
    pub logger: LoggerConfig,
    /// Tenant the daemon serves.
    pub instance: InstanceId,
    pub transport: TransportConfig,
    pub channels: ChannelConfig,
    pub timing: TimingConfig,
    /// Config snapshot (`{adGroups, screenAssignments}`) read once at startup.
    pub snapshot: Option<PathBuf>,
    pub relay: RelayConfig,
}

impl Default for WallConfig {
    fn default() -> Self {
        Self {
            logger: LoggerConfig::default(),
            instance: InstanceId::from("default"),
            transport: TransportConfig::default(),
            channels: ChannelConfig::default(),
            timing: TimingConfig::default(),
            snapshot: None,
            relay: RelayConfig::default(),
        }
    }
}

impl WallConfig {
    /// Load `path`, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }

    /// Channel scheme matching the configured transport.
    pub fn scheme(&self) -> ChannelScheme {
        match self.transport.kind {
            TransportKind::Local => ChannelScheme::Local {
                prefix: self.channels.local_prefix.clone(),
            },
            TransportKind::Relay => ChannelScheme::Relay {
                prefix: self.channels.relay_prefix.clone(),
            },
        }
    }

    pub fn screen(&self) -> ScreenConfig {
        ScreenConfig {
            drift_check_ms: self.timing.drift_check_ms,
            transition_ms: self.timing.transition_ms,
        }
    }
}

/// Which transport carries envelopes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransportKind {
    /// In-process broadcast. Only `demo` runs both ends in one daemon; standalone
    /// `screen` and `controller` processes refuse it.
    #[default]
    Local,
    /// Hosted relay reachable over HTTP.
    Relay,
}

impl FromStr for TransportKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "relay" => Ok(Self::Relay),
            other => Err(format!("unknown transport kind '{other}'")),
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransportKind::Local => "local",
            TransportKind::Relay => "relay",
        })
    }
}

impl Serialize for TransportKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TransportKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub kind: TransportKind,
    /// Relay base url, used when `kind` is `relay`.
    pub endpoint: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            kind: TransportKind::default(),
            endpoint: "http://127.0.0.1:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub relay_prefix: String,
    pub local_prefix: String,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            relay_prefix: DEFAULT_RELAY_PREFIX.to_string(),
            local_prefix: DEFAULT_LOCAL_PREFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub drift_check_ms: u64,
    pub transition_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            drift_check_ms: DEFAULT_DRIFT_CHECK_MS,
            transition_ms: DEFAULT_TRANSITION_MS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Listen address of the relay server.
    pub listen: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:3000".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let cfg: WallConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.transport.kind, TransportKind::Local);
        assert_eq!(cfg.channels.relay_prefix, "rotation");
        assert_eq!(cfg.channels.local_prefix, "multiwall");
        assert_eq!(cfg.timing.drift_check_ms, 5_000);
        assert_eq!(cfg.timing.transition_ms, 700);
        assert_eq!(cfg.relay.listen, "0.0.0.0:3000");
        assert!(cfg.snapshot.is_none());
        assert_eq!(cfg.instance.as_str(), "default");
    }

    #[test]
    fn transport_kind_is_case_insensitive() {
        let json = r#"{"transport": {"kind": "RELAY", "endpoint": "http://relay:3000"}}"#;
        let cfg: WallConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.transport.kind, TransportKind::Relay);
        assert_eq!(
            cfg.scheme(),
            ChannelScheme::Relay {
                prefix: "rotation".into()
            }
        );
        assert!(serde_json::from_str::<TransportKind>("\"carrier-pigeon\"").is_err());
    }

    #[test]
    fn timing_feeds_screen_config() {
        let json = r#"{"timing": {"drift_check_ms": 2500}}"#;
        let cfg: WallConfig = serde_json::from_str(json).unwrap();
        let screen = cfg.screen();
        assert_eq!(screen.drift_check_ms, 2_500);
        assert_eq!(screen.transition_ms, 700);
    }

    #[test]
    fn missing_path_means_defaults() {
        let cfg = WallConfig::load(None).unwrap();
        assert_eq!(cfg.transport.kind, TransportKind::Local);
    }
}
