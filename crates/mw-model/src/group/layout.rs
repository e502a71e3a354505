use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize, Serializer};

use crate::error::{ModelError, ModelResult};

/// How screens present each content item.
///
/// - `Card`: the full HTML fragment (default).
/// - `Image`: minimal layout, only the first `<img>` tag of every item is published.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LayoutMode {
    #[default]
    Card,
    Image,
}

impl LayoutMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutMode::Card => "card",
            LayoutMode::Image => "image",
        }
    }
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutMode {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "card" | "" => Ok(LayoutMode::Card),
            "image" | "minimal" => Ok(LayoutMode::Image),
            other => Err(ModelError::UnknownLayout(other.to_string())),
        }
    }
}

impl Serialize for LayoutMode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Unknown layout names decode as `Card` so that newer publishers never break older screens.
impl<'de> Deserialize<'de> for LayoutMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from_str(&s).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitive() {
        assert_eq!("IMAGE".parse::<LayoutMode>().unwrap(), LayoutMode::Image);
        assert_eq!(" card ".parse::<LayoutMode>().unwrap(), LayoutMode::Card);
        assert!("carousel".parse::<LayoutMode>().is_err());
    }

    #[test]
    fn unknown_wire_value_decodes_as_card() {
        let mode: LayoutMode = serde_json::from_str("\"hologram\"").unwrap();
        assert_eq!(mode, LayoutMode::Card);
    }
}
