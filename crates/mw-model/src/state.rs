use serde::{Deserialize, Serialize};

use crate::{
    DEFAULT_INTERVAL_MS, content,
    domain::{Flag, IntervalMs},
    group::LayoutMode,
};

/// Operator edit state of one controller.
///
/// This is what controllers persist and what `controller-sync` envelopes carry between
/// peers. `products` keeps the raw operator text; [`ControllerState::items`] splits it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ControllerState {
    pub interval_seconds: i64,
    pub products: String,
    pub layout_mode: LayoutMode,
    pub is_running: bool,
    pub production_mode: Flag,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            interval_seconds: (DEFAULT_INTERVAL_MS / 1_000) as i64,
            products: String::new(),
            layout_mode: LayoutMode::Card,
            is_running: false,
            production_mode: Flag::disabled(),
        }
    }
}

impl ControllerState {
    /// Interval to publish: positive seconds times 1000, the default otherwise.
    ///
    /// Values whose milliseconds do not fit the wire's signed field also get the default.
    pub fn interval_ms(&self) -> IntervalMs {
        u64::try_from(self.interval_seconds)
            .ok()
            .filter(|s| *s > 0)
            .and_then(|s| s.checked_mul(1_000))
            .filter(|ms| i64::try_from(*ms).is_ok())
            .unwrap_or(DEFAULT_INTERVAL_MS)
    }

    /// Content items parsed from the raw operator text.
    pub fn items(&self) -> Vec<String> {
        content::parse_products(&self.products)
    }
}
