#[cfg(feature = "timezone-sync")]
pub mod timezone_sync;
