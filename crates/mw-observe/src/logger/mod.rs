mod config;
mod error;
mod install;
mod object;
mod tasks;

pub use config::LoggerConfig;
pub use error::{LoggerError, LoggerResult};
pub use object::{LogClock, LoggerFormat, LoggerLevel, LoggerTimeZone, init_local_offset};

#[cfg(feature = "timezone-sync")]
pub use tasks::timezone_sync::{TZ_SYNC_PERIOD, timezone_sync};

/// Install the global tracing subscriber described by `cfg`.
///
/// With [`LoggerTimeZone::Local`], call [`init_local_offset`] first, while the process is
/// still single-threaded.
///
/// # Examples
/// ```rust
/// use mw_observe::{LoggerConfig, init_logger};
///
/// let config = LoggerConfig::default();
/// init_logger(&config).expect("logger");
/// tracing::info!("wall starting");
/// ```
pub fn init_logger(cfg: &LoggerConfig) -> LoggerResult<()> {
    match cfg.format {
        LoggerFormat::Text => install::text(cfg),
        LoggerFormat::Json => install::json(cfg),
        LoggerFormat::Journald => install::journald(cfg),
    }
}
