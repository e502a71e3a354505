mod clock;
pub use clock::LogClock;

mod format;
pub use format::LoggerFormat;

mod level;
pub use level::LoggerLevel;

pub(crate) mod timezone;
pub use timezone::{LoggerTimeZone, init_local_offset};
