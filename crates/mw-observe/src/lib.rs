//! Logging bootstrap shared by every wall process.
mod logger;
pub use logger::*;
