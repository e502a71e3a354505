//! Hosted pub/sub relay for walls spanning several devices.
//!
//! Two halves share one wire contract:
//! - [`RelayServer`]: axum service fanning `POST /trigger` payloads out to every open
//!   `GET /channels/{channel}/events/{event}` stream (newline-delimited JSON).
//! - [`RelayTransport`]: `mw_core::Transport` implementation talking to that service.
mod error;
pub use error::RelayError;

mod server;
pub use server::{RelayServer, TriggerRequest, serve};

mod client;
pub use client::RelayTransport;
