//! Rotation state machine and per-screen phase offset.
mod machine;
mod offset;

pub use machine::{RotationMachine, RotationState, Transition};
pub use offset::product_index;
