//! Cross-subsystem integration scenarios.

pub mod action_lifecycle;
pub mod durability;
