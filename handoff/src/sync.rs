//! Synchronization primitives for the hand-off.
//!
//! This module provides the capacity-one slot both worker loops share.

pub mod slot;

pub use slot::{HandoffSlot, InterruptPolicy, Role, SlotGuard, SlotStats};
