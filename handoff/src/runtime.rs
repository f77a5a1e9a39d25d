//! Worker loops and the coordinator that runs them.

pub mod consumer;
pub mod coordinator;
pub mod producer;

pub use consumer::ConsumerLoop;
pub use coordinator::{Coordinator, Handoff, HandoffSummary, Outcome};
pub use producer::ProducerLoop;
