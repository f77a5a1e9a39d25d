//! Single-slot hand-off between one producer thread and one consumer thread.
//!
//! The slot is a monitor: one mutex, two condition variables, predicate-wait
//! loops. The producer publishes a timestamp, the consumer withdraws and
//! reports it, and the two strictly alternate.
//!
//! ```no_run
//! use handoff::{Coordinator, HandoffConfig};
//!
//! let summary = Coordinator::new(HandoffConfig::default()).run().unwrap();
//! assert!(summary.is_complete(20));
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod report;
pub mod runtime;
pub mod sync;
pub mod trace;

pub use config::HandoffConfig;
pub use error::HandoffError;
pub use runtime::{Coordinator, Handoff, HandoffSummary};
pub use sync::{HandoffSlot, InterruptPolicy, Role};
pub use trace::init_tracing;
