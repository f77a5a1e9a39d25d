//! Hand-off demonstration binary.
//!
//! Runs one producer and one consumer through a single-slot buffer and writes
//! the lock protocol to standard error.
//!
//! # Usage
//!
//! ```sh
//! handoff
//! HANDOFF_ITERATIONS=3 HANDOFF_PAUSE_MS=10 handoff
//! RUST_LOG=handoff=trace handoff
//! ```
//!
//! # Environment
//!
//! - `HANDOFF_ITERATIONS`: items to hand off (default: 20)
//! - `HANDOFF_PAUSE_MS`: producer pause after each item (default: 2000)
//! - `HANDOFF_INTERRUPT_POLICY`: `resume` or `abort` (default: resume)

use handoff::{Coordinator, HandoffConfig, HandoffError};

fn main() {
    if let Err(e) = run() {
        eprintln!("handoff: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), HandoffError> {
    handoff::init_tracing();

    let config = HandoffConfig::from_env()?;

    // Worker failures were already logged; they do not change the exit code.
    Coordinator::new(config).run()?;
    Ok(())
}
