//! Consumer side of the hand-off.

use std::fmt::Display;
use std::sync::Arc;

use crate::config::HandoffConfig;
use crate::error::HandoffError;
use crate::report::{Event, Report};
use crate::sync::{HandoffSlot, Role};
use crate::trace::{debug, trace, warn};

/// Withdraws and reports an item a fixed number of times. Never pauses.
pub struct ConsumerLoop<T> {
    slot: Arc<HandoffSlot<T>>,
    report: Arc<dyn Report>,
    iterations: usize,
}

impl<T: Display> ConsumerLoop<T> {
    pub fn new(slot: Arc<HandoffSlot<T>>, report: Arc<dyn Report>, config: &HandoffConfig) -> Self {
        Self {
            slot,
            report,
            iterations: config.iterations,
        }
    }

    /// Runs every iteration and returns how many were completed.
    ///
    /// On failure the slot is closed so the producer does not wait forever.
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError::Closed`] if the producer gave up, or
    /// [`HandoffError::Interrupted`] if the consumer was interrupted under
    /// [`crate::sync::InterruptPolicy::Abort`].
    pub fn run(self) -> Result<usize, HandoffError> {
        for iteration in 0..self.iterations {
            if let Err(e) = self.step(iteration) {
                warn!(iteration, error = %e, "consumer stopping early");
                self.slot.close();
                return Err(e);
            }
        }

        debug!(iterations = self.iterations, "consumer finished");
        Ok(self.iterations)
    }

    fn step(&self, iteration: usize) -> Result<(), HandoffError> {
        let taken = {
            let mut guard = self.slot.lock();
            self.report.event(&Event::Locked(Role::Consumer));
            let taken = guard.take();
            // Reported before the guard drops so the value precedes "unlocking".
            if let Ok(item) = &taken {
                self.report.event(&Event::Consumed(item.to_string()));
            }
            taken
        };
        self.report.event(&Event::Unlocking(Role::Consumer));

        taken?;

        trace!(iteration, "withdrawn");
        Ok(())
    }
}
