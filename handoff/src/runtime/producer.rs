//! Producer side of the hand-off.

use std::sync::Arc;
use std::time::Duration;

use crate::clock::Source;
use crate::config::HandoffConfig;
use crate::error::HandoffError;
use crate::report::{Event, Report};
use crate::sync::{HandoffSlot, Role};
use crate::trace::{debug, trace, warn};

/// Publishes a fresh item into the slot a fixed number of times, pausing
/// after each publish.
pub struct ProducerLoop<T, S> {
    slot: Arc<HandoffSlot<T>>,
    source: S,
    report: Arc<dyn Report>,
    iterations: usize,
    pause: Duration,
}

impl<T, S> ProducerLoop<T, S>
where
    S: Source<T>,
{
    pub fn new(
        slot: Arc<HandoffSlot<T>>,
        source: S,
        report: Arc<dyn Report>,
        config: &HandoffConfig,
    ) -> Self {
        Self {
            slot,
            source,
            report,
            iterations: config.iterations,
            pause: config.pause,
        }
    }

    /// Runs every iteration and returns how many were completed.
    ///
    /// On failure the slot is closed so the consumer does not wait forever.
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError::Closed`] if the consumer gave up, or
    /// [`HandoffError::Interrupted`] if the producer was interrupted under
    /// [`crate::sync::InterruptPolicy::Abort`].
    pub fn run(mut self) -> Result<usize, HandoffError> {
        for iteration in 0..self.iterations {
            if let Err(e) = self.step(iteration) {
                warn!(iteration, error = %e, "producer stopping early");
                self.slot.close();
                return Err(e);
            }
        }

        debug!(iterations = self.iterations, "producer finished");
        Ok(self.iterations)
    }

    fn step(&mut self, iteration: usize) -> Result<(), HandoffError> {
        let item = self.source.next_item();

        let stored = {
            let mut guard = self.slot.lock();
            self.report.event(&Event::Locked(Role::Producer));
            guard.put(item)
        };
        self.report.event(&Event::Unlocking(Role::Producer));
        stored?;

        trace!(iteration, "published");
        self.slot.pause(Role::Producer, self.pause)
    }
}
