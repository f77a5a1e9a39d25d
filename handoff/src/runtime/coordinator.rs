//! Coordinator: owns the slot, runs both loops on their own threads, joins
//! them and announces completion.
//!
//! # Thread Model
//!
//! ```text
//!            ┌──────────────┐
//!            │ coordinator  │ spawn producer, spawn consumer, join, join
//!            └──────┬───────┘
//!          ┌────────┴────────┐
//!          ▼                 ▼
//!  ┌───────────────┐  ┌───────────────┐
//!  │   producer    │  │   consumer    │
//!  │ put + pause   │  │ take + report │
//!  └───────┬───────┘  └───────┬───────┘
//!          └───── slot ───────┘
//! ```
//!
//! The producer is started first by convention only; the slot's protocol is
//! correct in either order.

use std::fmt::Display;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::clock::{Source, UnixMillis};
use crate::config::HandoffConfig;
use crate::error::HandoffError;
use crate::report::{Event, Report, StderrReport};
use crate::runtime::{ConsumerLoop, ProducerLoop};
use crate::sync::{HandoffSlot, Role, SlotStats};
use crate::trace::{debug, error, info};

/// Result of a worker loop: completed iterations or why it stopped.
pub type Outcome = Result<usize, HandoffError>;

/// What happened to both loops once they were joined.
#[derive(Debug)]
pub struct HandoffSummary {
    pub producer: Outcome,
    pub consumer: Outcome,
    pub stats: SlotStats,
}

impl HandoffSummary {
    /// Returns `true` if both loops ran all `iterations`.
    #[must_use]
    pub fn is_complete(&self, iterations: usize) -> bool {
        matches!(self.producer, Ok(n) if n == iterations)
            && matches!(self.consumer, Ok(n) if n == iterations)
    }
}

/// Builds and starts hand-off runs.
pub struct Coordinator {
    config: HandoffConfig,
    report: Arc<dyn Report>,
    consumer_first: bool,
}

impl Coordinator {
    /// Creates a coordinator reporting to standard error.
    #[must_use]
    pub fn new(config: HandoffConfig) -> Self {
        Self {
            config,
            report: Arc::new(StderrReport),
            consumer_first: false,
        }
    }

    #[must_use]
    pub fn with_report(mut self, report: Arc<dyn Report>) -> Self {
        self.report = report;
        self
    }

    /// Starts the consumer thread before the producer thread.
    #[must_use]
    pub fn consumer_first(mut self) -> Self {
        self.consumer_first = true;
        self
    }

    /// Runs to completion with the wall-clock source.
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError::Spawn`] if a worker thread cannot be created.
    pub fn run(&self) -> Result<HandoffSummary, HandoffError> {
        Ok(self.spawn()?.join())
    }

    /// Starts both loops with the wall-clock source.
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError::Spawn`] if a worker thread cannot be created.
    pub fn spawn(&self) -> Result<Handoff<String>, HandoffError> {
        self.spawn_with(UnixMillis::new())
    }

    /// Starts both loops, the producer drawing items from `source`.
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError::Spawn`] if a worker thread cannot be created.
    /// A worker that was already started finds the slot closed and winds
    /// down on its own.
    pub fn spawn_with<T, S>(&self, source: S) -> Result<Handoff<T>, HandoffError>
    where
        T: Display + Send + 'static,
        S: Source<T> + 'static,
    {
        info!(
            iterations = self.config.iterations,
            pause_ms = self.config.pause.as_millis() as u64,
            policy = ?self.config.policy,
            "hand-off starting"
        );

        let slot = Arc::new(HandoffSlot::with_policy(self.config.policy));

        let producer = ProducerLoop::new(
            Arc::clone(&slot),
            source,
            Arc::clone(&self.report),
            &self.config,
        );
        let consumer = ConsumerLoop::new(Arc::clone(&slot), Arc::clone(&self.report), &self.config);

        let mut handoff = Handoff {
            slot,
            report: Arc::clone(&self.report),
            producer: None,
            consumer: None,
        };

        if self.consumer_first {
            handoff.consumer = Some(spawn_worker(&handoff.slot, Role::Consumer, move || {
                consumer.run()
            })?);
            handoff.producer = Some(spawn_worker(&handoff.slot, Role::Producer, move || {
                producer.run()
            })?);
        } else {
            handoff.producer = Some(spawn_worker(&handoff.slot, Role::Producer, move || {
                producer.run()
            })?);
            handoff.consumer = Some(spawn_worker(&handoff.slot, Role::Consumer, move || {
                consumer.run()
            })?);
        }

        Ok(handoff)
    }
}

/// A running hand-off.
///
/// Dropping the handle without calling [`Handoff::join`] closes the slot so
/// both threads wind down, but does not wait for them.
pub struct Handoff<T> {
    slot: Arc<HandoffSlot<T>>,
    report: Arc<dyn Report>,
    producer: Option<JoinHandle<Outcome>>,
    consumer: Option<JoinHandle<Outcome>>,
}

impl<T> Handoff<T> {
    /// Delivers an interruption to one of the loops.
    pub fn interrupt(&self, role: Role) {
        self.slot.interrupt(role);
    }

    /// Waits for the producer, then the consumer, then emits `Finished`.
    ///
    /// Waits are unbounded. A worker that panicked is logged and recorded as
    /// [`HandoffError::Panicked`]; the other worker is still joined.
    pub fn join(mut self) -> HandoffSummary {
        let producer = join_worker(self.producer.take(), Role::Producer);
        let consumer = join_worker(self.consumer.take(), Role::Consumer);

        self.report.event(&Event::Finished);
        info!("hand-off finished");

        HandoffSummary {
            producer,
            consumer,
            stats: self.slot.stats(),
        }
    }
}

impl<T> Drop for Handoff<T> {
    fn drop(&mut self) {
        if self.producer.is_some() || self.consumer.is_some() {
            debug!("hand-off dropped before join, closing slot");
            self.slot.close();
        }
    }
}

/// Closes the slot if its worker unwinds, so the peer is not left waiting.
struct CloseOnPanic<T>(Arc<HandoffSlot<T>>);

impl<T> Drop for CloseOnPanic<T> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.close();
        }
    }
}

fn spawn_worker<T, F>(
    slot: &Arc<HandoffSlot<T>>,
    role: Role,
    work: F,
) -> Result<JoinHandle<Outcome>, HandoffError>
where
    T: Send + 'static,
    F: FnOnce() -> Outcome + Send + 'static,
{
    debug!(%role, "spawning worker thread");
    let close_on_panic = CloseOnPanic(Arc::clone(slot));

    thread::Builder::new()
        .name(format!("handoff-{}", role.name().to_ascii_lowercase()))
        .spawn(move || {
            let _close_on_panic = close_on_panic;
            info!(%role, "worker thread started");
            let outcome = work();
            info!(%role, ok = outcome.is_ok(), "worker thread exiting");
            outcome
        })
        .map_err(|source| {
            error!(%role, error = %source, "failed to spawn worker thread");
            // Whatever already runs must not wait on a peer that never came.
            slot.close();
            HandoffError::Spawn { role, source }
        })
}

fn join_worker(handle: Option<JoinHandle<Outcome>>, role: Role) -> Outcome {
    let Some(handle) = handle else {
        return Err(HandoffError::Closed);
    };

    debug!(%role, "waiting for worker thread to exit");
    handle.join().unwrap_or_else(|_| {
        error!(%role, "worker thread panicked");
        Err(HandoffError::Panicked { role })
    })
}
