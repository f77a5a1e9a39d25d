//! The diagnostic stream: what the hand-off tells the outside world.
//!
//! Each [`Event`] renders as exactly one line. [`StderrReport`] is what the
//! binary uses; [`MemoryReport`] keeps events around so tests can check
//! ordering.

use std::fmt;
use std::io::Write;

use parking_lot::Mutex;

use crate::sync::Role;

/// One line of the diagnostic stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// `<Role>: locked sb`
    Locked(Role),
    /// `<Role>: unlocking sb`
    Unlocking(Role),
    /// `sb: <value>`, emitted by the consumer while it still holds the slot.
    Consumed(String),
    /// `Finished`, emitted once after both loops are joined.
    Finished,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Locked(role) => write!(f, "{role}: locked sb"),
            Self::Unlocking(role) => write!(f, "{role}: unlocking sb"),
            Self::Consumed(value) => write!(f, "sb: {value}"),
            Self::Finished => f.write_str("Finished"),
        }
    }
}

/// Sink for diagnostic events. Shared by both worker threads.
pub trait Report: Send + Sync {
    fn event(&self, event: &Event);
}

/// Writes each event as a line on standard error.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrReport;

impl Report for StderrReport {
    fn event(&self, event: &Event) {
        // A closed stderr is not worth failing a hand-off over.
        let _ = writeln!(std::io::stderr().lock(), "{event}");
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReport;

impl Report for NullReport {
    fn event(&self, _event: &Event) {}
}

/// Records events in arrival order.
#[derive(Debug, Default)]
pub struct MemoryReport {
    events: Mutex<Vec<Event>>,
}

impl MemoryReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Rendered lines, as [`StderrReport`] would have written them.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.events.lock().iter().map(ToString::to_string).collect()
    }

    /// Values the consumer reported, in order.
    #[must_use]
    pub fn consumed(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                Event::Consumed(value) => Some(value.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Report for MemoryReport {
    fn event(&self, event: &Event) {
        self.events.lock().push(event.clone());
    }
}
