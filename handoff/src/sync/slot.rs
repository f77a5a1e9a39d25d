//! Capacity-one hand-off slot built as a monitor.
//!
//! One mutex guards the slot; two condition variables carry the
//! "slot became empty" and "slot became non-empty" transitions. Every wait is
//! a predicate loop, so a wake-up meant for someone else (or no one) simply
//! re-checks and goes back to sleep.
//!
//! # Overview
//!
//! - [`HandoffSlot::lock`] - take exclusive access and get a [`SlotGuard`]
//! - [`SlotGuard::put`] / [`SlotGuard::take`] - block in place, releasing the
//!   lock while suspended
//! - [`HandoffSlot::put`] / [`HandoffSlot::take`] - lock, operate, unlock
//! - [`HandoffSlot::interrupt`] - deliver an interruption to a waiting role
//! - [`HandoffSlot::close`] - make both sides give up
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::thread;
//!
//! use handoff::sync::HandoffSlot;
//!
//! let slot = Arc::new(HandoffSlot::new());
//! let consumer = {
//!     let slot = Arc::clone(&slot);
//!     thread::spawn(move || slot.take().unwrap())
//! };
//!
//! slot.put("1533427200000".to_string()).unwrap();
//! assert_eq!(consumer.join().unwrap(), "1533427200000");
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use minstant::Instant;
use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::error::HandoffError;
use crate::trace::{trace, warn};

/// Which side of the hand-off an operation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Producer,
    Consumer,
}

impl Role {
    /// Name used in the diagnostic stream.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Producer => "Producer",
            Self::Consumer => "Consumer",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Producer => 0,
            Self::Consumer => 1,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a waiter does when it wakes up to find itself interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterruptPolicy {
    /// Log the interruption and keep waiting. A pause is cut short.
    #[default]
    Resume,
    /// Log the interruption and fail the operation with
    /// [`HandoffError::Interrupted`].
    Abort,
}

impl FromStr for InterruptPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("resume") {
            Ok(Self::Resume)
        } else if s.eq_ignore_ascii_case("abort") {
            Ok(Self::Abort)
        } else {
            Err(())
        }
    }
}

/// Counters maintained by the slot under its lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SlotStats {
    /// Items stored.
    pub puts: u64,
    /// Items withdrawn.
    pub takes: u64,
    /// Highest number of stored-but-not-taken items ever seen.
    pub max_occupancy: u64,
    /// Interruptions observed by waiters.
    pub interrupts: u64,
}

struct State<T> {
    item: Option<T>,
    closed: bool,
    /// Pending interruption per role, indexed by [`Role::index`].
    pending: [bool; 2],
    stats: SlotStats,
}

/// Single-item buffer shared by one producer and one consumer.
pub struct HandoffSlot<T> {
    state: Mutex<State<T>>,
    /// Signalled when the slot goes from occupied to empty.
    emptied: Condvar,
    /// Signalled when the slot goes from empty to occupied.
    filled: Condvar,
    /// Wakes a role sleeping in [`HandoffSlot::pause`].
    alarm: Condvar,
    policy: InterruptPolicy,
}

impl<T> Default for HandoffSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> HandoffSlot<T> {
    /// Creates an empty slot with the [`InterruptPolicy::Resume`] policy.
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(InterruptPolicy::default())
    }

    /// Creates an empty slot with the given interruption policy.
    #[must_use]
    pub fn with_policy(policy: InterruptPolicy) -> Self {
        Self {
            state: Mutex::new(State {
                item: None,
                closed: false,
                pending: [false; 2],
                stats: SlotStats::default(),
            }),
            emptied: Condvar::new(),
            filled: Condvar::new(),
            alarm: Condvar::new(),
            policy,
        }
    }

    /// Acquires exclusive access to the slot.
    ///
    /// The lock is held until the returned guard is dropped, except while the
    /// guard is suspended inside [`SlotGuard::put`] or [`SlotGuard::take`].
    pub fn lock(&self) -> SlotGuard<'_, T> {
        SlotGuard {
            slot: self,
            state: self.state.lock(),
        }
    }

    /// Stores `item`, waiting for the slot to become empty first.
    ///
    /// # Errors
    ///
    /// See [`SlotGuard::put`].
    pub fn put(&self, item: T) -> Result<(), HandoffError> {
        self.lock().put(item)
    }

    /// Withdraws the item, waiting for one to arrive first.
    ///
    /// # Errors
    ///
    /// See [`SlotGuard::take`].
    pub fn take(&self) -> Result<T, HandoffError> {
        self.lock().take()
    }

    /// Delivers an interruption to `role`.
    ///
    /// If the role is suspended in a wait or a pause it wakes up and applies
    /// the slot's [`InterruptPolicy`]. Otherwise the interruption stays
    /// pending until the role next has to wait.
    pub fn interrupt(&self, role: Role) {
        {
            let mut state = self.state.lock();
            state.pending[role.index()] = true;
        }
        trace!(%role, "interrupt raised");
        self.wake_all();
    }

    /// Closes the slot and wakes every waiter.
    ///
    /// Subsequent puts fail with [`HandoffError::Closed`]. Takes still drain
    /// a stored item, then fail the same way.
    pub fn close(&self) {
        {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
        }
        trace!("slot closed");
        self.wake_all();
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Snapshot of the slot's counters.
    #[must_use]
    pub fn stats(&self) -> SlotStats {
        self.state.lock().stats
    }

    /// Sleeps for `duration` without holding the slot, unless `role` is
    /// interrupted or the slot is closed first.
    ///
    /// Under [`InterruptPolicy::Resume`] an interruption abandons the pause
    /// and returns `Ok(())`. A `duration` too large to form a deadline sleeps
    /// until interrupted or closed.
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError::Interrupted`] if interrupted under
    /// [`InterruptPolicy::Abort`].
    pub fn pause(&self, role: Role, duration: Duration) -> Result<(), HandoffError> {
        let deadline = Instant::now().checked_add(duration);
        let mut state = self.state.lock();
        loop {
            if self.observe_interrupt(&mut state, role) {
                return match self.policy {
                    InterruptPolicy::Resume => {
                        warn!(%role, "interrupted while pausing, pause abandoned");
                        Ok(())
                    }
                    InterruptPolicy::Abort => {
                        warn!(%role, "interrupted while pausing, aborting");
                        Err(HandoffError::Interrupted { role })
                    }
                };
            }
            if state.closed {
                return Ok(());
            }
            // Both waits release the lock while asleep.
            match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return Ok(());
                    }
                    self.alarm.wait_for(&mut state, remaining);
                }
                None => self.alarm.wait(&mut state),
            }
        }
    }

    fn wake_all(&self) {
        self.emptied.notify_all();
        self.filled.notify_all();
        self.alarm.notify_all();
    }

    /// Clears and reports a pending interruption for `role`.
    fn observe_interrupt(&self, state: &mut State<T>, role: Role) -> bool {
        let pending = std::mem::take(&mut state.pending[role.index()]);
        if pending {
            state.stats.interrupts += 1;
        }
        pending
    }

}

/// Exclusive access to a [`HandoffSlot`].
///
/// Dropping the guard releases the lock.
pub struct SlotGuard<'a, T> {
    slot: &'a HandoffSlot<T>,
    state: MutexGuard<'a, State<T>>,
}

impl<T> SlotGuard<'_, T> {
    /// Returns `true` if an item is waiting to be taken.
    #[must_use]
    pub fn is_occupied(&self) -> bool {
        self.state.item.is_some()
    }

    /// Stores `item`, first waiting (lock released) while the slot is full.
    /// Wakes the consumer once the item is in place.
    ///
    /// # Errors
    ///
    /// - [`HandoffError::Closed`] if the slot is or becomes closed.
    /// - [`HandoffError::Interrupted`] if the producer is interrupted while
    ///   waiting under [`InterruptPolicy::Abort`]. The slot is left untouched.
    pub fn put(&mut self, item: T) -> Result<(), HandoffError> {
        let slot = self.slot;
        self.wait_while(Role::Producer, &slot.emptied, |state| state.item.is_some())?;
        if self.state.closed {
            return Err(HandoffError::Closed);
        }

        debug_assert!(self.state.item.is_none());
        self.state.item = Some(item);
        let stats = &mut self.state.stats;
        stats.puts += 1;
        stats.max_occupancy = stats.max_occupancy.max(stats.puts - stats.takes);

        slot.filled.notify_one();
        trace!("item stored");
        Ok(())
    }

    /// Withdraws the item, first waiting (lock released) while the slot is
    /// empty. Wakes the producer once the slot is clear.
    ///
    /// # Errors
    ///
    /// - [`HandoffError::Closed`] if the slot is closed and empty.
    /// - [`HandoffError::Interrupted`] if the consumer is interrupted while
    ///   waiting under [`InterruptPolicy::Abort`].
    pub fn take(&mut self) -> Result<T, HandoffError> {
        let slot = self.slot;
        self.wait_while(Role::Consumer, &slot.filled, |state| state.item.is_none())?;

        let Some(item) = self.state.item.take() else {
            return Err(HandoffError::Closed);
        };
        self.state.stats.takes += 1;

        slot.emptied.notify_one();
        trace!("item withdrawn");
        Ok(item)
    }

    /// Suspends on `condvar` until `blocked` no longer holds.
    ///
    /// A satisfied predicate wins over a pending interruption, which then
    /// stays pending for the next wait.
    fn wait_while(
        &mut self,
        role: Role,
        condvar: &Condvar,
        blocked: impl Fn(&State<T>) -> bool,
    ) -> Result<(), HandoffError> {
        loop {
            if !blocked(&*self.state) {
                return Ok(());
            }
            if self.state.closed {
                return Err(HandoffError::Closed);
            }
            if self.slot.observe_interrupt(&mut *self.state, role) {
                match self.slot.policy {
                    InterruptPolicy::Resume => {
                        warn!(%role, "interrupted while waiting on slot, resuming wait");
                    }
                    InterruptPolicy::Abort => {
                        warn!(%role, "interrupted while waiting on slot, aborting");
                        return Err(HandoffError::Interrupted { role });
                    }
                }
                continue;
            }

            trace!(%role, "waiting on slot");
            condvar.wait(&mut self.state);
        }
    }
}
