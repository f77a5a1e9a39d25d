//! Where produced items come from.

use std::fmt;

use minstant::{Anchor, Instant};

/// Produces the next item for the producer loop.
pub trait Source<T>: Send {
    fn next_item(&mut self) -> T;
}

impl<T, F> Source<T> for F
where
    F: FnMut() -> T + Send,
{
    fn next_item(&mut self) -> T {
        self()
    }
}

/// Current Unix time in milliseconds, rendered as decimal text.
///
/// Readings come from the TSC-backed monotonic clock translated through a
/// single anchor, so successive values never go backwards even if the wall
/// clock is stepped.
pub struct UnixMillis {
    anchor: Anchor,
}

impl UnixMillis {
    #[must_use]
    pub fn new() -> Self {
        Self {
            anchor: Anchor::new(),
        }
    }

    #[must_use]
    pub fn now(&self) -> u64 {
        Instant::now().as_unix_nanos(&self.anchor) / 1_000_000
    }
}

impl fmt::Debug for UnixMillis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnixMillis").finish_non_exhaustive()
    }
}

impl Default for UnixMillis {
    fn default() -> Self {
        Self::new()
    }
}

impl Source<String> for UnixMillis {
    fn next_item(&mut self) -> String {
        self.now().to_string()
    }
}
