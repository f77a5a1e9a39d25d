//! Run parameters for the hand-off.

use std::time::Duration;

use crate::error::HandoffError;
use crate::sync::InterruptPolicy;

/// Iterations each loop runs by default.
pub const DEFAULT_ITERATIONS: usize = 20;

/// Producer pause between iterations by default.
pub const DEFAULT_PAUSE: Duration = Duration::from_secs(2);

/// Environment variable overriding [`HandoffConfig::iterations`].
pub const ITERATIONS_ENV: &str = "HANDOFF_ITERATIONS";

/// Environment variable overriding [`HandoffConfig::pause`], in milliseconds.
pub const PAUSE_MS_ENV: &str = "HANDOFF_PAUSE_MS";

/// Environment variable overriding [`HandoffConfig::policy`] (`resume` or `abort`).
pub const POLICY_ENV: &str = "HANDOFF_INTERRUPT_POLICY";

/// Configuration for a hand-off run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffConfig {
    /// Items the producer publishes and the consumer withdraws.
    pub iterations: usize,
    /// Producer sleep after each publish, taken outside the lock.
    pub pause: Duration,
    /// How waiters react to interruption.
    pub policy: InterruptPolicy,
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            pause: DEFAULT_PAUSE,
            policy: InterruptPolicy::Resume,
        }
    }
}

impl HandoffConfig {
    #[must_use]
    pub const fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    #[must_use]
    pub const fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: InterruptPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Defaults overridden by `HANDOFF_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError::Config`] if a variable is set but malformed.
    pub fn from_env() -> Result<Self, HandoffError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError::Config`] if a value is present but malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, HandoffError> {
        let mut config = Self::default();

        if let Some(value) = lookup(ITERATIONS_ENV) {
            config.iterations = parse(ITERATIONS_ENV, value)?;
        }
        if let Some(value) = lookup(PAUSE_MS_ENV) {
            config.pause = Duration::from_millis(parse(PAUSE_MS_ENV, value)?);
        }
        if let Some(value) = lookup(POLICY_ENV) {
            config.policy = parse(POLICY_ENV, value)?;
        }

        Ok(config)
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, HandoffError> {
    value
        .trim()
        .parse()
        .map_err(|_| HandoffError::Config { key, value })
}
