use core::time::Duration;

/// How [`Generator::get_key`] waits out an exhausted second.
///
/// [`Generator::get_key`]: crate::Generator::get_key
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RetryPolicy {
    /// Pause between attempts.
    pub sleep: Duration,
    /// Attempts before giving up with [`Error::TryCountExhausted`]. Zero
    /// retries forever.
    ///
    /// [`Error::TryCountExhausted`]: crate::Error::TryCountExhausted
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// Default pause between attempts: 35 000 µs.
    pub const DEFAULT_SLEEP: Duration = Duration::from_micros(35_000);

    pub const fn new(sleep: Duration, max_attempts: u32) -> Self {
        Self {
            sleep,
            max_attempts,
        }
    }

    pub const fn is_unbounded(&self) -> bool {
        self.max_attempts == 0
    }

    /// Returns `true` once `attempts` has reached a bounded limit.
    pub(crate) const fn is_exhausted(&self, attempts: u32) -> bool {
        !self.is_unbounded() && attempts >= self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SLEEP, 0)
    }
}
