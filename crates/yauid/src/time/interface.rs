use std::time::{SystemTime, UNIX_EPOCH};

/// A source of wall-clock seconds.
///
/// Keys embed whole seconds since the Unix epoch, so this is the only
/// resolution a generator needs. The abstraction lets tests drive a
/// generator across second boundaries deterministically.
///
/// # Example
///
/// ```
/// use yauid::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_secs(&self) -> u64 {
///         1_405_124_592
///     }
/// }
///
/// assert_eq!(FixedTime.current_secs(), 1_405_124_592);
/// ```
pub trait TimeSource {
    /// Returns the current time in seconds since the Unix epoch.
    fn current_secs(&self) -> u64;
}

/// The system wall clock.
///
/// Not monotonic: if the host clock is stepped backwards, so are the keys'
/// timestamps. A clock before the Unix epoch reads as zero.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn current_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs())
    }
}
