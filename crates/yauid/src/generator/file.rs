use core::time::Duration;
use std::path::Path;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    Error, ErrorCode, FIRST_SEQUENCE, Key, Result, RetryPolicy, SystemClock, TimeSource,
    generator::state::StateFile, load_node_id, validate_node_id,
};

/// A key generator backed by a state file shared through an advisory lock.
///
/// Each call to [`Generator::get_key_once`] locks the file, reads the last
/// key issued for this node, derives the next one from the current second,
/// writes it back and unlocks. Any number of generators (in this process or
/// others) can point at the same file: the lock serializes them, so a
/// node never issues the same key twice nor skips a sequence number within
/// a second.
///
/// ## Features
/// - ✅ Safe across processes and across independent handles
/// - ✅ Survives restarts (state is on disk)
/// - ❌ Not shareable between threads by reference (`&mut self`); see
///   [`SharedGenerator`]
///
/// Every call records its outcome, readable through
/// [`Generator::last_error`].
///
/// # Example
///
/// ```
/// use yauid::Generator;
///
/// let dir = tempfile::tempdir().unwrap();
/// let mut generator = Generator::open(dir.path().join("yauid.key"), None)
///     .unwrap()
///     .with_node_id(12)
///     .unwrap();
///
/// let first = generator.get_key().unwrap();
/// let second = generator.get_key().unwrap();
/// assert!(first < second);
/// assert_eq!(second.node_id(), 12);
/// ```
///
/// [`SharedGenerator`]: crate::SharedGenerator
#[derive(Debug)]
pub struct Generator<T = SystemClock>
where
    T: TimeSource,
{
    state: StateFile,
    node_id: u64,
    policy: RetryPolicy,
    sync_writes: bool,
    last_error: ErrorCode,
    time: T,
}

impl Generator<SystemClock> {
    /// Opens a generator on the state file at `state_path` using the system
    /// clock.
    ///
    /// The state file is created empty if it doesn't exist. When
    /// `node_id_path` is given, the node id is read from it (see
    /// [`load_node_id`]); otherwise the node id stays zero, which fails
    /// issuance until [`Generator::set_node_id`] is called.
    ///
    /// # Errors
    ///
    /// - [`Error::NodeIdFileMissing`], [`Error::NodeIdFileRead`],
    ///   [`Error::NodeIdFileEmpty`], [`Error::NodeIdTooShort`] or
    ///   [`Error::NodeIdTooLong`] for a bad node id file
    /// - [`Error::CreateStateFile`] or [`Error::OpenStateFile`] if the state
    ///   file can't be created or opened
    pub fn open(state_path: impl AsRef<Path>, node_id_path: Option<&Path>) -> Result<Self> {
        Self::open_with_time(state_path, node_id_path, SystemClock)
    }
}

impl<T> Generator<T>
where
    T: TimeSource,
{
    /// Like [`Generator::open`], reading seconds from `time`.
    ///
    /// # Errors
    ///
    /// See [`Generator::open`].
    pub fn open_with_time(
        state_path: impl AsRef<Path>,
        node_id_path: Option<&Path>,
        time: T,
    ) -> Result<Self> {
        let node_id = node_id_path.map(load_node_id).transpose()?.unwrap_or(0);
        let state = StateFile::open(state_path.as_ref())?;

        #[cfg(feature = "tracing")]
        tracing::debug!(path = %state.path().display(), node_id, "opened key file");

        Ok(Self {
            state,
            node_id,
            policy: RetryPolicy::default(),
            sync_writes: false,
            last_error: ErrorCode::Ok,
            time,
        })
    }

    /// Sets the node id, consuming and returning the generator.
    ///
    /// # Errors
    ///
    /// See [`Generator::set_node_id`].
    pub fn with_node_id(mut self, node_id: u64) -> Result<Self> {
        self.set_node_id(node_id)?;
        Ok(self)
    }

    /// Sets the retry policy, consuming and returning the generator.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.set_retry_policy(policy);
        self
    }

    pub fn node_id(&self) -> u64 {
        self.node_id
    }

    /// Changes the node id embedded in subsequent keys.
    ///
    /// # Errors
    ///
    /// [`Error::NodeIdTooShort`] or [`Error::NodeIdTooLong`]; the previous
    /// node id is kept.
    pub fn set_node_id(&mut self, node_id: u64) -> Result<()> {
        let res = validate_node_id(node_id).map(|node_id| self.node_id = node_id);
        self.record(res)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn set_retry_policy(&mut self, policy: RetryPolicy) {
        self.policy = policy;
        self.last_error = ErrorCode::Ok;
    }

    /// Sets the pause between attempts of [`Generator::get_key`].
    pub fn set_retry_sleep(&mut self, sleep: Duration) {
        self.set_retry_policy(RetryPolicy {
            sleep,
            ..self.policy
        });
    }

    /// Sets how many exhausted seconds [`Generator::get_key`] waits out
    /// before failing. Zero waits forever.
    pub fn set_max_attempts(&mut self, max_attempts: u32) {
        self.set_retry_policy(RetryPolicy {
            max_attempts,
            ..self.policy
        });
    }

    /// With `true`, every issuance waits for the key to reach the storage
    /// device (`fdatasync`) before returning. Off by default.
    pub fn set_sync_writes(&mut self, sync_writes: bool) {
        self.sync_writes = sync_writes;
        self.last_error = ErrorCode::Ok;
    }

    /// Path of the state file.
    pub fn path(&self) -> &Path {
        self.state.path()
    }

    /// Outcome of the last call that can fail; [`ErrorCode::Ok`] after a
    /// success.
    pub fn last_error(&self) -> ErrorCode {
        self.last_error
    }

    /// Issues the next key, waiting out exhausted seconds according to the
    /// retry policy.
    ///
    /// # Errors
    ///
    /// - [`Error::TryCountExhausted`] if a bounded policy ran out of
    ///   attempts
    /// - any non-recoverable error of [`Generator::get_key_once`],
    ///   immediately
    pub fn get_key(&mut self) -> Result<Key> {
        let mut attempts: u32 = 0;
        let res = loop {
            match self.issue() {
                Err(err) if err.is_recoverable() => {
                    attempts = attempts.saturating_add(1);
                    if self.policy.is_exhausted(attempts) {
                        #[cfg(feature = "tracing")]
                        tracing::warn!(attempts, "giving up on exhausted second");
                        break Err(Error::TryCountExhausted { attempts });
                    }
                    #[cfg(feature = "tracing")]
                    tracing::debug!(attempts, sleep = ?self.policy.sleep, "{err}, retrying");
                    std::thread::sleep(self.policy.sleep);
                }
                res => break res,
            }
        };
        self.record(res)
    }

    /// Issues the next key or fails without waiting.
    ///
    /// # Errors
    ///
    /// - [`Error::KeysEnded`] if the current second has no sequence numbers
    ///   left; retry once the clock has moved on
    /// - [`Error::NodeIdTooShort`] / [`Error::NodeIdTooLong`] for an invalid
    ///   node id
    /// - [`Error::Lock`], [`Error::Seek`], [`Error::ReadKey`],
    ///   [`Error::CorruptState`], [`Error::WriteKey`], [`Error::FlushKey`] for
    ///   failures of the state file
    /// - [`Error::TimestampOutOfRange`] if the clock is beyond the key layout
    pub fn get_key_once(&mut self) -> Result<Key> {
        let res = self.issue();
        self.record(res)
    }

    /// Releases the state file.
    ///
    /// Dropping the generator does the same; this only makes the intent
    /// explicit.
    pub fn close(self) {
        #[cfg(feature = "tracing")]
        tracing::debug!(path = %self.path().display(), "closing key file");
    }

    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self), fields(node_id = self.node_id)))]
    fn issue(&self) -> Result<Key> {
        let node_id = validate_node_id(self.node_id)?;

        let mut lock = self.state.lock()?;
        let previous = lock.read_key()?;
        let now = self.time.current_secs();
        let key = next_key(previous, now, node_id)?;
        lock.write_key(key, self.sync_writes)?;
        lock.unlock()?;

        Ok(key)
    }

    fn record<V>(&mut self, res: Result<V>) -> Result<V> {
        self.last_error = match &res {
            Ok(_) => ErrorCode::Ok,
            Err(err) => err.code(),
        };
        res
    }
}

/// Derives the key following `previous` at second `now`.
fn next_key(previous: Option<Key>, now: u64, node_id: u64) -> Result<Key> {
    let sequence = match previous {
        Some(previous) if previous.timestamp() == now => match previous.increment_sequence() {
            Some(next) => next.sequence(),
            None => return Err(Error::KeysEnded { timestamp: now }),
        },
        Some(_previous) => {
            #[cfg(feature = "tracing")]
            {
                if _previous.timestamp() > now {
                    tracing::warn!(
                        previous = _previous.timestamp(),
                        now,
                        "clock moved backwards since the last key"
                    );
                } else {
                    tracing::trace!(previous = _previous.timestamp(), now, "rollover");
                }
            }
            FIRST_SEQUENCE
        }
        None => FIRST_SEQUENCE,
    };

    Key::try_from_components(now, node_id, sequence).ok_or(Error::TimestampOutOfRange {
        timestamp: now,
        max: Key::max_timestamp(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_key_starts_sequence_at_one() {
        let key = next_key(None, 100, 7).unwrap();
        assert_eq!((key.timestamp(), key.node_id(), key.sequence()), (100, 7, 1));
    }

    #[test]
    fn same_second_increments() {
        let previous = Key::from_components(100, 7, 41);
        let key = next_key(Some(previous), 100, 7).unwrap();
        assert_eq!(key.sequence(), 42);
        assert_eq!(key.timestamp(), 100);
    }

    #[test]
    fn new_second_resets() {
        let previous = Key::from_components(100, 7, 41);
        assert_eq!(next_key(Some(previous), 101, 7).unwrap().sequence(), 1);
        // clock regression also resets; no skew correction
        assert_eq!(next_key(Some(previous), 99, 7).unwrap().sequence(), 1);
    }

    #[test]
    fn exhausted_second() {
        let previous = Key::from_components(100, 7, Key::max_sequence());
        assert!(matches!(
            next_key(Some(previous), 100, 7),
            Err(Error::KeysEnded { timestamp: 100 })
        ));
    }

    #[test]
    fn clock_beyond_layout() {
        let err = next_key(None, Key::max_timestamp() + 1, 7).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TimestampOutOfRange);
    }
}
