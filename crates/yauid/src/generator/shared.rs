use core::time::Duration;
use std::sync::Arc;

use crate::{
    ErrorCode, Generator, Key, Result, RetryPolicy, SystemClock, TimeSource,
    generator::mutex::{Mutex, MutexGuard},
};

/// A [`Generator`] behind an [`Arc<Mutex<_>>`], for handing one handle to
/// many threads.
///
/// Cloning is cheap and every clone drives the same generator. Threads
/// serialize on the mutex first, then on the state file lock like any other
/// handle, so mixing shared and independent handles on one file is fine.
///
/// With the `parking-lot` feature the mutex can't be poisoned; otherwise a
/// thread panicking mid-issuance turns every later call into
/// [`Error::LockPoisoned`].
///
/// ## Features
/// - ✅ Thread-safe
/// - ✅ Single open file descriptor for the whole process
///
/// ## See Also
/// - [`Generator`]
///
/// [`Error::LockPoisoned`]: crate::Error::LockPoisoned
pub struct SharedGenerator<T = SystemClock>
where
    T: TimeSource,
{
    #[cfg(feature = "cache-padded")]
    state: Arc<crossbeam_utils::CachePadded<Mutex<Generator<T>>>>,
    #[cfg(not(feature = "cache-padded"))]
    state: Arc<Mutex<Generator<T>>>,
}

impl<T> SharedGenerator<T>
where
    T: TimeSource,
{
    pub fn new(generator: Generator<T>) -> Self {
        Self {
            #[cfg(feature = "cache-padded")]
            state: Arc::new(crossbeam_utils::CachePadded::new(Mutex::new(generator))),
            #[cfg(not(feature = "cache-padded"))]
            state: Arc::new(Mutex::new(generator)),
        }
    }

    /// See [`Generator::get_key`]. The mutex is held while waiting out an
    /// exhausted second, so other threads wait with it.
    ///
    /// # Errors
    ///
    /// [`Error::LockPoisoned`] in addition to those of
    /// [`Generator::get_key`].
    ///
    /// [`Error::LockPoisoned`]: crate::Error::LockPoisoned
    pub fn get_key(&self) -> Result<Key> {
        self.lock()?.get_key()
    }

    /// See [`Generator::get_key_once`].
    ///
    /// # Errors
    ///
    /// [`Error::LockPoisoned`] in addition to those of
    /// [`Generator::get_key_once`].
    ///
    /// [`Error::LockPoisoned`]: crate::Error::LockPoisoned
    pub fn get_key_once(&self) -> Result<Key> {
        self.lock()?.get_key_once()
    }

    /// Last status of the shared generator, whichever thread caused it.
    ///
    /// # Errors
    ///
    /// [`Error::LockPoisoned`] if the mutex is poisoned.
    ///
    /// [`Error::LockPoisoned`]: crate::Error::LockPoisoned
    pub fn last_error(&self) -> Result<ErrorCode> {
        Ok(self.lock()?.last_error())
    }

    /// # Errors
    ///
    /// See [`Generator::set_node_id`].
    pub fn set_node_id(&self, node_id: u64) -> Result<()> {
        self.lock()?.set_node_id(node_id)
    }

    /// # Errors
    ///
    /// [`Error::LockPoisoned`] if the mutex is poisoned.
    ///
    /// [`Error::LockPoisoned`]: crate::Error::LockPoisoned
    pub fn set_retry_policy(&self, policy: RetryPolicy) -> Result<()> {
        self.lock()?.set_retry_policy(policy);
        Ok(())
    }

    /// # Errors
    ///
    /// [`Error::LockPoisoned`] if the mutex is poisoned.
    ///
    /// [`Error::LockPoisoned`]: crate::Error::LockPoisoned
    pub fn set_retry_sleep(&self, sleep: Duration) -> Result<()> {
        self.lock()?.set_retry_sleep(sleep);
        Ok(())
    }

    /// # Errors
    ///
    /// [`Error::LockPoisoned`] if the mutex is poisoned.
    ///
    /// [`Error::LockPoisoned`]: crate::Error::LockPoisoned
    pub fn set_max_attempts(&self, max_attempts: u32) -> Result<()> {
        self.lock()?.set_max_attempts(max_attempts);
        Ok(())
    }

    /// # Errors
    ///
    /// [`Error::LockPoisoned`] if the mutex is poisoned.
    ///
    /// [`Error::LockPoisoned`]: crate::Error::LockPoisoned
    pub fn set_sync_writes(&self, sync_writes: bool) -> Result<()> {
        self.lock()?.set_sync_writes(sync_writes);
        Ok(())
    }

    /// Runs `f` with exclusive access to the inner generator.
    ///
    /// # Errors
    ///
    /// [`Error::LockPoisoned`] if the mutex is poisoned.
    ///
    /// [`Error::LockPoisoned`]: crate::Error::LockPoisoned
    pub fn with<R>(&self, f: impl FnOnce(&mut Generator<T>) -> R) -> Result<R> {
        let mut guard = self.lock()?;
        Ok(f(&mut *guard))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Generator<T>>> {
        #[cfg(feature = "parking-lot")]
        {
            Ok(self.state.lock())
        }
        #[cfg(not(feature = "parking-lot"))]
        {
            Ok(self.state.lock()?)
        }
    }
}

impl<T> Clone for SharedGenerator<T>
where
    T: TimeSource,
{
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> From<Generator<T>> for SharedGenerator<T>
where
    T: TimeSource,
{
    fn from(generator: Generator<T>) -> Self {
        Self::new(generator)
    }
}

impl<T> core::fmt::Debug for SharedGenerator<T>
where
    T: TimeSource,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SharedGenerator").finish_non_exhaustive()
    }
}
