use std::{
    fs::{File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use nix::{
    errno::Errno,
    fcntl::{Flock, FlockArg},
};

use crate::{Error, Key, Result};

const KEY_LEN: u64 = Key::BYTES as u64;

/// The on-disk "last issued key" of a node.
///
/// The file is either empty (nothing issued yet) or holds exactly one key in
/// native byte order. It is only read or written through a [`StateLock`].
#[derive(Debug)]
pub(crate) struct StateFile {
    file: File,
    path: PathBuf,
}

impl StateFile {
    /// Creates the file empty if it doesn't exist, then opens it for
    /// reading and writing. Existing content is left untouched.
    pub(crate) fn open(path: &Path) -> Result<Self> {
        if !matches!(path.try_exists(), Ok(true)) {
            OpenOptions::new()
                .append(true)
                .create(true)
                .open(path)
                .map_err(|source| Error::CreateStateFile {
                    path: path.to_path_buf(),
                    source,
                })?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| Error::OpenStateFile {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Blocks until an exclusive advisory lock on the file is granted.
    ///
    /// The lock is taken on a duplicate of this handle's descriptor, so it
    /// belongs to this handle's open file description: another
    /// `StateFile` on the same path, in this process or any other, waits
    /// for it.
    pub(crate) fn lock(&self) -> Result<StateLock> {
        let mut handle = self
            .file
            .try_clone()
            .map_err(|source| Error::Lock { source })?;
        loop {
            match Flock::lock(handle, FlockArg::LockExclusive) {
                Ok(file) => return Ok(StateLock { file }),
                // interrupted by a signal while waiting
                Err((file, Errno::EINTR)) => handle = file,
                Err((_, errno)) => {
                    return Err(Error::Lock {
                        source: errno.into(),
                    });
                }
            }
        }
    }
}

/// Exclusive access to a [`StateFile`].
///
/// Dropping the guard releases the lock, so every early return of an
/// issuance leaves the file unlocked. [`StateLock::unlock`] releases it
/// explicitly and reports failure.
pub(crate) struct StateLock {
    file: Flock<File>,
}

impl StateLock {
    /// Reads the stored key, or `None` if nothing has been issued yet.
    pub(crate) fn read_key(&mut self) -> Result<Option<Key>> {
        let len = self
            .file
            .metadata()
            .map_err(|source| Error::ReadKey { source })?
            .len();

        match len {
            0 => Ok(None),
            KEY_LEN => {
                self.file
                    .seek(SeekFrom::Start(0))
                    .map_err(|source| Error::Seek { source })?;
                let mut bytes = [0u8; Key::BYTES];
                self.file
                    .read_exact(&mut bytes)
                    .map_err(|source| Error::ReadKey { source })?;
                Ok(Some(Key::from_ne_bytes(bytes)))
            }
            len => Err(Error::CorruptState { len }),
        }
    }

    /// Overwrites the stored key. With `sync`, waits for the data to reach
    /// the device.
    pub(crate) fn write_key(&mut self, key: Key, sync: bool) -> Result<()> {
        self.file
            .seek(SeekFrom::Start(0))
            .map_err(|source| Error::Seek { source })?;
        self.file
            .write_all(&key.to_ne_bytes())
            .map_err(|source| Error::WriteKey { source })?;
        self.file
            .flush()
            .map_err(|source| Error::FlushKey { source })?;
        if sync {
            self.file
                .sync_data()
                .map_err(|source| Error::FlushKey { source })?;
        }
        Ok(())
    }

    pub(crate) fn unlock(self) -> Result<()> {
        match self.file.unlock() {
            Ok(_) => Ok(()),
            Err((file, errno)) => {
                // forget the guard so its Drop doesn't retry LOCK_UN and
                // panic; the duplicated descriptor is leaked and the lock is
                // then held until the StateFile closes
                std::mem::forget(file);
                Err(Error::Lock {
                    source: errno.into(),
                })
            }
        }
    }
}
