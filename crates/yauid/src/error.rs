use core::fmt;
use std::{io, path::PathBuf};

/// A result type whose error defaults to [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors that `yauid` can produce.
///
/// Every variant maps onto exactly one [`ErrorCode`] through
/// [`Error::code`], which is what [`Generator::last_error`] reports after a
/// call.
///
/// Only [`Error::KeysEnded`] is transient: the current second has no
/// sequence numbers left and the caller should wait for the clock to move.
/// Everything else should be treated as fatal for the handle that produced
/// it.
///
/// [`Generator::last_error`]: crate::Generator::last_error
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The state file did not exist and could not be created.
    #[error("can't create key file {}: {source}", path.display())]
    CreateStateFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The state file exists but could not be opened for reading and
    /// writing.
    #[error("can't open key file {}: {source}", path.display())]
    OpenStateFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Every sequence number of `timestamp` has already been issued.
    #[error("all keys in second {timestamp} are done")]
    KeysEnded { timestamp: u64 },

    /// The node id file exists but could not be read.
    #[error("can't read node id file {}: {source}", path.display())]
    NodeIdFileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The node id file exists but is empty.
    #[error("node id file {} is empty", path.display())]
    NodeIdFileEmpty { path: PathBuf },

    /// The node id file does not exist.
    #[error("node id file {} does not exist", path.display())]
    NodeIdFileMissing { path: PathBuf },

    /// Acquiring or releasing the advisory lock on the state file failed.
    #[error("can't set lock on key file: {source}")]
    Lock {
        #[source]
        source: io::Error,
    },

    /// The in-process mutex guarding a shared generator was poisoned.
    #[error("generator mutex poisoned by a panicking thread")]
    LockPoisoned,

    /// The node id is above [`Key::max_node_id`].
    ///
    /// [`Key::max_node_id`]: crate::Key::max_node_id
    #[error("node id {node_id} is too long (max {max})")]
    NodeIdTooLong { node_id: u64, max: u64 },

    /// The node id is below [`Key::min_node_id`].
    ///
    /// [`Key::min_node_id`]: crate::Key::min_node_id
    #[error("node id {node_id} is too short (min {min})")]
    NodeIdTooShort { node_id: u64, min: u64 },

    /// Reading the previous key from the state file failed.
    #[error("can't read key from key file: {source}")]
    ReadKey {
        #[source]
        source: io::Error,
    },

    /// The state file has a size other than 0 or 8 bytes.
    #[error("key file is corrupt: {len} bytes (expected 0 or 8)")]
    CorruptState { len: u64 },

    /// Seeking within the state file failed.
    #[error("can't seek in key file: {source}")]
    Seek {
        #[source]
        source: io::Error,
    },

    /// Writing the new key to the state file failed.
    #[error("can't write key to key file: {source}")]
    WriteKey {
        #[source]
        source: io::Error,
    },

    /// Flushing the new key to the state file failed.
    #[error("can't flush key to key file: {source}")]
    FlushKey {
        #[source]
        source: io::Error,
    },

    /// The retrying fetch gave up after `attempts` exhausted seconds.
    #[error("number of attempts to get the key exhausted ({attempts})")]
    TryCountExhausted { attempts: u32 },

    /// The clock reports a second that does not fit in the timestamp field.
    #[error("timestamp {timestamp} exceeds the key layout (max {max})")]
    TimestampOutOfRange { timestamp: u64, max: u64 },
}

impl Error {
    /// Returns the status code for this error.
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::CreateStateFile { .. } => ErrorCode::CreateStateFile,
            Self::OpenStateFile { .. } => ErrorCode::OpenStateFile,
            Self::KeysEnded { .. } => ErrorCode::KeysEnded,
            Self::NodeIdFileRead { .. } | Self::NodeIdFileEmpty { .. } => {
                ErrorCode::NodeIdFileRead
            }
            Self::NodeIdFileMissing { .. } => ErrorCode::NodeIdFileMissing,
            Self::Lock { .. } => ErrorCode::Lock,
            Self::LockPoisoned => ErrorCode::LockPoisoned,
            Self::NodeIdTooLong { .. } => ErrorCode::NodeIdTooLong,
            Self::NodeIdTooShort { .. } => ErrorCode::NodeIdTooShort,
            Self::ReadKey { .. } | Self::CorruptState { .. } => ErrorCode::ReadKey,
            Self::Seek { .. } => ErrorCode::Seek,
            Self::WriteKey { .. } => ErrorCode::WriteKey,
            Self::FlushKey { .. } => ErrorCode::FlushKey,
            Self::TryCountExhausted { .. } => ErrorCode::TryCountExhausted,
            Self::TimestampOutOfRange { .. } => ErrorCode::TimestampOutOfRange,
        }
    }

    /// Returns `true` if waiting for the next second may clear the error.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::KeysEnded { .. })
    }
}

/// Status codes reported by [`Generator::last_error`].
///
/// The discriminants are stable and can be stored or sent across process
/// boundaries; [`error_text`] turns a raw code back into a description.
///
/// [`Generator::last_error`]: crate::Generator::last_error
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum ErrorCode {
    #[default]
    Ok = 0,
    CreateStateFile = 1,
    OpenStateFile = 2,
    KeysEnded = 3,
    NodeIdFileRead = 4,
    NodeIdFileMissing = 5,
    Lock = 6,
    NodeIdTooLong = 7,
    NodeIdTooShort = 8,
    ReadKey = 9,
    Seek = 10,
    WriteKey = 11,
    FlushKey = 12,
    TryCountExhausted = 13,
    TimestampOutOfRange = 14,
    LockPoisoned = 15,
}

impl ErrorCode {
    /// Every code, in discriminant order.
    pub const ALL: [Self; 16] = [
        Self::Ok,
        Self::CreateStateFile,
        Self::OpenStateFile,
        Self::KeysEnded,
        Self::NodeIdFileRead,
        Self::NodeIdFileMissing,
        Self::Lock,
        Self::NodeIdTooLong,
        Self::NodeIdTooShort,
        Self::ReadKey,
        Self::Seek,
        Self::WriteKey,
        Self::FlushKey,
        Self::TryCountExhausted,
        Self::TimestampOutOfRange,
        Self::LockPoisoned,
    ];

    /// Human-readable description of the code.
    pub const fn text(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::CreateStateFile => "Can't create key file",
            Self::OpenStateFile => "Can't open key file",
            Self::KeysEnded => "All keys in current second are done",
            Self::NodeIdFileRead => "Can't read node id file",
            Self::NodeIdFileMissing => "Node id file does not exist",
            Self::Lock => "Can't set lock",
            Self::NodeIdTooLong => "Node id is too long",
            Self::NodeIdTooShort => "Node id is too short",
            Self::ReadKey => "Can't read key from file",
            Self::Seek => "Can't seek to start file position",
            Self::WriteKey => "Can't write key to file",
            Self::FlushKey => "Can't flush key to file",
            Self::TryCountExhausted => "Number of attempts to get the key exhausted",
            Self::TimestampOutOfRange => "Current time does not fit in the key",
            Self::LockPoisoned => "Generator mutex poisoned",
        }
    }

    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl TryFrom<u32> for ErrorCode {
    type Error = u32;

    fn try_from(code: u32) -> core::result::Result<Self, Self::Error> {
        Self::ALL.get(code as usize).copied().ok_or(code)
    }
}

impl From<ErrorCode> for u32 {
    fn from(code: ErrorCode) -> Self {
        code as Self
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Looks up the description of a raw status code.
///
/// Unknown codes yield `None` rather than a made-up description.
///
/// ```
/// use yauid::{error_text, ErrorCode};
///
/// assert_eq!(error_text(0), Some("OK"));
/// assert_eq!(error_text(ErrorCode::KeysEnded.into()), Some(ErrorCode::KeysEnded.text()));
/// assert_eq!(error_text(10_000), None);
/// ```
pub fn error_text(code: u32) -> Option<&'static str> {
    ErrorCode::try_from(code).ok().map(ErrorCode::text)
}
