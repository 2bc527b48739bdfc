//! Bit widths of the packed [`Key`](crate::Key).
//!
//! The persisted state file and every key already stored by callers depend
//! on these values, so they are fixed at compile time as a single set.

/// Total width of a key.
pub const KEY_BITS: u32 = 64;

/// Width of the timestamp field (seconds since the Unix epoch).
pub const TIMESTAMP_BITS: u32 = 33;

/// Width of the node id field.
pub const NODE_ID_BITS: u32 = 14;

/// Width of the per-second sequence field.
pub const SEQUENCE_BITS: u32 = KEY_BITS - (TIMESTAMP_BITS + NODE_ID_BITS);

/// Smallest node id a generator may use. Zero is reserved.
pub const MIN_NODE_ID: u64 = 1;

/// First sequence number issued in a new second. Zero is reserved.
pub const FIRST_SEQUENCE: u64 = 1;

const _: () = assert!(TIMESTAMP_BITS + NODE_ID_BITS + SEQUENCE_BITS == KEY_BITS);
const _: () = assert!(TIMESTAMP_BITS > 0 && NODE_ID_BITS > 0 && SEQUENCE_BITS > 0);
