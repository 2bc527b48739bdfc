use core::fmt;

use crate::key::{FIRST_SEQUENCE, MIN_NODE_ID, NODE_ID_BITS, SEQUENCE_BITS, TIMESTAMP_BITS};

/// A 64-bit key issued by a [`Generator`].
///
/// - 33 bits timestamp (seconds since the Unix epoch)
/// - 14 bits node id
/// - 17 bits sequence (per node, per second)
///
/// ```text
///  Bit Index:  63             31 30             17 16             0
///              +----------------+-----------------+---------------+
///  Field:      | timestamp (33) |  node id (14)   | sequence (17) |
///              +----------------+-----------------+---------------+
///              |<----- MSB ---------- 64 bits --------- LSB ----->|
/// ```
///
/// Because the timestamp occupies the most significant bits, keys sort
/// approximately by creation time, and exactly by `(second, node, sequence)`.
///
/// # Example
///
/// ```
/// use yauid::Key;
///
/// let key = Key::try_from_components(1_405_124_592, 12, 7).unwrap();
/// assert_eq!(key.timestamp(), 1_405_124_592);
/// assert_eq!(key.node_id(), 12);
/// assert_eq!(key.sequence(), 7);
/// assert_eq!(Key::from_raw(key.to_raw()), key);
/// ```
///
/// [`Generator`]: crate::Generator
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key {
    id: u64,
}

impl Key {
    /// Bitmask for extracting the 33-bit timestamp field. Occupies bits 31
    /// through 63.
    pub const TIMESTAMP_MASK: u64 = (1 << TIMESTAMP_BITS) - 1;

    /// Bitmask for extracting the 14-bit node id field. Occupies bits 17
    /// through 30.
    pub const NODE_ID_MASK: u64 = (1 << NODE_ID_BITS) - 1;

    /// Bitmask for extracting the 17-bit sequence field. Occupies bits 0
    /// through 16.
    pub const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;

    /// Number of bits to shift the timestamp to its correct position (bit 31).
    pub const TIMESTAMP_SHIFT: u32 = NODE_ID_BITS + SEQUENCE_BITS;

    /// Number of bits to shift the node id to its correct position (bit 17).
    pub const NODE_ID_SHIFT: u32 = SEQUENCE_BITS;

    /// Number of bits to shift the sequence field (bit 0).
    pub const SEQUENCE_SHIFT: u32 = 0;

    /// Size of a key on disk.
    pub const BYTES: usize = core::mem::size_of::<u64>();

    /// Packs the components without range checks. Out-of-range components
    /// are truncated to their field width.
    pub const fn from(timestamp: u64, node_id: u64, sequence: u64) -> Self {
        let timestamp = (timestamp & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT;
        let node_id = (node_id & Self::NODE_ID_MASK) << Self::NODE_ID_SHIFT;
        let sequence = (sequence & Self::SEQUENCE_MASK) << Self::SEQUENCE_SHIFT;
        Self {
            id: timestamp | node_id | sequence,
        }
    }

    /// Packs the components, debug-asserting that each fits its field.
    pub fn from_components(timestamp: u64, node_id: u64, sequence: u64) -> Self {
        debug_assert!(timestamp <= Self::TIMESTAMP_MASK, "timestamp overflow");
        debug_assert!(node_id <= Self::NODE_ID_MASK, "node_id overflow");
        debug_assert!(sequence <= Self::SEQUENCE_MASK, "sequence overflow");
        Self::from(timestamp, node_id, sequence)
    }

    /// Packs the components, returning `None` if any of them is above its
    /// field maximum.
    ///
    /// Lower bounds (reserved zero node id and sequence) are not checked
    /// here; this mirrors how range bounds and stored keys are built.
    pub const fn try_from_components(timestamp: u64, node_id: u64, sequence: u64) -> Option<Self> {
        if sequence > Self::SEQUENCE_MASK
            || node_id > Self::NODE_ID_MASK
            || timestamp > Self::TIMESTAMP_MASK
        {
            return None;
        }
        Some(Self::from(timestamp, node_id, sequence))
    }

    /// Extracts the timestamp from the packed key.
    pub const fn timestamp(&self) -> u64 {
        (self.id >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK
    }

    /// Extracts the node id from the packed key.
    pub const fn node_id(&self) -> u64 {
        (self.id >> Self::NODE_ID_SHIFT) & Self::NODE_ID_MASK
    }

    /// Extracts the sequence number from the packed key.
    pub const fn sequence(&self) -> u64 {
        (self.id >> Self::SEQUENCE_SHIFT) & Self::SEQUENCE_MASK
    }

    /// Maximum sequence number within one second.
    pub const fn max_sequence() -> u64 {
        Self::SEQUENCE_MASK
    }

    /// Smallest valid node id.
    pub const fn min_node_id() -> u64 {
        MIN_NODE_ID
    }

    /// Largest valid node id.
    pub const fn max_node_id() -> u64 {
        Self::NODE_ID_MASK
    }

    /// Largest representable timestamp.
    pub const fn max_timestamp() -> u64 {
        Self::TIMESTAMP_MASK
    }

    pub const fn to_raw(&self) -> u64 {
        self.id
    }

    pub const fn from_raw(raw: u64) -> Self {
        Self { id: raw }
    }

    /// Returns `true` if the sequence can be incremented within the same
    /// second.
    pub const fn has_sequence_room(&self) -> bool {
        self.sequence() < Self::SEQUENCE_MASK
    }

    /// Returns a key for the same second and node with the next sequence,
    /// or `None` if the second is exhausted.
    pub const fn increment_sequence(&self) -> Option<Self> {
        if !self.has_sequence_room() {
            return None;
        }
        Some(Self::from(self.timestamp(), self.node_id(), self.sequence() + 1))
    }

    /// Returns the first key of second `ts` for `node_id`.
    pub const fn first_of_second(ts: u64, node_id: u64) -> Option<Self> {
        Self::try_from_components(ts, node_id, FIRST_SEQUENCE)
    }

    /// Native-endian bytes, the layout of the state file.
    pub const fn to_ne_bytes(&self) -> [u8; Self::BYTES] {
        self.id.to_ne_bytes()
    }

    pub const fn from_ne_bytes(bytes: [u8; Self::BYTES]) -> Self {
        Self::from_raw(u64::from_ne_bytes(bytes))
    }

    /// Returns the key as a zero-padded 20-digit string, which sorts
    /// lexicographically in key order.
    pub fn to_padded_string(&self) -> String {
        format!("{:020}", self.id)
    }
}

impl From<Key> for u64 {
    fn from(key: Key) -> Self {
        key.id
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("id", &format_args!("0x{:016x}", self.id))
            .field("timestamp", &self.timestamp())
            .field("node_id", &self.node_id())
            .field("sequence", &self.sequence())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_and_bounds() {
        let ts = Key::max_timestamp();
        let node = Key::max_node_id();
        let seq = Key::max_sequence();

        let key = Key::from(ts, node, seq);
        assert_eq!(key.timestamp(), ts);
        assert_eq!(key.node_id(), node);
        assert_eq!(key.sequence(), seq);
        assert_eq!(key.to_raw(), u64::MAX);
        assert_eq!(Key::from_components(ts, node, seq), key);
    }

    #[test]
    fn components_survive_packing() {
        let timestamps = [0, 1, Key::max_timestamp() / 2, Key::max_timestamp()];
        let nodes = [1, Key::max_node_id() / 2, Key::max_node_id()];
        let sequences = [0, 1, Key::max_sequence() / 2, Key::max_sequence()];

        for &ts in &timestamps {
            for &node in &nodes {
                for &seq in &sequences {
                    let key = Key::try_from_components(ts, node, seq).unwrap();
                    assert_eq!(
                        (key.timestamp(), key.node_id(), key.sequence()),
                        (ts, node, seq)
                    );
                    assert_eq!(Key::from_raw(key.to_raw()), key);
                }
            }
        }
    }

    #[test]
    fn layout_constants() {
        assert_eq!(Key::max_timestamp(), (1 << 33) - 1);
        assert_eq!(Key::max_node_id(), (1 << 14) - 1);
        assert_eq!(Key::max_sequence(), (1 << 17) - 1);
        assert_eq!(Key::min_node_id(), 1);
    }

    #[test]
    fn decodes_components() {
        let ts = 1_405_124_592;
        let key = Key::try_from_components(ts, 12, 3).unwrap();
        assert_eq!(key.to_raw(), (ts << 31) | (12 << 17) | 3);
        assert_eq!(key.timestamp(), ts);
        assert_eq!(key.node_id(), 12);
        assert_eq!(key.sequence(), 3);
    }

    #[test]
    fn rejects_out_of_range_components() {
        assert!(Key::try_from_components(Key::max_timestamp() + 1, 1, 1).is_none());
        assert!(Key::try_from_components(1, Key::max_node_id() + 1, 1).is_none());
        assert!(Key::try_from_components(1, 1, Key::max_sequence() + 1).is_none());
        assert!(
            Key::try_from_components(Key::max_timestamp(), Key::max_node_id(), Key::max_sequence())
                .is_some()
        );
    }

    #[test]
    #[should_panic(expected = "timestamp overflow")]
    fn timestamp_overflow_panics() {
        let _ = Key::from_components(Key::max_timestamp() + 1, 1, 1);
    }

    #[test]
    #[should_panic(expected = "node_id overflow")]
    fn node_id_overflow_panics() {
        let _ = Key::from_components(1, Key::max_node_id() + 1, 1);
    }

    #[test]
    #[should_panic(expected = "sequence overflow")]
    fn sequence_overflow_panics() {
        let _ = Key::from_components(1, 1, Key::max_sequence() + 1);
    }

    #[test]
    fn ordering_follows_time_then_node_then_sequence() {
        let a = Key::from_components(100, 2, 50);
        let b = Key::from_components(100, 3, 1);
        let c = Key::from_components(101, 1, 1);
        assert!(a < b && b < c);
        assert!(a.increment_sequence().unwrap() > a);
    }

    #[test]
    fn increment_stops_at_max_sequence() {
        let key = Key::from_components(7, 9, Key::max_sequence() - 1);
        let last = key.increment_sequence().unwrap();
        assert_eq!(last.sequence(), Key::max_sequence());
        assert!(!last.has_sequence_room());
        assert_eq!(last.increment_sequence(), None);
        assert_eq!(Key::first_of_second(8, 9).unwrap().sequence(), 1);
    }

    #[test]
    fn native_bytes_and_padding() {
        let key = Key::from_components(1_405_124_592, 12, 1);
        assert_eq!(Key::from_ne_bytes(key.to_ne_bytes()), key);
        assert_eq!(key.to_ne_bytes(), key.to_raw().to_ne_bytes());
        assert_eq!(Key::from_raw(42).to_padded_string(), "00000000000000000042");
        assert_eq!(key.to_string(), key.to_raw().to_string());
    }

    #[test]
    fn debug_shows_fields() {
        let key = Key::from_components(5, 6, 7);
        let dbg = format!("{key:?}");
        assert!(dbg.contains("timestamp: 5"));
        assert!(dbg.contains("node_id: 6"));
        assert!(dbg.contains("sequence: 7"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_as_raw_integer() {
        let key = Key::from_components(5, 6, 7);
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, key.to_raw().to_string());
        let back: Key = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }
}
