use crate::key::{FIRST_SEQUENCE, Key, MIN_NODE_ID};

/// Smallest and largest key that could have been issued within a window of
/// seconds and node ids.
///
/// Use the pair as inclusive bounds when scanning key-sorted storage (for
/// example a database index) by time. The bounds are numeric: for windows
/// spanning several seconds and a subset of nodes, keys of other nodes from
/// the inner seconds also fall between them.
///
/// A zero bound means the inputs were unusable (see
/// [`compute_range_by_timestamp`]).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct PeriodKeyRange {
    pub min: Key,
    pub max: Key,
}

impl PeriodKeyRange {
    /// Both bounds zero: the "no usable input" result.
    pub const EMPTY: Self = Self {
        min: Key::from_raw(0),
        max: Key::from_raw(0),
    };

    /// Returns `true` if both bounds are set and ordered.
    pub const fn is_valid(&self) -> bool {
        self.min.to_raw() != 0 && self.max.to_raw() != 0 && self.min.to_raw() <= self.max.to_raw()
    }

    /// Returns `true` if `key` lies within the (valid) bounds.
    pub const fn contains(&self, key: Key) -> bool {
        self.is_valid() && self.min.to_raw() <= key.to_raw() && key.to_raw() <= self.max.to_raw()
    }
}

/// Computes the key range for seconds `from_ts..=to_ts` and node ids
/// `from_node..=to_node`.
///
/// Defaults, where `None` and `Some(0)` both mean "unspecified":
/// - `to_ts` falls back to `from_ts`.
/// - `to_node` falls back to `from_node` when only `from_node` is given.
/// - otherwise a missing `from_node` is [`Key::min_node_id`] and a missing
///   `to_node` is [`Key::max_node_id`].
///
/// `min` is `{from_ts, from_node, 1}` and `max` is
/// `{to_ts, to_node, Key::max_sequence()}`. A zero `from_ts` yields
/// [`PeriodKeyRange::EMPTY`]; a bound whose components don't fit the key
/// layout is reported as zero.
///
/// ```
/// use yauid::{Key, compute_range_by_timestamp};
///
/// let range = compute_range_by_timestamp(1_405_124_592, None, Some(12), None);
/// assert_eq!(range.min, Key::from_components(1_405_124_592, 12, 1));
/// assert_eq!(range.max, Key::from_components(1_405_124_592, 12, Key::max_sequence()));
///
/// assert_eq!(compute_range_by_timestamp(0, None, None, None).min.to_raw(), 0);
/// ```
pub fn compute_range_by_timestamp(
    from_ts: u64,
    to_ts: Option<u64>,
    from_node: Option<u64>,
    to_node: Option<u64>,
) -> PeriodKeyRange {
    let to_ts = non_zero(to_ts).unwrap_or(from_ts);
    let (from_node, to_node) = match (non_zero(from_node), non_zero(to_node)) {
        (Some(node), None) => (node, node),
        (from, to) => (
            from.unwrap_or(MIN_NODE_ID),
            to.unwrap_or(Key::max_node_id()),
        ),
    };

    if from_ts == 0 {
        return PeriodKeyRange::EMPTY;
    }
    let Some(min) = Key::try_from_components(from_ts, from_node, FIRST_SEQUENCE) else {
        return PeriodKeyRange::EMPTY;
    };
    let max = Key::try_from_components(to_ts, to_node, Key::max_sequence()).unwrap_or_default();

    PeriodKeyRange { min, max }
}

/// Computes the key range between two `"%Y-%m-%d %H:%M:%S"` local datetimes.
///
/// A `to` of `None` means the same second as `from`. Text that fails to
/// parse counts as timestamp zero, which yields zero bounds exactly as in
/// [`compute_range_by_timestamp`].
#[cfg_attr(docsrs, doc(cfg(feature = "datetime")))]
#[cfg(feature = "datetime")]
pub fn compute_range_by_datetime(
    from: &str,
    to: Option<&str>,
    from_node: Option<u64>,
    to_node: Option<u64>,
) -> PeriodKeyRange {
    let from_ts = crate::parse_datetime(from).unwrap_or(0);
    let to_ts = crate::parse_datetime(to.unwrap_or(from)).unwrap_or(0);
    compute_range_by_timestamp(from_ts, Some(to_ts), from_node, to_node)
}

fn non_zero(value: Option<u64>) -> Option<u64> {
    value.filter(|&v| v != 0)
}
