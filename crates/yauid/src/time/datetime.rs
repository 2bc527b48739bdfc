use chrono::{Local, NaiveDateTime, TimeZone};

/// Format accepted by [`parse_datetime`], e.g. `2014-07-12 04:23:12`.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Converts a local `"%Y-%m-%d %H:%M:%S"` datetime into seconds since the
/// Unix epoch.
///
/// Returns `None` if the text doesn't match [`DATETIME_FORMAT`], names a
/// local time skipped by a DST transition, or lies before the epoch. An
/// ambiguous local time (DST fold) resolves to the earlier instant.
pub fn parse_datetime(text: &str) -> Option<u64> {
    parse_datetime_in(text, &Local)
}

/// [`parse_datetime`] in an explicit timezone.
///
/// ```
/// use chrono::FixedOffset;
///
/// let moscow = FixedOffset::east_opt(4 * 3600).unwrap();
/// assert_eq!(
///     yauid::parse_datetime_in("2014-07-12 04:23:12", &moscow),
///     Some(1_405_124_592)
/// );
/// ```
pub fn parse_datetime_in<Tz: TimeZone>(text: &str, tz: &Tz) -> Option<u64> {
    let naive = NaiveDateTime::parse_from_str(text.trim(), DATETIME_FORMAT).ok()?;
    let instant = tz.from_local_datetime(&naive).earliest()?;
    u64::try_from(instant.timestamp()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn parses_in_fixed_offsets() {
        assert_eq!(
            parse_datetime_in("2014-07-12 00:23:12", &Utc),
            Some(1_405_124_592)
        );
        let plus_four = FixedOffset::east_opt(4 * 3600).unwrap();
        assert_eq!(
            parse_datetime_in("2014-07-12 04:23:12", &plus_four),
            Some(1_405_124_592)
        );
        assert_eq!(parse_datetime_in(" 1970-01-01 00:00:01\n", &Utc), Some(1));
    }

    #[test]
    fn rejects_malformed_text() {
        assert_eq!(parse_datetime_in("2014-07-12", &Utc), None);
        assert_eq!(parse_datetime_in("2014-13-12 00:00:00", &Utc), None);
        assert_eq!(parse_datetime_in("12/07/2014 04:23:12", &Utc), None);
        assert_eq!(parse_datetime(""), None);
    }

    #[test]
    fn rejects_pre_epoch() {
        assert_eq!(parse_datetime_in("1969-12-31 23:59:59", &Utc), None);
    }

    #[test]
    fn local_agrees_with_chrono() {
        let naive =
            NaiveDateTime::parse_from_str("2014-07-12 04:23:12", DATETIME_FORMAT).unwrap();
        let expected = Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.timestamp() as u64);
        assert_eq!(parse_datetime("2014-07-12 04:23:12"), expected);
    }
}
