use chrono::{DateTime, TimeDelta};

/// Convert an RFC 3339 / ISO 8601 timestamp to unix seconds.
///
/// ```
/// assert_eq!(keeper_core::time::iso_to_unix("2021-12-25T12:34:56+00:00").unwrap(), 1640435696);
/// ```
pub fn iso_to_unix(value: &str) -> crate::Result<i64> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.timestamp())
        .map_err(|e| crate::Error::InvalidTimestamp {
            value: value.to_owned(),
            source: e,
        })
}

/// Days, hours and minutes of a non-negative span. Negative spans clamp to zero.
pub fn split_duration(span: TimeDelta) -> (i64, i64, i64) {
    let secs = span.num_seconds().max(0);
    (secs / 86_400, (secs % 86_400) / 3_600, (secs % 3_600) / 60)
}

/// Always-three-field form used by the status endpoint: `"2d 3h 15m"`.
pub fn format_uptime(span: TimeDelta) -> String {
    let (days, hours, minutes) = split_duration(span);
    format!("{days}d {hours}h {minutes}m")
}

/// Compact form used for instances: leading zero units are dropped.
pub fn format_uptime_compact(span: TimeDelta) -> String {
    match split_duration(span) {
        (0, 0, minutes) => format!("{minutes}m"),
        (0, hours, minutes) => format!("{hours}h {minutes}m"),
        (days, hours, minutes) => format!("{days}d {hours}h {minutes}m"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso_with_zulu_suffix() {
        assert_eq!(iso_to_unix("2025-08-17T14:29:22Z").unwrap(), 1755440962);
    }

    #[test]
    fn iso_with_fractional_seconds() {
        assert_eq!(
            iso_to_unix("2025-08-17T14:29:22.123456789Z").unwrap(),
            1755440962
        );
    }

    #[test]
    fn iso_rejects_garbage() {
        let err = iso_to_unix("yesterday").unwrap_err();
        assert!(err.to_string().contains("yesterday"), "got: {err}");
    }

    #[test]
    fn uptime_always_has_three_fields() {
        assert_eq!(format_uptime(TimeDelta::seconds(59)), "0d 0h 0m");
        assert_eq!(
            format_uptime(TimeDelta::days(2) + TimeDelta::hours(3) + TimeDelta::minutes(15)),
            "2d 3h 15m"
        );
    }

    #[test]
    fn compact_uptime_drops_leading_zero_units() {
        assert_eq!(format_uptime_compact(TimeDelta::minutes(7)), "7m");
        assert_eq!(
            format_uptime_compact(TimeDelta::hours(5) + TimeDelta::minutes(1)),
            "5h 1m"
        );
        assert_eq!(format_uptime_compact(TimeDelta::days(1)), "1d 0h 0m");
    }

    #[test]
    fn negative_span_clamps_to_zero() {
        assert_eq!(format_uptime(TimeDelta::minutes(-90)), "0d 0h 0m");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn split_recombines(secs in 0i64..10_000_000) {
                let (d, h, m) = split_duration(TimeDelta::seconds(secs));
                prop_assert!(h < 24);
                prop_assert!(m < 60);
                prop_assert_eq!(d * 86_400 + h * 3_600 + m * 60, secs - secs % 60);
            }
        }
    }
}
