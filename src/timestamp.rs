//! UTC timestamp rendering for `TIMESTAMP '...'` literals.
//!
//! FrontBase accepts fractional seconds up to microseconds; the sub-second
//! remainder is rounded half-up at the requested precision, carrying into
//! the seconds field when it overflows.

use chrono::{DateTime, TimeDelta, Timelike, Utc};

struct SubsecondSpec {
    divisor: u32,
    width: usize,
}

// Indexed by precision (0..=6 fractional digits).
const SUBSECOND_SPECS: [SubsecondSpec; 7] = [
    SubsecondSpec {
        divisor: 1_000_000_000,
        width: 0,
    },
    SubsecondSpec {
        divisor: 100_000_000,
        width: 1,
    },
    SubsecondSpec {
        divisor: 10_000_000,
        width: 2,
    },
    SubsecondSpec {
        divisor: 1_000_000,
        width: 3,
    },
    SubsecondSpec {
        divisor: 100_000,
        width: 4,
    },
    SubsecondSpec {
        divisor: 10_000,
        width: 5,
    },
    SubsecondSpec {
        divisor: 1_000,
        width: 6,
    },
];

const MICROSECONDS: usize = 6;

/// Render a timestamp at the engine's full microsecond precision.
pub(crate) fn format(timestamp: &DateTime<Utc>) -> String {
    format_with_precision(timestamp, MICROSECONDS)
}

/// Render `YYYY-MM-DD HH:MM:SS[.fraction]` in UTC at the given precision.
pub(crate) fn format_with_precision(timestamp: &DateTime<Utc>, precision: usize) -> String {
    let spec = &SUBSECOND_SPECS[precision.min(MICROSECONDS)];
    let nanos = timestamp.timestamp_subsec_nanos().min(999_999_999);
    let mut fraction = (nanos + spec.divisor / 2) / spec.divisor;
    let limit = 1_000_000_000 / spec.divisor;

    let mut seconds = timestamp.with_nanosecond(0).unwrap_or(*timestamp);
    if fraction >= limit {
        fraction = 0;
        seconds += TimeDelta::seconds(1);
    }

    let mut rendered = seconds.format("%Y-%m-%d %H:%M:%S").to_string();
    if spec.width > 0 {
        rendered.push('.');
        rendered.push_str(&format!("{fraction:0width$}", width = spec.width));
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(nanos: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 21, 15, 42)
            .unwrap()
            .with_nanosecond(nanos)
            .unwrap()
    }

    #[test]
    fn renders_microseconds_by_default() {
        assert_eq!(format(&at(123_456_000)), "2024-03-09 21:15:42.123456");
    }

    #[test]
    fn rounds_half_up_on_the_subsecond_remainder() {
        assert_eq!(format(&at(123_456_500)), "2024-03-09 21:15:42.123457");
        assert_eq!(format(&at(123_456_499)), "2024-03-09 21:15:42.123456");
    }

    #[test]
    fn carries_into_seconds_when_rounding_overflows() {
        assert_eq!(format(&at(999_999_600)), "2024-03-09 21:15:43.000000");
        assert_eq!(
            format_with_precision(&at(999_600_000), 3),
            "2024-03-09 21:15:43.000"
        );
    }

    #[test]
    fn precision_zero_omits_the_fraction() {
        assert_eq!(format_with_precision(&at(400_000_000), 0), "2024-03-09 21:15:42");
        assert_eq!(format_with_precision(&at(600_000_000), 0), "2024-03-09 21:15:43");
    }

    #[test]
    fn precision_is_clamped_to_microseconds() {
        assert_eq!(
            format_with_precision(&at(123_456_789), 9),
            "2024-03-09 21:15:42.123457"
        );
    }
}
