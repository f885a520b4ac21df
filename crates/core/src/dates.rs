//! Date rendering for the panel's fixed French locale.

use crate::constants::LONG_DATE_FORMAT;
use chrono::{DateTime, Locale, Utc};

/// Formats a timestamp as a long French date, e.g. `15 mars 2023`.
///
/// Timestamps are rendered in UTC.
pub fn format_long_date(timestamp: &DateTime<Utc>) -> String {
    timestamp
        .format_localized(LONG_DATE_FORMAT, Locale::fr_FR)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_french_month_names() {
        let ts = Utc.with_ymd_and_hms(2023, 3, 15, 14, 30, 0).unwrap();
        assert_eq!(format_long_date(&ts), "15 mars 2023");
    }

    #[test]
    fn day_is_not_zero_padded() {
        let ts = Utc.with_ymd_and_hms(2023, 8, 1, 0, 0, 0).unwrap();
        assert_eq!(format_long_date(&ts), "1 août 2023");
    }
}
