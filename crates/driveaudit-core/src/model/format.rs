/// Display formatting for report cells and log summaries.
///
/// All timestamps are stored as `DateTime<Utc>`; text is only produced at
/// the sink or log boundary.
use chrono::{DateTime, Utc};

/// Timestamp as `YYYY-MM-DD HH:MM:SS` in UTC. Sheets receives it as plain
/// text (`RAW` input), so it sorts correctly but is not a date value.
pub fn format_timestamp(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Row/record count with thousand separators, for log lines.
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamp_drops_fraction_and_zone() {
        let t = Utc.with_ymd_and_hms(2024, 6, 1, 12, 5, 9).unwrap();
        assert_eq!(format_timestamp(t), "2024-06-01 12:05:09");
    }

    #[test]
    fn count_separators() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1_000), "1,000");
        assert_eq!(format_count(1_234_567), "1,234,567");
    }
}
