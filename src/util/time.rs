use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

// Parse a window string like "7d", "7", "YYYY-MM-DD", or RFC3339 into a whole
// number of days back from `now`. Returns None if unparseable or in the future.
pub fn parse_days_window(s: &str, now: DateTime<Utc>) -> Option<u32> {
    let s = s.trim();
    // "7d" or "7"
    let digits = s.strip_suffix('d').unwrap_or(s);
    if let Ok(days) = digits.parse::<u32>() {
        return (days > 0).then_some(days);
    }
    let since = if let Ok(nd) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        nd.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc())?
    } else {
        DateTime::parse_from_rfc3339(s).ok()?.with_timezone(&Utc)
    };
    let secs = (now - since).num_seconds();
    if secs <= 0 {
        return None;
    }
    // round partial days up so the window always covers `since`
    u32::try_from((secs + 86_399) / 86_400).ok()
}

// Published timestamps arrive as RFC3339, RFC2822, or naive ISO (assumed UTC).
pub fn parse_published(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    None
}

pub fn format_time_ago(published: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let hours = (now - published).num_hours();
    if hours < 1 {
        return "Just now".to_string();
    }
    if hours < 24 {
        return format!("{hours}h ago");
    }
    format!("{}d ago", hours / 24)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn days_window_accepts_suffix_number_and_dates() {
        assert_eq!(parse_days_window("7d", now()), Some(7));
        assert_eq!(parse_days_window("3", now()), Some(3));
        assert_eq!(parse_days_window("0d", now()), None);
        assert_eq!(parse_days_window("2024-01-14", now()), Some(2));
        assert_eq!(parse_days_window("2024-01-14T12:00:00Z", now()), Some(1));
        assert_eq!(parse_days_window("2024-02-01", now()), None);
        assert_eq!(parse_days_window("soon", now()), None);
    }

    #[test]
    fn published_formats() {
        assert!(parse_published("2024-01-15T10:30:00Z").is_some());
        assert!(parse_published("Mon, 15 Jan 2024 10:30:00 +0000").is_some());
        assert_eq!(
            parse_published("2024-01-15T10:30:00.123456"),
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap() + Duration::microseconds(123_456))
        );
        assert!(parse_published("yesterday").is_none());
    }

    #[test]
    fn time_ago_buckets() {
        assert_eq!(format_time_ago(now() - Duration::minutes(30), now()), "Just now");
        assert_eq!(format_time_ago(now() - Duration::hours(5), now()), "5h ago");
        assert_eq!(format_time_ago(now() - Duration::hours(50), now()), "2d ago");
    }
}
