//! Duration formatting for log lines.

use std::time::Duration;

/// Format a duration compactly: `850ms`, `12s`, `2m 5s`, `1h 3m`.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs == 0 {
        format!("{}ms", duration.as_millis())
    } else if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_second_uses_millis() {
        assert_eq!(format_duration(Duration::from_millis(850)), "850ms");
    }

    #[test]
    fn seconds_minutes_hours() {
        assert_eq!(format_duration(Duration::from_secs(60)), "1m 0s");
        assert_eq!(format_duration(Duration::from_millis(120_000)), "2m 0s");
        assert_eq!(format_duration(Duration::from_secs(12)), "12s");
        assert_eq!(format_duration(Duration::from_secs(3780)), "1h 3m");
    }
}
