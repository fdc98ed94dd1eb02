use chrono::{DateTime, Local, Utc};

/// Converts a stored UTC timestamp to the local timezone for display
pub fn format_timestamp_to_local(timestamp: &DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S %Z")
        .to_string()
}

/// Formats an optional timestamp, "-" when it was never set
pub fn format_optional_timestamp(timestamp: Option<&DateTime<Utc>>) -> String {
    timestamp
        .map(format_timestamp_to_local)
        .unwrap_or_else(|| "-".to_string())
}

/// Shortens text to at most `max_chars` characters, marking the cut with "..."
/// Newlines are flattened so the preview fits on one line.
pub fn preview(text: &str, max_chars: usize) -> String {
    let flat: String = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let flat = flat.trim();

    if flat.chars().count() <= max_chars {
        return flat.to_string();
    }
    let kept: String = flat.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_timestamp_to_local() {
        let ts = Utc.with_ymd_and_hms(2025, 12, 16, 12, 0, 0).unwrap();
        let result = format_timestamp_to_local(&ts);
        // Local offset varies by machine, the day cannot move by more than one
        assert!(result.starts_with("2025-12-1"));
        assert!(result.contains(':'));
    }

    #[test]
    fn test_format_optional_timestamp_none() {
        assert_eq!(format_optional_timestamp(None), "-");
    }

    #[test]
    fn test_preview_short_text_unchanged() {
        assert_eq!(preview("hello", 10), "hello");
    }

    #[test]
    fn test_preview_truncates() {
        assert_eq!(preview("abcdefghij", 8), "abcde...");
    }

    #[test]
    fn test_preview_flattens_newlines() {
        assert_eq!(preview("line one\nline two", 40), "line one line two");
    }

    #[test]
    fn test_preview_counts_characters() {
        assert_eq!(preview("ééééé", 5), "ééééé");
        assert_eq!(preview("éééééé", 5), "éé...");
    }
}
