//! Log excerpt shaping

use chrono::DateTime;

/// Number of trailing log lines kept in an answer
pub const LOG_TAIL_LINES: usize = 5;

/// Upper bound on the length of a log answer, in characters
pub const MAX_LOG_ANSWER_CHARS: usize = 512;

/// Drop a leading RFC 3339 timestamp (`2024-05-01T10:00:00.123Z msg`)
fn strip_timestamp(line: &str) -> &str {
    let trimmed = line.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((head, rest)) if DateTime::parse_from_rfc3339(head).is_ok() => rest.trim_start(),
        _ => trimmed,
    }
}

/// Keep the tail of a log stream: last non-empty lines without
/// timestamps, capped at [`MAX_LOG_ANSWER_CHARS`] (the end is kept).
/// Returns `None` when there is nothing to show.
pub fn log_excerpt<S: AsRef<str>>(lines: &[S]) -> Option<String> {
    let mut tail: Vec<&str> = lines
        .iter()
        .rev()
        .map(|l| strip_timestamp(l.as_ref()))
        .filter(|l| !l.is_empty())
        .take(LOG_TAIL_LINES)
        .collect();

    if tail.is_empty() {
        return None;
    }
    tail.reverse();

    let text = tail.join("\n");
    let char_count = text.chars().count();
    if char_count <= MAX_LOG_ANSWER_CHARS {
        return Some(text);
    }

    let skip = char_count - MAX_LOG_ANSWER_CHARS;
    Some(text.chars().skip(skip).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_keeps_tail() {
        let lines: Vec<String> = (1..=10).map(|i| format!("line {}", i)).collect();
        let excerpt = log_excerpt(&lines).unwrap();

        assert_eq!(excerpt, "line 6\nline 7\nline 8\nline 9\nline 10");
    }

    #[test]
    fn test_excerpt_strips_timestamps_and_blank_lines() {
        let lines = [
            "2024-05-01T10:00:00.123456789Z starting server",
            "",
            "2024-05-01T10:00:01Z listening on :8080",
            "   ",
        ];

        assert_eq!(
            log_excerpt(&lines).unwrap(),
            "starting server\nlistening on :8080"
        );
    }

    #[test]
    fn test_excerpt_leaves_non_timestamp_prefix() {
        let lines = ["INFO ready"];
        assert_eq!(log_excerpt(&lines).unwrap(), "INFO ready");
    }

    #[test]
    fn test_excerpt_is_bounded() {
        let long = "x".repeat(4096);
        let excerpt = log_excerpt(&[long.as_str()]).unwrap();
        assert_eq!(excerpt.chars().count(), MAX_LOG_ANSWER_CHARS);
    }

    #[test]
    fn test_excerpt_empty() {
        let lines: [&str; 2] = ["", " "];
        assert!(log_excerpt(&lines).is_none());
    }
}
