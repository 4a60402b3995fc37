// SRT subtitle format
use super::SubtitleEntry;
use crate::error::{Result, TransubError};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;

fn timestamp_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{2,}):(\d{2}):(\d{2}),(\d{3})$").expect("Invalid regex"))
}

fn timing_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\S+) --> (\S+)$").expect("Invalid regex"))
}

/// Round a duration to whole milliseconds, saturating at `u64::MAX`.
pub fn to_millis(d: Duration) -> u64 {
    u64::try_from((d.as_nanos() + 500_000) / 1_000_000).unwrap_or(u64::MAX)
}

/// Format a millisecond count as `HH:MM:SS,mmm`.
///
/// Hours are zero-padded to two digits and grow past that without bound.
pub fn format_millis(ms: u64) -> String {
    let (seconds, millis) = (ms / 1000, ms % 1000);
    let (minutes, seconds) = (seconds / 60, seconds % 60);
    let (hours, minutes) = (minutes / 60, minutes % 60);
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

pub fn format_timestamp(d: Duration) -> String {
    format_millis(to_millis(d))
}

/// Parse `HH:MM:SS,mmm` back to a millisecond count.
pub fn parse_timestamp(s: &str) -> Option<u64> {
    let caps = timestamp_regex().captures(s.trim())?;
    let hours: u64 = caps[1].parse().ok()?;
    let minutes: u64 = caps[2].parse().ok()?;
    let seconds: u64 = caps[3].parse().ok()?;
    let millis: u64 = caps[4].parse().ok()?;

    if minutes >= 60 || seconds >= 60 {
        return None;
    }

    Some(((hours * 60 + minutes) * 60 + seconds) * 1000 + millis)
}

/// Serialize entries as SRT; every block ends with a blank line.
pub fn format_srt(entries: &[SubtitleEntry]) -> String {
    entries
        .iter()
        .map(|entry| {
            format!(
                "{}\n{} --> {}\n{}\n\n",
                entry.index,
                format_timestamp(entry.start),
                format_timestamp(entry.end),
                entry.text
            )
        })
        .collect()
}

/// Write entries to `path` as an SRT file.
pub async fn write_subtitles(entries: &[SubtitleEntry], path: &Path) -> Result<()> {
    debug!("Writing {} subtitle entries to {}", entries.len(), path.display());
    tokio::fs::write(path, format_srt(entries))
        .await
        .map_err(|e| TransubError::file_write(path, e))
}

/// Parse SRT text into entries. Accepts CRLF line endings and a missing final blank line.
pub fn parse_srt(text: &str) -> Result<Vec<SubtitleEntry>> {
    let normalized = text.replace("\r\n", "\n");
    let mut lines = normalized.lines().enumerate().peekable();
    let mut entries = Vec::new();

    loop {
        while lines.next_if(|(_, line)| line.trim().is_empty()).is_some() {}

        let Some((line_no, index_line)) = lines.next() else {
            break;
        };
        let index: usize = index_line.trim().parse().map_err(|_| {
            TransubError::Subtitle(format!(
                "line {}: expected block index, found {:?}",
                line_no + 1,
                index_line
            ))
        })?;

        let (line_no, timing_line) = lines.next().ok_or_else(|| {
            TransubError::Subtitle(format!("block {index}: missing timing line"))
        })?;
        let caps = timing_regex().captures(timing_line.trim()).ok_or_else(|| {
            TransubError::Subtitle(format!(
                "line {}: malformed timing line {:?}",
                line_no + 1,
                timing_line
            ))
        })?;
        let start = parse_timestamp(&caps[1]).ok_or_else(|| {
            TransubError::Subtitle(format!("line {}: bad start timestamp", line_no + 1))
        })?;
        let end = parse_timestamp(&caps[2]).ok_or_else(|| {
            TransubError::Subtitle(format!("line {}: bad end timestamp", line_no + 1))
        })?;

        let mut text_lines = Vec::new();
        while let Some((_, line)) = lines.next_if(|(_, line)| !line.trim().is_empty()) {
            text_lines.push(line);
        }

        entries.push(SubtitleEntry {
            index,
            start: Duration::from_millis(start),
            end: Duration::from_millis(end),
            text: text_lines.join("\n"),
        });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn entry(index: usize, start_ms: u64, end_ms: u64, text: &str) -> SubtitleEntry {
        SubtitleEntry {
            index,
            start: Duration::from_millis(start_ms),
            end: Duration::from_millis(end_ms),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_millis(1500), "00:00:01,500");
        assert_eq!(format_millis(3_661_234), "01:01:01,234");
        assert_eq!(
            format_timestamp(Duration::from_secs_f64(1.5)),
            "00:00:01,500"
        );
    }

    #[test]
    fn test_format_timestamp_rounds_to_nearest_millisecond() {
        assert_eq!(to_millis(Duration::from_micros(1_499_600)), 1500);
        assert_eq!(to_millis(Duration::from_micros(1_499_400)), 1499);
        assert_eq!(format_timestamp(Duration::from_secs_f64(2.9996)), "00:00:03,000");
    }

    #[test]
    fn test_to_millis_saturates() {
        assert_eq!(to_millis(Duration::MAX), u64::MAX);
        assert_eq!(to_millis(Duration::from_secs(u64::MAX / 1000)), (u64::MAX / 1000) * 1000);
    }

    #[test]
    fn test_format_timestamp_past_99_hours() {
        assert_eq!(format_millis(100 * 3_600_000), "100:00:00,000");
        assert_eq!(parse_timestamp("100:00:00,000"), Some(100 * 3_600_000));
    }

    #[test]
    fn test_timestamp_round_trip() {
        for ms in [0, 1, 999, 1000, 59_999, 60_000, 3_599_999, 3_661_234, 359_999_999] {
            let formatted = format_millis(ms);
            assert!(timestamp_regex().is_match(&formatted), "{formatted}");
            assert_eq!(formatted.len(), 12, "{formatted}");
            assert_eq!(parse_timestamp(&formatted), Some(ms));
        }
    }

    #[test]
    fn test_parse_timestamp_rejects_malformed() {
        assert_eq!(parse_timestamp("00:00:01.500"), None);
        assert_eq!(parse_timestamp("0:00:01,500"), None);
        assert_eq!(parse_timestamp("00:61:01,500"), None);
        assert_eq!(parse_timestamp("00:00:01,50"), None);
    }

    #[test]
    fn test_srt_format() {
        let entries = vec![
            entry(1, 1500, 4000, "Hello, world!"),
            entry(2, 4500, 7000, "This is a test."),
        ];

        let output = format_srt(&entries);
        assert_eq!(
            output,
            "1\n00:00:01,500 --> 00:00:04,000\nHello, world!\n\n\
             2\n00:00:04,500 --> 00:00:07,000\nThis is a test.\n\n"
        );
    }

    #[test]
    fn test_srt_format_empty() {
        assert_eq!(format_srt(&[]), "");
    }

    #[test]
    fn test_parse_srt_inverts_format() {
        let entries = vec![
            entry(1, 0, 1200, "One"),
            entry(2, 1300, 2500, "Two\nlines"),
            entry(3, 2600, 4000, "Three"),
        ];
        assert_eq!(parse_srt(&format_srt(&entries)).unwrap(), entries);
    }

    #[test]
    fn test_parse_srt_tolerates_crlf_and_missing_trailer() {
        let text = "1\r\n00:00:00,000 --> 00:00:01,000\r\nBonjour\r\n\r\n2\r\n00:00:01,000 --> 00:00:02,000\r\nSalut";
        let entries = parse_srt(text).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].text, "Bonjour");
        assert_eq!(entries[1].text, "Salut");
    }

    #[test]
    fn test_parse_srt_empty_text_block() {
        let entries = vec![entry(1, 0, 1000, ""), entry(2, 1000, 2000, "After")];
        let parsed = parse_srt(&format_srt(&entries)).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].text, "After");
    }

    #[test]
    fn test_parse_srt_errors() {
        assert!(parse_srt("one\n00:00:00,000 --> 00:00:01,000\nText\n").is_err());
        assert!(parse_srt("1\n00:00:00,000 -> 00:00:01,000\nText\n").is_err());
        assert!(parse_srt("1\n").is_err());
    }

    #[tokio::test]
    async fn test_write_subtitles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transcript.srt");
        let entries = vec![entry(1, 0, 1000, "Hi")];

        write_subtitles(&entries, &path).await.unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "1\n00:00:00,000 --> 00:00:01,000\nHi\n\n");
    }

    #[tokio::test]
    async fn test_write_subtitles_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("transcript.srt");

        let result = write_subtitles(&[], &path).await;
        assert!(matches!(result, Err(TransubError::FileWrite { .. })));
    }
}
