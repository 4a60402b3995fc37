use super::SubtitleEntry;
use crate::transcribe::TranscriptSegment;

/// Convert transcript segments to subtitle entries, one entry per segment.
///
/// Indices start at 1 and follow segment order. Text is trimmed; timing is
/// carried over untouched (no merging, splitting or overlap repair).
pub fn convert_to_subtitles(segments: &[TranscriptSegment]) -> Vec<SubtitleEntry> {
    segments
        .iter()
        .enumerate()
        .map(|(i, segment)| SubtitleEntry {
            index: i + 1,
            start: segment.start,
            end: segment.end,
            text: segment.text.trim().to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn segment(start_ms: u64, end_ms: u64, text: &str) -> TranscriptSegment {
        TranscriptSegment {
            start: Duration::from_millis(start_ms),
            end: Duration::from_millis(end_ms),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_indices_follow_segment_order() {
        let segments = vec![
            segment(0, 1000, " First "),
            segment(1000, 2000, "Second"),
            segment(2000, 3000, "\tThird\n"),
        ];

        let entries = convert_to_subtitles(&segments);
        let indices: Vec<usize> = entries.iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert_eq!(entries[0].text, "First");
        assert_eq!(entries[2].text, "Third");
    }

    #[test]
    fn test_overlaps_are_preserved() {
        let segments = vec![segment(0, 2500, "A"), segment(2000, 3000, "B")];
        let entries = convert_to_subtitles(&segments);
        assert_eq!(entries[0].end, Duration::from_millis(2500));
        assert_eq!(entries[1].start, Duration::from_millis(2000));
    }

    #[test]
    fn test_empty_transcript() {
        assert!(convert_to_subtitles(&[]).is_empty());
    }
}
