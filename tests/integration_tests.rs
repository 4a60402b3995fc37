//! Integration tests for transub
//!
//! These tests validate the integration between components without requiring
//! external API keys or FFmpeg.

use std::time::Duration;
use transub::config::Config;
use transub::job::{JobProgress, JobStage, SubtitleKind};
use transub::language::{LanguageCatalog, LanguageSelection};
use transub::subtitle::{
    convert_to_subtitles, format_millis, format_srt, parse_srt, parse_timestamp, write_subtitles,
};
use transub::transcribe::TranscriptSegment;
use transub::{JobStore, TransubError};

fn segments(count: usize) -> Vec<TranscriptSegment> {
    (0..count)
        .map(|i| TranscriptSegment {
            start: Duration::from_millis(i as u64 * 2000),
            end: Duration::from_millis(i as u64 * 2000 + 1750),
            text: format!("  Line number {}  ", i + 1),
        })
        .collect()
}

// ============================================================================
// Config Integration Tests
// ============================================================================

mod config_tests {
    use super::*;

    #[test]
    fn test_config_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "static_dir = \"/opt/transub/static\"\nextraction_timeout_secs = 42\n",
        )
        .unwrap();

        let config = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(config.static_dir, std::path::PathBuf::from("/opt/transub/static"));
        assert_eq!(config.extraction_timeout_secs, 42);
    }

    #[test]
    fn test_config_load_missing_file() {
        let result = Config::load(Some(std::path::Path::new("/nonexistent/transub.toml")));
        assert!(matches!(result, Err(TransubError::Config(_))));
    }

    #[test]
    fn test_config_requires_both_secrets() {
        let mut config = Config::default();
        config.openai_api_key = Some("sk-test".to_string());
        assert!(matches!(config.validate(), Err(TransubError::MissingConfig(_))));

        config.deepl_api_key = Some("key:fx".to_string());
        assert!(config.validate().is_ok());
    }
}

// ============================================================================
// Subtitle Writer Integration Tests
// ============================================================================

mod subtitle_tests {
    use super::*;

    #[test]
    fn test_n_segments_make_n_blocks() {
        for n in [0, 1, 2, 7, 25] {
            let entries = convert_to_subtitles(&segments(n));
            let srt = format_srt(&entries);

            let blocks: Vec<&str> = srt.split_terminator("\n\n").collect();
            assert_eq!(blocks.len(), n);
            assert!(n == 0 || srt.ends_with("\n\n"));

            for (i, block) in blocks.iter().enumerate() {
                let first_line = block.lines().next().unwrap();
                assert_eq!(first_line, (i + 1).to_string());
            }

            let parsed = parse_srt(&srt).unwrap();
            assert_eq!(parsed.len(), n);
        }
    }

    #[test]
    fn test_block_layout() {
        let entries = convert_to_subtitles(&segments(1));
        assert_eq!(
            format_srt(&entries),
            "1\n00:00:00,000 --> 00:00:01,750\nLine number 1\n\n"
        );
    }

    #[test]
    fn test_timestamp_examples() {
        assert_eq!(format_millis(1500), "00:00:01,500");
        assert_eq!(format_millis(3_661_234), "01:01:01,234");
        assert_eq!(parse_timestamp("01:01:01,234"), Some(3_661_234));
    }

    #[test]
    fn test_timestamp_round_trip_sweep() {
        let mut ms = 0u64;
        while ms < 100 * 3_600_000 {
            let formatted = format_millis(ms);
            let fields: Vec<&str> = formatted.split(|c: char| c == ':' || c == ',').collect();
            assert_eq!(
                fields.iter().map(|f| f.len()).collect::<Vec<_>>(),
                vec![2, 2, 2, 3],
                "{formatted}"
            );
            assert_eq!(parse_timestamp(&formatted), Some(ms));
            ms = ms * 3 + 7;
        }
    }

    #[tokio::test]
    async fn test_write_into_job_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = JobStore::new(dir.path());
        let job = store.create_job(Some("mp4")).await.unwrap();

        let entries = convert_to_subtitles(&segments(3));
        write_subtitles(&entries, &job.subtitle_path(SubtitleKind::Original))
            .await
            .unwrap();

        let path = store
            .subtitle_file(&job.id.to_string(), SubtitleKind::Original)
            .await
            .unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert_eq!(parse_srt(&text).unwrap(), entries);
    }
}

// ============================================================================
// Language and Job Tests
// ============================================================================

mod job_tests {
    use super::*;

    #[test]
    fn test_language_selection_for_upload() {
        let selection = LanguageSelection::resolve("English", "French").unwrap();
        assert_eq!(selection.transcription_code, "en");
        assert_eq!(selection.translation_code, "FR");

        let catalog = LanguageCatalog::new();
        for name in &catalog.translation {
            assert!(catalog.transcription.contains(name), "{name}");
        }
    }

    #[test]
    fn test_job_stage_sequence() {
        let mut progress = JobProgress::new(uuid::Uuid::new_v4());
        for stage in [
            JobStage::VideoSaved,
            JobStage::AudioExtracted,
            JobStage::Transcribed,
            JobStage::SubtitlesWritten,
            JobStage::Translated,
            JobStage::Complete,
        ] {
            progress.advance(stage.clone());
            assert_eq!(progress.stage(), &stage);
        }

        progress.fail(&TransubError::Translation("late".to_string()));
        assert_eq!(progress.stage(), &JobStage::Complete);
    }

    #[tokio::test]
    async fn test_result_of_failed_job_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = JobStore::new(dir.path());
        let job = store.create_job(Some("mp4")).await.unwrap();

        // A job that died after writing the original subtitles.
        std::fs::write(job.subtitle_path(SubtitleKind::Original), "1\n").unwrap();

        let result = store.read_result(&job.id.to_string()).await;
        assert!(matches!(result, Err(TransubError::NotFound(_))));
    }
}
