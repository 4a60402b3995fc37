use crate::audio::{extract_audio, AudioOptions};
use crate::error::{Result, TransubError};
use crate::job::{Job, JobProgress, JobStage, SubtitleKind};
use crate::language::LanguageSelection;
use crate::subtitle::{convert_to_subtitles, parse_srt, write_subtitles};
use crate::transcribe::Transcriber;
use crate::translate::Translator;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Statistics from one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineStats {
    /// Total time taken for the entire pipeline.
    pub total_time: Duration,
    /// Time taken for audio extraction.
    pub extraction_time: Duration,
    /// Time taken for transcription.
    pub transcription_time: Duration,
    /// Time taken for translation.
    pub translation_time: Duration,
    /// Duration of the extracted audio.
    pub audio_duration: Duration,
    /// Number of subtitle entries written.
    pub subtitle_entries: usize,
    /// Blocks found in the translated document, if it parsed as SRT.
    pub translated_entries: Option<usize>,
}

/// Runs extraction, transcription, subtitle writing and translation for one job.
pub struct Pipeline {
    transcriber: Arc<dyn Transcriber>,
    translator: Arc<dyn Translator>,
    audio: AudioOptions,
}

impl Pipeline {
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        translator: Arc<dyn Translator>,
        audio: AudioOptions,
    ) -> Self {
        Self {
            transcriber,
            translator,
            audio,
        }
    }

    /// Process a job whose video is already saved in its directory.
    ///
    /// Any stage failure aborts the rest; files written so far stay on disk.
    pub async fn run(&self, job: &Job, languages: &LanguageSelection) -> Result<PipelineStats> {
        let mut progress = JobProgress::new(job.id);
        progress.advance(JobStage::VideoSaved);

        match self.run_stages(job, languages, &mut progress).await {
            Ok(stats) => {
                progress.advance(JobStage::Complete);
                log_summary(job, &stats);
                Ok(stats)
            }
            Err(e) => {
                progress.fail(&e);
                Err(e)
            }
        }
    }

    async fn run_stages(
        &self,
        job: &Job,
        languages: &LanguageSelection,
        progress: &mut JobProgress,
    ) -> Result<PipelineStats> {
        let start_time = Instant::now();

        // Stage 1: audio extraction
        let extraction_start = Instant::now();
        let audio_path = job.audio_path(&self.audio);
        let audio_metadata = extract_audio(&job.video_path(), &audio_path, &self.audio).await?;
        let extraction_time = extraction_start.elapsed();
        progress.advance(JobStage::AudioExtracted);

        // Stage 2: transcription
        info!(
            job_id = %job.id,
            "Transcribing with {} ({})",
            self.transcriber.name(),
            languages.transcription_code
        );
        let transcription_start = Instant::now();
        let transcript = self
            .transcriber
            .transcribe(&audio_path, languages.transcription_code)
            .await?;
        let transcription_time = transcription_start.elapsed();
        progress.advance(JobStage::Transcribed);

        // Stage 3: subtitle file
        let entries = convert_to_subtitles(&transcript.segments);
        let original_path = job.subtitle_path(SubtitleKind::Original);
        write_subtitles(&entries, &original_path).await?;
        progress.advance(JobStage::SubtitlesWritten);

        // Stage 4: translation
        let original = tokio::fs::read_to_string(&original_path).await?;
        let translation_start = Instant::now();
        let translated = if original.trim().is_empty() {
            warn!(job_id = %job.id, "Transcript is empty, skipping translation");
            String::new()
        } else {
            info!(
                job_id = %job.id,
                "Translating with {} ({})",
                self.translator.name(),
                languages.translation_code
            );
            self.translator
                .translate(&original, languages.translation_code)
                .await?
        };
        let translation_time = translation_start.elapsed();

        let translated_entries = check_translated_markup(job, entries.len(), &translated);

        let translated_path = job.subtitle_path(SubtitleKind::Translated);
        tokio::fs::write(&translated_path, &translated)
            .await
            .map_err(|e| TransubError::file_write(&translated_path, e))?;
        progress.advance(JobStage::Translated);

        Ok(PipelineStats {
            total_time: start_time.elapsed(),
            extraction_time,
            transcription_time,
            translation_time,
            audio_duration: audio_metadata.duration,
            subtitle_entries: entries.len(),
            translated_entries,
        })
    }
}

/// The translation service receives indices and timestamps along with the text
/// and is not guaranteed to leave them alone. Mismatches are reported, not fixed.
fn check_translated_markup(job: &Job, expected: usize, translated: &str) -> Option<usize> {
    match parse_srt(translated) {
        Ok(blocks) => {
            if blocks.len() != expected {
                warn!(
                    job_id = %job.id,
                    "Translated subtitles have {} blocks, original has {}",
                    blocks.len(),
                    expected
                );
            }
            Some(blocks.len())
        }
        Err(e) => {
            warn!(job_id = %job.id, "Translated subtitles are not valid SRT: {}", e);
            None
        }
    }
}

fn log_summary(job: &Job, stats: &PipelineStats) {
    info!(
        job_id = %job.id,
        "Job complete: {} entries from {:.1}s of audio in {:.2}s \
         (extract {:.2}s, transcribe {:.2}s, translate {:.2}s)",
        stats.subtitle_entries,
        stats.audio_duration.as_secs_f64(),
        stats.total_time.as_secs_f64(),
        stats.extraction_time.as_secs_f64(),
        stats.transcription_time.as_secs_f64(),
        stats.translation_time.as_secs_f64()
    );
}
