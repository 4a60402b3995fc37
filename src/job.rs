use crate::audio::AudioOptions;
use crate::error::{Result, TransubError};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use uuid::Uuid;

pub const ORIGINAL_SUBTITLE_FILE: &str = "transcript.srt";
pub const TRANSLATED_SUBTITLE_FILE: &str = "translated_transcript.srt";

/// Which of a job's two subtitle files is meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleKind {
    Original,
    Translated,
}

impl SubtitleKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            SubtitleKind::Original => ORIGINAL_SUBTITLE_FILE,
            SubtitleKind::Translated => TRANSLATED_SUBTITLE_FILE,
        }
    }
}

impl std::str::FromStr for SubtitleKind {
    type Err = TransubError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "original" => Ok(SubtitleKind::Original),
            "translated" => Ok(SubtitleKind::Translated),
            _ => Err(TransubError::InvalidFileType(format!(
                "{s:?}; use 'original' or 'translated'"
            ))),
        }
    }
}

impl fmt::Display for SubtitleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubtitleKind::Original => write!(f, "original"),
            SubtitleKind::Translated => write!(f, "translated"),
        }
    }
}

/// A job's identity and the layout of its directory.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,
    pub dir: PathBuf,
    video_file: String,
}

impl Job {
    /// `video_extension` is the uploaded file's extension without the dot, if any.
    pub fn new(id: Uuid, dir: PathBuf, video_extension: Option<&str>) -> Self {
        let video_file = match video_extension {
            Some(ext) if !ext.is_empty() => format!("video.{ext}"),
            _ => "video".to_string(),
        };
        Self { id, dir, video_file }
    }

    pub fn video_path(&self) -> PathBuf {
        self.dir.join(&self.video_file)
    }

    pub fn audio_path(&self, options: &AudioOptions) -> PathBuf {
        self.dir.join(options.file_name())
    }

    pub fn subtitle_path(&self, kind: SubtitleKind) -> PathBuf {
        subtitle_path(&self.dir, kind)
    }
}

pub(crate) fn subtitle_path(dir: &Path, kind: SubtitleKind) -> PathBuf {
    dir.join(kind.file_name())
}

/// Pipeline stages of a job, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStage {
    Created,
    VideoSaved,
    AudioExtracted,
    Transcribed,
    SubtitlesWritten,
    Translated,
    Complete,
    Failed(String),
}

impl JobStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStage::Complete | JobStage::Failed(_))
    }
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStage::Created => write!(f, "created"),
            JobStage::VideoSaved => write!(f, "video saved"),
            JobStage::AudioExtracted => write!(f, "audio extracted"),
            JobStage::Transcribed => write!(f, "transcribed"),
            JobStage::SubtitlesWritten => write!(f, "subtitles written"),
            JobStage::Translated => write!(f, "translated"),
            JobStage::Complete => write!(f, "complete"),
            JobStage::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Tracks and logs the stage of one running job.
///
/// Nothing is persisted: the files in the job directory are the only record.
#[derive(Debug)]
pub struct JobProgress {
    job_id: Uuid,
    stage: JobStage,
}

impl JobProgress {
    pub fn new(job_id: Uuid) -> Self {
        Self {
            job_id,
            stage: JobStage::Created,
        }
    }

    pub fn stage(&self) -> &JobStage {
        &self.stage
    }

    /// Move to `next`. Terminal stages are final.
    pub fn advance(&mut self, next: JobStage) {
        if self.stage.is_terminal() {
            return;
        }
        info!(job_id = %self.job_id, "Job stage: {} -> {}", self.stage, next);
        self.stage = next;
    }

    pub fn fail(&mut self, err: &TransubError) {
        if self.stage.is_terminal() {
            return;
        }
        error!(job_id = %self.job_id, "Job failed after stage '{}': {}", self.stage, err);
        self.stage = JobStage::Failed(err.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtitle_kind_parsing() {
        assert_eq!("original".parse::<SubtitleKind>().unwrap(), SubtitleKind::Original);
        assert_eq!(
            "translated".parse::<SubtitleKind>().unwrap(),
            SubtitleKind::Translated
        );
        assert!(matches!(
            "foo".parse::<SubtitleKind>(),
            Err(TransubError::InvalidFileType(_))
        ));
        assert!("Original".parse::<SubtitleKind>().is_err());
    }

    #[test]
    fn test_subtitle_kind_file_names() {
        assert_eq!(SubtitleKind::Original.file_name(), "transcript.srt");
        assert_eq!(
            SubtitleKind::Translated.file_name(),
            "translated_transcript.srt"
        );
    }

    #[test]
    fn test_job_layout() {
        let id = Uuid::new_v4();
        let dir = PathBuf::from("/data").join(id.to_string());
        let job = Job::new(id, dir.clone(), Some("mp4"));

        assert_eq!(job.video_path(), dir.join("video.mp4"));
        assert_eq!(job.audio_path(&AudioOptions::default()), dir.join("audio.ogg"));
        assert_eq!(
            job.subtitle_path(SubtitleKind::Translated),
            dir.join("translated_transcript.srt")
        );
    }

    #[test]
    fn test_job_without_extension() {
        let job = Job::new(Uuid::new_v4(), PathBuf::from("/data/x"), None);
        assert_eq!(job.video_path(), PathBuf::from("/data/x/video"));
    }

    #[test]
    fn test_progress_transitions() {
        let mut progress = JobProgress::new(Uuid::new_v4());
        assert_eq!(progress.stage(), &JobStage::Created);

        progress.advance(JobStage::VideoSaved);
        progress.advance(JobStage::AudioExtracted);
        assert_eq!(progress.stage(), &JobStage::AudioExtracted);

        progress.fail(&TransubError::Transcription("timeout".to_string()));
        assert!(matches!(progress.stage(), JobStage::Failed(r) if r.contains("timeout")));

        // Failed is terminal.
        progress.advance(JobStage::Complete);
        assert!(matches!(progress.stage(), JobStage::Failed(_)));
    }
}
