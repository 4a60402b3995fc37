pub mod whisper;

pub use whisper::{WhisperClient, WhisperModel};

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// One timed piece of recognized speech.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSegment {
    pub start: Duration,
    pub end: Duration,
    pub text: String,
}

/// Chronologically ordered segments as returned by the speech-to-text service.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    pub segments: Vec<TranscriptSegment>,
    pub language: Option<String>,
    pub duration: Option<Duration>,
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe the audio file at `audio_path` spoken in `language` (service code).
    async fn transcribe(&self, audio_path: &Path, language: &str) -> Result<Transcript>;
    fn name(&self) -> &'static str;
}
