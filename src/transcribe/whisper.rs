use crate::error::{Result, TransubError};
use crate::transcribe::{Transcriber, Transcript, TranscriptSegment};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::debug;

/// OpenAI Whisper API endpoint.
const WHISPER_API_URL: &str = "https://api.openai.com/v1/audio/transcriptions";

/// Maximum file size for Whisper API (25 MB).
const MAX_FILE_SIZE: u64 = 25 * 1024 * 1024;

/// Whisper model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WhisperModel {
    #[default]
    Whisper1,
    Gpt4oTranscribe,
    Gpt4oMiniTranscribe,
}

impl WhisperModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            WhisperModel::Whisper1 => "whisper-1",
            WhisperModel::Gpt4oTranscribe => "gpt-4o-transcribe",
            WhisperModel::Gpt4oMiniTranscribe => "gpt-4o-mini-transcribe",
        }
    }
}

impl std::str::FromStr for WhisperModel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "whisper-1" => Ok(WhisperModel::Whisper1),
            "gpt-4o-transcribe" => Ok(WhisperModel::Gpt4oTranscribe),
            "gpt-4o-mini-transcribe" => Ok(WhisperModel::Gpt4oMiniTranscribe),
            _ => Err(format!("Unknown Whisper model: {s}")),
        }
    }
}

/// OpenAI Whisper API client.
pub struct WhisperClient {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
    model: WhisperModel,
}

impl WhisperClient {
    /// Create a new Whisper client with the given API key.
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            api_url: WHISPER_API_URL.to_string(),
            model: WhisperModel::default(),
        }
    }

    /// Use a preconfigured HTTP client (timeouts, proxies).
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Point the client at a different transcription endpoint.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_model(mut self, model: WhisperModel) -> Self {
        self.model = model;
        self
    }

    async fn build_form(&self, audio_path: &Path, language: &str) -> Result<Form> {
        let file_bytes = fs::read(audio_path).await.map_err(|e| {
            TransubError::Transcription(format!("Failed to read {}: {e}", audio_path.display()))
        })?;
        let file_name = audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.ogg")
            .to_string();

        let mime_type = match audio_path.extension().and_then(|e| e.to_str()) {
            Some("wav") => "audio/wav",
            Some("ogg") => "audio/ogg",
            Some("mp3") => "audio/mpeg",
            Some("flac") => "audio/flac",
            _ => "application/octet-stream",
        };

        let file_part = Part::bytes(file_bytes)
            .file_name(file_name)
            .mime_str(mime_type)
            .map_err(|e| TransubError::Transcription(format!("Invalid MIME type: {e}")))?;

        Ok(Form::new()
            .part("file", file_part)
            .text("model", self.model.as_str())
            .text("language", language.to_string())
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "segment"))
    }

    async fn call_api(&self, form: Form) -> Result<WhisperResponse> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TransubError::Transcription(format!("Request failed: {e}")))?;

        let status = response.status();
        debug!("Whisper API response status: {}", status);

        let body = response
            .text()
            .await
            .map_err(|e| TransubError::Transcription(format!("Failed to read response: {e}")))?;

        if status.is_success() {
            debug!("Whisper API response: {}", truncate(&body, 500));
            return serde_json::from_str(&body).map_err(|e| {
                TransubError::Transcription(format!("Failed to parse response: {e}"))
            });
        }

        if let Ok(api_error) = serde_json::from_str::<ApiErrorResponse>(&body) {
            return Err(TransubError::Transcription(format!(
                "Whisper API error ({}): {}",
                status, api_error.error.message
            )));
        }

        Err(TransubError::Transcription(format!(
            "Whisper API error ({}): {}",
            status, body
        )))
    }

    /// Convert a Whisper response to a transcript, keeping segment order as-is.
    fn parse_response(&self, response: WhisperResponse) -> Result<Transcript> {
        let duration = response.duration.and_then(|d| Duration::try_from_secs_f64(d).ok());

        let segments = match response.segments {
            Some(api_segments) => api_segments
                .into_iter()
                .map(|seg| {
                    let start = seconds(seg.start)?;
                    let end = seconds(seg.end)?;
                    if end < start {
                        return Err(TransubError::Transcription(format!(
                            "Segment ends before it starts ({} > {})",
                            seg.start, seg.end
                        )));
                    }
                    Ok(TranscriptSegment {
                        start,
                        end,
                        text: seg.text,
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            None if response.text.trim().is_empty() => Vec::new(),
            None => vec![TranscriptSegment {
                start: Duration::ZERO,
                end: duration.unwrap_or_default(),
                text: response.text,
            }],
        };

        Ok(Transcript {
            segments,
            language: response.language,
            duration,
        })
    }
}

fn seconds(value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value)
        .map_err(|e| TransubError::Transcription(format!("Invalid segment timestamp {value}: {e}")))
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[async_trait]
impl Transcriber for WhisperClient {
    async fn transcribe(&self, audio_path: &Path, language: &str) -> Result<Transcript> {
        debug!(
            "Transcribing {} with Whisper (language: {})",
            audio_path.display(),
            language
        );

        let metadata = fs::metadata(audio_path).await.map_err(|e| {
            TransubError::Transcription(format!("Cannot access {}: {e}", audio_path.display()))
        })?;
        if metadata.len() > MAX_FILE_SIZE {
            return Err(TransubError::Transcription(format!(
                "File too large for Whisper API: {} bytes (max {} bytes)",
                metadata.len(),
                MAX_FILE_SIZE
            )));
        }

        let form = self.build_form(audio_path, language).await?;
        let response = self.call_api(form).await?;
        let transcript = self.parse_response(response)?;

        debug!("Whisper returned {} segments", transcript.segments.len());

        Ok(transcript)
    }

    fn name(&self) -> &'static str {
        "OpenAI Whisper"
    }
}

// API response types

#[derive(Debug, Deserialize)]
struct WhisperResponse {
    #[serde(default)]
    text: String,
    #[serde(default)]
    segments: Option<Vec<WhisperSegment>>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    start: f64,
    end: f64,
    text: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}
