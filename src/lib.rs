//! Video subtitle service.
//!
//! An uploaded video goes through audio extraction (FFmpeg), speech-to-text
//! (OpenAI Whisper), SRT generation and document translation (DeepL). Both
//! subtitle files are kept in a per-job directory and served over HTTP.

pub mod audio;
pub mod config;
pub mod error;
pub mod job;
pub mod language;
pub mod pipeline;
pub mod server;
pub mod store;
pub mod subtitle;
pub mod transcribe;
pub mod translate;

pub use config::Config;
pub use error::{Result, TransubError};
pub use pipeline::{Pipeline, PipelineStats};
pub use store::{JobResult, JobStore};
