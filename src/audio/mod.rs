pub mod extract;

pub use extract::{
    check_ffmpeg, container_format, extract_audio, get_audio_duration, get_audio_info,
    SUPPORTED_CONTAINERS,
};

use std::time::Duration;

/// Metadata about an extracted audio file.
#[derive(Debug, Clone)]
pub struct AudioMetadata {
    pub duration: Duration,
    pub sample_rate: u32,
    pub channels: u16,
}

/// How the audio track is written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioOptions {
    /// Re-encode to Ogg/Vorbis instead of writing PCM WAV.
    pub compress: bool,
    /// Vorbis quality, 0 (smallest) to 10 (best). Ignored for WAV.
    pub quality: u8,
    /// Upper bound on a single FFmpeg run.
    pub timeout: Duration,
}

impl Default for AudioOptions {
    fn default() -> Self {
        Self {
            compress: true,
            quality: 5,
            timeout: Duration::from_secs(600),
        }
    }
}

impl AudioOptions {
    /// File name of the extracted artifact inside a job directory.
    pub fn file_name(&self) -> &'static str {
        if self.compress {
            "audio.ogg"
        } else {
            "audio.wav"
        }
    }
}
