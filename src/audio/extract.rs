use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{Result, TransubError};

use super::{AudioMetadata, AudioOptions};

/// Container formats accepted for audio extraction.
pub const SUPPORTED_CONTAINERS: [&str; 2] = ["mp4", "mov"];

/// Number of FFmpeg stderr lines carried into an extraction error.
const STDERR_TAIL_LINES: usize = 5;

/// Return the lowercased container extension of `input` if it is on the allow-list.
pub fn container_format(input: &Path) -> Result<String> {
    let extension = input
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if SUPPORTED_CONTAINERS.contains(&extension.as_str()) {
        Ok(extension)
    } else if extension.is_empty() {
        Err(TransubError::UnsupportedFormat(format!(
            "{} has no file extension",
            input.display()
        )))
    } else {
        Err(TransubError::UnsupportedFormat(format!(".{extension}")))
    }
}

/// Check if FFmpeg is installed and accessible.
pub async fn check_ffmpeg() -> Result<()> {
    let output = Command::new("ffmpeg")
        .arg("-version")
        .output()
        .await
        .map_err(|e| {
            TransubError::AudioExtraction(format!(
                "FFmpeg not found. Please install FFmpeg and ensure it's in your PATH. Error: {e}"
            ))
        })?;

    if !output.status.success() {
        return Err(TransubError::AudioExtraction(
            "FFmpeg check failed".to_string(),
        ));
    }

    debug!("FFmpeg is available");
    Ok(())
}

async fn run_ffprobe(args: &[&str], input: &Path) -> Result<String> {
    let output = Command::new("ffprobe")
        .args(args)
        .arg(input)
        .output()
        .await
        .map_err(|e| TransubError::AudioExtraction(format!("Failed to run FFprobe: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(TransubError::AudioExtraction(format!(
            "FFprobe failed: {}",
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Get audio duration using FFprobe.
pub async fn get_audio_duration(input: &Path) -> Result<Duration> {
    let duration_str = run_ffprobe(
        &[
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ],
        input,
    )
    .await?;

    let duration_secs: f64 = duration_str.parse().map_err(|e| {
        TransubError::AudioExtraction(format!("Failed to parse duration '{duration_str}': {e}"))
    })?;

    Duration::try_from_secs_f64(duration_secs).map_err(|e| {
        TransubError::AudioExtraction(format!("Invalid duration '{duration_str}': {e}"))
    })
}

/// Get audio metadata (sample rate, channels) using FFprobe.
pub async fn get_audio_info(input: &Path) -> Result<(u32, u16)> {
    let info_str = run_ffprobe(
        &[
            "-v",
            "error",
            "-select_streams",
            "a:0",
            "-show_entries",
            "stream=sample_rate,channels",
            "-of",
            "csv=s=,:p=0",
        ],
        input,
    )
    .await?;

    parse_audio_info(&info_str)
}

fn parse_audio_info(info_str: &str) -> Result<(u32, u16)> {
    let parts: Vec<&str> = info_str.split(',').map(str::trim).collect();

    if parts.len() < 2 {
        return Err(TransubError::AudioExtraction(format!(
            "Failed to parse audio info: {info_str}"
        )));
    }

    let sample_rate: u32 = parts[0].parse().map_err(|e| {
        TransubError::AudioExtraction(format!("Failed to parse sample rate: {e}"))
    })?;

    let channels: u16 = parts[1]
        .parse()
        .map_err(|e| TransubError::AudioExtraction(format!("Failed to parse channels: {e}")))?;

    Ok((sample_rate, channels))
}

/// Read duration and format from a PCM WAV header.
fn read_wav_metadata(path: &Path) -> Result<AudioMetadata> {
    let reader = hound::WavReader::open(path).map_err(|e| {
        TransubError::AudioExtraction(format!("Failed to read WAV output {}: {e}", path.display()))
    })?;

    let spec = reader.spec();
    let duration = if spec.sample_rate == 0 {
        Duration::ZERO
    } else {
        Duration::from_secs_f64(reader.duration() as f64 / spec.sample_rate as f64)
    };

    Ok(AudioMetadata {
        duration,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}

fn ffmpeg_args(input: &Path, output: &Path, options: &AudioOptions) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-y", "-nostdin", "-hide_banner", "-loglevel", "error", "-i"]
        .iter()
        .map(OsString::from)
        .collect();
    args.push(input.into());
    args.extend(["-vn", "-map", "0:a:0"].iter().map(OsString::from));

    if options.compress {
        args.extend(
            ["-c:a", "libvorbis", "-q:a"]
                .iter()
                .map(OsString::from),
        );
        args.push(options.quality.to_string().into());
        args.extend(["-f", "ogg"].iter().map(OsString::from));
    } else {
        // 16kHz mono keeps a few minutes of PCM under the transcription upload limit.
        args.extend(
            ["-ar", "16000", "-ac", "1", "-c:a", "pcm_s16le", "-f", "wav"]
                .iter()
                .map(OsString::from),
        );
    }

    args.push(output.into());
    args
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("; ")
}

/// Extract the audio track of a video container.
///
/// The extension of `input` is checked against [`SUPPORTED_CONTAINERS`] before
/// anything else happens. With `options.compress` the track is re-encoded to
/// Ogg/Vorbis at `options.quality`, otherwise it is written as 16 kHz mono
/// 16-bit PCM WAV.
pub async fn extract_audio(
    input: &Path,
    output: &Path,
    options: &AudioOptions,
) -> Result<AudioMetadata> {
    let format = container_format(input)?;

    if !input.exists() {
        return Err(TransubError::AudioExtraction(format!(
            "Input file not found: {}",
            input.display()
        )));
    }

    check_ffmpeg().await?;

    info!(
        "Extracting audio from {} ({}) to {}",
        input.display(),
        format,
        output.display()
    );

    let child = Command::new("ffmpeg")
        .args(ffmpeg_args(input, output, options))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| TransubError::AudioExtraction(format!("Failed to spawn FFmpeg: {e}")))?;

    let result = tokio::time::timeout(options.timeout, child.wait_with_output())
        .await
        .map_err(|_| {
            TransubError::AudioExtraction(format!(
                "FFmpeg timed out after {}s",
                options.timeout.as_secs()
            ))
        })?
        .map_err(|e| TransubError::AudioExtraction(format!("Failed to wait for FFmpeg: {e}")))?;

    if !result.status.success() {
        return Err(TransubError::AudioExtraction(format!(
            "FFmpeg exited with {}: {}",
            result.status,
            stderr_tail(&result.stderr)
        )));
    }

    if !output.exists() {
        return Err(TransubError::AudioExtraction(
            "Output file was not created".to_string(),
        ));
    }

    let metadata = if options.compress {
        let duration = get_audio_duration(output).await?;
        let (sample_rate, channels) = get_audio_info(output).await?;
        AudioMetadata {
            duration,
            sample_rate,
            channels,
        }
    } else {
        read_wav_metadata(output)?
    };

    info!(
        "Audio extracted to {} ({:.1}s, {} Hz, {} ch)",
        output.display(),
        metadata.duration.as_secs_f64(),
        metadata.sample_rate,
        metadata.channels
    );

    Ok(metadata)
}
