use crate::audio::AudioOptions;
use crate::error::{Result, TransubError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub deepl_api_key: Option<String>,
    pub addr: String,
    pub port: u16,
    pub storage_dir: PathBuf,
    pub static_dir: PathBuf,
    pub request_timeout_secs: u64,
    pub extraction_timeout_secs: u64,
    pub compress_audio: bool,
    pub audio_quality: u8,
    pub max_upload_bytes: usize,
    pub whisper_model: String,
    pub whisper_api_url: Option<String>,
    pub deepl_api_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            deepl_api_key: None,
            addr: "0.0.0.0".to_string(),
            port: 8000,
            storage_dir: PathBuf::from("temp"),
            static_dir: PathBuf::from("static"),
            request_timeout_secs: 300,
            extraction_timeout_secs: 600,
            compress_audio: true,
            audio_quality: 5,
            max_upload_bytes: 512 * 1024 * 1024,
            whisper_model: "whisper-1".to_string(),
            whisper_api_url: None,
            deepl_api_url: None,
        }
    }
}

impl Config {
    /// Load configuration: defaults, then the TOML file, then environment variables.
    ///
    /// An explicit `path` must exist. Without one, the per-user config file is read
    /// only when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::config_file_path() {
                Some(default_path) if default_path.exists() => Self::from_file(&default_path)?,
                _ => Self::default(),
            },
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| TransubError::Config(format!("Failed to parse config file: {e}")))
    }

    fn from_file(path: &Path) -> Result<Self> {
        debug!("Reading config file {}", path.display());
        let contents = std::fs::read_to_string(path).map_err(|e| {
            TransubError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Override fields from environment variables supplied by `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.openai_api_key = Some(key);
        }
        if let Some(key) = lookup("DEEPL_API_KEY") {
            self.deepl_api_key = Some(key);
        }
        if let Some(addr) = lookup("TRANSUB_ADDR") {
            self.addr = addr;
        }
        if let Some(port) = lookup("TRANSUB_PORT") {
            self.port = parse_env("TRANSUB_PORT", &port)?;
        }
        if let Some(dir) = lookup("TRANSUB_STORAGE_DIR") {
            self.storage_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("TRANSUB_STATIC_DIR") {
            self.static_dir = PathBuf::from(dir);
        }
        if let Some(secs) = lookup("TRANSUB_REQUEST_TIMEOUT") {
            self.request_timeout_secs = parse_env("TRANSUB_REQUEST_TIMEOUT", &secs)?;
        }
        if let Some(secs) = lookup("TRANSUB_EXTRACTION_TIMEOUT") {
            self.extraction_timeout_secs = parse_env("TRANSUB_EXTRACTION_TIMEOUT", &secs)?;
        }
        if let Some(compress) = lookup("TRANSUB_COMPRESS_AUDIO") {
            self.compress_audio = parse_env("TRANSUB_COMPRESS_AUDIO", &compress)?;
        }
        if let Some(quality) = lookup("TRANSUB_AUDIO_QUALITY") {
            self.audio_quality = parse_env("TRANSUB_AUDIO_QUALITY", &quality)?;
        }
        if let Some(limit) = lookup("TRANSUB_MAX_UPLOAD_BYTES") {
            self.max_upload_bytes = parse_env("TRANSUB_MAX_UPLOAD_BYTES", &limit)?;
        }
        Ok(())
    }

    /// Check that both service credentials are present and the tunables are sane.
    pub fn validate(&self) -> Result<()> {
        if is_blank(&self.openai_api_key) {
            return Err(TransubError::MissingConfig(
                "OPENAI_API_KEY not set. Export it with: export OPENAI_API_KEY=sk-...".to_string(),
            ));
        }
        if is_blank(&self.deepl_api_key) {
            return Err(TransubError::MissingConfig(
                "DEEPL_API_KEY not set. Get one at https://www.deepl.com/pro-api".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 || self.extraction_timeout_secs == 0 {
            return Err(TransubError::Config(
                "Timeouts must be greater than 0".to_string(),
            ));
        }

        if self.audio_quality > 10 {
            return Err(TransubError::Config(format!(
                "Audio quality must be between 0 and 10, got {}",
                self.audio_quality
            )));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn audio_options(&self) -> AudioOptions {
        AudioOptions {
            compress: self.compress_audio,
            quality: self.audio_quality,
            timeout: Duration::from_secs(self.extraction_timeout_secs),
        }
    }

    /// Build the HTTP client shared by the transcription and translation clients.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.request_timeout())
            .build()
            .map_err(|e| TransubError::Config(format!("Failed to build HTTP client: {e}")))
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("transub").join("config.toml"))
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

fn parse_env<T>(name: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| TransubError::Config(format!("{name}={value:?}: {e}")))
}
