use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use transub::config::Config;
use transub::server::{self, AppState};
use transub::store::JobStore;
use transub::transcribe::{WhisperClient, WhisperModel};
use transub::translate::DeeplTranslator;
use transub::Pipeline;

#[derive(Parser)]
#[command(name = "transub")]
#[command(version, about = "Video subtitle transcription and translation server")]
#[command(
    long_about = "Upload a video, get back SRT subtitles transcribed with OpenAI Whisper and translated with DeepL."
)]
struct Cli {
    /// Config file (defaults to <config dir>/transub/config.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    addr: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory holding one sub-directory per job
    #[arg(long)]
    storage_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

fn apply_cli(config: &mut Config, cli: &Cli) {
    if let Some(addr) = &cli.addr {
        config.addr = addr.clone();
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(dir) = &cli.storage_dir {
        config.storage_dir = dir.clone();
    }
}

fn build_pipeline(config: &Config) -> Result<Pipeline> {
    let http = config.http_client()?;

    let model: WhisperModel = config
        .whisper_model
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let mut transcriber = WhisperClient::new(config.openai_api_key.clone().unwrap_or_default())
        .with_http_client(http.clone())
        .with_model(model);
    if let Some(url) = &config.whisper_api_url {
        transcriber = transcriber.with_api_url(url.clone());
    }

    let mut translator = DeeplTranslator::new(config.deepl_api_key.clone().unwrap_or_default())
        .with_http_client(http);
    if let Some(url) = &config.deepl_api_url {
        translator = translator.with_base_url(url.clone());
    }

    Ok(Pipeline::new(
        Arc::new(transcriber),
        Arc::new(translator),
        config.audio_options(),
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    apply_cli(&mut config, &cli);
    config
        .validate()
        .context("Configuration validation failed")?;

    std::fs::create_dir_all(&config.storage_dir).with_context(|| {
        format!(
            "Failed to create storage directory {}",
            config.storage_dir.display()
        )
    })?;

    info!("Storage:  {}", config.storage_dir.display());
    info!("Static:   {}", config.static_dir.display());
    info!(
        "Timeouts: {}s requests, {}s extraction",
        config.request_timeout_secs, config.extraction_timeout_secs
    );

    let state = AppState {
        pipeline: Arc::new(build_pipeline(&config)?),
        store: JobStore::new(&config.storage_dir),
        static_dir: config.static_dir.clone(),
    };
    let app = server::router(state, config.max_upload_bytes);

    let bind_addr = format!("{}:{}", config.addr, config.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;

    server::serve(listener, app).await.context("Server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from(["transub", "--port", "9100", "--storage-dir", "/srv/jobs"]);
        let mut config = Config::default();
        apply_cli(&mut config, &cli);

        assert_eq!(config.port, 9100);
        assert_eq!(config.storage_dir, PathBuf::from("/srv/jobs"));
        assert_eq!(config.addr, "0.0.0.0");
    }

    #[test]
    fn test_build_pipeline_rejects_unknown_model() {
        let config = Config {
            whisper_model: "whisper-9".to_string(),
            ..Config::default()
        };
        assert!(build_pipeline(&config).is_err());
    }
}
