//! DeepL document translation over the v2 REST API.

use crate::error::{Result, TransubError};
use crate::translate::Translator;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const DEEPL_FREE_API_URL: &str = "https://api-free.deepl.com";
const DEEPL_PRO_API_URL: &str = "https://api.deepl.com";

/// Translator using the DeepL API.
pub struct DeeplTranslator {
    client: Client,
    api_key: String,
    base_url: String,
}

impl DeeplTranslator {
    /// Create a translator; free-tier keys (suffix `:fx`) select the free endpoint.
    pub fn new(api_key: String) -> Self {
        let base_url = default_base_url(&api_key).to_string();
        Self {
            client: Client::new(),
            api_key,
            base_url,
        }
    }

    /// Use a preconfigured HTTP client (timeouts, proxies).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Override the API base URL (scheme and host, without `/v2`).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/v2/translate", self.base_url)
    }
}

fn default_base_url(api_key: &str) -> &'static str {
    if api_key.ends_with(":fx") {
        DEEPL_FREE_API_URL
    } else {
        DEEPL_PRO_API_URL
    }
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    text: [&'a str; 1],
    target_lang: &'a str,
    preserve_formatting: bool,
}

#[derive(Deserialize, Debug)]
struct TranslateResponse {
    translations: Vec<Translation>,
}

#[derive(Deserialize, Debug)]
struct Translation {
    #[serde(default)]
    detected_source_language: Option<String>,
    text: String,
}

#[derive(Deserialize, Debug)]
struct DeeplError {
    message: String,
}

#[async_trait]
impl Translator for DeeplTranslator {
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String> {
        debug!("Translating {} bytes to {}", text.len(), target_lang);

        let request = TranslateRequest {
            text: [text],
            target_lang,
            preserve_formatting: true,
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| TransubError::Translation(format!("Translation request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransubError::Translation(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<DeeplError>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(TransubError::Translation(format!(
                "DeepL API error ({status}): {detail}"
            )));
        }

        let parsed: TranslateResponse = serde_json::from_str(&body).map_err(|e| {
            TransubError::Translation(format!("Failed to parse translation response: {e}"))
        })?;

        let translation = parsed.translations.into_iter().next().ok_or_else(|| {
            TransubError::Translation("DeepL returned no translations".to_string())
        })?;

        if let Some(source) = &translation.detected_source_language {
            debug!("DeepL detected source language {}", source);
        }

        Ok(translation.text)
    }

    fn name(&self) -> &'static str {
        "DeepL"
    }
}
