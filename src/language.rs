//! Language tables for the two external services.
//!
//! Both tables are keyed by the same human-readable names, but their value sets
//! differ: Whisper accepts Korean, the DeepL table has no entry for it. A name
//! missing from the table it is looked up in is rejected when the request is
//! parsed.

use crate::error::{Result, TransubError};
use serde::Serialize;

/// Human-readable name to Whisper (ISO 639-1) code.
pub const TRANSCRIPTION_LANGUAGES: [(&str, &str); 11] = [
    ("English", "en"),
    ("Spanish", "es"),
    ("French", "fr"),
    ("German", "de"),
    ("Italian", "it"),
    ("Portuguese", "pt"),
    ("Dutch", "nl"),
    ("Russian", "ru"),
    ("Chinese", "zh"),
    ("Japanese", "ja"),
    ("Korean", "ko"),
];

/// Human-readable name to DeepL target language code.
pub const TRANSLATION_LANGUAGES: [(&str, &str); 10] = [
    ("English", "EN-US"),
    ("Spanish", "ES"),
    ("French", "FR"),
    ("German", "DE"),
    ("Italian", "IT"),
    ("Portuguese", "PT-PT"),
    ("Dutch", "NL"),
    ("Russian", "RU"),
    ("Chinese", "ZH"),
    ("Japanese", "JA"),
];

fn lookup(table: &[(&'static str, &'static str)], name: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, code)| *code)
}

pub fn transcription_code(name: &str) -> Result<&'static str> {
    lookup(&TRANSCRIPTION_LANGUAGES, name).ok_or_else(|| {
        TransubError::UnknownLanguage(format!("'{name}' is not a supported transcription language"))
    })
}

pub fn translation_code(name: &str) -> Result<&'static str> {
    lookup(&TRANSLATION_LANGUAGES, name).ok_or_else(|| {
        TransubError::UnknownLanguage(format!("'{name}' is not a supported translation language"))
    })
}

/// A resolved pair of languages for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageSelection {
    pub transcription_name: String,
    pub transcription_code: &'static str,
    pub translation_name: String,
    pub translation_code: &'static str,
}

impl LanguageSelection {
    pub fn resolve(transcription_lang: &str, translation_lang: &str) -> Result<Self> {
        let transcription_lang = transcription_lang.trim();
        let translation_lang = translation_lang.trim();

        Ok(Self {
            transcription_code: transcription_code(transcription_lang)?,
            transcription_name: transcription_lang.to_string(),
            translation_code: translation_code(translation_lang)?,
            translation_name: translation_lang.to_string(),
        })
    }
}

/// Language names offered by each table, in table order.
#[derive(Debug, Clone, Serialize)]
pub struct LanguageCatalog {
    pub transcription: Vec<&'static str>,
    pub translation: Vec<&'static str>,
}

impl LanguageCatalog {
    pub fn new() -> Self {
        Self {
            transcription: TRANSCRIPTION_LANGUAGES.iter().map(|(name, _)| *name).collect(),
            translation: TRANSLATION_LANGUAGES.iter().map(|(name, _)| *name).collect(),
        }
    }
}

impl Default for LanguageCatalog {
    fn default() -> Self {
        Self::new()
    }
}
