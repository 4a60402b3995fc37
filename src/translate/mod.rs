pub mod deepl;

pub use deepl::DeeplTranslator;

use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate a whole document into `target_lang` (service code) in one request.
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String>;
    fn name(&self) -> &'static str;
}
