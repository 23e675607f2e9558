use std::sync::Arc;

use bp_core::{LanguageModel, Result};
use bp_inference::prompts;
use serde::Deserialize;
use tracing::info;

use super::ask_lenient;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NextKeyword {
    #[serde(default)]
    pub next_keyword: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub learning_level: String,
    #[serde(default)]
    pub connection: String,
}

/// Suggests the topic to study after the current keyword.
pub struct KeywordInferer {
    model: Arc<dyn LanguageModel>,
}

impl KeywordInferer {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    pub async fn infer(
        &self,
        keyword: &str,
        path: &[String],
        previous_titles: &[String],
    ) -> Result<Option<NextKeyword>> {
        let prompt = prompts::keyword_inference(keyword, path, previous_titles);
        let Some(mut next) = ask_lenient::<NextKeyword>(self.model.as_ref(), &prompt, "keyword inference").await?
        else {
            return Ok(None);
        };
        next.next_keyword = next.next_keyword.trim().to_string();
        if next.next_keyword.is_empty() || next.next_keyword == keyword.trim() {
            return Ok(None);
        }
        info!("🧭 Next keyword after '{}': '{}' ({})", keyword, next.next_keyword, next.reason);
        Ok(Some(next))
    }
}
