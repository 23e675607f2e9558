//! One agent per model call in the chain.

use bp_core::{Error, LanguageModel, Result};
use bp_inference::prompts::Prompt;
use bp_inference::reply::parse_json_reply;
use serde::de::DeserializeOwned;
use tracing::warn;

pub mod fact_check;
pub mod keywords;
pub mod review;
pub mod search;
pub mod writer;

pub use fact_check::{FactCheckReport, FactChecked, FactChecker};
pub use keywords::{KeywordInferer, NextKeyword};
pub use review::{ReviewReport, Reviewer, Reviser, Revision, RevisionReply};
pub use search::{SearchDecision, SearchValidator, SearchVerdict};
pub use writer::{Draft, Writer};

/// Upstream failures end the run; anything else is a bad reply an agent may tolerate.
pub fn is_fatal(error: &Error) -> bool {
    error.api_kind().is_some() || matches!(error, Error::Http(_) | Error::Config(_))
}

pub(crate) async fn ask<T: DeserializeOwned>(model: &dyn LanguageModel, prompt: &Prompt) -> Result<T> {
    let reply = model.chat(&prompt.messages(), true).await?;
    parse_json_reply(&reply)
}

/// Like [`ask`], but a malformed or missing reply becomes `None`.
pub(crate) async fn ask_lenient<T: DeserializeOwned>(
    model: &dyn LanguageModel,
    prompt: &Prompt,
    agent: &str,
) -> Result<Option<T>> {
    match ask(model, prompt).await {
        Ok(reply) => Ok(Some(reply)),
        Err(e) if is_fatal(&e) => Err(e),
        Err(e) => {
            warn!("⚠️ {} gave no usable answer, continuing without it: {}", agent, e);
            Ok(None)
        }
    }
}
