use std::fmt;

use async_trait::async_trait;

use crate::types::ChatMessage;
use crate::Result;

#[async_trait]
pub trait LanguageModel: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Run one chat completion and return the assistant text.
    ///
    /// With `json_reply` set the model is asked for a single JSON object.
    async fn chat(&self, messages: &[ChatMessage], json_reply: bool) -> Result<String>;
}
