use async_trait::async_trait;

use crate::types::{Language, PageParent, PublishedPage};
use crate::Result;

#[derive(Debug, Clone)]
pub struct PublishRequest<'a> {
    pub title: &'a str,
    pub markdown: &'a str,
    pub language: Language,
    pub parent: &'a PageParent,
}

#[async_trait]
pub trait Publisher: Send + Sync {
    /// Create a page holding the rendered markdown.
    async fn publish(&self, request: PublishRequest<'_>) -> Result<PublishedPage>;
}
