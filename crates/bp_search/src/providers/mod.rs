use async_trait::async_trait;
use bp_core::{Error, Result, SearchResult};
use scraper::Selector;

pub mod duckduckgo;
pub mod google;

pub const MAX_RESULTS: usize = 10;

#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Run one query and return at most `limit` results
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>>;
}

pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Search(format!("Invalid selector {}: {}", css, e)))
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
