use std::sync::Arc;

use bp_core::{Error, Result, SearchResult};
use tracing::{info, warn};

use crate::providers::{SearchProvider, MAX_RESULTS};
use crate::query_variants;

/// Tries providers in order until one returns results.
pub struct SearchManager {
    providers: Vec<Arc<dyn SearchProvider>>,
    limit: usize,
}

impl SearchManager {
    pub fn new(providers: Vec<Arc<dyn SearchProvider>>) -> Self {
        Self {
            providers,
            limit: MAX_RESULTS,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn add_provider(&mut self, provider: Arc<dyn SearchProvider>) {
        self.providers.push(provider);
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Run one query through the provider chain. Provider failures fall through to the next one.
    pub async fn search(&self, query: &str) -> Vec<SearchResult> {
        for provider in &self.providers {
            match provider.search(query, self.limit).await {
                Ok(results) if !results.is_empty() => {
                    info!("🔍 {} returned {} results for '{}'", provider.name(), results.len(), query);
                    return results;
                }
                Ok(_) => {
                    info!("🔍 {} returned nothing for '{}'", provider.name(), query);
                }
                Err(e) => {
                    warn!("⚠️ {} search failed for '{}': {}", provider.name(), query, e);
                }
            }
        }
        Vec::new()
    }

    /// Search for a keyword, trying query variants until one produces results.
    pub async fn search_keyword(&self, keyword: &str) -> Result<Vec<SearchResult>> {
        if self.providers.is_empty() {
            return Err(Error::Config("no search provider configured".to_string()));
        }
        for query in query_variants(keyword) {
            let results = self.search(&query).await;
            if !results.is_empty() {
                return Ok(results);
            }
        }
        Err(Error::Search(format!("No search results for '{}'", keyword)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bp_core::ApiError;
    use std::sync::Mutex;

    struct FakeProvider {
        name: &'static str,
        answers_to: Option<&'static str>,
        fail: bool,
        queries: Mutex<Vec<String>>,
    }

    impl FakeProvider {
        fn new(name: &'static str, answers_to: Option<&'static str>, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                name,
                answers_to,
                fail,
                queries: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl SearchProvider for FakeProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn search(&self, query: &str, _limit: usize) -> Result<Vec<SearchResult>> {
            self.queries.lock().unwrap().push(query.to_string());
            if self.fail {
                return Err(ApiError::RateLimited.into());
            }
            if self.answers_to.map_or(true, |q| q == query) {
                return Ok(vec![SearchResult {
                    title: format!("{} result", self.name),
                    link: "https://example.com".into(),
                    snippet: String::new(),
                }]);
            }
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_failing_provider_falls_back() {
        let broken = FakeProvider::new("broken", None, true);
        let backup = FakeProvider::new("backup", None, false);
        let manager = SearchManager::new(vec![broken.clone() as Arc<dyn SearchProvider>, backup as Arc<dyn SearchProvider>]);

        let results = manager.search_keyword("rust").await.unwrap();
        assert_eq!(results[0].title, "backup result");
        assert_eq!(broken.queries.lock().unwrap().len(), 1);
        assert_eq!(manager.provider_names(), vec!["broken", "backup"]);
    }

    #[tokio::test]
    async fn test_variants_are_tried_in_order() {
        let provider = FakeProvider::new("only", Some("rust news"), false);
        let manager = SearchManager::new(vec![provider.clone() as Arc<dyn SearchProvider>]);

        manager.search_keyword("rust").await.unwrap();
        let queries = provider.queries.lock().unwrap().clone();
        assert_eq!(
            queries,
            vec!["rust", "rust 최신", "rust 2024", "rust technology", "rust news"]
        );
    }

    #[tokio::test]
    async fn test_no_results_is_a_search_error() {
        let provider = FakeProvider::new("empty", Some("never"), false);
        let manager = SearchManager::new(vec![provider as Arc<dyn SearchProvider>]);
        assert!(matches!(manager.search_keyword("rust").await, Err(Error::Search(_))));

        let empty = SearchManager::new(Vec::new());
        assert!(matches!(empty.search_keyword("rust").await, Err(Error::Config(_))));
    }
}
