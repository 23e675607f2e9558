use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bp_core::{ApiError, Error, Result, SearchResult};
use reqwest::Client;
use serde::Deserialize;

use super::{SearchProvider, MAX_RESULTS};

pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/customsearch/v1";

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Deserialize)]
struct Item {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

/// Custom search JSON API client.
pub struct GoogleSearch {
    client: Client,
    api_key: String,
    cx: String,
    base_url: String,
}

impl GoogleSearch {
    pub fn new(api_key: impl Into<String>, cx: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        let cx = cx.into();
        if api_key.trim().is_empty() || cx.trim().is_empty() {
            return Err(Error::Config("search API key and engine id are required".to_string()));
        }
        let client = Client::builder().timeout(Duration::from_secs(15)).build()?;
        Ok(Self {
            client,
            api_key,
            cx,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl fmt::Debug for GoogleSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleSearch")
            .field("api_key", &"<redacted>")
            .field("cx", &self.cx)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl SearchProvider for GoogleSearch {
    fn name(&self) -> &str {
        "google"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let num = limit.clamp(1, MAX_RESULTS).to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.cx.as_str()),
                ("q", query),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .map_err(ApiError::from)?;

        let status = response.status();
        let body = response.text().await.map_err(ApiError::from)?;
        if !status.is_success() {
            return Err(ApiError::from_status(status.as_u16(), &body).into());
        }

        let parsed: SearchResponse = serde_json::from_str(&body)?;
        Ok(parsed
            .items
            .into_iter()
            .filter(|item| !item.link.is_empty())
            .take(limit)
            .map(|item| SearchResult {
                title: item.title,
                link: item.link,
                snippet: item.snippet,
            })
            .collect())
    }
}
