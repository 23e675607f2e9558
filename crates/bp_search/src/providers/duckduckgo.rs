use std::time::Duration;

use async_trait::async_trait;
use bp_core::{ApiError, Result, SearchResult};
use reqwest::Client;
use scraper::Html;
use url::Url;

use super::{collapse_whitespace, selector, SearchProvider};

pub const DEFAULT_BASE_URL: &str = "https://html.duckduckgo.com/html/";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Scrapes the HTML results page; used when no search API is configured or it fails.
#[derive(Debug, Clone)]
pub struct DuckDuckGoSearch {
    client: Client,
    base_url: String,
}

impl DuckDuckGoSearch {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Resolve the redirect wrapper around result links to the target URL.
pub(crate) fn decode_link(href: &str) -> Option<String> {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.to_string()
    };
    let url = Url::parse(&absolute).ok()?;
    if let Some((_, target)) = url.query_pairs().find(|(key, _)| key == "uddg") {
        return Some(target.into_owned());
    }
    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}

pub(crate) fn parse_results(html: &str, limit: usize) -> Result<Vec<SearchResult>> {
    let document = Html::parse_document(html);
    let result_selector = selector("div.result")?;
    let link_selector = selector("a.result__a")?;
    let snippet_selector = selector(".result__snippet")?;

    let mut results = Vec::new();
    for element in document.select(&result_selector) {
        if element.value().classes().any(|class| class == "result--ad") {
            continue;
        }
        let Some(anchor) = element.select(&link_selector).next() else {
            continue;
        };
        let Some(link) = anchor.value().attr("href").and_then(decode_link) else {
            continue;
        };
        let title = collapse_whitespace(&anchor.text().collect::<String>());
        let snippet = element
            .select(&snippet_selector)
            .next()
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .unwrap_or_default();
        results.push(SearchResult { title, link, snippet });
        if results.len() >= limit {
            break;
        }
    }
    Ok(results)
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("q", query)])
            .send()
            .await
            .map_err(ApiError::from)?;

        let status = response.status();
        let body = response.text().await.map_err(ApiError::from)?;
        if !status.is_success() {
            return Err(ApiError::from_status(status.as_u16(), &body).into());
        }
        parse_results(&body, limit)
    }
}
