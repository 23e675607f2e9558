use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bp_core::time::default_offset;
use bp_core::{ApiError, Error, PageParent, PublishRequest, PublishedPage, Publisher, Result};
use chrono::{FixedOffset, Utc};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::blocks::{date_line, markdown_to_blocks, truncate_chars, Block, MAX_TEXT_CHARS};

pub const DEFAULT_BASE_URL: &str = "https://api.notion.com";
pub const NOTION_VERSION: &str = "2022-06-28";

/// Most children a single create or append request may carry.
pub const MAX_CHILDREN: usize = 100;

#[derive(Deserialize)]
struct PageResponse {
    id: String,
    #[serde(default)]
    url: String,
}

pub struct NotionClient {
    client: Client,
    api_key: String,
    base_url: String,
    offset: FixedOffset,
}

impl fmt::Debug for NotionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotionClient")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("offset", &self.offset)
            .finish()
    }
}

fn parent_json(parent: &PageParent) -> Value {
    match parent {
        PageParent::Page(id) => json!({ "type": "page_id", "page_id": id }),
        PageParent::Database(id) => json!({ "type": "database_id", "database_id": id }),
    }
}

/// Public links drop the `www.` host prefix.
fn public_url(url: &str) -> String {
    url.replacen("https://www.notion.so/", "https://notion.so/", 1)
}

impl NotionClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::Config("document store API key is required".to_string()));
        }
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            offset: default_offset(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(&self.api_key)
            .header("Notion-Version", NOTION_VERSION)
    }

    async fn send(&self, builder: RequestBuilder) -> std::result::Result<String, ApiError> {
        let response = self.authorized(builder).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::from_status(status.as_u16(), &body));
        }
        Ok(body)
    }

    async fn append_children(&self, page_id: &str, children: &[Value]) -> Result<()> {
        let url = format!("{}/v1/blocks/{}/children", self.base_url.trim_end_matches('/'), page_id);
        self.send(self.client.patch(url).json(&json!({ "children": children })))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Publisher for NotionClient {
    async fn publish(&self, request: PublishRequest<'_>) -> Result<PublishedPage> {
        let today = Utc::now().with_timezone(&self.offset).date_naive();
        let mut blocks = vec![Block::Note(date_line(request.language, today)), Block::Divider];
        blocks.extend(markdown_to_blocks(request.markdown));
        let children: Vec<Value> = blocks.iter().map(Block::to_json).collect();
        let (first, rest) = children.split_at(children.len().min(MAX_CHILDREN));

        let body = json!({
            "parent": parent_json(request.parent),
            "properties": {
                "title": {
                    "title": [{ "text": { "content": truncate_chars(request.title, MAX_TEXT_CHARS) } }]
                }
            },
            "children": first,
        });

        info!("📝 Creating page '{}' with {} blocks", request.title, children.len());
        let url = format!("{}/v1/pages", self.base_url.trim_end_matches('/'));
        let raw = self.send(self.client.post(url).json(&body)).await?;
        let page: PageResponse = serde_json::from_str(&raw)
            .map_err(|e| Error::Publish(format!("Unexpected page response: {}", e)))?;

        for (i, chunk) in rest.chunks(MAX_CHILDREN).enumerate() {
            debug!("appending block chunk {} ({} blocks)", i + 1, chunk.len());
            self.append_children(&page.id, chunk).await?;
        }

        let url = public_url(&page.url);
        info!("✅ Published page {}", url);
        Ok(PublishedPage { page_id: page.id, url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bp_core::Language;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn client(server: &MockServer) -> NotionClient {
        NotionClient::new("secret").unwrap().with_base_url(server.uri())
    }

    #[tokio::test]
    async fn test_publish_creates_page() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/pages"))
            .and(header("authorization", "Bearer secret"))
            .and(header("Notion-Version", NOTION_VERSION))
            .and(body_partial_json(json!({
                "parent": { "type": "page_id", "page_id": "parent-1" },
                "properties": { "title": { "title": [{ "text": { "content": "제목" } }] } }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "page-1",
                "url": "https://www.notion.so/page-1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let parent = PageParent::Page("parent-1".into());
        let page = client(&server)
            .publish(PublishRequest {
                title: "제목",
                markdown: "## 서론\n\n내용입니다.",
                language: Language::Korean,
                parent: &parent,
            })
            .await
            .unwrap();
        assert_eq!(page.page_id, "page-1");
        assert_eq!(page.url, "https://notion.so/page-1");

        let requests = server.received_requests().await.unwrap();
        let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
        let children = sent["children"].as_array().unwrap();
        assert_eq!(children.len(), 4);
        assert_eq!(children[0]["paragraph"]["color"], "gray");
        assert_eq!(children[1]["type"], "divider");
        assert_eq!(children[2]["type"], "heading_2");
    }

    #[tokio::test]
    async fn test_large_documents_are_appended_in_chunks() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/pages"))
            .and(body_partial_json(json!({ "parent": { "type": "database_id", "database_id": "db" } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "page-2",
                "url": "https://www.notion.so/page-2"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/v1/blocks/page-2/children"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
            .expect(2)
            .mount(&server)
            .await;

        // 2 header blocks + 250 paragraphs = 252 blocks: 100 + 100 + 52
        let markdown: String = (0..250).map(|i| format!("문단 {}.\n\n", i)).collect();
        let parent = PageParent::Database("db".into());
        client(&server)
            .publish(PublishRequest {
                title: "긴 글",
                markdown: &markdown,
                language: Language::English,
                parent: &parent,
            })
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let sizes: Vec<usize> = requests
            .iter()
            .map(|r: &Request| {
                let body: Value = serde_json::from_slice(&r.body).unwrap();
                body["children"].as_array().unwrap().len()
            })
            .collect();
        assert_eq!(sizes, vec![100, 100, 52]);
    }

    #[tokio::test]
    async fn test_errors_are_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&server)
            .await;

        let parent = PageParent::Page("p".into());
        let err = client(&server)
            .publish(PublishRequest {
                title: "t",
                markdown: "body",
                language: Language::English,
                parent: &parent,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Api(ApiError::Auth { status: 401 })));
    }

    #[test]
    fn test_config_and_debug() {
        assert!(matches!(NotionClient::new(" "), Err(Error::Config(_))));
        let client = NotionClient::new("secret-token").unwrap();
        assert!(!format!("{:?}", client).contains("secret-token"));
        assert_eq!(public_url("https://www.notion.so/abc"), "https://notion.so/abc");
        assert_eq!(public_url("https://notion.so/abc"), "https://notion.so/abc");
    }
}
