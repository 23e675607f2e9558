use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Korean,
    English,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Korean => "korean",
            Language::English => "english",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "korean" | "ko" | "kr" => Ok(Language::Korean),
            "english" | "en" => Ok(Language::English),
            other => Err(Error::Config(format!("Unknown language: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub snippet: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Keyword {
    pub id: String,
    pub keyword: String,
    pub is_active: bool,
    pub last_checked: Option<DateTime<Utc>>,
    pub last_posted: Option<DateTime<Utc>>,
    pub notion_page_id: Option<String>,
    pub parent_keyword_id: Option<String>,
    pub learning_level: Option<String>,
    pub sequence_number: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when inserting a keyword.
#[derive(Debug, Clone, Default)]
pub struct NewKeyword {
    pub keyword: String,
    pub notion_page_id: Option<String>,
    pub parent_keyword_id: Option<String>,
    pub learning_level: Option<String>,
    pub sequence_number: Option<i64>,
    pub is_active: bool,
}

impl NewKeyword {
    pub fn active(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            is_active: true,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct KeywordSummary {
    pub keyword: Keyword,
    pub post_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }
}

impl FromStr for PostStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            other => Err(Error::Storage(format!("Unknown post status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub keyword_id: String,
    pub language: Language,
    pub title: String,
    pub content: String,
    pub search_results: Vec<SearchResult>,
    pub status: PostStatus,
    pub notion_page_id: Option<String>,
    pub notion_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub keyword_id: String,
    pub language: Language,
    pub title: String,
    pub content: String,
    pub search_results: Vec<SearchResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedPost {
    pub language: Language,
    pub post_id: String,
    pub title: String,
    pub content: String,
    pub cached_at: DateTime<Utc>,
}

/// A drafted article as returned by the writer model, before publishing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedContent {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub category: String,
}

/// Where a new document-store page is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageParent {
    Page(String),
    Database(String),
}

impl PageParent {
    /// A page id wins over a database id; neither is a configuration error.
    pub fn resolve(page_id: Option<&str>, database_id: Option<&str>) -> crate::Result<Self> {
        let non_empty = |v: Option<&str>| v.map(str::trim).filter(|v| !v.is_empty()).map(String::from);
        if let Some(page) = non_empty(page_id) {
            return Ok(PageParent::Page(page));
        }
        if let Some(db) = non_empty(database_id) {
            return Ok(PageParent::Database(db));
        }
        Err(Error::Config(
            "either a parent page id or a database id is required".to_string(),
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedPage {
    pub page_id: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}
