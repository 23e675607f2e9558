//! Scripted collaborators shared by the pipeline tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bp_core::{
    ApiError, Error, Language, PageParent, PublishRequest, PublishedPage, Publisher, Result, SearchResult,
};
use bp_search::{SearchManager, SearchProvider};
use serde_json::json;

use crate::agents::Draft;

pub const ENGLISH_TITLE: &str = "Understanding Rust Ownership";
pub const KOREAN_TITLE: &str = "러스트 소유권 이야기";

pub const GOOD_ENGLISH_BODY: &str = "## Introduction\n\n\
Ownership felt strange when I first met it.\n\n\
## What Ownership Means\n\n\
Every value in Rust has exactly one owner.\n\n\
## Borrowing\n\n\
References let code use a value without taking it.\n\n\
## Lifetimes\n\n\
A lifetime is the span in which a reference stays valid.\n\n\
## Conclusion\n\n\
It finally clicks after a little practice.";

pub const GOOD_KOREAN_BODY: &str = "## 서론\n\n\
처음에는 소유권이라는 개념이 무척 낯설게 느껴졌어요.\n\n\
## 소유권이란\n\n\
러스트에서는 모든 값마다 주인이 하나씩 정해져 있습니다.\n\n\
## 빌림\n\n\
참조를 사용하면 값을 옮기지 않고도 잠시 빌려 쓸 수 있어요.\n\n\
## 수명\n\n\
수명은 참조가 유효하게 남아 있는 범위를 뜻합니다.\n\n\
## 결론\n\n\
조금씩 연습하다 보니 이제는 흐름이 보이기 시작했어요.";

pub fn sample_results() -> Vec<SearchResult> {
    vec![
        SearchResult {
            title: "The Rust Book: Ownership".into(),
            link: "https://doc.rust-lang.org/book/ch04-01-what-is-ownership.html".into(),
            snippet: "Ownership is a set of rules that govern memory.".into(),
        },
        SearchResult {
            title: "Rust by Example: Borrowing".into(),
            link: "https://doc.rust-lang.org/rust-by-example/scope/borrow.html".into(),
            snippet: "Borrowing lets you access data without taking ownership.".into(),
        },
    ]
}

struct FixedSearch;

#[async_trait]
impl SearchProvider for FixedSearch {
    fn name(&self) -> &str {
        "Fixed"
    }

    async fn search(&self, _query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        Ok(sample_results().into_iter().take(limit).collect())
    }
}

pub fn search_manager() -> Arc<SearchManager> {
    Arc::new(SearchManager::new(vec![Arc::new(FixedSearch) as Arc<dyn SearchProvider>]))
}

/// Records published titles with their parent id; can be told to fail.
#[derive(Default)]
pub struct FakePublisher {
    failing: AtomicBool,
    published: Mutex<Vec<(String, String)>>,
}

impl FakePublisher {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn published(&self) -> Vec<(String, String)> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl Publisher for FakePublisher {
    async fn publish(&self, request: PublishRequest<'_>) -> Result<PublishedPage> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Api(ApiError::Upstream {
                status: 502,
                message: "bad gateway".into(),
            }));
        }
        let parent = match request.parent {
            PageParent::Page(id) | PageParent::Database(id) => id.clone(),
        };
        let mut published = self.published.lock().unwrap();
        published.push((request.title.to_string(), parent));
        let page_id = format!("page-{}", published.len());
        Ok(PublishedPage {
            url: format!("https://notion.so/{}", page_id),
            page_id,
        })
    }
}

pub fn validation_reply(recommendation: &str, score: f64) -> String {
    json!({
        "is_valid": recommendation == "proceed",
        "reason": "relevant official documentation",
        "quality_score": score,
        "recommendation": recommendation
    })
    .to_string()
}

pub fn fact_check_reply() -> String {
    json!({
        "is_accurate": true,
        "accuracy_score": 92,
        "issues": [],
        "recommendation": "proceed"
    })
    .to_string()
}

pub fn generation_reply(title: &str, body: &str) -> String {
    json!({
        "title": title,
        "content": body,
        "summary": "ownership in a nutshell",
        "keywords": ["rust", "ownership"],
        "category": "Programming"
    })
    .to_string()
}

pub fn review_reply(recommendation: &str) -> String {
    json!({
        "is_valid": true,
        "quality_score": 85,
        "issues": [],
        "recommendation": recommendation
    })
    .to_string()
}

pub fn revision_reply(body: &str) -> String {
    json!({
        "revised_content": body,
        "revisions": [{ "section": "all", "original": "", "revised": "", "reason": "layout" }]
    })
    .to_string()
}

pub fn revision_reply_with_title(title: &str, body: &str) -> String {
    json!({
        "revised_title": title,
        "revised_content": body,
        "revisions": [{ "section": "title", "original": "", "revised": title, "reason": "language" }]
    })
    .to_string()
}

pub fn inference_reply(keyword: &str) -> String {
    json!({
        "next_keyword": keyword,
        "reason": "follows naturally",
        "learning_level": "intermediate",
        "connection": "references"
    })
    .to_string()
}

/// Replies for one clean pass of the chain: validation, fact check, generation, review.
pub fn english_script() -> Vec<String> {
    vec![
        validation_reply("proceed", 90.0),
        fact_check_reply(),
        generation_reply(ENGLISH_TITLE, GOOD_ENGLISH_BODY),
        review_reply("publish"),
    ]
}

pub fn korean_script() -> Vec<String> {
    vec![
        validation_reply("proceed", 90.0),
        fact_check_reply(),
        generation_reply(KOREAN_TITLE, GOOD_KOREAN_BODY),
        review_reply("publish"),
    ]
}

pub fn english_draft(body: &str) -> Draft {
    Draft {
        language: Language::English,
        title: ENGLISH_TITLE.to_string(),
        body: body.to_string(),
        footer: String::new(),
        summary: String::new(),
        keywords: Vec::new(),
        category: String::new(),
    }
}

pub fn korean_draft(body: &str) -> Draft {
    Draft {
        language: Language::Korean,
        title: KOREAN_TITLE.to_string(),
        ..english_draft(body)
    }
}
