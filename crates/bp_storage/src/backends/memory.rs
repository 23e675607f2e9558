use std::collections::HashSet;

use async_trait::async_trait;
use bp_core::storage::{LEARNING_CACHE_SIZE, LEARNING_PATH_DEPTH};
use bp_core::time::{default_offset, local_day_bounds};
use bp_core::{
    BlogStorage, CachedPost, Error, Keyword, KeywordSummary, Language, NewKeyword, NewPost, Post,
    PostStatus, Result,
};
use chrono::{DateTime, FixedOffset, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct MemoryState {
    keywords: Vec<Keyword>,
    posts: Vec<Post>,
    cache: Vec<CachedPost>,
}

impl MemoryState {
    fn keyword_mut(&mut self, id: &str) -> Option<&mut Keyword> {
        self.keywords.iter_mut().find(|k| k.id == id)
    }
}

/// Process-local storage with the same semantics as the SQLite backend.
pub struct MemoryStorage {
    state: RwLock<MemoryState>,
    offset: FixedOffset,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MemoryState::default()),
            offset: default_offset(),
        }
    }

    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }
}

#[async_trait]
impl BlogStorage for MemoryStorage {
    async fn add_keyword(&self, keyword: NewKeyword) -> Result<Keyword> {
        let text = keyword.keyword.trim().to_string();
        if text.is_empty() {
            return Err(Error::Validation("keyword must not be empty".to_string()));
        }
        let mut state = self.state.write().await;
        if state.keywords.iter().any(|k| k.keyword == text) {
            return Err(Error::Duplicate(format!("keyword '{}' already exists", text)));
        }
        let now = Utc::now();
        let stored = Keyword {
            id: Uuid::new_v4().to_string(),
            keyword: text,
            is_active: keyword.is_active,
            last_checked: None,
            last_posted: None,
            notion_page_id: keyword.notion_page_id,
            parent_keyword_id: keyword.parent_keyword_id,
            learning_level: keyword.learning_level,
            sequence_number: keyword.sequence_number,
            created_at: now,
            updated_at: now,
        };
        state.keywords.push(stored.clone());
        Ok(stored)
    }

    async fn get_keyword(&self, id: &str) -> Result<Option<Keyword>> {
        Ok(self.state.read().await.keywords.iter().find(|k| k.id == id).cloned())
    }

    async fn get_keyword_by_name(&self, keyword: &str) -> Result<Option<Keyword>> {
        let keyword = keyword.trim();
        Ok(self
            .state
            .read()
            .await
            .keywords
            .iter()
            .find(|k| k.keyword == keyword)
            .cloned())
    }

    async fn list_keywords(&self) -> Result<Vec<KeywordSummary>> {
        let state = self.state.read().await;
        let mut keywords = state.keywords.clone();
        keywords.sort_by_key(|k| k.created_at);
        Ok(keywords
            .into_iter()
            .map(|keyword| {
                let post_count = state.posts.iter().filter(|p| p.keyword_id == keyword.id).count() as i64;
                KeywordSummary { keyword, post_count }
            })
            .collect())
    }

    async fn first_active_keyword(&self) -> Result<Option<Keyword>> {
        let state = self.state.read().await;
        Ok(state
            .keywords
            .iter()
            .filter(|k| k.is_active)
            .min_by_key(|k| (k.sequence_number.is_none(), k.sequence_number, k.created_at))
            .cloned())
    }

    async fn keyword_by_sequence(&self, sequence_number: i64) -> Result<Option<Keyword>> {
        Ok(self
            .state
            .read()
            .await
            .keywords
            .iter()
            .find(|k| k.sequence_number == Some(sequence_number))
            .cloned())
    }

    async fn set_keyword_active(&self, id: &str, active: bool) -> Result<()> {
        if let Some(keyword) = self.state.write().await.keyword_mut(id) {
            keyword.is_active = active;
            keyword.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn toggle_keyword(&self, keyword: &str) -> Result<Option<bool>> {
        let mut state = self.state.write().await;
        let Some(existing) = state.keywords.iter_mut().find(|k| k.keyword == keyword.trim()) else {
            return Ok(None);
        };
        existing.is_active = !existing.is_active;
        existing.updated_at = Utc::now();
        Ok(Some(existing.is_active))
    }

    async fn delete_keyword(&self, keyword: &str) -> Result<bool> {
        let mut state = self.state.write().await;
        let Some(position) = state.keywords.iter().position(|k| k.keyword == keyword.trim()) else {
            return Ok(false);
        };
        let removed = state.keywords.remove(position);
        let post_ids: HashSet<String> = state
            .posts
            .iter()
            .filter(|p| p.keyword_id == removed.id)
            .map(|p| p.id.clone())
            .collect();
        state.posts.retain(|p| p.keyword_id != removed.id);
        state.cache.retain(|c| !post_ids.contains(&c.post_id));
        for keyword in state.keywords.iter_mut() {
            if keyword.parent_keyword_id.as_deref() == Some(removed.id.as_str()) {
                keyword.parent_keyword_id = None;
            }
        }
        Ok(true)
    }

    async fn touch_checked(&self, id: &str, at: DateTime<Utc>) -> Result<()> {
        if let Some(keyword) = self.state.write().await.keyword_mut(id) {
            keyword.last_checked = Some(at);
            keyword.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn touch_posted(&self, id: &str, at: DateTime<Utc>) -> Result<()> {
        if let Some(keyword) = self.state.write().await.keyword_mut(id) {
            keyword.last_posted = Some(at);
            keyword.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn learning_path(&self, id: &str) -> Result<Vec<Keyword>> {
        let state = self.state.read().await;
        let mut path = Vec::new();
        let mut seen = HashSet::new();
        let mut next = Some(id.to_string());
        while let Some(current) = next.take() {
            if path.len() >= LEARNING_PATH_DEPTH || !seen.insert(current.clone()) {
                break;
            }
            let Some(keyword) = state.keywords.iter().find(|k| k.id == current) else {
                break;
            };
            next = keyword.parent_keyword_id.clone();
            path.push(keyword.clone());
        }
        path.reverse();
        Ok(path)
    }

    async fn create_post(&self, post: NewPost) -> Result<Post> {
        let now = Utc::now();
        let (day_start, day_end) = local_day_bounds(now, self.offset);
        let mut state = self.state.write().await;
        let duplicate = state.posts.iter().any(|p| {
            p.keyword_id == post.keyword_id
                && p.title == post.title
                && p.created_at >= day_start
                && p.created_at < day_end
        });
        if duplicate {
            return Err(Error::Duplicate(format!("post '{}' was already created today", post.title)));
        }

        let stored = Post {
            id: Uuid::new_v4().to_string(),
            keyword_id: post.keyword_id,
            language: post.language,
            title: post.title,
            content: post.content,
            search_results: post.search_results,
            status: PostStatus::Draft,
            notion_page_id: None,
            notion_url: None,
            created_at: now,
            updated_at: now,
            published_at: None,
        };
        state.posts.push(stored.clone());
        Ok(stored)
    }

    async fn get_post(&self, id: &str) -> Result<Option<Post>> {
        Ok(self.state.read().await.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn list_posts(&self, status: Option<PostStatus>) -> Result<Vec<Post>> {
        Ok(self
            .state
            .read()
            .await
            .posts
            .iter()
            .filter(|p| status.map_or(true, |s| p.status == s))
            .cloned()
            .collect())
    }

    async fn posts_for_keyword(&self, keyword_id: &str) -> Result<Vec<Post>> {
        Ok(self
            .state
            .read()
            .await
            .posts
            .iter()
            .filter(|p| p.keyword_id == keyword_id)
            .cloned()
            .collect())
    }

    async fn mark_published(&self, post_id: &str, page_id: &str, url: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let post = state
            .posts
            .iter_mut()
            .find(|p| p.id == post_id)
            .ok_or_else(|| Error::Storage(format!("Unknown post: {}", post_id)))?;
        let now = Utc::now();
        post.status = PostStatus::Published;
        post.notion_page_id = Some(page_id.to_string());
        post.notion_url = Some(url.to_string());
        post.published_at = Some(now);
        post.updated_at = now;
        Ok(())
    }

    async fn cache_post(&self, language: Language, post_id: &str, title: &str, content: &str) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .cache
            .retain(|c| !(c.language == language && c.post_id == post_id));
        state.cache.push(CachedPost {
            language,
            post_id: post_id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            cached_at: Utc::now(),
        });

        // entries are appended in time order, so the oldest come first
        let count = state.cache.iter().filter(|c| c.language == language).count();
        let mut excess = count.saturating_sub(LEARNING_CACHE_SIZE);
        state.cache.retain(|c| {
            if excess > 0 && c.language == language {
                excess -= 1;
                return false;
            }
            true
        });
        Ok(())
    }

    async fn cached_posts(&self, language: Language, limit: usize) -> Result<Vec<CachedPost>> {
        Ok(self
            .state
            .read()
            .await
            .cache
            .iter()
            .rev()
            .filter(|c| c.language == language)
            .take(limit)
            .cloned()
            .collect())
    }
}
