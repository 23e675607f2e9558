use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::types::{
    CachedPost, Keyword, KeywordSummary, Language, NewKeyword, NewPost, Post, PostStatus,
};
use crate::Result;

/// Number of recent posts kept per language in the learning cache.
pub const LEARNING_CACHE_SIZE: usize = 2;

/// Maximum depth walked when reconstructing a learning path.
pub const LEARNING_PATH_DEPTH: usize = 10;

#[async_trait]
pub trait BlogStorage: Send + Sync {
    /// Insert a keyword. Fails with `Error::Duplicate` when the text already exists.
    async fn add_keyword(&self, keyword: NewKeyword) -> Result<Keyword>;

    async fn get_keyword(&self, id: &str) -> Result<Option<Keyword>>;

    async fn get_keyword_by_name(&self, keyword: &str) -> Result<Option<Keyword>>;

    /// All keywords with their post counts, oldest first.
    async fn list_keywords(&self) -> Result<Vec<KeywordSummary>>;

    /// The next keyword to work on: lowest sequence number, then oldest created.
    async fn first_active_keyword(&self) -> Result<Option<Keyword>>;

    async fn keyword_by_sequence(&self, sequence_number: i64) -> Result<Option<Keyword>>;

    async fn set_keyword_active(&self, id: &str, active: bool) -> Result<()>;

    /// Flip the active flag, returning the new state, or `None` if the keyword is unknown.
    async fn toggle_keyword(&self, keyword: &str) -> Result<Option<bool>>;

    /// Delete a keyword and its posts. Returns false if it did not exist.
    async fn delete_keyword(&self, keyword: &str) -> Result<bool>;

    async fn touch_checked(&self, id: &str, at: DateTime<Utc>) -> Result<()>;

    async fn touch_posted(&self, id: &str, at: DateTime<Utc>) -> Result<()>;

    /// Ancestors of a keyword followed by the keyword itself, root first.
    async fn learning_path(&self, id: &str) -> Result<Vec<Keyword>>;

    /// Store a draft post. Fails with `Error::Duplicate` when the keyword already
    /// has a post with this title created on the same local day.
    async fn create_post(&self, post: NewPost) -> Result<Post>;

    async fn get_post(&self, id: &str) -> Result<Option<Post>>;

    async fn list_posts(&self, status: Option<PostStatus>) -> Result<Vec<Post>>;

    async fn posts_for_keyword(&self, keyword_id: &str) -> Result<Vec<Post>>;

    async fn mark_published(&self, post_id: &str, page_id: &str, url: &str) -> Result<()>;

    /// Remember a post for prompt biasing, keeping only the newest entries per language.
    async fn cache_post(&self, language: Language, post_id: &str, title: &str, content: &str) -> Result<()>;

    async fn cached_posts(&self, language: Language, limit: usize) -> Result<Vec<CachedPost>>;
}
