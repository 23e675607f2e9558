//! Daily run: one keyword, both languages, then move on to the next keyword.

use std::sync::Arc;

use bp_core::time::{is_weekend, posting_cutoff};
use bp_core::{
    BlogStorage, Error, Keyword, Language, LanguageModel, NewKeyword, NewPost, Post, PostStatus, PublishRequest,
    Publisher, Result,
};
use bp_text::ensure_disclaimer;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::agents::KeywordInferer;
use crate::chain::AgentChain;

/// Order in which a keyword's posts are written.
pub const LANGUAGES: [Language; 2] = [Language::English, Language::Korean];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Weekend,
    AlreadyPosted,
}

#[derive(Debug, Clone)]
pub struct KeywordRun {
    pub keyword: Keyword,
    pub posts: Vec<Post>,
    /// Keyword activated for the next run, if any.
    pub next_keyword: Option<Keyword>,
}

impl KeywordRun {
    pub fn all_published(&self) -> bool {
        self.posts.iter().all(|p| p.status == PostStatus::Published)
    }
}

#[derive(Debug, Clone)]
pub enum RunOutcome {
    NoKeyword,
    Skipped(SkipReason),
    Completed(KeywordRun),
}

pub struct AutoPoster {
    chain: AgentChain,
    storage: Arc<dyn BlogStorage>,
    publisher: Arc<dyn Publisher>,
    inferer: KeywordInferer,
}

impl AutoPoster {
    pub fn new(
        chain: AgentChain,
        model: Arc<dyn LanguageModel>,
        storage: Arc<dyn BlogStorage>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            chain,
            storage,
            publisher,
            inferer: KeywordInferer::new(model),
        }
    }

    /// Scheduled entry point: honours weekends and the once-a-day rule.
    pub async fn daily_run(&self, now: DateTime<Utc>) -> Result<RunOutcome> {
        let Some(keyword) = self.storage.first_active_keyword().await? else {
            info!("📭 No active keyword, nothing to post");
            return Ok(RunOutcome::NoKeyword);
        };

        let schedule = self.chain.config().schedule;
        if schedule.skip_weekends && is_weekend(now, schedule.offset) {
            info!("🛌 Weekend, skipping '{}'", keyword.keyword);
            return Ok(RunOutcome::Skipped(SkipReason::Weekend));
        }
        let cutoff = posting_cutoff(now, schedule.offset, schedule.cutoff_hour);
        if keyword.last_posted.is_some_and(|posted| posted >= cutoff) {
            info!("⏭️ '{}' was already posted today", keyword.keyword);
            return Ok(RunOutcome::Skipped(SkipReason::AlreadyPosted));
        }

        self.run_keyword(keyword, now).await.map(RunOutcome::Completed)
    }

    /// First active keyword in both languages, without the day checks.
    pub async fn process_all(&self) -> Result<RunOutcome> {
        match self.storage.first_active_keyword().await? {
            Some(keyword) => self.run_keyword(keyword, Utc::now()).await.map(RunOutcome::Completed),
            None => Ok(RunOutcome::NoKeyword),
        }
    }

    /// One post for one active keyword. Does not advance the curriculum.
    pub async fn process_keyword(&self, text: &str, language: Language) -> Result<Post> {
        let keyword = self
            .storage
            .get_keyword_by_name(text)
            .await?
            .ok_or_else(|| Error::Validation(format!("unknown keyword '{}'", text.trim())))?;
        if !keyword.is_active {
            return Err(Error::Validation(format!("keyword '{}' is not active", keyword.keyword)));
        }
        let post = self.generate_and_publish(&keyword, language).await?;
        if post.status == PostStatus::Published {
            let now = Utc::now();
            self.storage.touch_checked(&keyword.id, now).await?;
            self.storage.touch_posted(&keyword.id, now).await?;
        }
        Ok(post)
    }

    /// Retry every stored draft. Returns the posts that made it out.
    pub async fn publish_drafts(&self) -> Result<Vec<Post>> {
        let drafts = self.storage.list_posts(Some(PostStatus::Draft)).await?;
        info!("📤 Publishing {} drafts", drafts.len());
        let mut published = Vec::new();
        for draft in drafts {
            let page_id = match self.storage.get_keyword(&draft.keyword_id).await? {
                Some(keyword) => keyword.notion_page_id,
                None => None,
            };
            let parent = self.chain.config().parent_for(page_id.as_deref())?;
            let request = PublishRequest {
                title: &draft.title,
                markdown: &draft.content,
                language: draft.language,
                parent: &parent,
            };
            match self.publisher.publish(request).await {
                Ok(page) => published.push(self.record_published(draft, &page.page_id, &page.url).await?),
                Err(e) => warn!("⚠️ Draft '{}' still not published: {}", draft.title, e),
            }
        }
        Ok(published)
    }

    async fn run_keyword(&self, keyword: Keyword, now: DateTime<Utc>) -> Result<KeywordRun> {
        info!("🚀 Posting '{}'", keyword.keyword);
        let mut posts = Vec::with_capacity(LANGUAGES.len());
        for language in LANGUAGES {
            match self.generate_and_publish(&keyword, language).await {
                Ok(post) => posts.push(post),
                Err(Error::Duplicate(reason)) => warn!("⏭️ Skipping {} post: {}", language, reason),
                Err(e) => return Err(e),
            }
        }

        let mut run = KeywordRun {
            keyword,
            posts,
            next_keyword: None,
        };
        if run.posts.is_empty() {
            warn!("⏭️ Nothing new for '{}' today", run.keyword.keyword);
            return Ok(run);
        }
        if !run.all_published() {
            warn!("💾 Some posts stayed drafts; '{}' stays active", run.keyword.keyword);
            return Ok(run);
        }

        self.storage.touch_checked(&run.keyword.id, now).await?;
        self.storage.touch_posted(&run.keyword.id, now).await?;
        run.next_keyword = self.advance(&run.keyword).await?;
        Ok(run)
    }

    /// Run the chain for one language, store the post and publish it.
    /// A failed publish leaves the post as a draft.
    pub async fn generate_and_publish(&self, keyword: &Keyword, language: Language) -> Result<Post> {
        let parent = self.chain.config().parent_for(keyword.notion_page_id.as_deref())?;
        let output = self.chain.run(keyword, language).await?;
        let content = ensure_disclaimer(&output.draft.content(), language);

        let post = self
            .storage
            .create_post(NewPost {
                keyword_id: keyword.id.clone(),
                language,
                title: output.draft.title.clone(),
                content,
                search_results: output.results,
            })
            .await?;
        info!("💾 Stored {} draft '{}'", language, post.title);

        let request = PublishRequest {
            title: &post.title,
            markdown: &post.content,
            language,
            parent: &parent,
        };
        match self.publisher.publish(request).await {
            Ok(page) => self.record_published(post, &page.page_id, &page.url).await,
            Err(e) => {
                warn!("⚠️ Publishing '{}' failed, kept as draft: {}", post.title, e);
                Ok(post)
            }
        }
    }

    async fn record_published(&self, post: Post, page_id: &str, url: &str) -> Result<Post> {
        self.storage.mark_published(&post.id, page_id, url).await?;
        self.storage
            .cache_post(post.language, &post.id, &post.title, &post.content)
            .await?;
        info!("✅ Published '{}' at {}", post.title, url);
        Ok(self.storage.get_post(&post.id).await?.unwrap_or(post))
    }

    async fn advance(&self, keyword: &Keyword) -> Result<Option<Keyword>> {
        let config = self.chain.config();
        if config.curriculum_mode {
            if let Some(sequence) = keyword.sequence_number {
                if let Some(next) = self.storage.keyword_by_sequence(sequence + 1).await? {
                    if !config.auto_activate_next {
                        return Ok(None);
                    }
                    return self.switch_to(keyword, &next).await.map(Some);
                }
            }
        }
        if config.infer_next_keyword {
            return self.infer_next(keyword).await;
        }
        Ok(None)
    }

    async fn switch_to(&self, current: &Keyword, next: &Keyword) -> Result<Keyword> {
        self.storage.set_keyword_active(&current.id, false).await?;
        self.storage.set_keyword_active(&next.id, true).await?;
        info!("📚 Next keyword: '{}'", next.keyword);
        Ok(self.storage.get_keyword(&next.id).await?.unwrap_or_else(|| next.clone()))
    }

    async fn infer_next(&self, keyword: &Keyword) -> Result<Option<Keyword>> {
        let path: Vec<String> = self
            .storage
            .learning_path(&keyword.id)
            .await?
            .into_iter()
            .map(|k| k.keyword)
            .collect();
        let titles: Vec<String> = self
            .storage
            .posts_for_keyword(&keyword.id)
            .await?
            .into_iter()
            .map(|p| p.title)
            .collect();

        // the posts are already out; a failed inference only means no follow-up topic
        let next = match self.inferer.infer(&keyword.keyword, &path, &titles).await {
            Ok(Some(next)) => next,
            Ok(None) => return Ok(None),
            Err(e) => {
                warn!("⚠️ Could not infer the next keyword: {}", e);
                return Ok(None);
            }
        };

        let learning_level = Some(next.learning_level.trim().to_string()).filter(|l| !l.is_empty());
        let inserted = self
            .storage
            .add_keyword(NewKeyword {
                keyword: next.next_keyword.clone(),
                notion_page_id: keyword.notion_page_id.clone(),
                parent_keyword_id: Some(keyword.id.clone()),
                learning_level,
                sequence_number: None,
                is_active: false,
            })
            .await;
        let child = match inserted {
            Ok(child) => child,
            Err(Error::Duplicate(_)) => match self.storage.get_keyword_by_name(&next.next_keyword).await? {
                Some(existing) => {
                    info!("🔁 Inferred keyword '{}' already exists", existing.keyword);
                    existing
                }
                None => return Ok(None),
            },
            Err(e) => return Err(e),
        };
        self.switch_to(keyword, &child).await.map(Some)
    }
}
