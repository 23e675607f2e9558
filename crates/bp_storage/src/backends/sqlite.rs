use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use async_trait::async_trait;
use bp_core::storage::{LEARNING_CACHE_SIZE, LEARNING_PATH_DEPTH};
use bp_core::time::{default_offset, local_day_bounds};
use bp_core::{
    BlogStorage, CachedPost, Error, Keyword, KeywordSummary, Language, NewKeyword, NewPost, Post,
    PostStatus, Result,
};
use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqliteRow};
use sqlx::Row;
use tracing::{debug, info};
use uuid::Uuid;

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS keywords (
        id TEXT PRIMARY KEY,
        keyword TEXT NOT NULL UNIQUE,
        is_active INTEGER NOT NULL DEFAULT 1,
        last_checked TEXT,
        last_posted TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS posts (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        keyword_id TEXT NOT NULL,
        search_results TEXT NOT NULL DEFAULT '[]',
        status TEXT NOT NULL DEFAULT 'draft',
        notion_page_id TEXT,
        notion_url TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        published_at TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS learning_cache (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        language TEXT NOT NULL,
        post_id TEXT NOT NULL,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        cached_at TEXT NOT NULL,
        UNIQUE(language, post_id)
    )
    "#,
];

/// Columns added after the first release; old files gain them on open.
const COLUMN_MIGRATIONS: &[(&str, &str)] = &[
    ("keywords", "notion_page_id TEXT"),
    ("keywords", "parent_keyword_id TEXT"),
    ("keywords", "learning_level TEXT"),
    ("keywords", "sequence_number INTEGER"),
    ("posts", "language TEXT NOT NULL DEFAULT 'korean'"),
];

fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> Error {
    move |e| Error::Database(format!("{}: {}", context, e))
}

/// Fixed-width RFC 3339 so stored timestamps sort as text.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| Error::Storage(format!("Failed to parse timestamp {}: {}", raw, e)))
}

fn parse_optional(raw: Option<String>) -> Result<Option<DateTime<Utc>>> {
    raw.as_deref().map(parse_timestamp).transpose()
}

fn keyword_from_row(row: &SqliteRow) -> Result<Keyword> {
    let get = db_error("Failed to read keyword row");
    Ok(Keyword {
        id: row.try_get("id").map_err(&get)?,
        keyword: row.try_get("keyword").map_err(&get)?,
        is_active: row.try_get("is_active").map_err(&get)?,
        last_checked: parse_optional(row.try_get("last_checked").map_err(&get)?)?,
        last_posted: parse_optional(row.try_get("last_posted").map_err(&get)?)?,
        notion_page_id: row.try_get("notion_page_id").map_err(&get)?,
        parent_keyword_id: row.try_get("parent_keyword_id").map_err(&get)?,
        learning_level: row.try_get("learning_level").map_err(&get)?,
        sequence_number: row.try_get("sequence_number").map_err(&get)?,
        created_at: parse_timestamp(&row.try_get::<String, _>("created_at").map_err(&get)?)?,
        updated_at: parse_timestamp(&row.try_get::<String, _>("updated_at").map_err(&get)?)?,
    })
}

fn post_from_row(row: &SqliteRow) -> Result<Post> {
    let get = db_error("Failed to read post row");
    let search_results: String = row.try_get("search_results").map_err(&get)?;
    let language: String = row.try_get("language").map_err(&get)?;
    let status: String = row.try_get("status").map_err(&get)?;
    Ok(Post {
        id: row.try_get("id").map_err(&get)?,
        keyword_id: row.try_get("keyword_id").map_err(&get)?,
        language: Language::from_str(&language)?,
        title: row.try_get("title").map_err(&get)?,
        content: row.try_get("content").map_err(&get)?,
        search_results: serde_json::from_str(&search_results)?,
        status: PostStatus::from_str(&status)?,
        notion_page_id: row.try_get("notion_page_id").map_err(&get)?,
        notion_url: row.try_get("notion_url").map_err(&get)?,
        created_at: parse_timestamp(&row.try_get::<String, _>("created_at").map_err(&get)?)?,
        updated_at: parse_timestamp(&row.try_get::<String, _>("updated_at").map_err(&get)?)?,
        published_at: parse_optional(row.try_get("published_at").map_err(&get)?)?,
    })
}

pub struct SqliteStorage {
    pool: SqlitePool,
    db_path: PathBuf,
    offset: FixedOffset,
}

impl SqliteStorage {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(db_error("Failed to connect to database"))?;

        for migration in MIGRATIONS {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(db_error("Failed to run migration"))?;
        }

        for (table, column) in COLUMN_MIGRATIONS {
            let statement = format!("ALTER TABLE {} ADD COLUMN {}", table, column);
            match sqlx::query(&statement).execute(&pool).await {
                Ok(_) => debug!("added column {}.{}", table, column),
                Err(e) if e.to_string().contains("duplicate column") => {}
                Err(e) => return Err(Error::Database(format!("Failed to run '{}': {}", statement, e))),
            }
        }

        info!("💾 Opened database at {}", db_path.display());
        Ok(Self {
            pool,
            db_path: db_path.to_path_buf(),
            offset: default_offset(),
        })
    }

    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    async fn set_timestamp(&self, column: &'static str, id: &str, at: DateTime<Utc>) -> Result<()> {
        let statement = format!("UPDATE keywords SET {} = ?, updated_at = ? WHERE id = ?", column);
        sqlx::query(&statement)
            .bind(timestamp(at))
            .bind(timestamp(Utc::now()))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to update keyword timestamp"))?;
        Ok(())
    }
}

#[async_trait]
impl BlogStorage for SqliteStorage {
    async fn add_keyword(&self, keyword: NewKeyword) -> Result<Keyword> {
        let text = keyword.keyword.trim().to_string();
        if text.is_empty() {
            return Err(Error::Validation("keyword must not be empty".to_string()));
        }
        if self.get_keyword_by_name(&text).await?.is_some() {
            return Err(Error::Duplicate(format!("keyword '{}' already exists", text)));
        }

        let now = timestamp(Utc::now());
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO keywords
            (id, keyword, is_active, notion_page_id, parent_keyword_id, learning_level,
             sequence_number, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&text)
        .bind(keyword.is_active)
        .bind(keyword.notion_page_id.as_deref())
        .bind(keyword.parent_keyword_id.as_deref())
        .bind(keyword.learning_level.as_deref())
        .bind(keyword.sequence_number)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Error::Duplicate(format!("keyword '{}' already exists", text))
            }
            _ => Error::Database(format!("Failed to add keyword: {}", e)),
        })?;

        self.get_keyword(&id)
            .await?
            .ok_or_else(|| Error::Storage(format!("keyword {} vanished after insert", id)))
    }

    async fn get_keyword(&self, id: &str) -> Result<Option<Keyword>> {
        let row = sqlx::query("SELECT * FROM keywords WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to get keyword"))?;
        row.as_ref().map(keyword_from_row).transpose()
    }

    async fn get_keyword_by_name(&self, keyword: &str) -> Result<Option<Keyword>> {
        let row = sqlx::query("SELECT * FROM keywords WHERE keyword = ?")
            .bind(keyword.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to get keyword"))?;
        row.as_ref().map(keyword_from_row).transpose()
    }

    async fn list_keywords(&self) -> Result<Vec<KeywordSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT k.*, (SELECT COUNT(*) FROM posts p WHERE p.keyword_id = k.id) AS post_count
            FROM keywords k
            ORDER BY k.created_at, k.rowid
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list keywords"))?;

        rows.iter()
            .map(|row| {
                Ok(KeywordSummary {
                    keyword: keyword_from_row(row)?,
                    post_count: row
                        .try_get("post_count")
                        .map_err(db_error("Failed to read post count"))?,
                })
            })
            .collect()
    }

    async fn first_active_keyword(&self) -> Result<Option<Keyword>> {
        let row = sqlx::query(
            r#"
            SELECT * FROM keywords
            WHERE is_active = 1
            ORDER BY sequence_number IS NULL, sequence_number, created_at, rowid
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to get active keyword"))?;
        row.as_ref().map(keyword_from_row).transpose()
    }

    async fn keyword_by_sequence(&self, sequence_number: i64) -> Result<Option<Keyword>> {
        let row = sqlx::query("SELECT * FROM keywords WHERE sequence_number = ? ORDER BY created_at LIMIT 1")
            .bind(sequence_number)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to get keyword by sequence"))?;
        row.as_ref().map(keyword_from_row).transpose()
    }

    async fn set_keyword_active(&self, id: &str, active: bool) -> Result<()> {
        sqlx::query("UPDATE keywords SET is_active = ?, updated_at = ? WHERE id = ?")
            .bind(active)
            .bind(timestamp(Utc::now()))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to update keyword"))?;
        Ok(())
    }

    async fn toggle_keyword(&self, keyword: &str) -> Result<Option<bool>> {
        let Some(existing) = self.get_keyword_by_name(keyword).await? else {
            return Ok(None);
        };
        let active = !existing.is_active;
        self.set_keyword_active(&existing.id, active).await?;
        Ok(Some(active))
    }

    async fn delete_keyword(&self, keyword: &str) -> Result<bool> {
        let Some(existing) = self.get_keyword_by_name(keyword).await? else {
            return Ok(false);
        };

        let mut tx = self.pool.begin().await.map_err(db_error("Failed to begin transaction"))?;
        sqlx::query("DELETE FROM learning_cache WHERE post_id IN (SELECT id FROM posts WHERE keyword_id = ?)")
            .bind(&existing.id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to delete cached posts"))?;
        sqlx::query("DELETE FROM posts WHERE keyword_id = ?")
            .bind(&existing.id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to delete posts"))?;
        sqlx::query("UPDATE keywords SET parent_keyword_id = NULL WHERE parent_keyword_id = ?")
            .bind(&existing.id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to detach child keywords"))?;
        sqlx::query("DELETE FROM keywords WHERE id = ?")
            .bind(&existing.id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to delete keyword"))?;
        tx.commit().await.map_err(db_error("Failed to commit transaction"))?;
        Ok(true)
    }

    async fn touch_checked(&self, id: &str, at: DateTime<Utc>) -> Result<()> {
        self.set_timestamp("last_checked", id, at).await
    }

    async fn touch_posted(&self, id: &str, at: DateTime<Utc>) -> Result<()> {
        self.set_timestamp("last_posted", id, at).await
    }

    async fn learning_path(&self, id: &str) -> Result<Vec<Keyword>> {
        let mut path = Vec::new();
        let mut seen = HashSet::new();
        let mut next = Some(id.to_string());
        while let Some(current) = next.take() {
            if path.len() >= LEARNING_PATH_DEPTH || !seen.insert(current.clone()) {
                break;
            }
            let Some(keyword) = self.get_keyword(&current).await? else {
                break;
            };
            next = keyword.parent_keyword_id.clone();
            path.push(keyword);
        }
        path.reverse();
        Ok(path)
    }

    async fn create_post(&self, post: NewPost) -> Result<Post> {
        let now = Utc::now();
        let (day_start, day_end) = local_day_bounds(now, self.offset);

        let existing: Vec<String> =
            sqlx::query_scalar("SELECT created_at FROM posts WHERE keyword_id = ? AND title = ?")
                .bind(&post.keyword_id)
                .bind(&post.title)
                .fetch_all(&self.pool)
                .await
                .map_err(db_error("Failed to check duplicate posts"))?;
        for created_at in existing {
            let created_at = parse_timestamp(&created_at)?;
            if created_at >= day_start && created_at < day_end {
                return Err(Error::Duplicate(format!(
                    "post '{}' was already created today",
                    post.title
                )));
            }
        }

        let id = Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO posts
            (id, title, content, keyword_id, search_results, status, language, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, 'draft', ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.keyword_id)
        .bind(serde_json::to_string(&post.search_results)?)
        .bind(post.language.as_str())
        .bind(timestamp(now))
        .bind(timestamp(now))
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to create post"))?;

        self.get_post(&id)
            .await?
            .ok_or_else(|| Error::Storage(format!("post {} vanished after insert", id)))
    }

    async fn get_post(&self, id: &str) -> Result<Option<Post>> {
        let row = sqlx::query("SELECT * FROM posts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to get post"))?;
        row.as_ref().map(post_from_row).transpose()
    }

    async fn list_posts(&self, status: Option<PostStatus>) -> Result<Vec<Post>> {
        let rows = match status {
            Some(status) => {
                sqlx::query("SELECT * FROM posts WHERE status = ? ORDER BY created_at, rowid")
                    .bind(status.as_str())
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                sqlx::query("SELECT * FROM posts ORDER BY created_at, rowid")
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(db_error("Failed to list posts"))?;
        rows.iter().map(post_from_row).collect()
    }

    async fn posts_for_keyword(&self, keyword_id: &str) -> Result<Vec<Post>> {
        let rows = sqlx::query("SELECT * FROM posts WHERE keyword_id = ? ORDER BY created_at, rowid")
            .bind(keyword_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list posts"))?;
        rows.iter().map(post_from_row).collect()
    }

    async fn mark_published(&self, post_id: &str, page_id: &str, url: &str) -> Result<()> {
        let now = timestamp(Utc::now());
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET status = 'published', notion_page_id = ?, notion_url = ?, published_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(page_id)
        .bind(url)
        .bind(&now)
        .bind(&now)
        .bind(post_id)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to mark post published"))?;

        if result.rows_affected() == 0 {
            return Err(Error::Storage(format!("Unknown post: {}", post_id)));
        }
        Ok(())
    }

    async fn cache_post(&self, language: Language, post_id: &str, title: &str, content: &str) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(db_error("Failed to begin transaction"))?;
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO learning_cache (language, post_id, title, content, cached_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(language.as_str())
        .bind(post_id)
        .bind(title)
        .bind(content)
        .bind(timestamp(Utc::now()))
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to cache post"))?;

        sqlx::query(
            r#"
            DELETE FROM learning_cache
            WHERE language = ? AND id NOT IN (
                SELECT id FROM learning_cache WHERE language = ?
                ORDER BY cached_at DESC, id DESC
                LIMIT ?
            )
            "#,
        )
        .bind(language.as_str())
        .bind(language.as_str())
        .bind(LEARNING_CACHE_SIZE as i64)
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to trim learning cache"))?;
        tx.commit().await.map_err(db_error("Failed to commit transaction"))?;
        Ok(())
    }

    async fn cached_posts(&self, language: Language, limit: usize) -> Result<Vec<CachedPost>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM learning_cache WHERE language = ?
            ORDER BY cached_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(language.as_str())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to read learning cache"))?;

        let get = db_error("Failed to read cache row");
        rows.iter()
            .map(|row| {
                Ok(CachedPost {
                    language,
                    post_id: row.try_get("post_id").map_err(&get)?,
                    title: row.try_get("title").map_err(&get)?,
                    content: row.try_get("content").map_err(&get)?,
                    cached_at: parse_timestamp(&row.try_get::<String, _>("cached_at").map_err(&get)?)?,
                })
            })
            .collect()
    }
}
