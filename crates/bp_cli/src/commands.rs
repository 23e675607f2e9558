use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use bp_core::time::default_offset;
use bp_core::{BlogStorage, Error, NewKeyword, Post, PostStatus};
use bp_inference::{create_model, Config as ModelConfig, KeyRing};
use bp_pipeline::{AgentChain, AutoPoster, PipelineConfig, RevisionPolicy, RunOutcome};
use bp_publish::NotionClient;
use bp_search::{DuckDuckGoSearch, GoogleSearch, SearchManager, SearchProvider};
use bp_storage::{create_storage, StorageKind};
use chrono::Utc;
use tracing::{info, warn};

use crate::{Cli, Commands};

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let offset = default_offset();
    let storage = create_storage(StorageKind::from_path(cli.db_path.clone()), offset).await?;
    info!("💾 Storage ready");

    match &cli.command {
        Commands::AddKeyword {
            keyword,
            notion_page_id,
            sequence,
            inactive,
        } => {
            let added = storage
                .add_keyword(NewKeyword {
                    keyword: keyword.clone(),
                    notion_page_id: notion_page_id.clone(),
                    sequence_number: *sequence,
                    is_active: !inactive,
                    ..NewKeyword::default()
                })
                .await?;
            println!("✅ Added keyword '{}'", added.keyword);
        }
        Commands::ListKeywords => {
            let keywords = storage.list_keywords().await?;
            if keywords.is_empty() {
                println!("No keywords yet");
            }
            for summary in keywords {
                let keyword = summary.keyword;
                println!(
                    "{} {}{} - {} posts, last posted {}",
                    if keyword.is_active { "🟢" } else { "⚪" },
                    keyword.keyword,
                    keyword.sequence_number.map(|s| format!(" (#{})", s)).unwrap_or_default(),
                    summary.post_count,
                    keyword
                        .last_posted
                        .map(|t| t.with_timezone(&offset).format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_else(|| "never".to_string())
                );
            }
        }
        Commands::DeleteKeyword { keyword } => {
            if !storage.delete_keyword(keyword).await? {
                bail!("Keyword not found: {}", keyword);
            }
            println!("🗑️ Deleted keyword '{}' and its posts", keyword);
        }
        Commands::ToggleKeyword { keyword } => match storage.toggle_keyword(keyword).await? {
            Some(active) => println!(
                "🔀 '{}' is now {}",
                keyword,
                if active { "active" } else { "inactive" }
            ),
            None => bail!("Keyword not found: {}", keyword),
        },
        Commands::ListDrafts => {
            let drafts = storage.list_posts(Some(PostStatus::Draft)).await?;
            println!("{} drafts", drafts.len());
            for post in &drafts {
                print_post(post);
            }
        }
        Commands::SeedCurriculum { file } => {
            let added = seed_curriculum(storage.as_ref(), file).await?;
            println!("📚 Seeded {} curriculum keywords", added);
        }
        Commands::ProcessKeyword { keyword, language } => {
            let poster = build_poster(&cli, storage.clone())?;
            let post = poster.process_keyword(keyword, *language).await?;
            print_post(&post);
        }
        Commands::ProcessAll => {
            let poster = build_poster(&cli, storage.clone())?;
            report(poster.process_all().await?);
        }
        Commands::Cron => {
            let poster = build_poster(&cli, storage.clone())?;
            report(poster.daily_run(Utc::now()).await?);
        }
        Commands::PublishDrafts => {
            let poster = build_poster(&cli, storage.clone())?;
            let published = poster.publish_drafts().await?;
            println!("📤 Published {} drafts", published.len());
            for post in &published {
                print_post(post);
            }
        }
    }
    Ok(())
}

fn build_poster(cli: &Cli, storage: Arc<dyn BlogStorage>) -> anyhow::Result<AutoPoster> {
    let keys = KeyRing::new([cli.groq_api_key.clone(), cli.groq_api_key_1.clone()]);
    let model_config = ModelConfig {
        model_name: cli.model_name.clone(),
        ..ModelConfig::with_keys(keys)
    };
    let model = create_model(&cli.model, model_config)?;
    info!("🧠 Chat model ready (using {})", model.name());

    let mut providers: Vec<Arc<dyn SearchProvider>> = Vec::new();
    match (&cli.google_api_key, &cli.google_cse_id) {
        (Some(key), Some(cx)) => providers.push(Arc::new(GoogleSearch::new(key.clone(), cx.clone())?)),
        _ => warn!("⚠️ GOOGLE_API_KEY or GOOGLE_CSE_ID missing, using HTML search only"),
    }
    providers.push(Arc::new(DuckDuckGoSearch::new()?));
    let search = SearchManager::new(providers);
    info!("🔍 Search providers: {}", search.provider_names().join(", "));

    let offset = default_offset();
    let publisher = NotionClient::new(cli.notion_api_key.clone().unwrap_or_default())?.with_offset(offset);

    let config = PipelineConfig {
        revision: RevisionPolicy {
            max_revisions: cli.max_revisions,
        },
        curriculum_mode: cli.curriculum_mode,
        auto_activate_next: cli.auto_activate_next,
        infer_next_keyword: cli.infer_next_keyword,
        parent_page_id: cli.notion_parent_page_id.clone(),
        database_id: cli.notion_database_id.clone(),
        ..PipelineConfig::default()
    };
    let chain = AgentChain::new(Arc::new(search), model.clone(), storage.clone(), config);
    Ok(AutoPoster::new(chain, model, storage, Arc::new(publisher)))
}

/// Keywords in file order; blank lines and `#` comments are skipped.
fn curriculum_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

/// Insert keywords numbered from 1; only the first starts active.
async fn seed_curriculum(storage: &dyn BlogStorage, file: &Path) -> anyhow::Result<usize> {
    let text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("reading curriculum file {}", file.display()))?;
    let mut added = 0;
    for (index, keyword) in curriculum_lines(&text).into_iter().enumerate() {
        let result = storage
            .add_keyword(NewKeyword {
                keyword: keyword.clone(),
                sequence_number: Some(index as i64 + 1),
                is_active: index == 0,
                ..NewKeyword::default()
            })
            .await;
        match result {
            Ok(_) => added += 1,
            Err(Error::Duplicate(_)) => warn!("⚠️ '{}' already exists, skipped", keyword),
            Err(e) => return Err(e.into()),
        }
    }
    Ok(added)
}

fn print_post(post: &Post) {
    let status = match post.status {
        PostStatus::Published => "✅",
        PostStatus::Draft => "📝",
    };
    println!(
        "{} [{}] {} {}",
        status,
        post.language,
        post.title,
        post.notion_url.as_deref().unwrap_or("(draft)")
    );
}

fn report(outcome: RunOutcome) {
    match outcome {
        RunOutcome::NoKeyword => println!("📭 No active keyword"),
        RunOutcome::Skipped(reason) => println!("⏭️ Skipped: {:?}", reason),
        RunOutcome::Completed(run) => {
            println!("🏁 '{}'", run.keyword.keyword);
            for post in &run.posts {
                print_post(post);
            }
            if let Some(next) = run.next_keyword {
                println!("📚 Next keyword: {}", next.keyword);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bp_storage::MemoryStorage;

    #[test]
    fn test_curriculum_lines() {
        let lines = curriculum_lines("# rust track\n소유권\n\n  빌림  \n# later\n수명\n");
        assert_eq!(lines, vec!["소유권", "빌림", "수명"]);
    }

    #[tokio::test]
    async fn test_seed_curriculum() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("curriculum.txt");
        std::fs::write(&path, "소유권\n빌림\n수명\n").unwrap();

        let storage = MemoryStorage::new();
        storage.add_keyword(NewKeyword::active("빌림")).await.unwrap();

        assert_eq!(seed_curriculum(&storage, &path).await.unwrap(), 2);
        let first = storage.first_active_keyword().await.unwrap().unwrap();
        assert_eq!(first.keyword, "소유권");
        assert_eq!(first.sequence_number, Some(1));
        let third = storage.keyword_by_sequence(3).await.unwrap().unwrap();
        assert_eq!(third.keyword, "수명");
        assert!(!third.is_active);
    }
}
