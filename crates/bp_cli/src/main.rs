use std::path::PathBuf;

use bp_core::Language;
use bp_inference::DEFAULT_MODEL;
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "bp", author, version, about = "Keyword-driven blog auto-poster", long_about = None)]
pub struct Cli {
    /// SQLite database file
    #[arg(long, env = "BLOG_DB_PATH")]
    db_path: Option<PathBuf>,
    #[arg(long, default_value = "groq", help = "Chat model provider. Available: groq (default), dummy")]
    model: String,
    #[arg(long, env = "GROQ_MODEL", default_value = DEFAULT_MODEL)]
    model_name: String,
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    groq_api_key: Option<String>,
    /// Second key, used when the first one is rate limited
    #[arg(long, env = "GROQ_API_KEY_1", hide_env_values = true)]
    groq_api_key_1: Option<String>,
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    google_api_key: Option<String>,
    #[arg(long, env = "GOOGLE_CSE_ID")]
    google_cse_id: Option<String>,
    #[arg(long, env = "NOTION_API_KEY", hide_env_values = true)]
    notion_api_key: Option<String>,
    #[arg(long, env = "NOTION_PARENT_PAGE_ID")]
    notion_parent_page_id: Option<String>,
    #[arg(long, env = "NOTION_DATABASE_ID")]
    notion_database_id: Option<String>,
    /// Advance through keywords by sequence number
    #[arg(long, env = "USE_CURRICULUM_MODE", default_value_t = true, action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    curriculum_mode: bool,
    #[arg(long, env = "AUTO_ACTIVATE_NEXT_KEYWORD", default_value_t = true, action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    auto_activate_next: bool,
    /// Ask the model for a follow-up keyword when the curriculum runs out
    #[arg(long, default_value_t = true, action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    infer_next_keyword: bool,
    #[arg(long, default_value_t = 3)]
    max_revisions: usize,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Register a keyword
    AddKeyword {
        keyword: String,
        #[arg(long)]
        notion_page_id: Option<String>,
        /// Position in the curriculum
        #[arg(long)]
        sequence: Option<i64>,
        /// Store the keyword without activating it
        #[arg(long)]
        inactive: bool,
    },
    ListKeywords,
    DeleteKeyword {
        keyword: String,
    },
    ToggleKeyword {
        keyword: String,
    },
    /// Write and publish one post for an active keyword
    ProcessKeyword {
        keyword: String,
        #[arg(long, default_value = "korean")]
        language: Language,
    },
    /// Post the first active keyword in both languages, ignoring the schedule
    ProcessAll,
    /// Scheduled daily run
    Cron,
    ListDrafts,
    /// Retry publishing every stored draft
    PublishDrafts,
    /// Load a curriculum file with one keyword per line
    SeedCurriculum {
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    commands::run(cli).await
}
