use std::sync::Arc;

use bp_core::{LanguageModel, Result, SearchResult};
use bp_inference::prompts::{self, PromptTemplate};
use bp_text::{clean_text, clean_title, split_footer};
use serde::Deserialize;
use tracing::info;

use super::{ask_lenient, Draft};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewReport {
    #[serde(default)]
    pub is_valid: bool,
    #[serde(default)]
    pub quality_score: f64,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub recommendation: String,
}

impl ReviewReport {
    /// Issues worth a revision; a reviewer that recommends publishing raises none.
    pub fn actionable_issues(&self) -> Vec<String> {
        if self.recommendation.eq_ignore_ascii_case("publish") && self.is_valid {
            return Vec::new();
        }
        self.issues
            .iter()
            .map(|i| i.trim())
            .filter(|i| !i.is_empty())
            .map(String::from)
            .collect()
    }
}

pub struct Reviewer {
    model: Arc<dyn LanguageModel>,
}

impl Reviewer {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    pub async fn review(&self, keyword: &str, draft: &Draft) -> Result<Vec<String>> {
        let prompt = prompts::content_review(draft.language, keyword, &draft.title, &draft.body);
        let Some(report) = ask_lenient::<ReviewReport>(self.model.as_ref(), &prompt, "content review").await? else {
            return Ok(Vec::new());
        };
        info!(
            "🔎 Review: score {}, recommendation '{}', {} issues",
            report.quality_score,
            report.recommendation,
            report.issues.len()
        );
        Ok(report.actionable_issues())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RevisionNote {
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub original: String,
    #[serde(default)]
    pub revised: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RevisionReply {
    /// Empty when the title needs no change.
    #[serde(default)]
    pub revised_title: String,
    #[serde(default)]
    pub revised_content: String,
    #[serde(default)]
    pub revisions: Vec<RevisionNote>,
}

/// A cleaned revision: the new body, plus a new title when one was sent.
#[derive(Debug, Clone, PartialEq)]
pub struct Revision {
    pub title: Option<String>,
    pub body: String,
}

pub struct Reviser {
    model: Arc<dyn LanguageModel>,
}

impl Reviser {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Ask for a corrected body and, if needed, title. `None` when the reply is unusable.
    pub async fn revise(
        &self,
        template: &PromptTemplate,
        draft: &Draft,
        issues: &[String],
        results: &[SearchResult],
    ) -> Result<Option<Revision>> {
        let prompt = template.revision(&draft.title, &draft.body, issues, results);
        let Some(reply) = ask_lenient::<RevisionReply>(self.model.as_ref(), &prompt, "revision").await? else {
            return Ok(None);
        };
        let (body, _) = split_footer(&reply.revised_content);
        let body = clean_text(draft.language, body);
        if body.is_empty() {
            return Ok(None);
        }
        let title = Some(clean_title(draft.language, &reply.revised_title))
            .filter(|t| !t.is_empty() && *t != draft.title);
        if let Some(title) = &title {
            info!("✏️ Retitled '{}' -> '{}'", draft.title, title);
        }
        for note in &reply.revisions {
            info!("✏️ Revised '{}': {}", note.section, note.reason);
        }
        Ok(Some(Revision { title, body }))
    }
}
