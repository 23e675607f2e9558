use std::collections::HashSet;
use std::sync::Arc;

use bp_core::{Error, LanguageModel, Result, SearchResult};
use bp_inference::prompts;
use serde::Deserialize;
use tracing::{info, warn};

use super::ask_lenient;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FactIssue {
    #[serde(default)]
    pub result_index: usize,
    #[serde(default)]
    pub issue: String,
    #[serde(default)]
    pub severity: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FactCheckReport {
    #[serde(default)]
    pub is_accurate: bool,
    #[serde(default)]
    pub accuracy_score: f64,
    #[serde(default)]
    pub issues: Vec<FactIssue>,
    #[serde(default)]
    pub recommendation: String,
}

/// Results that survived the check, plus the flagged issues for later revision prompts.
#[derive(Debug, Clone, Default)]
pub struct FactChecked {
    pub results: Vec<SearchResult>,
    pub notes: Vec<String>,
}

pub struct FactChecker {
    model: Arc<dyn LanguageModel>,
}

impl FactChecker {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    pub fn apply(report: &FactCheckReport, results: Vec<SearchResult>) -> Result<FactChecked> {
        let dropped: HashSet<usize> = report
            .issues
            .iter()
            .filter(|i| i.severity.eq_ignore_ascii_case("high"))
            .map(|i| i.result_index)
            .collect();
        let notes = report
            .issues
            .iter()
            .map(|i| i.issue.trim())
            .filter(|i| !i.is_empty())
            .map(String::from)
            .collect();
        let kept: Vec<SearchResult> = results
            .into_iter()
            .enumerate()
            .filter(|(index, _)| !dropped.contains(index))
            .map(|(_, result)| result)
            .collect();

        if kept.is_empty() && report.recommendation.eq_ignore_ascii_case("needs_review") {
            return Err(Error::Validation(
                "fact check flagged every search result for review".to_string(),
            ));
        }
        Ok(FactChecked { results: kept, notes })
    }

    pub async fn check(&self, keyword: &str, results: Vec<SearchResult>) -> Result<FactChecked> {
        let prompt = prompts::fact_check(keyword, &results);
        let Some(report) = ask_lenient::<FactCheckReport>(self.model.as_ref(), &prompt, "fact check").await? else {
            return Ok(FactChecked {
                results,
                notes: Vec::new(),
            });
        };

        let before = results.len();
        let checked = Self::apply(&report, results)?;
        if checked.results.len() < before {
            warn!(
                "⚠️ Fact check removed {} of {} search results",
                before - checked.results.len(),
                before
            );
        }
        info!("✅ Fact check done (accuracy {})", report.accuracy_score);
        Ok(checked)
    }
}
