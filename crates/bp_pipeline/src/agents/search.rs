use std::sync::Arc;

use bp_core::{LanguageModel, Result, SearchResult};
use bp_inference::prompts;
use serde::Deserialize;
use tracing::{info, warn};

use super::ask_lenient;
use crate::config::SearchPolicy;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchVerdict {
    #[serde(default)]
    pub is_valid: bool,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub quality_score: f64,
    #[serde(default)]
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchDecision {
    Proceed { score: f64 },
    ProceedWithWarning { score: f64, reason: String },
    Reject { score: f64, reason: String },
}

impl SearchDecision {
    pub fn is_rejected(&self) -> bool {
        matches!(self, SearchDecision::Reject { .. })
    }
}

pub struct SearchValidator {
    model: Arc<dyn LanguageModel>,
    policy: SearchPolicy,
}

impl SearchValidator {
    pub fn new(model: Arc<dyn LanguageModel>, policy: SearchPolicy) -> Self {
        Self { model, policy }
    }

    pub fn decide(&self, verdict: &SearchVerdict) -> SearchDecision {
        let score = verdict.quality_score;
        if verdict.recommendation.eq_ignore_ascii_case("proceed") || score >= self.policy.pass_score {
            SearchDecision::Proceed { score }
        } else if score >= self.policy.warn_score {
            SearchDecision::ProceedWithWarning {
                score,
                reason: verdict.reason.clone(),
            }
        } else {
            SearchDecision::Reject {
                score,
                reason: verdict.reason.clone(),
            }
        }
    }

    pub async fn validate(&self, keyword: &str, results: &[SearchResult]) -> Result<SearchDecision> {
        let prompt = prompts::search_validation(keyword, results);
        let verdict = ask_lenient::<SearchVerdict>(self.model.as_ref(), &prompt, "search validation")
            .await?
            .unwrap_or_else(|| SearchVerdict {
                is_valid: true,
                reason: "validator unavailable".to_string(),
                quality_score: self.policy.fallback_score,
                recommendation: String::new(),
            });

        let decision = self.decide(&verdict);
        match &decision {
            SearchDecision::Proceed { score } => info!("✅ Search results accepted (score {})", score),
            SearchDecision::ProceedWithWarning { score, reason } => {
                warn!("⚠️ Search results are weak (score {}): {}", score, reason)
            }
            SearchDecision::Reject { score, reason } => {
                warn!("❌ Search results rejected (score {}): {}", score, reason)
            }
        }
        Ok(decision)
    }
}
