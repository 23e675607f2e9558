//! Bounded validate/revise loop run on every draft before it may be published.
//!
//! ```text
//! Generated -> Validating -> Valid
//!                  |  ^
//!                  v  |
//!               Revising        (at most `max_revisions` times, then Failed)
//! ```

use bp_core::{Error, Result, SearchResult};
use bp_inference::prompts::PromptTemplate;
use bp_text::{content_issues, ContentPolicy};
use tracing::{info, warn};

use crate::agents::{Draft, Reviser};
use crate::config::RevisionPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionState {
    Generated,
    Validating,
    Revising,
    Valid,
    Failed,
}

#[derive(Debug, Clone)]
pub struct RevisionOutcome {
    pub draft: Draft,
    pub state: RevisionState,
    pub revisions: usize,
    /// Issues left when the loop gave up; empty when valid.
    pub remaining_issues: Vec<String>,
    pub trace: Vec<RevisionState>,
}

impl RevisionOutcome {
    pub fn is_valid(&self) -> bool {
        self.state == RevisionState::Valid
    }

    /// The draft, or a validation error naming what is still wrong.
    pub fn into_result(self) -> Result<Draft> {
        match self.state {
            RevisionState::Valid => Ok(self.draft),
            _ => Err(Error::Validation(format!(
                "post still fails after {} revisions: {}",
                self.revisions,
                self.remaining_issues.join("; ")
            ))),
        }
    }
}

pub struct RevisionLoop<'a> {
    reviser: &'a Reviser,
    policy: RevisionPolicy,
    content: ContentPolicy,
}

impl<'a> RevisionLoop<'a> {
    pub fn new(reviser: &'a Reviser, policy: RevisionPolicy, content: ContentPolicy) -> Self {
        Self {
            reviser,
            policy,
            content,
        }
    }

    /// Validate `draft` and revise it until it passes or the revision budget is spent.
    ///
    /// `review_issues` only count on the first validation; `notes` are passed to
    /// every revision request without triggering one. Makes at most
    /// `max_revisions` model calls.
    pub async fn run(
        &self,
        template: &PromptTemplate,
        mut draft: Draft,
        review_issues: Vec<String>,
        notes: &[String],
        results: &[SearchResult],
    ) -> Result<RevisionOutcome> {
        let mut state = RevisionState::Generated;
        let mut trace = vec![state];
        let mut revisions = 0;
        let mut pending_review = review_issues;
        let mut issues = Vec::new();

        loop {
            state = match state {
                RevisionState::Generated | RevisionState::Revising => RevisionState::Validating,
                RevisionState::Validating => {
                    issues = content_issues(draft.language, &draft.title, &draft.body, &self.content);
                    issues.append(&mut pending_review);
                    if issues.is_empty() {
                        RevisionState::Valid
                    } else if revisions >= self.policy.max_revisions {
                        RevisionState::Failed
                    } else {
                        warn!("⚠️ Draft has {} issues: {}", issues.len(), issues.join("; "));
                        let mut request = issues.clone();
                        request.extend(notes.iter().cloned());
                        revisions += 1;
                        info!("✏️ Revision {}/{}", revisions, self.policy.max_revisions);
                        if let Some(revision) = self.reviser.revise(template, &draft, &request, results).await? {
                            if let Some(title) = revision.title {
                                draft.title = title;
                            }
                            draft.body = revision.body;
                        }
                        RevisionState::Revising
                    }
                }
                RevisionState::Valid | RevisionState::Failed => break,
            };
            trace.push(state);
        }

        match state {
            RevisionState::Valid => info!("✅ Draft passed validation after {} revisions", revisions),
            _ => warn!("❌ Draft still invalid after {} revisions", revisions),
        }
        Ok(RevisionOutcome {
            draft,
            state,
            revisions,
            remaining_issues: if state == RevisionState::Valid { Vec::new() } else { issues },
            trace,
        })
    }
}
