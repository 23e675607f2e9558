use std::sync::Arc;

use bp_core::storage::LEARNING_CACHE_SIZE;
use bp_core::{BlogStorage, Error, Keyword, Language, LanguageModel, Result, SearchResult};
use bp_inference::prompts::PromptTemplate;
use bp_search::SearchManager;
use tracing::info;

use crate::agents::{Draft, FactChecker, Reviewer, Reviser, SearchDecision, SearchValidator, Writer};
use crate::config::PipelineConfig;
use crate::revision::RevisionLoop;

/// A validated post together with the sources it was written from.
#[derive(Debug, Clone)]
pub struct ChainOutput {
    pub draft: Draft,
    pub results: Vec<SearchResult>,
    pub revisions: usize,
}

/// Search, validate, fact check, write, review and revise, strictly in that order.
pub struct AgentChain {
    search: Arc<SearchManager>,
    storage: Arc<dyn BlogStorage>,
    validator: SearchValidator,
    fact_checker: FactChecker,
    writer: Writer,
    reviewer: Reviewer,
    reviser: Reviser,
    config: PipelineConfig,
}

impl AgentChain {
    pub fn new(
        search: Arc<SearchManager>,
        model: Arc<dyn LanguageModel>,
        storage: Arc<dyn BlogStorage>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            search,
            storage,
            validator: SearchValidator::new(model.clone(), config.search),
            fact_checker: FactChecker::new(model.clone()),
            writer: Writer::new(model.clone()),
            reviewer: Reviewer::new(model.clone()),
            reviser: Reviser::new(model),
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn template(&self, language: Language) -> PromptTemplate {
        PromptTemplate::new(language, self.config.variant).with_persona(self.config.persona(language))
    }

    pub async fn run(&self, keyword: &Keyword, language: Language) -> Result<ChainOutput> {
        let text = keyword.keyword.as_str();
        info!("🔍 Searching for '{}'", text);
        let results = self.search.search_keyword(text).await?;

        if let SearchDecision::Reject { score, reason } = self.validator.validate(text, &results).await? {
            return Err(Error::Validation(format!(
                "search results for '{}' rejected (score {}): {}",
                text, score, reason
            )));
        }

        let checked = self.fact_checker.check(text, results).await?;
        let recent = self.storage.cached_posts(language, LEARNING_CACHE_SIZE).await?;
        let template = self.template(language);

        let draft = self.writer.draft(&template, text, &checked.results, &recent).await?;
        let review_issues = self.reviewer.review(text, &draft).await?;

        let outcome = RevisionLoop::new(&self.reviser, self.config.revision, self.config.content)
            .run(&template, draft, review_issues, &checked.notes, &checked.results)
            .await?;
        let revisions = outcome.revisions;
        let draft = outcome.into_result()?;
        info!("✅ {} post ready: '{}'", language, draft.title);

        Ok(ChainOutput {
            draft,
            results: checked.results,
            revisions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use bp_core::{ApiError, NewKeyword};
    use bp_inference::models::dummy::DummyModel;
    use bp_storage::MemoryStorage;

    async fn setup(model: Arc<DummyModel>) -> (AgentChain, Keyword) {
        let storage = Arc::new(MemoryStorage::new());
        let keyword = storage.add_keyword(NewKeyword::active("rust ownership")).await.unwrap();
        let chain = AgentChain::new(search_manager(), model, storage, PipelineConfig::default());
        (chain, keyword)
    }

    #[tokio::test]
    async fn test_chain_runs_every_agent_in_order() {
        let model = Arc::new(DummyModel::with_replies(english_script()));
        let (chain, keyword) = setup(model.clone()).await;

        let output = chain.run(&keyword, Language::English).await.unwrap();
        assert_eq!(output.draft.title, ENGLISH_TITLE);
        assert_eq!(output.revisions, 0);
        assert_eq!(output.results.len(), 2);
        assert!(output.draft.footer.contains("## References"));
        assert_eq!(model.calls(), 4);
        assert_eq!(model.remaining(), 0);

        let requests = model.requests();
        assert!(requests[0][0].content.contains("judge whether web search results"));
        assert!(requests[1][0].content.contains("fact-check"));
    }

    #[tokio::test]
    async fn test_rejected_search_stops_before_writing() {
        let model = Arc::new(DummyModel::with_replies([validation_reply("reject", 5.0)]));
        let (chain, keyword) = setup(model.clone()).await;

        let result = chain.run(&keyword, Language::English).await;
        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_revisions_abort() {
        let model = Arc::new(DummyModel::with_replies([
            validation_reply("proceed", 90.0),
            fact_check_reply(),
            generation_reply(ENGLISH_TITLE, "## Only\n\nOne section."),
            review_reply("publish"),
            revision_reply("## Still\n\nOne section."),
            revision_reply("## Still\n\nOne section."),
            revision_reply("## Still\n\nOne section."),
        ]));
        let (chain, keyword) = setup(model.clone()).await;

        let result = chain.run(&keyword, Language::English).await;
        assert!(matches!(result, Err(Error::Validation(_))));
        // generation plus at most three revisions after the two checks
        assert_eq!(model.calls(), 2 + 1 + 1 + 3);
    }

    #[tokio::test]
    async fn test_upstream_error_is_fatal() {
        let model = Arc::new(DummyModel::new());
        model.push_error(ApiError::RateLimited);
        let (chain, keyword) = setup(model.clone()).await;

        let result = chain.run(&keyword, Language::English).await;
        assert!(matches!(result, Err(Error::Api(ApiError::RateLimited))));
    }
}
