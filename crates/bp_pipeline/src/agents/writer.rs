use std::sync::Arc;

use bp_core::{Error, GeneratedContent, Language, LanguageModel, Result, SearchResult, CachedPost};
use bp_inference::prompts::PromptTemplate;
use bp_text::footer::attach_footer;
use bp_text::{build_footer, clean_text, clean_title, split_footer};
use tracing::info;

use super::ask;

/// A post split into the part revisions may touch and the footer they may not.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub language: Language,
    pub title: String,
    pub body: String,
    pub footer: String,
    pub summary: String,
    pub keywords: Vec<String>,
    pub category: String,
}

impl Draft {
    /// Body and footer joined, ready to store or publish.
    pub fn content(&self) -> String {
        attach_footer(&self.body, &self.footer)
    }
}

pub struct Writer {
    model: Arc<dyn LanguageModel>,
}

impl Writer {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Turn a raw model reply into a cleaned draft with our own footer.
    pub fn assemble(language: Language, reply: GeneratedContent, results: &[SearchResult]) -> Result<Draft> {
        let title = clean_title(language, &reply.title);
        if title.is_empty() {
            return Err(Error::Inference("writer returned an empty title".to_string()));
        }
        // the model sometimes writes its own references section; ours replaces it
        let (body, _) = split_footer(&reply.content);
        let body = clean_text(language, body);
        if body.is_empty() {
            return Err(Error::Inference("writer returned an empty post".to_string()));
        }
        let footer = build_footer(language, results, &reply.category, &reply.keywords);
        Ok(Draft {
            language,
            title,
            body,
            footer,
            summary: reply.summary,
            keywords: reply.keywords,
            category: reply.category,
        })
    }

    pub async fn draft(
        &self,
        template: &PromptTemplate,
        keyword: &str,
        results: &[SearchResult],
        recent: &[CachedPost],
    ) -> Result<Draft> {
        info!("📝 Drafting {} post for '{}'", template.language, keyword);
        let prompt = template.generation(keyword, results, recent);
        let reply: GeneratedContent = ask(self.model.as_ref(), &prompt).await?;
        Self::assemble(template.language, reply, results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bp_inference::models::dummy::DummyModel;
    use bp_inference::prompts::StructureVariant;

    #[tokio::test]
    async fn test_draft_is_cleaned_and_gets_footer() {
        let reply = serde_json::json!({
            "title": "러스트 非常 소유권",
            "content": "## 서론\n처음 배우는 소유권. ## 본문\n내용입니다.\n\n## References\n\n- [model link](https://bad.example)",
            "summary": "요약",
            "keywords": ["러스트", "소유권"],
            "category": "IT"
        });
        let model = Arc::new(DummyModel::with_replies([reply.to_string()]));
        let results = vec![SearchResult {
            title: "Rust Book".into(),
            link: "https://doc.rust-lang.org/book/".into(),
            snippet: String::new(),
        }];
        let template = PromptTemplate::new(Language::Korean, StructureVariant::LearningStory);

        let draft = Writer::new(model).draft(&template, "러스트", &results, &[]).await.unwrap();
        assert_eq!(draft.title, "러스트 소유권");
        assert_eq!(draft.body, "## 서론\n\n처음 배우는 소유권.\n\n## 본문\n\n내용입니다.");
        assert!(draft.footer.contains("- [Rust Book](https://doc.rust-lang.org/book/)"));
        assert!(!draft.content().contains("bad.example"));
        assert!(draft.content().starts_with(&draft.body));
    }

    #[tokio::test]
    async fn test_malformed_reply_is_an_error() {
        let model = Arc::new(DummyModel::with_replies(["I cannot do that"]));
        let template = PromptTemplate::new(Language::English, StructureVariant::Standard);
        let result = Writer::new(model).draft(&template, "rust", &[], &[]).await;
        assert!(matches!(result, Err(Error::Inference(_))));
    }
}
