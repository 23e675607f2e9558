use bp_core::time::default_offset;
use bp_core::{Language, PageParent, Result};
use bp_inference::prompts::{Persona, StructureVariant};
use bp_text::ContentPolicy;
use chrono::FixedOffset;

/// How many times a failing draft is sent back for revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevisionPolicy {
    pub max_revisions: usize,
}

impl Default for RevisionPolicy {
    fn default() -> Self {
        Self { max_revisions: 3 }
    }
}

/// Score thresholds applied to the search-validation verdict (0-100).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchPolicy {
    pub pass_score: f64,
    pub warn_score: f64,
    /// Score assumed when the validator gives no usable answer.
    pub fallback_score: f64,
}

impl Default for SearchPolicy {
    fn default() -> Self {
        Self {
            pass_score: 50.0,
            warn_score: 20.0,
            fallback_score: 50.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub offset: FixedOffset,
    /// Local hour after which a keyword counts as posted for the day.
    pub cutoff_hour: u32,
    pub skip_weekends: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            offset: default_offset(),
            cutoff_hour: 7,
            skip_weekends: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub content: ContentPolicy,
    pub revision: RevisionPolicy,
    pub search: SearchPolicy,
    pub schedule: ScheduleConfig,
    pub variant: StructureVariant,
    /// Overrides the default persona for every language.
    pub persona: Option<Persona>,
    pub curriculum_mode: bool,
    pub auto_activate_next: bool,
    pub infer_next_keyword: bool,
    pub parent_page_id: Option<String>,
    pub database_id: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            content: ContentPolicy::default(),
            revision: RevisionPolicy::default(),
            search: SearchPolicy::default(),
            schedule: ScheduleConfig::default(),
            variant: StructureVariant::LearningStory,
            persona: None,
            curriculum_mode: true,
            auto_activate_next: true,
            infer_next_keyword: true,
            parent_page_id: None,
            database_id: None,
        }
    }
}

impl PipelineConfig {
    pub fn persona(&self, language: Language) -> Persona {
        self.persona
            .clone()
            .unwrap_or_else(|| Persona::default_for(language))
    }

    /// Parent for a keyword's pages: the keyword's own page, then the configured page, then the database.
    pub fn parent_for(&self, keyword_page_id: Option<&str>) -> Result<PageParent> {
        let page = keyword_page_id
            .filter(|p| !p.trim().is_empty())
            .or(self.parent_page_id.as_deref());
        PageParent::resolve(page, self.database_id.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bp_core::Error;

    #[test]
    fn test_parent_resolution_order() {
        let config = PipelineConfig {
            parent_page_id: Some("configured".into()),
            database_id: Some("db".into()),
            ..PipelineConfig::default()
        };
        assert_eq!(config.parent_for(Some("own")).unwrap(), PageParent::Page("own".into()));
        assert_eq!(config.parent_for(Some("")).unwrap(), PageParent::Page("configured".into()));

        let database_only = PipelineConfig {
            database_id: Some("db".into()),
            ..PipelineConfig::default()
        };
        assert_eq!(database_only.parent_for(None).unwrap(), PageParent::Database("db".into()));
        assert!(matches!(PipelineConfig::default().parent_for(None), Err(Error::Config(_))));
    }
}
