//! Prompt construction for every model call the pipeline makes.
//!
//! Drafting and revision share one template parameterised by language,
//! persona and section layout; the remaining agents have a single prompt each.

use bp_core::{CachedPost, ChatMessage, Language, SearchResult};

const SNIPPET_CHARS: usize = 300;
const CACHED_EXCERPT_CHARS: usize = 400;

/// The voice the writer model is asked to adopt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    pub name: String,
    pub description: String,
}

impl Persona {
    pub fn default_for(language: Language) -> Self {
        match language {
            Language::Korean => Self {
                name: "김AI".to_string(),
                description: "IT 중소기업에서 일하는 30대 직장인 블로거. 차분하고 배려심 있는 말투로, \
                              직접 공부하며 알게 된 것을 솔직하게 나눈다."
                    .to_string(),
            },
            Language::English => Self {
                name: "Kim AI".to_string(),
                description: "a blogger in their thirties working at a small IT company. Calm and \
                              considerate, sharing honestly what they learned while studying the topic."
                    .to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureVariant {
    /// First-person learning diary: intro, "what is it", three sections, conclusion.
    LearningStory,
    /// Neutral explainer: intro, three or more sections, conclusion.
    Standard,
}

/// A system/user message pair ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    pub fn messages(&self) -> Vec<ChatMessage> {
        vec![ChatMessage::system(&self.system), ChatMessage::user(&self.user)]
    }
}

struct Phrases {
    language_rule: &'static str,
    intro: &'static str,
    what_is: &'static str,
    section: &'static str,
    conclusion: &'static str,
    category_hint: &'static str,
}

fn phrases(language: Language) -> Phrases {
    match language {
        Language::Korean => Phrases {
            language_rule: "Write ONLY in Korean (Hangul). Do not use Hanja, Japanese, or accented Latin \
                            characters. Keep English words to technical terms that have no Korean equivalent.",
            intro: "## 서론",
            what_is: "란 무엇인가?",
            section: "## (소제목)",
            conclusion: "## 결론",
            category_hint: "e.g. IT/컴퓨터, 교육, 생활",
        },
        Language::English => Phrases {
            language_rule: "Write ONLY in English. Do not include any Korean characters.",
            intro: "## Introduction",
            what_is: ": what is it?",
            section: "## (section title)",
            conclusion: "## Conclusion",
            category_hint: "e.g. Technology, Education, Lifestyle",
        },
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    let mut out: String = text.chars().take(max_chars).collect();
    if text.chars().count() > max_chars {
        out.push_str("...");
    }
    out
}

/// Numbered listing of search results for inclusion in a prompt.
pub fn format_results(results: &[SearchResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            format!(
                "[{}] {}\n    {}\n    {}",
                i,
                r.title,
                r.link,
                truncate(&r.snippet, SNIPPET_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_recent(recent: &[CachedPost]) -> String {
    recent
        .iter()
        .map(|post| format!("- {}\n  {}", post.title, truncate(&post.content, CACHED_EXCERPT_CHARS)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_list(items: &[String]) -> String {
    items.iter().map(|i| format!("- {}", i)).collect::<Vec<_>>().join("\n")
}

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub language: Language,
    pub persona: Persona,
    pub variant: StructureVariant,
}

impl PromptTemplate {
    pub fn new(language: Language, variant: StructureVariant) -> Self {
        Self {
            language,
            persona: Persona::default_for(language),
            variant,
        }
    }

    pub fn with_persona(mut self, persona: Persona) -> Self {
        self.persona = persona;
        self
    }

    fn layout(&self, keyword: &str) -> String {
        let p = phrases(self.language);
        let mut sections = vec![p.intro.to_string()];
        if self.variant == StructureVariant::LearningStory {
            sections.push(format!("## {}{}", keyword, p.what_is));
        }
        sections.extend(std::iter::repeat(p.section.to_string()).take(3));
        sections.push(p.conclusion.to_string());
        sections.join("\n\n(...)\n\n")
    }

    fn system(&self) -> String {
        let p = phrases(self.language);
        let voice = match self.variant {
            StructureVariant::LearningStory => {
                "Tell the post as a personal learning story: what confused you, what clicked, what you will study next."
            }
            StructureVariant::Standard => "Explain the topic clearly for a general reader.",
        };
        format!(
            "You are {}, {}\n{}\n{}\n\
             Formatting rules:\n\
             - Use '## ' headings with an empty line before and after every heading.\n\
             - At least three body sections besides the introduction and conclusion.\n\
             - Keep paragraphs short (two or three sentences) and separate them with an empty line.\n\
             - Never glue a heading onto the end of a sentence.\n\
             Reply with a single JSON object.",
            self.persona.name, self.persona.description, p.language_rule, voice
        )
    }

    /// Prompt for a fresh draft about `keyword`.
    pub fn generation(&self, keyword: &str, results: &[SearchResult], recent: &[CachedPost]) -> Prompt {
        let p = phrases(self.language);
        let mut user = format!(
            "Write a blog post about \"{}\" in {}.\n\n\
             Search results to base the post on:\n{}\n\n\
             Use this section layout:\n\n{}\n",
            keyword,
            self.language,
            format_results(results),
            self.layout(keyword)
        );
        if !recent.is_empty() {
            user.push_str(&format!(
                "\nRecent posts (do not repeat their openings, phrasing or examples):\n{}\n",
                format_recent(recent)
            ));
        }
        user.push_str(&format!(
            "\nReturn JSON: {{\"title\": string, \"content\": markdown string, \"summary\": string, \
             \"keywords\": [up to 10 strings], \"category\": string ({})}}",
            p.category_hint
        ));
        Prompt {
            system: self.system(),
            user,
        }
    }

    /// Prompt asking for a corrected version of `body` that fixes `issues`.
    pub fn revision(&self, title: &str, body: &str, issues: &[String], results: &[SearchResult]) -> Prompt {
        let user = format!(
            "Revise the following {} blog post so that every listed issue is fixed. \
             Keep the meaning and the section layout; do not add a references section. \
             Rewrite the title as well when an issue concerns it, otherwise leave \"revised_title\" empty.\n\n\
             Title: {}\n\nIssues:\n{}\n\nSearch results for fact reference:\n{}\n\n\
             Post:\n{}\n\n\
             Return JSON: {{\"revised_title\": string, \"revised_content\": markdown string, \"revisions\": \
             [{{\"section\": string, \"original\": string, \"revised\": string, \"reason\": string}}]}}",
            self.language,
            title,
            format_list(issues),
            format_results(results),
            body
        );
        Prompt {
            system: self.system(),
            user,
        }
    }
}

pub fn search_validation(keyword: &str, results: &[SearchResult]) -> Prompt {
    Prompt {
        system: "You judge whether web search results are relevant and trustworthy enough to write \
                 a blog post from. Reply with a single JSON object."
            .to_string(),
        user: format!(
            "Keyword: {}\n\nResults:\n{}\n\n\
             Return JSON: {{\"is_valid\": bool, \"reason\": string, \"quality_score\": 0-100, \
             \"recommendation\": \"proceed\" | \"retry\" | \"reject\"}}",
            keyword,
            format_results(results)
        ),
    }
}

pub fn fact_check(keyword: &str, results: &[SearchResult]) -> Prompt {
    Prompt {
        system: "You fact-check search results before they are used as blog sources. Flag outdated, \
                 contradictory or unverifiable claims. Reply with a single JSON object."
            .to_string(),
        user: format!(
            "Keyword: {}\n\nResults (indexed):\n{}\n\n\
             Return JSON: {{\"is_accurate\": bool, \"accuracy_score\": 0-100, \"issues\": \
             [{{\"result_index\": number, \"issue\": string, \"severity\": \"low\" | \"medium\" | \"high\"}}], \
             \"recommendation\": \"proceed\" | \"needs_review\"}}",
            keyword,
            format_results(results)
        ),
    }
}

pub fn content_review(language: Language, keyword: &str, title: &str, body: &str) -> Prompt {
    Prompt {
        system: format!(
            "You review {} blog posts for accuracy, readability and formatting before publication. \
             Reply with a single JSON object.",
            language
        ),
        user: format!(
            "Keyword: {}\nTitle: {}\n\nPost:\n{}\n\n\
             Return JSON: {{\"is_valid\": bool, \"quality_score\": 0-100, \"issues\": [string], \
             \"recommendation\": \"publish\" | \"revise\" | \"reject\"}}",
            keyword, title, body
        ),
    }
}

/// Prompt for the topic to study after `keyword`, given the path that led to it.
pub fn keyword_inference(keyword: &str, path: &[String], previous_titles: &[String]) -> Prompt {
    let path = if path.is_empty() {
        keyword.to_string()
    } else {
        path.join(" → ")
    };
    Prompt {
        system: "You plan a self-study curriculum. Given what was just studied, suggest the single \
                 most natural next topic. Reply with a single JSON object."
            .to_string(),
        user: format!(
            "Just studied: {}\nLearning path so far: {}\nPosts already written:\n{}\n\n\
             Return JSON: {{\"next_keyword\": string, \"reason\": string, \
             \"learning_level\": \"beginner\" | \"intermediate\" | \"advanced\", \"connection\": string}}",
            keyword,
            path,
            format_list(previous_titles)
        ),
    }
}
