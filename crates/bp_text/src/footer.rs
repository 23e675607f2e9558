//! Sources, category, keyword and disclaimer sections appended to every post.

use std::collections::HashSet;

use bp_core::{Language, SearchResult};
use lazy_static::lazy_static;
use regex::Regex;

pub const MAX_SOURCES: usize = 10;
pub const MAX_KEYWORDS: usize = 10;

const FOOTER_HEADINGS: &[&str] = &[
    "참고 출처",
    "References",
    "카테고리",
    "Category",
    "관련 키워드",
    "Related Keywords",
];

const DISCLAIMER_MARKERS: &[&str] = &[
    "본 글은 AI를 활용하여",
    "본 글의 정보는 100%",
    "AI를 활용하여 작성되었습니다",
    "참고용으로만 활용해 주세요",
    "was generated using AI",
    "information in this article may not be 100%",
    "Please use it as a reference",
];

lazy_static! {
    static ref FOOTER_START: Regex = Regex::new(
        r"\n\n## (?:참고 출처|References|카테고리|Category|관련 키워드|Related Keywords)"
    )
    .unwrap();
}

struct Labels {
    sources: &'static str,
    no_sources: &'static str,
    category: &'static str,
    keywords: &'static str,
    disclaimer: &'static str,
}

fn labels(language: Language) -> Labels {
    match language {
        Language::Korean => Labels {
            sources: "참고 출처",
            no_sources: "검색 결과를 기반으로 작성되었습니다.",
            category: "카테고리",
            keywords: "관련 키워드",
            disclaimer: "⚠️ 본 글은 AI를 활용하여 작성되었습니다. 일부 정보는 정확하지 않을 수 있으니 참고용으로만 활용해 주세요.",
        },
        Language::English => Labels {
            sources: "References",
            no_sources: "This article was written based on search results.",
            category: "Category",
            keywords: "Related Keywords",
            disclaimer: "⚠️ This article was generated using AI. The information may not be 100% accurate. Please use it as a reference.",
        },
    }
}

pub fn is_footer_heading(text: &str) -> bool {
    let text = text.trim();
    FOOTER_HEADINGS.iter().any(|name| text.starts_with(name))
}

pub fn disclaimer(language: Language) -> &'static str {
    labels(language).disclaimer
}

pub fn has_disclaimer(content: &str) -> bool {
    DISCLAIMER_MARKERS.iter().any(|marker| content.contains(marker))
}

/// Append the language's disclaimer unless one is already present.
pub fn ensure_disclaimer(content: &str, language: Language) -> String {
    if has_disclaimer(content) {
        return content.to_string();
    }
    format!("{}\n\n---\n\n{}", content.trim_end(), disclaimer(language))
}

pub fn has_sources(content: &str) -> bool {
    content.contains("## 참고 출처") || content.contains("## References")
}

/// Split a post into its body and footer (footer keeps its leading blank line).
pub fn split_footer(content: &str) -> (&str, &str) {
    match FOOTER_START.find(content) {
        Some(m) => (&content[..m.start()], &content[m.start()..]),
        None => (content, ""),
    }
}

pub fn attach_footer(body: &str, footer: &str) -> String {
    if footer.is_empty() {
        return body.trim_end().to_string();
    }
    format!("{}{}", body.trim_end(), footer)
}

fn source_lines(results: &[SearchResult]) -> Vec<String> {
    let mut seen = HashSet::new();
    results
        .iter()
        .take(MAX_SOURCES)
        .filter(|r| r.link.starts_with("http"))
        .filter(|r| seen.insert(r.link.as_str()))
        .map(|r| {
            let title: String = r.title.chars().filter(|c| *c != '[' && *c != ']').collect();
            let title = if title.trim().is_empty() { r.link.as_str() } else { title.trim() };
            format!("- [{}]({})", title, r.link)
        })
        .collect()
}

/// Build the footer for a post, starting with the blank line that separates it from the body.
pub fn build_footer(
    language: Language,
    results: &[SearchResult],
    category: &str,
    keywords: &[String],
) -> String {
    let labels = labels(language);
    let mut footer = format!("\n\n## {}\n\n", labels.sources);

    let sources = source_lines(results);
    if sources.is_empty() {
        footer.push_str(labels.no_sources);
    } else {
        footer.push_str(&sources.join("\n"));
    }

    let category = category.trim();
    if !category.is_empty() {
        footer.push_str(&format!("\n\n## {}\n\n`{}`", labels.category, category));
    }

    let keywords: Vec<String> = keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .take(MAX_KEYWORDS)
        .map(|k| format!("`{}`", k))
        .collect();
    if !keywords.is_empty() {
        footer.push_str(&format!("\n\n## {}\n\n{}", labels.keywords, keywords.join(", ")));
    }

    footer.push_str(&format!("\n\n---\n\n{}", labels.disclaimer));
    footer
}
