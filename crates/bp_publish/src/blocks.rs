//! Markdown to document-store blocks, driven by the shared line classifier.

use bp_core::Language;
use bp_text::{tokenize, Line};
use chrono::{Datelike, NaiveDate, Weekday};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};

/// Longest text a single rich-text segment or heading may carry.
pub const MAX_TEXT_CHARS: usize = 2000;

lazy_static! {
    static ref HTML_TAG: Regex = Regex::new(r"</?[a-zA-Z][^>]*>").unwrap();
    static ref LINK: Regex = Regex::new(r"\[([^\]]+)\]\((https?://[^)\s]+)\)").unwrap();
}

/// A run of text, optionally linked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub link: Option<String>,
}

impl Span {
    fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), link: None }
    }

    fn to_json(&self) -> Value {
        match &self.link {
            Some(url) => json!({ "type": "text", "text": { "content": self.text, "link": { "url": url } } }),
            None => json!({ "type": "text", "text": { "content": self.text } }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, text: String },
    Divider,
    Paragraph(Vec<Span>),
    BulletedListItem(Vec<Span>),
    /// Gray single-line paragraph, used for the date line.
    Note(String),
}

fn rich_text(spans: &[Span]) -> Value {
    Value::Array(spans.iter().map(Span::to_json).collect())
}

impl Block {
    pub fn to_json(&self) -> Value {
        match self {
            Block::Heading { level, text } => {
                let kind = format!("heading_{}", level);
                let mut block = json!({ "object": "block", "type": &kind });
                block[kind.as_str()] = json!({ "rich_text": [Span::plain(text.as_str()).to_json()] });
                block
            }
            Block::Divider => json!({ "object": "block", "type": "divider", "divider": {} }),
            Block::Paragraph(spans) => json!({
                "object": "block",
                "type": "paragraph",
                "paragraph": { "rich_text": rich_text(spans) }
            }),
            Block::BulletedListItem(spans) => json!({
                "object": "block",
                "type": "bulleted_list_item",
                "bulleted_list_item": { "rich_text": rich_text(spans) }
            }),
            Block::Note(text) => json!({
                "object": "block",
                "type": "paragraph",
                "paragraph": { "rich_text": [Span::plain(text.as_str()).to_json()], "color": "gray" }
            }),
        }
    }
}

pub fn strip_html(text: &str) -> String {
    HTML_TAG.replace_all(text, "").into_owned()
}

/// Cut to `max` characters, marking the cut with "...".
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

fn split_long(span: Span) -> Vec<Span> {
    if span.text.chars().count() <= MAX_TEXT_CHARS {
        return vec![span];
    }
    let chars: Vec<char> = span.text.chars().collect();
    chars
        .chunks(MAX_TEXT_CHARS)
        .map(|chunk| Span {
            text: chunk.iter().collect(),
            link: span.link.clone(),
        })
        .collect()
}

/// Split inline text into plain and linked spans.
pub fn spans(text: &str) -> Vec<Span> {
    let text = strip_html(text);
    let mut out = Vec::new();
    let mut last = 0;
    for caps in LINK.captures_iter(&text) {
        let (Some(whole), Some(label), Some(url)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        if whole.start() > last {
            out.push(Span::plain(&text[last..whole.start()]));
        }
        out.push(Span {
            text: label.as_str().to_string(),
            link: Some(url.as_str().to_string()),
        });
        last = whole.end();
    }
    if last < text.len() {
        out.push(Span::plain(&text[last..]));
    }
    out.into_iter().flat_map(split_long).collect()
}

pub fn markdown_to_blocks(markdown: &str) -> Vec<Block> {
    tokenize(markdown)
        .iter()
        .filter_map(|line| match line {
            Line::Blank => None,
            Line::Divider => Some(Block::Divider),
            Line::Heading { level, text } => {
                let text = truncate_chars(strip_html(text).trim(), MAX_TEXT_CHARS);
                if text.is_empty() {
                    return None;
                }
                Some(Block::Heading {
                    level: (*level).clamp(1, 3),
                    text,
                })
            }
            Line::ListItem(_) => {
                let item = line.list_item_text().unwrap_or_default();
                Some(Block::BulletedListItem(spans(item)))
            }
            Line::Paragraph(raw) => {
                let spans = spans(raw.trim());
                (!spans.is_empty()).then_some(Block::Paragraph(spans))
            }
        })
        .collect()
}

fn korean_weekday(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "월요일",
        Weekday::Tue => "화요일",
        Weekday::Wed => "수요일",
        Weekday::Thu => "목요일",
        Weekday::Fri => "금요일",
        Weekday::Sat => "토요일",
        Weekday::Sun => "일요일",
    }
}

/// "📅 2026년 10월 16일 (금요일)" or "📅 October 16, 2026 (Friday)".
pub fn date_line(language: Language, date: NaiveDate) -> String {
    match language {
        Language::Korean => format!(
            "📅 {}년 {}월 {}일 ({})",
            date.year(),
            date.month(),
            date.day(),
            korean_weekday(date.weekday())
        ),
        Language::English => format!("📅 {}", date.format("%B %-d, %Y (%A)")),
    }
}
