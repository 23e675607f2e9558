//! Line classification for generated markdown.
//!
//! Every consumer that needs to understand the layout of a post (format
//! repair, the structural checker, block conversion) works on the token
//! stream produced here instead of matching raw text.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref GLUED_HEADING: Regex = Regex::new(r"([.!?])[ \t]+(#{2,6}[ \t])").unwrap();
    static ref ORDERED_ITEM: Regex = Regex::new(r"^\d+[.)][ \t]").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Heading { level: u8, text: String },
    ListItem(String),
    Divider,
    Blank,
    Paragraph(String),
}

impl Line {
    pub fn is_blank(&self) -> bool {
        matches!(self, Line::Blank)
    }

    pub fn is_heading(&self) -> bool {
        matches!(self, Line::Heading { .. })
    }

    /// Render the line back to markdown; classifying the result yields `self`.
    pub fn render(&self) -> String {
        match self {
            Line::Heading { level, text } if text.is_empty() => "#".repeat(*level as usize),
            Line::Heading { level, text } => format!("{} {}", "#".repeat(*level as usize), text),
            Line::ListItem(raw) | Line::Paragraph(raw) => raw.clone(),
            Line::Divider => "---".to_string(),
            Line::Blank => String::new(),
        }
    }

    /// Item text without the bullet or number.
    pub fn list_item_text(&self) -> Option<&str> {
        let Line::ListItem(raw) = self else {
            return None;
        };
        let trimmed = raw.trim_start();
        if let Some(m) = ORDERED_ITEM.find(trimmed) {
            return Some(trimmed[m.end()..].trim());
        }
        Some(trimmed[1..].trim())
    }
}

fn heading(trimmed: &str) -> Option<Line> {
    let level = trimmed.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &trimmed[level..];
    let spaced = rest.is_empty() || rest.starts_with(char::is_whitespace);
    // "#tag" is a paragraph, "##제목" is a heading the model forgot to space
    if !spaced && level < 2 {
        return None;
    }
    Some(Line::Heading {
        level: level as u8,
        text: rest.trim().to_string(),
    })
}

fn is_divider(trimmed: &str) -> bool {
    let compact: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
    compact.chars().count() >= 3
        && ['-', '*', '_']
            .iter()
            .any(|marker| compact.chars().all(|c| c == *marker))
}

fn is_list_item(trimmed: &str) -> bool {
    let bullet = ["- ", "* ", "+ ", "-\t", "*\t", "+\t"]
        .iter()
        .any(|marker| trimmed.starts_with(marker));
    bullet || ORDERED_ITEM.is_match(trimmed)
}

pub fn classify_line(raw: &str) -> Line {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Line::Blank;
    }
    if is_divider(trimmed) {
        return Line::Divider;
    }
    if let Some(heading) = heading(trimmed) {
        return heading;
    }
    if is_list_item(trimmed) {
        return Line::ListItem(raw.trim_end().to_string());
    }
    Line::Paragraph(raw.trim_end().to_string())
}

/// Undo the layout damage commonly seen in model replies: escaped newlines,
/// Windows line endings and headings glued to the end of a sentence.
pub fn normalize(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace("\\n", "\n");
    GLUED_HEADING.replace_all(&text, "$1\n\n$2").into_owned()
}

pub fn tokenize(text: &str) -> Vec<Line> {
    normalize(text).split('\n').map(classify_line).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_line() {
        assert_eq!(classify_line(""), Line::Blank);
        assert_eq!(classify_line("   \t"), Line::Blank);
        assert_eq!(classify_line("---"), Line::Divider);
        assert_eq!(classify_line("* * *"), Line::Divider);
        assert_eq!(
            classify_line("## 소유권이란?"),
            Line::Heading { level: 2, text: "소유권이란?".into() }
        );
        assert_eq!(
            classify_line("###빌림"),
            Line::Heading { level: 3, text: "빌림".into() }
        );
        assert_eq!(classify_line("#태그"), Line::Paragraph("#태그".into()));
        assert_eq!(classify_line("- 항목"), Line::ListItem("- 항목".into()));
        assert_eq!(classify_line("  2. 둘째"), Line::ListItem("  2. 둘째".into()));
        assert_eq!(classify_line("**굵게** 시작"), Line::Paragraph("**굵게** 시작".into()));
        assert_eq!(classify_line("-5도의 날씨"), Line::Paragraph("-5도의 날씨".into()));
    }

    #[test]
    fn test_render_round_trips_through_classifier() {
        for raw in ["# 제목", "###   공백 많은 제목  ", "##", "- [링크](https://a.b)", "1. 첫째", "문단입니다.", "___"] {
            let line = classify_line(raw);
            assert_eq!(classify_line(&line.render()), line, "{:?}", raw);
        }
    }

    #[test]
    fn test_tokenize_splits_glued_headings_and_escapes() {
        let tokens = tokenize("첫 문단입니다. ## 다음 제목\\n본문");
        assert_eq!(
            tokens,
            vec![
                Line::Paragraph("첫 문단입니다.".into()),
                Line::Blank,
                Line::Heading { level: 2, text: "다음 제목".into() },
                Line::Paragraph("본문".into()),
            ]
        );
    }

    #[test]
    fn test_list_item_text() {
        assert_eq!(classify_line("- 항목").list_item_text(), Some("항목"));
        assert_eq!(classify_line("10) 열번째").list_item_text(), Some("열번째"));
        assert_eq!(classify_line("문단").list_item_text(), None);
    }
}
