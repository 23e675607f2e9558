//! Lossy removal of foreign scripts from generated text.
//!
//! Korean output loses Han, kana and Latin-extended characters plus a short
//! list of loanwords the writer model keeps slipping in. English output loses
//! Hangul. Neither pass translates anything; meaning can be lost.

use lazy_static::lazy_static;
use regex::Regex;

use crate::script::Script;

const MAX_PASSES: usize = 8;

lazy_static! {
    static ref LOANWORDS: Vec<(Regex, &'static str)> = [
        ("인터레스팅(?:한)?", "흥미로운"),
        (r"(?i)(?:interesting|interess?ant)[a-z]*(?:한\b)?", "흥미로운"),
        (r"(?i)khá[a-z]*", "꽤"),
        ("データ", "데이터"),
        ("まだ", ""),
        ("あり", ""),
    ]
    .iter()
    .filter_map(|(pattern, replacement)| Regex::new(pattern).ok().map(|re| (re, *replacement)))
    .collect();

    static ref DOUBLED: Vec<(Regex, &'static str)> = ["흥미로운", "아직", "꽤"]
        .iter()
        .filter_map(|word| {
            Regex::new(&format!("{}(?:[ \\t]+{})+", word, word))
                .ok()
                .map(|re| (re, *word))
        })
        .collect();

    static ref EMPTY_PARENS: Regex = Regex::new(r"\([ \t]*\)").unwrap();
    static ref SPACE_RUN: Regex = Regex::new(r"[ \t]{2,}").unwrap();
    static ref TRAILING_SPACE: Regex = Regex::new(r"(?m)[ \t]+$").unwrap();
    static ref BLANK_RUN: Regex = Regex::new(r"\n{3,}").unwrap();
    static ref HANGUL_LINK: Regex = Regex::new(r"\[[\s\p{Hangul}]+\]\([^)]*\)").unwrap();
}

fn is_foreign_char(c: char) -> bool {
    matches!(
        Script::of(c),
        Some(Script::Han) | Some(Script::Kana) | Some(Script::LatinExtended)
    )
}

fn is_hangul_char(c: char) -> bool {
    matches!(c, '\u{AC00}'..='\u{D7A3}' | '\u{1100}'..='\u{11FF}' | '\u{3130}'..='\u{318F}')
}

/// True when `text` holds anything [`strip_foreign`] would remove or replace.
pub fn has_foreign_content(text: &str) -> bool {
    text.chars().any(is_foreign_char) || LOANWORDS.iter().any(|(re, _)| re.is_match(text))
}

pub fn has_hangul(text: &str) -> bool {
    text.chars().any(is_hangul_char)
}

fn foreign_pass(text: &str) -> String {
    let mut out = text.to_string();
    for (re, replacement) in LOANWORDS.iter() {
        out = re.replace_all(&out, *replacement).into_owned();
    }
    out.retain(|c| !is_foreign_char(c));
    out = EMPTY_PARENS.replace_all(&out, "").into_owned();
    for (re, word) in DOUBLED.iter() {
        out = re.replace_all(&out, *word).into_owned();
    }
    out = SPACE_RUN.replace_all(&out, " ").into_owned();
    TRAILING_SPACE.replace_all(&out, "").into_owned()
}

/// Strip non-Korean scripts and known loanwords from Korean text.
///
/// Text with nothing to remove comes back untouched, and the output never
/// changes on a second application.
pub fn strip_foreign(text: &str) -> String {
    if !has_foreign_content(text) {
        return text.to_string();
    }

    let mut current = text.to_string();
    for _ in 0..MAX_PASSES {
        current = foreign_pass(&current);
        if !has_foreign_content(&current) {
            break;
        }
    }
    current
}

/// Strip Hangul from English text, dropping lines left as fragments.
pub fn strip_hangul(text: &str) -> String {
    if !has_hangul(text) {
        return text.to_string();
    }

    let mut lines = Vec::new();
    for line in text.split('\n') {
        if !has_hangul(line) {
            lines.push(line.to_string());
            continue;
        }
        let mut cleaned = HANGUL_LINK.replace_all(line, "").into_owned();
        cleaned.retain(|c| !is_hangul_char(c));
        let cleaned = EMPTY_PARENS.replace_all(&cleaned, "");
        let cleaned = SPACE_RUN.replace_all(&cleaned, " ");
        let cleaned = cleaned.trim_end();
        if cleaned.trim().chars().count() <= 3 {
            continue;
        }
        lines.push(cleaned.to_string());
    }

    BLANK_RUN.replace_all(&lines.join("\n"), "\n\n").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::{validate_english, Script, ScriptStats};

    #[test]
    fn test_clean_text_is_untouched() {
        let samples = [
            "러스트 소유권 정리\n\n## 개요\n\n  들여쓰기도   그대로  ",
            "AI(인공지능)와 API 이야기",
            "",
            "Plain English   with  odd spacing",
        ];
        for sample in samples {
            assert_eq!(strip_foreign(sample), sample);
        }
    }

    #[test]
    fn test_transliterated_title_keeps_only_hangul_and_ascii() {
        let stripped = strip_foreign("인터레스팅한 데이터");
        assert!(stripped
            .chars()
            .all(|c| c.is_ascii() || Script::of(c) == Some(Script::Hangul)));
        assert!(!stripped.to_lowercase().contains("interest"));
        assert_eq!(stripped, "흥미로운 데이터");
    }

    #[test]
    fn test_loanwords_are_replaced() {
        assert_eq!(strip_foreign("interesting한 데이터"), "흥미로운 데이터");
        assert_eq!(strip_foreign("Interessante 기술"), "흥미로운 기술");
        assert_eq!(strip_foreign("khá 어려운 문제"), "꽤 어려운 문제");
        assert_eq!(strip_foreign("データ 분석"), "데이터 분석");
    }

    #[test]
    fn test_foreign_characters_are_removed() {
        let stripped = strip_foreign("이것은 非常 중요한 まだ 개념입니다.\n\n다음 줄");
        assert_eq!(stripped, "이것은 중요한 개념입니다.\n\n다음 줄");
        let stats = ScriptStats::of(&stripped);
        assert_eq!(stats.han + stats.kana + stats.latin_extended, 0);
    }

    #[test]
    fn test_doubled_words_collapse() {
        assert_eq!(strip_foreign("흥미로운 interesting 주제"), "흥미로운 주제");
        assert_eq!(strip_foreign("아직 まだ 아직 모릅니다"), "아직 모릅니다");
    }

    #[test]
    fn test_stripping_is_idempotent() {
        let samples = [
            "인터레스팅한 데이터",
            "inter非esting 이야기 (データ)",
            "khá khá 꽤 어려운 非常 문제",
            "혼합 텍스트 à la carte café",
            "## 제목 漢字\n\n본문 まだ ありがとう",
        ];
        for sample in samples {
            let once = strip_foreign(sample);
            assert_eq!(strip_foreign(&once), once, "not idempotent for {:?}", sample);
            assert!(!has_foreign_content(&once));
        }
    }

    #[test]
    fn test_hangul_removed_from_english() {
        let text = "## Ownership (소유권)\n\nOwnership is the core idea.\n\n한국어 문단\n\n- [러스트 책](https://example.com/book)\n- [The Book](https://doc.rust-lang.org/book/)";
        let stripped = strip_hangul(text);
        assert_eq!(
            stripped,
            "## Ownership\n\nOwnership is the core idea.\n\n- [The Book](https://doc.rust-lang.org/book/)"
        );
        assert!(validate_english("title", &stripped).is_ok());
        assert_eq!(strip_hangul(&stripped), stripped);
    }

    #[test]
    fn test_english_without_hangul_is_untouched() {
        let text = "Line one\n\n\n\nLine two  ";
        assert_eq!(strip_hangul(text), text);
    }
}
