//! Unicode script counting and the language checks built on it.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Hangul,
    Han,
    Kana,
    LatinExtended,
    Latin,
}

impl Script {
    pub fn of(c: char) -> Option<Script> {
        match c {
            '\u{AC00}'..='\u{D7A3}' => Some(Script::Hangul),
            '\u{4E00}'..='\u{9FFF}' => Some(Script::Han),
            '\u{3040}'..='\u{30FF}' => Some(Script::Kana),
            '\u{00C0}'..='\u{024F}' => Some(Script::LatinExtended),
            'a'..='z' | 'A'..='Z' => Some(Script::Latin),
            _ => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Script::Hangul => "Hangul",
            Script::Han => "Han",
            Script::Kana => "kana",
            Script::LatinExtended => "Latin-extended",
            Script::Latin => "Latin",
        }
    }
}

/// Characters that do not count towards the ratio denominator.
fn is_ignored(c: char) -> bool {
    c.is_whitespace() || matches!(c, '.' | ',' | '!' | '?' | ';' | ':' | '(' | ')' | '[' | ']' | '{' | '}' | '"' | '\'' | '-')
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScriptStats {
    pub counted: usize,
    pub hangul: usize,
    pub han: usize,
    pub kana: usize,
    pub latin_extended: usize,
    pub latin: usize,
}

impl ScriptStats {
    pub fn of(text: &str) -> Self {
        let mut stats = ScriptStats::default();
        for c in text.chars().filter(|c| !is_ignored(*c)) {
            stats.counted += 1;
            match Script::of(c) {
                Some(Script::Hangul) => stats.hangul += 1,
                Some(Script::Han) => stats.han += 1,
                Some(Script::Kana) => stats.kana += 1,
                Some(Script::LatinExtended) => stats.latin_extended += 1,
                Some(Script::Latin) => stats.latin += 1,
                None => {}
            }
        }
        stats
    }

    pub fn count(&self, script: Script) -> usize {
        match script {
            Script::Hangul => self.hangul,
            Script::Han => self.han,
            Script::Kana => self.kana,
            Script::LatinExtended => self.latin_extended,
            Script::Latin => self.latin,
        }
    }

    /// Share of counted characters in `script`; 0.0 for text with nothing to count.
    pub fn ratio(&self, script: Script) -> f64 {
        if self.counted == 0 {
            return 0.0;
        }
        self.count(script) as f64 / self.counted as f64
    }
}

pub fn script_ratio(text: &str, script: Script) -> f64 {
    ScriptStats::of(text).ratio(script)
}

/// Thresholds applied by the language checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScriptPolicy {
    pub title_min_hangul: f64,
    pub body_min_hangul: f64,
    pub body_max_latin: f64,
}

impl Default for ScriptPolicy {
    fn default() -> Self {
        Self {
            title_min_hangul: 0.7,
            body_min_hangul: 0.8,
            body_max_latin: 0.25,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Body,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Title => f.write_str("title"),
            Field::Body => f.write_str("body"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LanguageIssue {
    ForeignScript { field: Field, script: Script, sample: String },
    ForeignWord { field: Field, word: String },
    LowHangulRatio { field: Field, ratio: f64, required: f64 },
    TooMuchLatin { ratio: f64, allowed: f64 },
    ContainsHangul { field: Field, sample: String },
}

impl fmt::Display for LanguageIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LanguageIssue::ForeignScript { field, script, sample } => {
                write!(f, "{} contains {} characters: {}", field, script.label(), sample)
            }
            LanguageIssue::ForeignWord { field, word } => {
                write!(f, "{} contains a foreign word: {}", field, word)
            }
            LanguageIssue::LowHangulRatio { field, ratio, required } => write!(
                f,
                "{} is not mainly Korean ({:.1}% Hangul, {:.0}% required)",
                field,
                ratio * 100.0,
                required * 100.0
            ),
            LanguageIssue::TooMuchLatin { ratio, allowed } => write!(
                f,
                "body uses too much English ({:.1}% Latin letters, at most {:.0}% allowed)",
                ratio * 100.0,
                allowed * 100.0
            ),
            LanguageIssue::ContainsHangul { field, sample } => {
                write!(f, "{} contains Korean text: {}", field, sample)
            }
        }
    }
}

lazy_static! {
    static ref FOREIGN_WORDS: Vec<Regex> = [
        r"(?i)\binteress?ant\w*",
        r"(?i)\binteresting\w*",
        r"(?i)\bkhá\w*",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect();
}

/// First foreign loanword found in `text`, if any.
pub fn find_foreign_word(text: &str) -> Option<String> {
    FOREIGN_WORDS
        .iter()
        .find_map(|re| re.find(text).map(|m| m.as_str().to_string()))
}

fn sample_of(text: &str, script: Script) -> Option<String> {
    let sample: String = text
        .chars()
        .filter(|c| Script::of(*c) == Some(script))
        .take(5)
        .collect();
    (!sample.is_empty()).then_some(sample)
}

/// Check that a Korean title and body are written in Korean.
///
/// Checks run in a fixed order and the first failure is reported.
pub fn validate_korean(title: &str, body: &str, policy: &ScriptPolicy) -> Result<(), LanguageIssue> {
    for script in [Script::Han, Script::LatinExtended, Script::Kana] {
        for (field, text) in [(Field::Title, title), (Field::Body, body)] {
            if let Some(sample) = sample_of(text, script) {
                return Err(LanguageIssue::ForeignScript { field, script, sample });
            }
        }
    }

    for (field, text) in [(Field::Title, title), (Field::Body, body)] {
        if let Some(word) = find_foreign_word(text) {
            return Err(LanguageIssue::ForeignWord { field, word });
        }
    }

    let title_ratio = script_ratio(title, Script::Hangul);
    if title_ratio < policy.title_min_hangul {
        return Err(LanguageIssue::LowHangulRatio {
            field: Field::Title,
            ratio: title_ratio,
            required: policy.title_min_hangul,
        });
    }

    let stats = ScriptStats::of(body);
    let body_ratio = stats.ratio(Script::Hangul);
    if body_ratio < policy.body_min_hangul {
        return Err(LanguageIssue::LowHangulRatio {
            field: Field::Body,
            ratio: body_ratio,
            required: policy.body_min_hangul,
        });
    }

    let latin = stats.ratio(Script::Latin);
    if latin > policy.body_max_latin {
        return Err(LanguageIssue::TooMuchLatin { ratio: latin, allowed: policy.body_max_latin });
    }

    Ok(())
}

/// Check that an English title and body carry no Hangul.
pub fn validate_english(title: &str, body: &str) -> Result<(), LanguageIssue> {
    for (field, text) in [(Field::Title, title), (Field::Body, body)] {
        if let Some(sample) = sample_of(text, Script::Hangul) {
            return Err(LanguageIssue::ContainsHangul { field, sample });
        }
    }
    Ok(())
}
