pub mod footer;
pub mod lines;
pub mod repair;
pub mod script;
pub mod strip;
pub mod structure;

use bp_core::Language;

pub use footer::{build_footer, ensure_disclaimer, split_footer};
pub use lines::{classify_line, tokenize, Line};
pub use repair::repair_format;
pub use script::{validate_english, validate_korean, LanguageIssue, ScriptPolicy};
pub use strip::{strip_foreign, strip_hangul};
pub use structure::{check_structure, StructurePolicy, StructureReport};

/// Thresholds a generated post has to meet before it may be published.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContentPolicy {
    pub script: ScriptPolicy,
    pub structure: StructurePolicy,
}

/// Remove scripts that do not belong in `language`, then restore the layout.
pub fn clean_text(language: Language, text: &str) -> String {
    let stripped = match language {
        Language::Korean => strip_foreign(text),
        Language::English => strip_hangul(text),
    };
    repair_format(&stripped)
}

pub fn clean_title(language: Language, title: &str) -> String {
    let stripped = match language {
        Language::Korean => strip_foreign(title),
        Language::English => strip_hangul(title),
    };
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Every reason the post body (without footer) fails the policy; empty when it passes.
pub fn content_issues(language: Language, title: &str, body: &str, policy: &ContentPolicy) -> Vec<String> {
    let mut issues = Vec::new();
    let language_check = match language {
        Language::Korean => validate_korean(title, body, &policy.script),
        Language::English => validate_english(title, body),
    };
    if let Err(issue) = language_check {
        issues.push(issue.to_string());
    }
    issues.extend(check_structure(body, &policy.structure).reasons());
    issues
}
