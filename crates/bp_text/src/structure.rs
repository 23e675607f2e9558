//! Heuristic check that a post has an intro/body/conclusion shape.

use std::fmt;

use crate::footer::is_footer_heading;
use crate::lines::{tokenize, Line};

const INTRO_NAMES: &[&str] = &["서론", "들어가며", "도입", "introduction", "intro"];
const CONCLUSION_NAMES: &[&str] = &[
    "결론",
    "마치며",
    "마무리",
    "conclusion",
    "final thoughts",
    "wrapping up",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructurePolicy {
    pub min_body_headings: usize,
    pub min_blank_lines: usize,
    pub require_conclusion: bool,
    /// Lines longer than this (in characters) count as long.
    pub long_line_chars: usize,
    /// This many long lines in a row is a wall of text.
    pub max_long_run: usize,
}

impl Default for StructurePolicy {
    fn default() -> Self {
        Self {
            min_body_headings: 3,
            min_blank_lines: 8,
            require_conclusion: true,
            long_line_chars: 100,
            max_long_run: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructureIssue {
    TooFewHeadings { found: usize, required: usize },
    MissingConclusion,
    TooFewBlankLines { found: usize, required: usize },
    HeadingWithoutGap { heading: String },
    WallOfText { lines: usize },
}

impl fmt::Display for StructureIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructureIssue::TooFewHeadings { found, required } => write!(
                f,
                "only {} body section headings, at least {} required",
                found, required
            ),
            StructureIssue::MissingConclusion => f.write_str("no conclusion heading"),
            StructureIssue::TooFewBlankLines { found, required } => write!(
                f,
                "only {} blank lines between paragraphs, at least {} required",
                found, required
            ),
            StructureIssue::HeadingWithoutGap { heading } => {
                write!(f, "heading '{}' is not followed by a blank line", heading)
            }
            StructureIssue::WallOfText { lines } => {
                write!(f, "{} long lines in a row without a paragraph break", lines)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureReport {
    pub body_headings: usize,
    pub has_conclusion: bool,
    pub blank_lines: usize,
    pub issues: Vec<StructureIssue>,
}

impl StructureReport {
    pub fn passed(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn reasons(&self) -> Vec<String> {
        self.issues.iter().map(ToString::to_string).collect()
    }
}

fn matches_any(text: &str, names: &[&str]) -> bool {
    let lower = text.to_lowercase();
    names.iter().any(|name| lower.contains(name))
}

pub fn is_conclusion_heading(text: &str) -> bool {
    matches_any(text, CONCLUSION_NAMES)
}

pub fn is_intro_heading(text: &str) -> bool {
    matches_any(text, INTRO_NAMES)
}

pub fn check_structure(markdown: &str, policy: &StructurePolicy) -> StructureReport {
    let lines = tokenize(markdown);
    let mut issues = Vec::new();

    let section_headings: Vec<&str> = lines
        .iter()
        .filter_map(|line| match line {
            Line::Heading { level, text } if *level >= 2 && !is_footer_heading(text) => Some(text.as_str()),
            _ => None,
        })
        .collect();

    let body_headings = section_headings
        .iter()
        .filter(|text| !is_intro_heading(text) && !is_conclusion_heading(text))
        .count();
    let has_conclusion = section_headings.iter().any(|text| is_conclusion_heading(text));
    let blank_lines = lines.iter().filter(|line| line.is_blank()).count();

    if body_headings < policy.min_body_headings {
        issues.push(StructureIssue::TooFewHeadings {
            found: body_headings,
            required: policy.min_body_headings,
        });
    }
    if policy.require_conclusion && !has_conclusion {
        issues.push(StructureIssue::MissingConclusion);
    }
    if blank_lines < policy.min_blank_lines {
        issues.push(StructureIssue::TooFewBlankLines {
            found: blank_lines,
            required: policy.min_blank_lines,
        });
    }

    for pair in lines.windows(2) {
        if let (Line::Heading { text, .. }, next) = (&pair[0], &pair[1]) {
            if !next.is_blank() {
                issues.push(StructureIssue::HeadingWithoutGap { heading: text.clone() });
            }
        }
    }

    let mut run = 0;
    let mut longest = 0;
    for line in &lines {
        let long = match line {
            Line::Paragraph(text) | Line::ListItem(text) => {
                text.trim().chars().count() > policy.long_line_chars
            }
            _ => false,
        };
        run = if long { run + 1 } else { 0 };
        longest = longest.max(run);
    }
    if longest >= policy.max_long_run {
        issues.push(StructureIssue::WallOfText { lines: longest });
    }

    StructureReport {
        body_headings,
        has_conclusion,
        blank_lines,
        issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(headings: &[&str], blank_lines: usize) -> String {
        // one blank line after each heading, the rest between paragraphs
        let mut out = String::from("도입 문단입니다.");
        let mut blanks_left = blank_lines;
        for heading in headings {
            out.push_str(&format!("\n## {}", heading));
            if blanks_left > 0 {
                out.push('\n');
                blanks_left -= 1;
            }
            out.push_str("\n내용 문단입니다.");
        }
        while blanks_left > 0 {
            out.push_str("\n\n추가 문단입니다.");
            blanks_left -= 1;
        }
        out
    }

    #[test]
    fn test_sparse_document_fails_with_counts() {
        let doc = document(&["첫째", "결론"], 3);
        let report = check_structure(&doc, &StructurePolicy::default());
        assert_eq!(report.blank_lines, 3);
        assert!(!report.passed());
        assert!(report.issues.contains(&StructureIssue::TooFewHeadings { found: 1, required: 3 }));
        assert!(report.issues.contains(&StructureIssue::TooFewBlankLines { found: 3, required: 8 }));
        let reasons = report.reasons().join("; ");
        assert!(reasons.contains("headings"));
        assert!(reasons.contains("blank lines"));
    }

    #[test]
    fn test_two_plain_headings_three_blanks_fail() {
        let doc = document(&["첫째", "둘째"], 3);
        let report = check_structure(&doc, &StructurePolicy::default());
        assert!(!report.passed());
        assert!(matches!(report.issues[0], StructureIssue::TooFewHeadings { found: 2, .. }));
        assert!(report.issues.iter().any(|i| matches!(i, StructureIssue::TooFewBlankLines { found: 3, .. })));
    }

    #[test]
    fn test_well_formed_document_passes() {
        let doc = document(&["첫째", "둘째", "셋째", "결론"], 10);
        let report = check_structure(&doc, &StructurePolicy::default());
        assert_eq!(report.body_headings, 3);
        assert!(report.has_conclusion);
        assert_eq!(report.blank_lines, 10);
        assert!(report.passed(), "{:?}", report.issues);
    }

    #[test]
    fn test_intro_and_footer_headings_do_not_count() {
        let doc = "## 서론\n\n가\n\n## 하나\n\n나\n\n## 둘\n\n다\n\n## 결론\n\n라\n\n## 참고 출처\n\n- [a](https://a)\n\n## 관련 키워드\n\n`x`";
        let report = check_structure(doc, &StructurePolicy::default());
        assert_eq!(report.body_headings, 2);
    }

    #[test]
    fn test_heading_glued_to_text() {
        let doc = "## 하나\n붙은 문단";
        let report = check_structure(doc, &StructurePolicy::default());
        assert!(report
            .issues
            .contains(&StructureIssue::HeadingWithoutGap { heading: "하나".into() }));
    }

    #[test]
    fn test_stacked_headings_need_a_gap() {
        let doc = "## 서론
### 배경

본문";
        let report = check_structure(doc, &StructurePolicy::default());
        assert!(report
            .issues
            .contains(&StructureIssue::HeadingWithoutGap { heading: "서론".into() }));
        assert!(!report
            .issues
            .contains(&StructureIssue::HeadingWithoutGap { heading: "배경".into() }));
    }

    #[test]
    fn test_wall_of_text() {
        let long = "가".repeat(120);
        let doc = format!("{}\n{}\n{}", long, long, long);
        let report = check_structure(&doc, &StructurePolicy::default());
        assert!(report.issues.contains(&StructureIssue::WallOfText { lines: 3 }));

        let broken = format!("{}\n\n{}\n{}", long, long, long);
        let report = check_structure(&broken, &StructurePolicy::default());
        assert!(!report.issues.iter().any(|i| matches!(i, StructureIssue::WallOfText { .. })));
    }

    #[test]
    fn test_thresholds_are_policy() {
        let doc = document(&["첫째", "결론"], 3);
        let lenient = StructurePolicy {
            min_body_headings: 1,
            min_blank_lines: 2,
            ..StructurePolicy::default()
        };
        assert!(check_structure(&doc, &lenient).passed());
    }
}
