use crate::lines::{tokenize, Line};

fn ends_sentence(text: &str) -> bool {
    matches!(text.trim_end().chars().last(), Some('.' | '!' | '?'))
}

/// Whether layout rules demand an empty line between two adjacent blocks.
fn needs_gap(prev: &Line, next: &Line) -> bool {
    match (prev, next) {
        (Line::Heading { .. }, _) | (_, Line::Heading { .. }) => true,
        (Line::Divider, _) | (_, Line::Divider) => true,
        (Line::ListItem(_), Line::Paragraph(_)) => true,
        (Line::Paragraph(text), Line::Paragraph(_)) => ends_sentence(text),
        _ => false,
    }
}

/// Render a token stream: blank runs collapse to one, required gaps are
/// inserted, leading and trailing blanks are dropped.
pub fn render(lines: &[Line]) -> String {
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut previous: Option<&Line> = None;
    let mut pending_blank = false;

    for line in lines {
        if line.is_blank() {
            pending_blank = previous.is_some();
            continue;
        }
        if let Some(prev) = previous {
            if pending_blank || needs_gap(prev, line) {
                out.push(String::new());
            }
        }
        out.push(line.render());
        previous = Some(line);
        pending_blank = false;
    }

    out.join("\n")
}

/// Restore the paragraph layout of a generated post.
///
/// Headings get an empty line on both sides, list items stay contiguous,
/// finished sentences are separated from the next paragraph. Running the
/// repair on its own output changes nothing.
pub fn repair_format(text: &str) -> String {
    render(&tokenize(text))
}

pub fn blank_line_count(text: &str) -> usize {
    text.split('\n').filter(|line| line.trim().is_empty()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headings_get_gaps() {
        let repaired = repair_format("도입 문장\n## 첫 번째\n내용입니다.\n### 세부\n더 많은 내용");
        assert_eq!(
            repaired,
            "도입 문장\n\n## 첫 번째\n\n내용입니다.\n\n### 세부\n\n더 많은 내용"
        );
    }

    #[test]
    fn test_paragraph_breaks_after_sentences() {
        let repaired = repair_format("첫 문장입니다.\n둘째 문장이에요!\n이어지는 줄\n계속되는 줄");
        assert_eq!(repaired, "첫 문장입니다.\n\n둘째 문장이에요!\n\n이어지는 줄\n계속되는 줄");
    }

    #[test]
    fn test_lists_stay_contiguous() {
        let repaired = repair_format("## 목록\n- 하나\n- 둘\n1. 셋\n정리하면 이렇습니다.");
        assert_eq!(repaired, "## 목록\n\n- 하나\n- 둘\n1. 셋\n\n정리하면 이렇습니다.");
    }

    #[test]
    fn test_blank_runs_collapse_and_edges_trim() {
        let repaired = repair_format("\n\n\n첫 문단\n\n\n\n\n둘째 문단\n\n\n");
        assert_eq!(repaired, "첫 문단\n\n둘째 문단");
    }

    #[test]
    fn test_collapsed_single_line_document() {
        let repaired = repair_format("## 서론\\n처음에는 몰랐어요. ## 본론\\n이제 알겠어요.");
        assert_eq!(repaired, "## 서론\n\n처음에는 몰랐어요.\n\n## 본론\n\n이제 알겠어요.");
    }

    #[test]
    fn test_repair_is_idempotent() {
        let samples = [
            "도입\n## 하나\n내용.\n- a\n- b\n끝.\n---\n각주",
            "## 서론\\n처음에는 몰랐어요. ## 본론\\n이제 알겠어요.\n\n\n\n마무리!",
            "문단 하나\n문단 둘\n\n\n- 항목\n\n- 떨어진 항목\n### 제목\n",
        ];
        for sample in samples {
            let once = repair_format(sample);
            let twice = repair_format(&once);
            assert_eq!(twice, once);
            assert!(blank_line_count(&twice) >= blank_line_count(&once));
        }
    }
}
