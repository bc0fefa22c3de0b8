use crate::utils::find_unquoted;

/// A non-blank physical line with its comment removed and surrounding
/// whitespace trimmed.
#[derive(Debug, PartialEq)]
pub struct SourceLine {
    pub text:   String,
    pub line:   usize,
    /// 1-based column of the first character of `text` in the physical line.
    pub column: usize,
}

/// Splits `text` into the lines the schema parser consumes. Blank and
/// comment-only lines are dropped; line numbers are kept.
pub fn prepare_lines(text: &str) -> Vec<SourceLine> {
    let mut lines = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let without_comment = match find_unquoted(raw, "//") {
            Some(pos) => &raw[..pos],
            None => raw,
        };
        let trimmed_start = without_comment.trim_start_matches([' ', '\t']);
        let trimmed = trimmed_start.trim_end_matches([' ', '\t', '\r']);
        if trimmed.is_empty() {
            continue;
        }
        lines.push(SourceLine {
            text:   trimmed.to_string(),
            line:   index + 1,
            column: without_comment.len() - trimmed_start.len() + 1,
        });
    }
    lines
}

/// Line number reported for errors found at the end of `text`.
pub fn end_of_file_line(text: &str) -> usize {
    text.lines().count().max(1)
}
