//! LaTeX line-comment removal.

/// Returns `line` cut at its first unescaped `%`, trimmed.
///
/// A `%` counts as a comment marker unless the character immediately before
/// it is a backslash. Only the first marker matters.
#[must_use]
pub fn strip_line_comment(line: &str) -> &str {
    let mut previous = None;
    for (index, ch) in line.char_indices() {
        if ch == '%' && previous != Some('\\') {
            return line.get(..index).unwrap_or(line).trim();
        }
        previous = Some(ch);
    }
    line.trim()
}

/// Applies [`strip_line_comment`] to every line of `tex`.
///
/// Each output line is newline-terminated, so line structure (and blank
/// lines) survive.
#[must_use]
pub fn strip_comments(tex: &str) -> String {
    tex.lines()
        .map(strip_line_comment)
        .fold(String::with_capacity(tex.len()), |mut out, line| {
            out.push_str(line);
            out.push('\n');
            out
        })
}
