//! Splitting a theorem's raw content into body text and `\label` key.

use std::sync::LazyLock;

use regex::Regex;

use crate::patterns::literal_regex;

static LABEL: LazyLock<Regex> = LazyLock::new(|| literal_regex(r"\\label\s*\{\s*([^{}]+?)\s*\}"));

/// Removes the first `\label{key}` from `span` and returns the trimmed body
/// with the trimmed key.
///
/// An empty key yields no label. Without a label the whole span, trimmed, is
/// the body.
#[must_use]
pub fn separate_body_and_label(span: &str) -> (String, Option<String>) {
    let label = LABEL
        .captures(span)
        .and_then(|captures| captures.get(1))
        .map(|key| key.as_str().trim().to_owned())
        .filter(|key| !key.is_empty());
    let body = LABEL.replacen(span, 1, "").trim().to_owned();
    (body, label)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::leading("\\label{thm:main} Every $x$ is real.", "Every $x$ is real.", Some("thm:main"))]
    #[case::padded_key("A claim. \\label{ key }", "A claim.", Some("key"))]
    #[case::spaced_command("A \\label  {k} claim.", "A  claim.", Some("k"))]
    #[case::first_only("\\label{a} x \\label{b}", "x \\label{b}", Some("a"))]
    #[case::none("  Plain statement.  ", "Plain statement.", None)]
    fn separates_first_label(
        #[case] span: &str,
        #[case] body: &str,
        #[case] label: Option<&str>,
    ) {
        let (actual_body, actual_label) = separate_body_and_label(span);
        assert_eq!(actual_body, body);
        assert_eq!(actual_label.as_deref(), label);
    }

    proptest! {
        #[test]
        fn unlabelled_bodies_pass_through(body in "[a-zA-Z$ .,]{0,40}") {
            let trimmed = body.trim();
            prop_assert_eq!(
                separate_body_and_label(trimmed),
                (trimmed.to_owned(), None)
            );
        }

        #[test]
        fn appended_labels_are_recovered(
            body in "[a-zA-Z$.,][a-zA-Z$ .,]{0,30}[a-zA-Z$.,]",
            key in "[a-z][a-z:0-9-]{0,12}",
        ) {
            let span = format!("{body}\\label{{{key}}}");
            prop_assert_eq!(separate_body_and_label(&span), (body, Some(key)));
        }
    }
}
