//! Selection of a paper's compilation entry point.

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, warn};

use super::comments::strip_line_comment;
use super::error::ExtractError;
use super::source_tree::SourceTree;

/// Extensions a main file may carry. Matching is case sensitive.
pub const MAIN_FILE_EXTENSIONS: &[&str] = &["tex", "latex", "ltx", "txt", "TEX", "TeX"];

struct ScoreRule {
    points: i64,
    patterns: &'static [&'static str],
}

/// Ordered scoring rules; a line earns the points of its first matching rule.
const SCORE_RULES: &[ScoreRule] = &[
    ScoreRule {
        points: 4,
        patterns: &["\\begin{document}", "\\end{document}"],
    },
    ScoreRule {
        points: 2,
        patterns: &["\\title", "\\author", "\\maketitle", "\\begin{abstract}"],
    },
    ScoreRule {
        points: 1,
        patterns: &["\\input"],
    },
    ScoreRule {
        points: -8,
        patterns: &[
            "fixme",
            "FIXME",
            "todo",
            "TODO",
            "\\missingfigure",
            "\\XXX",
            "\\xx",
            "\\xxx",
        ],
    },
];

/// Scores one comment-free line.
#[must_use]
pub fn score_line(line: &str) -> i64 {
    SCORE_RULES
        .iter()
        .find(|rule| rule.patterns.iter().any(|pattern| line.contains(pattern)))
        .map_or(0, |rule| rule.points)
}

/// Scores a whole file, stripping comments from each line first.
#[must_use]
pub fn score_text(text: &str) -> i64 {
    text.lines()
        .map(|line| score_line(strip_line_comment(line)))
        .sum()
}

/// Picks the file most likely to be the document's entry point.
///
/// A lone candidate is returned without being read. Otherwise the candidate
/// with the strictly highest [`score_text`] wins, and ties go to the file
/// met first in the tree's order.
///
/// # Errors
///
/// Returns [`ExtractError::Download`] when the tree holds no file with a
/// [`MAIN_FILE_EXTENSIONS`] extension.
pub fn select_main_file(tree: &SourceTree) -> Result<Utf8PathBuf, ExtractError> {
    let candidates: Vec<&Utf8Path> = tree.files_with_extensions(MAIN_FILE_EXTENSIONS).collect();
    match candidates.as_slice() {
        [] => Err(ExtractError::download(
            "paper directory has no potential main files",
        )),
        [only] => {
            debug!(main_file = %only, "single candidate main file");
            Ok(tree.absolute(only))
        }
        _ => {
            let mut best: Option<(&Utf8Path, i64)> = None;
            for candidate in candidates {
                let score = score_candidate(tree, candidate);
                if best.is_none_or(|(_, top)| score > top) {
                    best = Some((candidate, score));
                }
            }
            let (winner, score) = best.ok_or_else(|| {
                ExtractError::download("paper directory has no potential main files")
            })?;
            debug!(main_file = %winner, score, "selected main file");
            Ok(tree.absolute(winner))
        }
    }
}

fn score_candidate(tree: &SourceTree, candidate: &Utf8Path) -> i64 {
    match tree.read_lossy(candidate) {
        Ok(text) => score_text(&text),
        Err(error) => {
            warn!(file = %candidate, %error, "unreadable candidate main file scores as empty");
            0
        }
    }
}
