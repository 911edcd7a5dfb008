//! Line-level diffing for file snapshots.
//!
//! Lines are aligned with Myers' algorithm (linear space) from `similar`.
//! Between two unchanged anchors the removed lines are emitted before the
//! added ones.

use serde::{Deserialize, Serialize};
use similar::{capture_diff_slices, Algorithm, DiffTag};

/// Status tag of a single line in a diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineTag {
    Unchanged,
    Added,
    Removed,
}

impl LineTag {
    pub fn as_str(self) -> &'static str {
        match self {
            LineTag::Unchanged => "UNCHANGED",
            LineTag::Added => "ADDED",
            LineTag::Removed => "REMOVED",
        }
    }

    /// `true` for lines that belong to the newer snapshot.
    pub fn is_current(self) -> bool {
        !matches!(self, LineTag::Removed)
    }
}

impl std::fmt::Display for LineTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One tagged line of a diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    pub tag: LineTag,
    pub line: String,
}

impl DiffLine {
    fn new(tag: LineTag, line: &str) -> Self {
        Self {
            tag,
            line: line.to_string(),
        }
    }
}

/// Split text into lines.
///
/// Splits on `\n` only; a `\r` before it stays part of the line. A trailing
/// newline does not produce a final empty line, and empty text has no lines.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text.split('\n').collect();
    if lines.last() == Some(&"") {
        lines.pop();
    }
    lines
}

/// Diff `old` against `new`, line by line.
///
/// `Added` + `Unchanged` lines rebuild `new`; `Removed` + `Unchanged` lines
/// rebuild `old`.
pub fn diff_lines(old: &str, new: &str) -> Vec<DiffLine> {
    let a = split_lines(old);
    let b = split_lines(new);

    let mut out = Vec::with_capacity(a.len().max(b.len()));
    let mut removed: Vec<&str> = Vec::new();
    let mut added: Vec<&str> = Vec::new();

    for op in capture_diff_slices(Algorithm::Myers, &a, &b) {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        match tag {
            DiffTag::Equal => {
                push_hunk(&mut out, &mut removed, &mut added);
                out.extend(
                    a[old_range]
                        .iter()
                        .map(|l| DiffLine::new(LineTag::Unchanged, l)),
                );
            }
            DiffTag::Delete => removed.extend_from_slice(&a[old_range]),
            DiffTag::Insert => added.extend_from_slice(&b[new_range]),
            DiffTag::Replace => {
                removed.extend_from_slice(&a[old_range]);
                added.extend_from_slice(&b[new_range]);
            }
        }
    }
    push_hunk(&mut out, &mut removed, &mut added);
    out
}

fn push_hunk(out: &mut Vec<DiffLine>, removed: &mut Vec<&str>, added: &mut Vec<&str>) {
    out.extend(removed.drain(..).map(|l| DiffLine::new(LineTag::Removed, l)));
    out.extend(added.drain(..).map(|l| DiffLine::new(LineTag::Added, l)));
}

/// Lines of the newer side (`Unchanged` + `Added`).
pub fn new_side(diff: &[DiffLine]) -> Vec<&str> {
    diff.iter()
        .filter(|d| d.tag.is_current())
        .map(|d| d.line.as_str())
        .collect()
}

/// Lines of the older side (`Unchanged` + `Removed`).
pub fn old_side(diff: &[DiffLine]) -> Vec<&str> {
    diff.iter()
        .filter(|d| d.tag != LineTag::Added)
        .map(|d| d.line.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(diff: &[DiffLine]) -> Vec<LineTag> {
        diff.iter().map(|d| d.tag).collect()
    }

    #[test]
    fn test_split_lines_drops_single_trailing_newline() {
        assert_eq!(split_lines(""), Vec::<&str>::new());
        assert_eq!(split_lines("a\nb\n"), vec!["a", "b"]);
        assert_eq!(split_lines("a\n\n"), vec!["a", ""]);
        assert_eq!(split_lines("a\r\nb"), vec!["a\r", "b"]);
        assert_eq!(split_lines("\n"), vec![""]);
    }

    #[test]
    fn test_identical_text_is_all_unchanged() {
        let diff = diff_lines("x\ny\nz", "x\ny\nz");
        assert_eq!(tags(&diff), vec![LineTag::Unchanged; 3]);
    }

    #[test]
    fn test_append_line() {
        let diff = diff_lines("a\nb", "a\nb\nc");
        assert_eq!(
            tags(&diff),
            vec![LineTag::Unchanged, LineTag::Unchanged, LineTag::Added]
        );
        assert_eq!(diff[2].line, "c");
    }

    #[test]
    fn test_replacement_emits_removed_before_added() {
        let diff = diff_lines("a\nold1\nold2\nz", "a\nnew1\nz");
        assert_eq!(
            tags(&diff),
            vec![
                LineTag::Unchanged,
                LineTag::Removed,
                LineTag::Removed,
                LineTag::Added,
                LineTag::Unchanged,
            ]
        );
    }

    #[test]
    fn test_edit_script_is_minimal() {
        let diff = diff_lines("a\nb\nc\nd", "b\nc\ne");
        let unchanged = diff.iter().filter(|d| d.tag == LineTag::Unchanged).count();
        assert_eq!(unchanged, 2);
        assert_eq!(diff.len(), 5);
    }

    #[test]
    fn test_empty_sides() {
        assert!(diff_lines("", "").is_empty());
        assert_eq!(tags(&diff_lines("", "a\nb")), vec![LineTag::Added; 2]);
        assert_eq!(tags(&diff_lines("a\nb", "")), vec![LineTag::Removed; 2]);
    }

    #[test]
    fn test_crlf_to_lf_rewrite_is_a_change() {
        let diff = diff_lines("a\r\nb", "a\nb");
        assert_eq!(
            tags(&diff),
            vec![LineTag::Removed, LineTag::Added, LineTag::Unchanged]
        );
        assert_eq!(new_side(&diff).join("\n"), "a\nb");
        assert_eq!(old_side(&diff).join("\n"), "a\r\nb");
    }

    #[test]
    fn test_sparse_edits_in_large_file() {
        let old: Vec<String> = (0..20_000).map(|i| format!("line {i}")).collect();
        let mut new = old.clone();
        new[0] = "first".to_string();
        new[10_000] = "middle".to_string();
        new[19_999] = "last".to_string();

        let diff = diff_lines(&old.join("\n"), &new.join("\n"));
        assert_eq!(diff.len(), 20_003);
        let changed = diff.iter().filter(|d| d.tag != LineTag::Unchanged).count();
        assert_eq!(changed, 6);
        assert_eq!(new_side(&diff).join("\n"), new.join("\n"));
    }

    #[test]
    fn test_both_sides_reconstruct() {
        let old = "fn main() {\n    println!(\"hi\");\n}\n";
        let new = "use std::io;\nfn main() {\n    println!(\"hello\");\n}\n";
        let diff = diff_lines(old, new);
        assert_eq!(new_side(&diff), split_lines(new));
        assert_eq!(old_side(&diff), split_lines(old));
    }
}
