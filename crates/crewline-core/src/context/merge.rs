//! Line-tagged merging of successive file snapshots.
//!
//! A role's files are never concatenated across turns. Each new snapshot is
//! diffed against the current view of the previous one, so the merged file
//! always describes exactly the latest change.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::diff::{diff_lines, DiffLine, LineTag};
use crate::domain::error::CrewlineError;

/// Parallel `lines` / `status` arrays for one file.
///
/// Both arrays always have the same length; construction goes through
/// [`MergedFile::from_parts`] or a diff.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MergedFileRepr")]
pub struct MergedFile {
    lines: Vec<String>,
    status: Vec<LineTag>,
}

#[derive(Deserialize)]
struct MergedFileRepr {
    lines: Vec<String>,
    status: Vec<LineTag>,
}

impl TryFrom<MergedFileRepr> for MergedFile {
    type Error = CrewlineError;

    fn try_from(repr: MergedFileRepr) -> Result<Self, Self::Error> {
        MergedFile::from_parts(repr.lines, repr.status)
    }
}

/// Line counts of a merged file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineStats {
    pub added: usize,
    pub removed: usize,
    pub unchanged: usize,
}

impl MergedFile {
    /// Checked constructor.
    pub fn from_parts(lines: Vec<String>, status: Vec<LineTag>) -> Result<Self, CrewlineError> {
        if lines.len() != status.len() {
            return Err(CrewlineError::MergeInvariant {
                lines: lines.len(),
                status: status.len(),
            });
        }
        Ok(Self { lines, status })
    }

    pub fn from_diff(diff: Vec<DiffLine>) -> Self {
        let (status, lines) = diff.into_iter().map(|d| (d.tag, d.line)).unzip();
        Self { lines, status }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn status(&self) -> &[LineTag] {
        &self.status
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// `(tag, line)` pairs in diff order.
    pub fn entries(&self) -> impl Iterator<Item = (LineTag, &str)> {
        self.status
            .iter()
            .copied()
            .zip(self.lines.iter().map(String::as_str))
    }

    /// Lines of the latest snapshot (`Unchanged` + `Added`).
    pub fn current_lines(&self) -> Vec<&str> {
        self.entries()
            .filter(|(tag, _)| tag.is_current())
            .map(|(_, line)| line)
            .collect()
    }

    /// Latest snapshot, every line terminated by `\n`.
    pub fn current_content(&self) -> String {
        self.current_lines()
            .into_iter()
            .fold(String::new(), |mut out, line| {
                out.push_str(line);
                out.push('\n');
                out
            })
    }

    pub fn stats(&self) -> LineStats {
        self.status
            .iter()
            .fold(LineStats::default(), |mut stats, tag| {
                match tag {
                    LineTag::Added => stats.added += 1,
                    LineTag::Removed => stats.removed += 1,
                    LineTag::Unchanged => stats.unchanged += 1,
                }
                stats
            })
    }

    /// `true` when the last merge added or removed at least one line.
    pub fn has_changes(&self) -> bool {
        self.status.iter().any(|tag| *tag != LineTag::Unchanged)
    }

    /// `true` when nothing of the file survives in the latest snapshot.
    pub fn is_deleted(&self) -> bool {
        self.status.iter().all(|tag| *tag == LineTag::Removed)
    }
}

/// Fold a new snapshot into the previous merged view of the same file.
///
/// Without a previous view every line is `Added`.
pub fn merge(prev: Option<&MergedFile>, new_content: &str) -> MergedFile {
    let previous = prev.map(MergedFile::current_content).unwrap_or_default();
    MergedFile::from_diff(diff_lines(&previous, new_content))
}

/// Accumulated output of one role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Latest free text, overwritten each turn.
    pub text: String,
    pub files: BTreeMap<String, MergedFile>,
}

impl Artifact {
    /// Current content of every file that still exists.
    pub fn current_files(&self) -> BTreeMap<String, String> {
        self.files
            .iter()
            .filter(|(_, file)| !file.is_deleted())
            .map(|(path, file)| (path.clone(), file.current_content()))
            .collect()
    }
}

/// Merge a role's new text and file map into its previous artifact.
///
/// Every path from either map is merged. Paths missing from `new_files` are
/// diffed against empty content, so they show up as fully `Removed` once and
/// as an empty file on later merges.
pub fn merge_artifact(
    prev: Option<&Artifact>,
    new_text: &str,
    new_files: &BTreeMap<String, String>,
) -> Artifact {
    let mut files = BTreeMap::new();

    if let Some(prev) = prev {
        for (path, prev_file) in &prev.files {
            let content = new_files.get(path).map_or("", String::as_str);
            files.insert(path.clone(), merge(Some(prev_file), content));
        }
    }

    for (path, content) in new_files {
        if !files.contains_key(path) {
            files.insert(path.clone(), merge(None, content));
        }
    }

    Artifact {
        text: new_text.to_string(),
        files,
    }
}
