//! Program-facing construction of hunks and file patches.
//!
//! All file-patch construction funnels through [`PatchBuilder::create_file_patch`],
//! which owns the one tricky numeric invariant in the engine: every hunk's
//! `new_start` equals its `old_start` plus the cumulative size delta of all
//! hunks sorted before it. Adding or removing hunks anywhere can change every
//! downstream `new_start`, so mutation always rebuilds the whole list.

use crate::hunk::{FilePatch, Hunk, HunkLine, LinePrefix, DATE_UNKNOWN};
use chrono::{DateTime, Utc};
use similar::{ChangeTag, TextDiff};
use std::path::PathBuf;

/// Context radius used when deriving a patch from two texts.
const DIFF_CONTEXT_LINES: usize = 3;

/// Builder for hunks and file patches.
pub struct PatchBuilder;

impl PatchBuilder {
    /// Build a hunk from its line array; lengths are derived from the lines.
    pub fn create_hunk(old_start: usize, lines: Vec<HunkLine>) -> Hunk {
        Hunk::new(old_start, lines)
    }

    /// Assemble a file patch, sorting hunks and recomputing offsets.
    ///
    /// Hunks are stably sorted by `old_start` ascending (equal starts keep
    /// their input order), then a single left-to-right pass assigns
    /// `new_start = old_start + shift` while accumulating
    /// `shift += new_length - old_length`.
    ///
    /// Hunk regions are not validated. For disjoint hunks (the only kind a
    /// diff produces) the accumulated shift can never point before line
    /// zero; for overlapping lists it can, and `new_start` saturates at 0
    /// instead of wrapping.
    pub fn create_file_patch(
        before_path: impl Into<PathBuf>,
        before_date: DateTime<Utc>,
        after_path: impl Into<PathBuf>,
        after_date: DateTime<Utc>,
        mut hunks: Vec<Hunk>,
    ) -> FilePatch {
        hunks.sort_by_key(|h| h.old_start);
        let mut shift: isize = 0;
        for hunk in &mut hunks {
            hunk.new_start = (hunk.old_start as isize + shift).max(0) as usize;
            shift += hunk.size_delta();
        }
        FilePatch::from_parts(
            before_path.into(),
            before_date,
            after_path.into(),
            after_date,
            hunks,
        )
    }

    /// Return a new file patch with `extra` hunks merged in.
    ///
    /// The input patch is left untouched; the combined hunk list is re-sorted
    /// and every offset recomputed.
    pub fn add_hunks(patch: &FilePatch, extra: Vec<Hunk>) -> FilePatch {
        let mut hunks = patch.hunks().to_vec();
        hunks.extend(extra);
        Self::create_file_patch(
            patch.before_path.clone(),
            patch.before_date,
            patch.after_path.clone(),
            patch.after_date,
            hunks,
        )
    }

    /// Return a new file patch without the hunks selected by `remove`.
    pub fn remove_hunks(patch: &FilePatch, mut remove: impl FnMut(&Hunk) -> bool) -> FilePatch {
        let hunks: Vec<Hunk> = patch
            .hunks()
            .iter()
            .filter(|h| !remove(h))
            .cloned()
            .collect();
        Self::create_file_patch(
            patch.before_path.clone(),
            patch.before_date,
            patch.after_path.clone(),
            patch.after_date,
            hunks,
        )
    }

    /// Derive a file patch from two texts via a line diff.
    ///
    /// Adjacent changes closer than the context radius fold into one hunk,
    /// matching what `diff -u` would emit for the same inputs.
    pub fn diff_file_patch(
        before_path: impl Into<PathBuf>,
        after_path: impl Into<PathBuf>,
        old: &str,
        new: &str,
    ) -> FilePatch {
        let diff = TextDiff::from_lines(old, new);
        let mut hunks = Vec::new();
        for group in diff.grouped_ops(DIFF_CONTEXT_LINES) {
            let Some(first) = group.first() else { continue };
            let base = first.old_range().start;
            let mut lines = Vec::new();
            for op in &group {
                for change in diff.iter_changes(op) {
                    let prefix = match change.tag() {
                        ChangeTag::Equal => LinePrefix::Context,
                        ChangeTag::Delete => LinePrefix::Remove,
                        ChangeTag::Insert => LinePrefix::Add,
                    };
                    let text = change.value().trim_end_matches(['\n', '\r']).to_string();
                    lines.push(HunkLine::new(prefix, text));
                }
            }
            let hunk = Hunk::new(Self::hunk_start(base, &lines), lines);
            hunks.push(hunk);
        }
        Self::create_file_patch(before_path, DATE_UNKNOWN, after_path, DATE_UNKNOWN, hunks)
    }

    /// Convert a 0-based group offset to the udiff `old_start` convention:
    /// 1-based for hunks that touch old lines, "insert after line N" (0 at
    /// the top) for pure insertions.
    fn hunk_start(base: usize, lines: &[HunkLine]) -> usize {
        let (old_length, _) = Hunk::count_lengths(lines);
        if old_length == 0 {
            base
        } else {
            base + 1
        }
    }
}
