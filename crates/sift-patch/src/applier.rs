//! Apply file patches to original content with per-hunk rejection.

use crate::hunk::{FilePatch, Hunk};

/// Options controlling hunk matching.
///
/// Exact context matching is the baseline. `fuzz` enables a bounded probe
/// of up to ±N lines around the expected offset, nearest offset first.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyOptions {
    pub fuzz: Option<usize>,
}

/// Applies a [`FilePatch`] to original file content.
///
/// Application is a pure function of its inputs: no shared state, safe to
/// call from any thread.
#[derive(Debug, Default)]
pub struct PatchApplier {
    options: ApplyOptions,
}

impl PatchApplier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ApplyOptions) -> Self {
        Self { options }
    }

    /// Apply every hunk of `patch` to `original`, in ascending `old_start`
    /// order.
    ///
    /// Each hunk is attempted independently; a rejected hunk leaves its
    /// region untouched and never cascades to later hunks. Successfully
    /// applied hunks shift the expected offsets of the hunks after them.
    pub fn apply(&self, original: &str, patch: &FilePatch) -> ApplyResult {
        let had_trailing_newline = original.ends_with('\n');
        let mut content: Vec<String> = original.lines().map(str::to_string).collect();
        let mut shift: isize = 0;
        let mut matched = Vec::new();
        let mut rejected = Vec::new();

        for (idx, hunk) in patch.hunks().iter().enumerate() {
            let old: Vec<&str> = hunk.old_lines().collect();
            let replacement: Vec<String> = hunk.new_lines().map(str::to_string).collect();

            let position = if old.is_empty() {
                // Pure insertion: old_start names the line to insert after
                // (0 inserts at the top).
                Some(
                    (hunk.old_start as isize + shift)
                        .clamp(0, content.len() as isize) as usize,
                )
            } else {
                let expected = hunk.old_start as isize - 1 + shift;
                self.locate(&content, &old, expected)
            };

            match position {
                Some(pos) => {
                    content.splice(pos..pos + old.len(), replacement);
                    shift += hunk.size_delta();
                    matched.push(idx);
                }
                None => {
                    tracing::debug!(
                        old_start = hunk.old_start,
                        old_length = hunk.old_length,
                        "hunk context not found, rejecting"
                    );
                    rejected.push(hunk.clone());
                }
            }
        }

        let patched = if content.is_empty() {
            String::new()
        } else {
            let mut joined = content.join("\n");
            if had_trailing_newline {
                joined.push('\n');
            }
            joined
        };

        ApplyResult {
            original: original.to_string(),
            patched,
            matched,
            rejected,
        }
    }

    /// Find the offset where the hunk's Context+Remove block matches,
    /// starting at `expected` and optionally probing ±fuzz lines around it.
    fn locate(&self, content: &[String], old: &[&str], expected: isize) -> Option<usize> {
        if Self::matches_at(content, old, expected) {
            return Some(expected as usize);
        }
        if let Some(fuzz) = self.options.fuzz {
            for distance in 1..=fuzz as isize {
                for candidate in [expected - distance, expected + distance] {
                    if Self::matches_at(content, old, candidate) {
                        return Some(candidate as usize);
                    }
                }
            }
        }
        None
    }

    fn matches_at(content: &[String], old: &[&str], pos: isize) -> bool {
        if pos < 0 {
            return false;
        }
        let pos = pos as usize;
        let Some(window) = content.get(pos..pos + old.len()) else {
            return false;
        };
        window.iter().map(String::as_str).eq(old.iter().copied())
    }
}

/// Outcome of one [`PatchApplier::apply`] call. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyResult {
    original: String,
    patched: String,
    matched: Vec<usize>,
    rejected: Vec<Hunk>,
}

impl ApplyResult {
    /// The content the patch was applied against.
    pub fn original(&self) -> &str {
        &self.original
    }

    /// The content after applying all matched hunks. Equals the original
    /// when no hunk matched.
    pub fn patched(&self) -> &str {
        &self.patched
    }

    /// Indices (within the file patch) of the hunks that applied.
    pub fn matched(&self) -> &[usize] {
        &self.matched
    }

    /// Hunks whose context could not be found, in attempt order.
    pub fn rejected(&self) -> &[Hunk] {
        &self.rejected
    }

    pub fn has_matches(&self) -> bool {
        !self.matched.is_empty()
    }

    pub fn has_rejects(&self) -> bool {
        !self.rejected.is_empty()
    }

    /// Render the rejected hunks as unified-diff text (`.rej` file content).
    pub fn rejected_unified(&self) -> String {
        self.rejected.iter().map(Hunk::to_unified).collect()
    }
}
