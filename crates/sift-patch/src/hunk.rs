//! Hunk and file-patch model types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// Timestamp sentinel for `---`/`+++` headers that carry no date.
pub const DATE_UNKNOWN: DateTime<Utc> = DateTime::UNIX_EPOCH;

/// Prefix of one body line in a unified diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LinePrefix {
    /// Line present in both versions (`' '`)
    Context,
    /// Line added in the new version (`'+'`)
    Add,
    /// Line removed from the old version (`'-'`)
    Remove,
}

impl LinePrefix {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            ' ' => Some(LinePrefix::Context),
            '+' => Some(LinePrefix::Add),
            '-' => Some(LinePrefix::Remove),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            LinePrefix::Context => ' ',
            LinePrefix::Add => '+',
            LinePrefix::Remove => '-',
        }
    }
}

/// One body line of a hunk: its prefix and the text without the prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HunkLine {
    pub prefix: LinePrefix,
    pub text: String,
}

impl HunkLine {
    pub fn new(prefix: LinePrefix, text: impl Into<String>) -> Self {
        Self {
            prefix,
            text: text.into(),
        }
    }

    /// Parse a prefixed diff body line (`" ctx"`, `"+add"`, `"-del"`).
    ///
    /// An empty line is treated as a context line with empty text, which
    /// is how many tools emit blank context lines.
    pub fn from_prefixed(line: &str) -> Option<Self> {
        if line.is_empty() {
            return Some(HunkLine::new(LinePrefix::Context, ""));
        }
        let mut chars = line.chars();
        let prefix = LinePrefix::from_char(chars.next()?)?;
        Some(HunkLine::new(prefix, chars.as_str()))
    }

    /// Render the line back in prefixed diff form.
    pub fn to_prefixed(&self) -> String {
        format!("{}{}", self.prefix.as_char(), self.text)
    }
}

/// Classification of a hunk by the shape of its line array.
///
/// Labeling only; application semantics never consult this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HunkKind {
    Addition,
    Deletion,
    Change,
}

/// One contiguous region of change in a unified diff.
///
/// `old_length` always equals the count of Context+Remove lines and
/// `new_length` the count of Context+Add lines; both are derived from
/// `lines` by the constructor. `new_start` is meaningful only inside a
/// [`FilePatch`], where it is recomputed from the cumulative size delta
/// of all earlier hunks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hunk {
    /// 1-based start line in the old file (0 for insertion at the top)
    pub old_start: usize,
    pub old_length: usize,
    /// 1-based start line in the new file, derived (see type docs)
    pub new_start: usize,
    pub new_length: usize,
    pub lines: Vec<HunkLine>,
    /// Set when the declared `@@` counts disagreed with the counted body
    /// lines. The hunk is still attempted on application.
    pub length_mismatch: bool,
}

impl Hunk {
    /// Build a hunk from its line array, deriving both lengths.
    ///
    /// `new_start` starts out equal to `old_start`; it is recomputed when
    /// the hunk is placed into a file patch.
    pub fn new(old_start: usize, lines: Vec<HunkLine>) -> Self {
        let (old_length, new_length) = Self::count_lengths(&lines);
        Self {
            old_start,
            old_length,
            new_start: old_start,
            new_length,
            lines,
            length_mismatch: false,
        }
    }

    pub(crate) fn count_lengths(lines: &[HunkLine]) -> (usize, usize) {
        let mut old_length = 0;
        let mut new_length = 0;
        for line in lines {
            match line.prefix {
                LinePrefix::Context => {
                    old_length += 1;
                    new_length += 1;
                }
                LinePrefix::Remove => old_length += 1,
                LinePrefix::Add => new_length += 1,
            }
        }
        (old_length, new_length)
    }

    /// Classify the hunk for display purposes.
    ///
    /// Addition: no context, no removals, at least one added line.
    /// Deletion: no context, no additions, at least one removed line.
    /// Everything else (including mixed add+remove) is a Change.
    pub fn kind(&self) -> HunkKind {
        let mut context = 0;
        let mut adds = 0;
        let mut removes = 0;
        for line in &self.lines {
            match line.prefix {
                LinePrefix::Context => context += 1,
                LinePrefix::Add => adds += 1,
                LinePrefix::Remove => removes += 1,
            }
        }
        if context == 0 && removes == 0 && adds > 0 {
            HunkKind::Addition
        } else if context == 0 && adds == 0 && removes > 0 {
            HunkKind::Deletion
        } else {
            HunkKind::Change
        }
    }

    /// Lines the hunk expects to find in the old file (Context+Remove).
    pub fn old_lines(&self) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .filter(|l| matches!(l.prefix, LinePrefix::Context | LinePrefix::Remove))
            .map(|l| l.text.as_str())
    }

    /// Lines the hunk produces in the new file (Context+Add).
    pub fn new_lines(&self) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .filter(|l| matches!(l.prefix, LinePrefix::Context | LinePrefix::Add))
            .map(|l| l.text.as_str())
    }

    /// Net line-count change this hunk causes when applied.
    pub fn size_delta(&self) -> isize {
        self.new_length as isize - self.old_length as isize
    }

    /// Render the hunk in unified-diff form (header plus body).
    pub fn to_unified(&self) -> String {
        let mut out = format!(
            "@@ -{},{} +{},{} @@\n",
            self.old_start, self.old_length, self.new_start, self.new_length
        );
        for line in &self.lines {
            out.push_str(&line.to_prefixed());
            out.push('\n');
        }
        out
    }
}

/// Ordered collection of hunks belonging to one before/after file pair.
///
/// Hunks are kept sorted by `old_start` ascending with every `new_start`
/// consistent with the cumulative size delta of earlier hunks. All
/// construction goes through [`PatchBuilder::create_file_patch`], which
/// enforces both; builder operations return fresh instances rather than
/// mutating shared ones.
///
/// [`PatchBuilder::create_file_patch`]: crate::PatchBuilder::create_file_patch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilePatch {
    pub before_path: PathBuf,
    pub before_date: DateTime<Utc>,
    pub after_path: PathBuf,
    pub after_date: DateTime<Utc>,
    hunks: Vec<Hunk>,
}

impl FilePatch {
    pub(crate) fn from_parts(
        before_path: PathBuf,
        before_date: DateTime<Utc>,
        after_path: PathBuf,
        after_date: DateTime<Utc>,
        hunks: Vec<Hunk>,
    ) -> Self {
        Self {
            before_path,
            before_date,
            after_path,
            after_date,
            hunks,
        }
    }

    /// Hunks in ascending `old_start` order.
    pub fn hunks(&self) -> &[Hunk] {
        &self.hunks
    }
}
