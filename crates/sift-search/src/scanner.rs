//! Line scanning of file content against a query.

use crate::query::SearchQuery;
use serde::Serialize;
use std::hash::{Hash, Hasher};
use std::io::BufRead;
use std::path::{Path, PathBuf};

/// Guard against pathological lines (minified bundles, binary-ish text).
pub const DEFAULT_MAX_LINE_LEN: usize = 1000;

/// One matched line in one file.
///
/// Equality and hashing are defined on `(file, line_number)` only: two
/// matches on the same line are the same match even when the highlighted
/// substring differs. Incremental query narrowing relies on this.
#[derive(Debug, Clone, Serialize)]
pub struct LineMatch {
    pub file: PathBuf,
    /// Line text, truncated to the scanner's line-length cutoff
    pub text: String,
    /// 1-based line number
    pub line_number: u64,
    /// Byte offset of the line start within the file
    pub offset: u64,
}

impl PartialEq for LineMatch {
    fn eq(&self, other: &Self) -> bool {
        self.file == other.file && self.line_number == other.line_number
    }
}

impl Eq for LineMatch {}

impl Hash for LineMatch {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.file.hash(state);
        self.line_number.hash(state);
    }
}

/// Sequential top-to-bottom scanner for one file's content.
///
/// Matches are reported in increasing line-number order. Read errors
/// (encoding, file deleted mid-scan) end the scan of that one file
/// silently; a tree-wide search must not abort on a single bad file.
#[derive(Debug, Clone)]
pub struct LineScanner {
    max_line_len: usize,
}

impl Default for LineScanner {
    fn default() -> Self {
        Self {
            max_line_len: DEFAULT_MAX_LINE_LEN,
        }
    }
}

impl LineScanner {
    pub fn new(max_line_len: usize) -> Self {
        Self { max_line_len }
    }

    /// Scan `reader`, invoking `on_match` for every line matching `query`.
    pub fn scan(
        &self,
        file: &Path,
        mut reader: impl BufRead,
        query: &SearchQuery,
        mut on_match: impl FnMut(LineMatch),
    ) {
        let mut buf = String::new();
        let mut offset: u64 = 0;
        let mut line_number: u64 = 0;
        loop {
            buf.clear();
            match reader.read_line(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    line_number += 1;
                    let line_offset = offset;
                    offset += n as u64;
                    let line = self.clip(buf.trim_end_matches(['\n', '\r']));
                    if query.matches(line) {
                        on_match(LineMatch {
                            file: file.to_path_buf(),
                            text: line.to_string(),
                            line_number,
                            offset: line_offset,
                        });
                    }
                }
                Err(err) => {
                    tracing::debug!(
                        file = %file.display(),
                        line = line_number + 1,
                        error = %err,
                        "stopping scan of unreadable file"
                    );
                    break;
                }
            }
        }
    }

    /// Truncate to at most `max_line_len` characters on a char boundary.
    fn clip<'a>(&self, line: &'a str) -> &'a str {
        if line.len() <= self.max_line_len {
            return line;
        }
        match line.char_indices().nth(self.max_line_len) {
            Some((idx, _)) => &line[..idx],
            None => line,
        }
    }
}
