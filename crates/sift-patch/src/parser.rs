//! Unified-diff text parser.
//!
//! Accepts a caller-supplied reader; the parser never takes ownership of
//! the underlying stream beyond the duration of the call. File sections
//! are independent: a malformed section is recorded as a [`SectionError`]
//! and parsing continues with the next `---` header.

use crate::builder::PatchBuilder;
use crate::error::{Result, SectionError};
use crate::hunk::{FilePatch, Hunk, HunkLine, LinePrefix, DATE_UNKNOWN};
use chrono::{DateTime, Utc};
use std::io::BufRead;
use std::path::PathBuf;

/// Timestamp format GNU diff writes after the tab in `---`/`+++` headers.
const HEADER_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f %z";

/// Outcome of parsing one patch stream.
#[derive(Debug, Clone, Default)]
pub struct PatchSet {
    /// Successfully parsed file sections, in stream order
    pub file_patches: Vec<FilePatch>,
    /// Sections that failed to parse (the rest of the stream still did)
    pub errors: Vec<SectionError>,
}

/// Parser for unified-diff text.
pub struct PatchParser;

impl PatchParser {
    /// Parse a patch stream into file patches.
    ///
    /// Only an I/O failure from `reader` aborts the parse; malformed
    /// sections land in [`PatchSet::errors`].
    pub fn parse(reader: impl BufRead) -> Result<PatchSet> {
        let mut collected = Vec::new();
        for line in reader.lines() {
            collected.push(line?);
        }
        let refs: Vec<&str> = collected.iter().map(String::as_str).collect();
        Ok(Self::parse_lines(&refs))
    }

    /// Parse in-memory patch text.
    pub fn parse_str(text: &str) -> PatchSet {
        let refs: Vec<&str> = text.lines().collect();
        Self::parse_lines(&refs)
    }

    fn parse_lines(lines: &[&str]) -> PatchSet {
        let mut set = PatchSet::default();
        let mut i = 0;
        while i < lines.len() {
            if lines[i].starts_with("--- ") || lines[i].starts_with("@@ -") {
                match Self::parse_section(lines, &mut i) {
                    Ok(file_patch) => set.file_patches.push(file_patch),
                    Err(err) => {
                        tracing::debug!(line = err.line, message = %err.message, "skipping patch section");
                        set.errors.push(err);
                        Self::skip_to_next_section(lines, &mut i);
                    }
                }
            } else {
                // Preamble and inter-section noise ("diff --git", "Index:", "===") is skipped.
                i += 1;
            }
        }
        set
    }

    /// Parse one file section starting at `lines[*i]` (a `---` header or a
    /// bare `@@` hunk for patches without file headers).
    fn parse_section(lines: &[&str], i: &mut usize) -> std::result::Result<FilePatch, SectionError> {
        let mut before_path = PathBuf::new();
        let mut before_date = DATE_UNKNOWN;
        let mut after_path = PathBuf::new();
        let mut after_date = DATE_UNKNOWN;

        if let Some(rest) = lines[*i].strip_prefix("--- ") {
            (before_path, before_date) = Self::parse_file_header(rest);
            *i += 1;
            match lines.get(*i).and_then(|l| l.strip_prefix("+++ ")) {
                Some(rest) => {
                    (after_path, after_date) = Self::parse_file_header(rest);
                    *i += 1;
                }
                None => {
                    return Err(SectionError {
                        line: *i + 1,
                        message: "expected '+++' header after '---'".to_string(),
                    });
                }
            }
        }

        let mut hunks = Vec::new();
        while lines.get(*i).is_some_and(|l| l.starts_with("@@")) {
            hunks.push(Self::parse_hunk(lines, i)?);
        }
        if hunks.is_empty() {
            return Err(SectionError {
                line: *i + 1,
                message: "file section contains no hunks".to_string(),
            });
        }

        Ok(PatchBuilder::create_file_patch(
            before_path,
            before_date,
            after_path,
            after_date,
            hunks,
        ))
    }

    /// Parse one hunk: `@@` header plus prefixed body lines.
    ///
    /// Body lines are consumed until the declared counts are satisfied or a
    /// non-body line appears. A count the body cannot honor flags the hunk
    /// with `length_mismatch` instead of failing the section; real-world
    /// patches carry slightly wrong counts that should still be attempted.
    fn parse_hunk(lines: &[&str], i: &mut usize) -> std::result::Result<Hunk, SectionError> {
        let header_line = *i + 1;
        let (old_start, old_len, _new_start, new_len) =
            Self::parse_hunk_header(lines[*i]).ok_or_else(|| SectionError {
                line: header_line,
                message: format!("malformed or unterminated hunk header: {:?}", lines[*i]),
            })?;
        *i += 1;

        let mut body = Vec::new();
        let mut counted_old = 0;
        let mut counted_new = 0;
        while *i < lines.len() && (counted_old < old_len || counted_new < new_len) {
            let raw = lines[*i];
            if raw.starts_with('\\') {
                // "\ No newline at end of file" markers are not body lines.
                *i += 1;
                continue;
            }
            // A "---"/"+++" header pair is the next file section, even though
            // both lines scan as Remove/Add body. Stop here and let the
            // length mismatch flag the short hunk.
            if raw.starts_with("--- ")
                && lines.get(*i + 1).is_some_and(|l| l.starts_with("+++ "))
            {
                break;
            }
            let Some(hunk_line) = HunkLine::from_prefixed(raw) else {
                break;
            };
            match hunk_line.prefix {
                LinePrefix::Context => {
                    counted_old += 1;
                    counted_new += 1;
                }
                LinePrefix::Remove => counted_old += 1,
                LinePrefix::Add => counted_new += 1,
            }
            body.push(hunk_line);
            *i += 1;
        }
        if lines.get(*i).is_some_and(|l| l.starts_with('\\')) {
            *i += 1;
        }

        let mut hunk = Hunk::new(old_start, body);
        hunk.length_mismatch = hunk.old_length != old_len || hunk.new_length != new_len;
        Ok(hunk)
    }

    /// Parse `@@ -oldStart[,oldLen] +newStart[,newLen] @@` with optional
    /// trailing context text. Returns `None` when the `@@` terminator is
    /// missing or a number fails to parse.
    fn parse_hunk_header(line: &str) -> Option<(usize, usize, usize, usize)> {
        let rest = line.strip_prefix("@@ -")?;
        let (ranges, _context) = rest.split_once(" @@")?;
        let (old, new) = ranges.split_once(" +")?;
        let (old_start, old_len) = Self::parse_range(old)?;
        let (new_start, new_len) = Self::parse_range(new)?;
        Some((old_start, old_len, new_start, new_len))
    }

    /// Parse `start[,len]`; a missing length defaults to 1 (udiff shorthand).
    fn parse_range(s: &str) -> Option<(usize, usize)> {
        match s.split_once(',') {
            Some((start, len)) => Some((start.parse().ok()?, len.parse().ok()?)),
            None => Some((s.parse().ok()?, 1)),
        }
    }

    /// Parse the remainder of a `---`/`+++` header: path, then an optional
    /// tab-separated timestamp. A missing or unreadable timestamp maps to
    /// [`DATE_UNKNOWN`].
    fn parse_file_header(rest: &str) -> (PathBuf, DateTime<Utc>) {
        match rest.split_once('\t') {
            Some((path, date)) => (PathBuf::from(path), Self::parse_header_date(date)),
            None => (PathBuf::from(rest), DATE_UNKNOWN),
        }
    }

    fn parse_header_date(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_str(s.trim(), HEADER_DATE_FORMAT)
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or(DATE_UNKNOWN)
    }

    fn skip_to_next_section(lines: &[&str], i: &mut usize) {
        *i += 1;
        while *i < lines.len() && !lines[*i].starts_with("--- ") {
            *i += 1;
        }
    }
}
