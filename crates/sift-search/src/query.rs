//! Search queries and the sub-filter relation between them.

use crate::error::Result;
use regex::Regex;
use std::ops::Range;

/// A text query: a pattern with `*`/`?` wildcards and a case mode.
///
/// A pattern with no literal character (empty, or wildcards only, which
/// would accept every line of every file) is trivial: it matches nothing
/// and leaves the search idle.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pattern: String,
    case_sensitive: bool,
    regex: Option<Regex>,
}

impl SearchQuery {
    pub fn new(pattern: &str, case_sensitive: bool) -> Result<Self> {
        let regex = if pattern.chars().all(|c| c == '*' || c == '?') {
            None
        } else {
            let mut source = String::new();
            if !case_sensitive {
                source.push_str("(?i)");
            }
            for c in pattern.chars() {
                match c {
                    '*' => source.push_str(".*"),
                    '?' => source.push('.'),
                    _ => source.push_str(&regex::escape(&c.to_string())),
                }
            }
            Some(Regex::new(&source)?)
        };
        Ok(Self {
            pattern: pattern.to_string(),
            case_sensitive,
            regex,
        })
    }

    /// The trivial query: matches nothing.
    pub fn trivial() -> Self {
        Self {
            pattern: String::new(),
            case_sensitive: false,
            regex: None,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn is_trivial(&self) -> bool {
        self.regex.is_none()
    }

    pub fn matches(&self, line: &str) -> bool {
        self.regex.as_ref().is_some_and(|r| r.is_match(line))
    }

    /// Byte range of the first match in `line`, for highlighting.
    pub fn match_range(&self, line: &str) -> Option<Range<usize>> {
        self.regex.as_ref()?.find(line).map(|m| m.range())
    }

    fn has_wildcards(&self) -> bool {
        self.pattern.contains(['*', '?'])
    }

    /// True exactly when any line matching `self` is guaranteed to have
    /// matched `previous` too, which lets the coordinator narrow the
    /// existing match set instead of re-walking the tree.
    ///
    /// The check is conservative: a wrong `true` would silently drop
    /// matches, a wrong `false` only costs a re-walk. Wildcard patterns
    /// and case modes weaker than the previous query's always answer
    /// `false`.
    pub fn is_sub_filter_of(&self, previous: &SearchQuery) -> bool {
        if self.is_trivial() || previous.is_trivial() {
            return false;
        }
        if self.has_wildcards() || previous.has_wildcards() {
            return false;
        }
        if previous.case_sensitive {
            self.case_sensitive && self.pattern.contains(&previous.pattern)
        } else {
            self.pattern
                .to_lowercase()
                .contains(&previous.pattern.to_lowercase())
        }
    }
}

impl PartialEq for SearchQuery {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern && self.case_sensitive == other.case_sensitive
    }
}

impl Eq for SearchQuery {}
