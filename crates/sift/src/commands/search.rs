//! `sift search` - priority-ordered search over a directory tree.
//!
//! Results stream to stdout as the walk finds them, most relevant files
//! first. `.gitignore` entries and well-known junk directories are
//! excluded from traversal entirely.

use anyhow::{bail, Result};
use ignore::gitignore::Gitignore;
use sift_search::{
    FsTree, LineMatch, PathFilter, PriorityFn, SearchCoordinator, SearchQuery, SearchRequestor,
    IGNORE,
};
use std::path::Path;
use std::sync::Arc;

/// Directories never worth traversing, gitignored or not.
const SKIP_DIRS: &[&str] = &[".git", ".hg", ".svn", "target", "node_modules"];

struct PrintRequestor {
    json: bool,
}

impl SearchRequestor for PrintRequestor {
    fn add(&mut self, item: &LineMatch) {
        if self.json {
            if let Ok(line) = serde_json::to_string(item) {
                println!("{line}");
            }
        } else {
            println!("{}:{}: {}", item.file.display(), item.line_number, item.text);
        }
    }

    // One-shot CLI searches never narrow an existing query.
    fn update(&mut self, _item: &LineMatch) {}
    fn revoke(&mut self, _item: &LineMatch) {}
    fn clear(&mut self) {}
}

pub fn run(
    pattern: &str,
    root: &Path,
    case_sensitive: bool,
    max_results: Option<usize>,
    path_contains: Option<&str>,
    json: bool,
) -> Result<i32> {
    let query = SearchQuery::new(pattern, case_sensitive)?;
    if query.is_trivial() {
        bail!("pattern matches every line; give it at least one literal character");
    }

    // Start idle so the cap and path filter are in place before any
    // file is scanned.
    let coordinator = SearchCoordinator::new(
        Arc::new(FsTree),
        root.to_path_buf(),
        default_priority(root),
        SearchQuery::trivial(),
        Box::new(PrintRequestor { json }),
    );
    if let Some(max) = max_results {
        coordinator.set_max_results(max);
    }
    if let Some(fragment) = path_contains {
        let fragment = fragment.to_string();
        let filter: PathFilter =
            Arc::new(move |p: &Path| p.to_string_lossy().contains(&fragment));
        coordinator.set_path_filter(Some(filter));
    }
    coordinator.set_query(query, false);
    coordinator.wait_until_idle();

    if !coordinator.is_done() {
        eprintln!(
            "stopped after {} result(s); raise --max-results to continue",
            coordinator.result_count()
        );
    }
    Ok(0)
}

/// Default traversal priority: skip junk and gitignored paths, visit
/// shallower paths first.
fn default_priority(root: &Path) -> PriorityFn {
    let (gitignore, err) = Gitignore::new(root.join(".gitignore"));
    if let Some(err) = err {
        tracing::debug!(error = %err, "no usable .gitignore, traversing everything");
    }
    Arc::new(move |path: &Path| {
        let is_dir = path.is_dir();
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if is_dir && SKIP_DIRS.contains(&name) {
                return IGNORE;
            }
        }
        if gitignore.matched(path, is_dir).is_ignore() {
            return IGNORE;
        }
        -(path.components().count() as f64)
    })
}
