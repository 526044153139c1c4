//! File-tree boundary: the tree abstraction, priority function and
//! cancellation token injected into the walker.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Priority sentinel that excludes a resource from traversal entirely.
///
/// Assigned to a directory it short-circuits before enqueueing, so none
/// of the directory's descendants are ever visited.
pub const IGNORE: f64 = f64::NEG_INFINITY;

/// Priority function injected into the walker: higher values are visited
/// first; [`IGNORE`] excludes the resource and its subtree.
pub type PriorityFn = Arc<dyn Fn(&Path) -> f64 + Send + Sync>;

/// Abstraction over an enumerable file tree.
///
/// Lets the walker and coordinator run against the real filesystem or an
/// in-memory tree in tests.
pub trait TreeProvider: Send + Sync {
    fn is_dir(&self, path: &Path) -> bool;

    /// Children of a directory resource.
    fn children(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Open a file resource for reading.
    fn open(&self, path: &Path) -> io::Result<Box<dyn BufRead + Send>>;
}

/// `std::fs`-backed tree provider.
pub struct FsTree;

impl TreeProvider for FsTree {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn children(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut out = Vec::new();
        for entry in std::fs::read_dir(path)? {
            out.push(entry?.path());
        }
        Ok(out)
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn BufRead + Send>> {
        Ok(Box::new(BufReader::new(File::open(path)?)))
    }
}

/// Cooperative cancellation token, polled by the walker at each safe
/// point (once per visited resource, never mid-file).
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Re-arm a cancelled token for a restarted walk.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_fs_tree_lists_and_opens() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("a.txt");
        std::fs::write(&file, "hello\n").expect("write");

        let tree = FsTree;
        assert!(tree.is_dir(dir.path()));
        assert!(!tree.is_dir(&file));
        let children = tree.children(dir.path()).expect("children");
        assert_eq!(children, vec![file.clone()]);

        let mut reader = tree.open(&file).expect("open");
        let mut line = String::new();
        reader.read_line(&mut line).expect("read");
        assert_eq!(line, "hello\n");
    }
}
