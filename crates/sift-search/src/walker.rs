//! Priority-ordered tree traversal as a resumable state machine.
//!
//! The walker owns a max-heap of `(priority, path)` entries and performs
//! one unit of work per [`PriorityWalker::step`] call: expanding one
//! directory or visiting one file. The caller supplies the thread and any
//! locking; this keeps the suspension points explicit (exactly one check
//! per visited resource).

use crate::tree::{CancelToken, PriorityFn, TreeProvider, IGNORE};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Lifecycle of a walker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkerState {
    NotStarted,
    Running,
    Suspended,
    /// Terminal: the queue is discarded and the walker cannot be resumed.
    Done,
}

/// Callback receiving each visited file.
pub trait FileVisitor {
    fn visit(&mut self, file: &Path, token: &CancelToken);
}

impl<F: FnMut(&Path, &CancelToken)> FileVisitor for F {
    fn visit(&mut self, file: &Path, token: &CancelToken) {
        self(file, token)
    }
}

/// Heap entry ordered by priority descending.
///
/// Entries with equal priority come off the heap in unspecified order;
/// traversal among equals is non-deterministic and tests must not rely
/// on it.
struct QueueEntry {
    priority: f64,
    path: PathBuf,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.priority.total_cmp(&other.priority) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority.total_cmp(&other.priority)
    }
}

/// Suspendable, priority-ordered traversal of a file tree.
pub struct PriorityWalker {
    tree: Arc<dyn TreeProvider>,
    priority_fn: PriorityFn,
    queue: BinaryHeap<QueueEntry>,
    state: WalkerState,
}

impl PriorityWalker {
    /// Create a walker seeded with `root`. The walker stays in
    /// `NotStarted` until [`resume`](Self::resume) is called.
    ///
    /// A root assigned [`IGNORE`] produces a walker with nothing to do.
    pub fn new(tree: Arc<dyn TreeProvider>, root: PathBuf, priority_fn: PriorityFn) -> Self {
        let mut queue = BinaryHeap::new();
        let priority = priority_fn(&root);
        if priority != IGNORE {
            queue.push(QueueEntry {
                priority,
                path: root,
            });
        }
        Self {
            tree,
            priority_fn,
            queue,
            state: WalkerState::NotStarted,
        }
    }

    pub fn state(&self) -> WalkerState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == WalkerState::Done
    }

    /// Start or continue traversal. No-op once the walker is `Done`.
    pub fn resume(&mut self) {
        match self.state {
            WalkerState::NotStarted | WalkerState::Suspended => {
                self.state = WalkerState::Running;
            }
            WalkerState::Running | WalkerState::Done => {}
        }
    }

    /// Request suspension; honored before the next visited resource.
    pub fn suspend(&mut self) {
        if self.state == WalkerState::Running {
            self.state = WalkerState::Suspended;
        }
    }

    /// Discard the queue and terminate. Irrecoverable: restarting a
    /// traversal requires constructing a new walker.
    pub fn stop(&mut self) {
        self.queue.clear();
        self.state = WalkerState::Done;
    }

    /// Visit one resource: expand one directory or hand one file to the
    /// visitor. Returns `true` while more work remains.
    ///
    /// Cancellation is observed here, once per resource; an observed
    /// token discards the queue and terminates the walker.
    pub fn step(&mut self, visitor: &mut dyn FileVisitor, token: &CancelToken) -> bool {
        if self.state != WalkerState::Running {
            return false;
        }
        if token.is_cancelled() {
            self.stop();
            return false;
        }
        let Some(entry) = self.queue.pop() else {
            self.state = WalkerState::Done;
            return false;
        };

        if self.tree.is_dir(&entry.path) {
            match self.tree.children(&entry.path) {
                Ok(children) => {
                    for child in children {
                        let priority = (self.priority_fn)(&child);
                        if priority == IGNORE {
                            // Excluded before enqueueing: the whole subtree
                            // disappears from the traversal.
                            continue;
                        }
                        self.queue.push(QueueEntry {
                            priority,
                            path: child,
                        });
                    }
                }
                Err(err) => {
                    tracing::debug!(
                        dir = %entry.path.display(),
                        error = %err,
                        "skipping unreadable directory"
                    );
                }
            }
        } else {
            visitor.visit(&entry.path, token);
        }

        if self.queue.is_empty() {
            self.state = WalkerState::Done;
        }
        self.state == WalkerState::Running
    }
}
