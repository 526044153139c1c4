//! Search lifecycle coordination: one driver thread walking the tree,
//! a shared match set, and incremental query updates.
//!
//! All shared state lives behind a single mutex. A walker traversal step
//! and an incremental update pass are the two operations that take it,
//! so a file scan is atomic with respect to query changes: a query never
//! changes between the first and last line of one file.

use crate::query::SearchQuery;
use crate::scanner::{LineMatch, LineScanner};
use crate::tree::{CancelToken, PriorityFn, TreeProvider};
use crate::walker::{PriorityWalker, WalkerState};
use parking_lot::{Condvar, Mutex};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Default cap on accumulated results before the walk self-suspends.
pub const DEFAULT_MAX_RESULTS: usize = 200;

/// Filter restricting which files are scanned at all. Files it rejects
/// are still traversed past, just never opened.
pub type PathFilter = Arc<dyn Fn(&Path) -> bool + Send + Sync>;

/// Receiver for match-set change notifications.
///
/// Called with the coordinator's internal lock held, so implementations
/// must not call back into the coordinator.
pub trait SearchRequestor: Send {
    /// A line newly entered the match set.
    fn add(&mut self, item: &LineMatch);
    /// A retained line's match ranges may have changed after a narrowing.
    fn update(&mut self, item: &LineMatch);
    /// A line left the match set after a narrowing.
    fn revoke(&mut self, item: &LineMatch);
    /// The whole match set was discarded.
    fn clear(&mut self);
}

struct Inner {
    walker: PriorityWalker,
    query: SearchQuery,
    matches: HashSet<LineMatch>,
    requestor: Box<dyn SearchRequestor>,
    scanner: LineScanner,
    path_filter: Option<PathFilter>,
    max_results: usize,
    shutdown: bool,
}

struct Shared {
    state: Mutex<Inner>,
    signal: Condvar,
}

/// Drives one search over one tree, reporting matches through a
/// [`SearchRequestor`] as the walk progresses.
pub struct SearchCoordinator {
    shared: Arc<Shared>,
    tree: Arc<dyn TreeProvider>,
    root: PathBuf,
    priority_fn: PriorityFn,
    token: CancelToken,
    driver: Option<JoinHandle<()>>,
}

impl SearchCoordinator {
    /// Start a search for `query` under `root`. The walk begins
    /// immediately on a background thread unless the query is trivial.
    pub fn new(
        tree: Arc<dyn TreeProvider>,
        root: PathBuf,
        priority_fn: PriorityFn,
        query: SearchQuery,
        requestor: Box<dyn SearchRequestor>,
    ) -> Self {
        let mut walker = PriorityWalker::new(tree.clone(), root.clone(), priority_fn.clone());
        if query.is_trivial() {
            walker.stop();
        } else {
            walker.resume();
        }
        let shared = Arc::new(Shared {
            state: Mutex::new(Inner {
                walker,
                query,
                matches: HashSet::new(),
                requestor,
                scanner: LineScanner::default(),
                path_filter: None,
                max_results: DEFAULT_MAX_RESULTS,
                shutdown: false,
            }),
            signal: Condvar::new(),
        });
        let token = CancelToken::new();
        let driver = {
            let shared = shared.clone();
            let tree = tree.clone();
            let token = token.clone();
            std::thread::spawn(move || drive(shared, tree, token))
        };
        Self {
            shared,
            tree,
            root,
            priority_fn,
            token,
            driver: Some(driver),
        }
    }

    /// Switch to a new query.
    ///
    /// When the new query only narrows the previous one (and `force` is
    /// not set) the existing match set is filtered in place: retained
    /// matches are reported through [`SearchRequestor::update`], dropped
    /// ones through [`SearchRequestor::revoke`], and the walk continues
    /// where it left off. Otherwise the match set is cleared and the
    /// walk restarts from the root.
    pub fn set_query(&self, query: SearchQuery, force: bool) {
        let mut guard = self.shared.state.lock();
        if !force && query == guard.query {
            return;
        }
        if !force && query.is_sub_filter_of(&guard.query) {
            tracing::debug!(pattern = query.pattern(), "narrowing query in place");
            guard.query = query;
            let Inner {
                query,
                matches,
                requestor,
                ..
            } = &mut *guard;
            matches.retain(|m| {
                if query.matches(&m.text) {
                    requestor.update(m);
                    true
                } else {
                    requestor.revoke(m);
                    false
                }
            });
            if !guard.walker.is_done() && guard.matches.len() < guard.max_results {
                guard.walker.resume();
                self.shared.signal.notify_all();
            }
        } else {
            tracing::debug!(pattern = query.pattern(), "restarting search");
            guard.query = query;
            self.restart_locked(&mut guard);
        }
    }

    /// Restrict the search to files accepted by `filter`. Always
    /// restarts the walk, since previously rejected files may now be
    /// eligible and vice versa.
    pub fn set_path_filter(&self, filter: Option<PathFilter>) {
        let mut guard = self.shared.state.lock();
        guard.path_filter = filter;
        self.restart_locked(&mut guard);
    }

    /// Raise or lower the result cap. Raising it resumes a walk that
    /// suspended on the old cap.
    pub fn set_max_results(&self, max_results: usize) {
        let mut guard = self.shared.state.lock();
        guard.max_results = max_results;
        if !guard.walker.is_done() && guard.matches.len() < guard.max_results {
            guard.walker.resume();
            self.shared.signal.notify_all();
        }
    }

    /// Raise the cap by ten percent of the current result count (at
    /// least one) and resume a cap-suspended walk.
    pub fn request_more_results(&self) {
        let mut guard = self.shared.state.lock();
        let len = guard.matches.len();
        guard.max_results = guard.max_results.max(len + (len / 10).max(1));
        if !guard.walker.is_done() {
            guard.walker.resume();
            self.shared.signal.notify_all();
        }
    }

    /// Snapshot of the current match set, ordered by file then line.
    pub fn matches(&self) -> Vec<LineMatch> {
        let guard = self.shared.state.lock();
        let mut out: Vec<LineMatch> = guard.matches.iter().cloned().collect();
        out.sort_by(|a, b| a.file.cmp(&b.file).then(a.line_number.cmp(&b.line_number)));
        out
    }

    pub fn result_count(&self) -> usize {
        self.shared.state.lock().matches.len()
    }

    /// True while the walk is still producing results.
    pub fn is_active(&self) -> bool {
        self.shared.state.lock().walker.state() == WalkerState::Running
    }

    /// True once the walk has covered the whole tree (or was stopped).
    pub fn is_done(&self) -> bool {
        self.shared.state.lock().walker.is_done()
    }

    /// Block until the walk is done, suspended on the result cap, or
    /// stopped. Returns immediately if it is not running.
    pub fn wait_until_idle(&self) {
        let mut guard = self.shared.state.lock();
        while guard.walker.state() == WalkerState::Running && !guard.shutdown {
            self.shared.signal.wait(&mut guard);
        }
    }

    /// Abort the current walk. The coordinator stays usable; a later
    /// `set_query` starts a fresh walk.
    pub fn cancel(&self) {
        self.token.cancel();
        self.shared.signal.notify_all();
    }

    fn restart_locked(&self, guard: &mut Inner) {
        if !guard.matches.is_empty() {
            guard.matches.clear();
        }
        guard.requestor.clear();
        guard.walker.stop();
        self.token.reset();
        if !guard.query.is_trivial() {
            guard.walker = PriorityWalker::new(
                self.tree.clone(),
                self.root.clone(),
                self.priority_fn.clone(),
            );
            guard.walker.resume();
            self.shared.signal.notify_all();
        } else {
            self.shared.signal.notify_all();
        }
    }
}

impl Drop for SearchCoordinator {
    fn drop(&mut self) {
        {
            let mut guard = self.shared.state.lock();
            guard.shutdown = true;
            guard.walker.stop();
        }
        self.token.cancel();
        self.shared.signal.notify_all();
        if let Some(driver) = self.driver.take() {
            let _ = driver.join();
        }
    }
}

/// Driver thread body. Holds the lock for each walker step (so one file
/// scan is atomic) and parks on the condvar while there is nothing to do.
fn drive(shared: Arc<Shared>, tree: Arc<dyn TreeProvider>, token: CancelToken) {
    let mut guard = shared.state.lock();
    loop {
        if guard.shutdown {
            return;
        }
        if guard.walker.state() != WalkerState::Running {
            shared.signal.notify_all();
            shared.signal.wait(&mut guard);
            continue;
        }
        if guard.matches.len() >= guard.max_results {
            tracing::debug!(count = guard.matches.len(), "result cap reached, suspending");
            guard.walker.suspend();
            continue;
        }
        let Inner {
            walker,
            query,
            matches,
            requestor,
            scanner,
            path_filter,
            ..
        } = &mut *guard;
        let mut visitor = |file: &Path, _token: &CancelToken| {
            if let Some(filter) = path_filter.as_ref() {
                if !filter(file) {
                    return;
                }
            }
            match tree.open(file) {
                Ok(reader) => scanner.scan(file, reader, query, |m| {
                    if matches.insert(m.clone()) {
                        requestor.add(&m);
                    }
                }),
                Err(err) => {
                    tracing::debug!(file = %file.display(), error = %err, "skipping unreadable file");
                }
            }
        };
        if !walker.step(&mut visitor, &token) {
            shared.signal.notify_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{Event, MemTree, RecordingRequestor};

    fn flat_priority() -> PriorityFn {
        Arc::new(|_: &Path| 1.0)
    }

    fn tree() -> Arc<MemTree> {
        Arc::new(
            MemTree::new()
                .with_file("root/a.txt", "alpha\nbeta\nalphabet\n")
                .with_file("root/b.txt", "nothing here\nalpha again\n"),
        )
    }

    fn start(
        tree: Arc<MemTree>,
        priority_fn: PriorityFn,
        query: SearchQuery,
    ) -> (SearchCoordinator, RecordingRequestor) {
        let requestor = RecordingRequestor::default();
        let coordinator = SearchCoordinator::new(
            tree,
            PathBuf::from("root"),
            priority_fn,
            query,
            Box::new(requestor.clone()),
        );
        (coordinator, requestor)
    }

    #[test]
    fn test_finds_matches_across_files() {
        let query = SearchQuery::new("alpha", false).unwrap();
        let (coordinator, requestor) = start(tree(), flat_priority(), query);
        coordinator.wait_until_idle();

        let matches = coordinator.matches();
        let locations: Vec<(PathBuf, u64)> = matches
            .iter()
            .map(|m| (m.file.clone(), m.line_number))
            .collect();
        assert_eq!(
            locations,
            vec![
                (PathBuf::from("root/a.txt"), 1),
                (PathBuf::from("root/a.txt"), 3),
                (PathBuf::from("root/b.txt"), 2),
            ]
        );
        assert!(coordinator.is_done());
        assert_eq!(requestor.events().len(), 3);
        assert!(requestor
            .events()
            .iter()
            .all(|e| matches!(e, Event::Add(_, _))));
    }

    #[test]
    fn test_priority_orders_file_visits() {
        let tree = Arc::new(
            MemTree::new()
                .with_file("root/cold.txt", "needle\n")
                .with_file("root/hot.txt", "needle\n"),
        );
        let priority: PriorityFn = Arc::new(|p: &Path| {
            if p.ends_with("hot.txt") {
                10.0
            } else {
                1.0
            }
        });
        let query = SearchQuery::new("needle", false).unwrap();
        let (coordinator, requestor) = start(tree, priority, query);
        coordinator.wait_until_idle();

        assert_eq!(
            requestor.events(),
            vec![
                Event::Add(PathBuf::from("root/hot.txt"), 1),
                Event::Add(PathBuf::from("root/cold.txt"), 1),
            ]
        );
    }

    #[test]
    fn test_narrowing_updates_and_revokes_in_place() {
        let query = SearchQuery::new("alpha", false).unwrap();
        let (coordinator, requestor) = start(tree(), flat_priority(), query);
        coordinator.wait_until_idle();
        assert_eq!(coordinator.result_count(), 3);
        let before = requestor.events().len();

        // "alphabet" narrows "alpha": only a.txt line 3 survives.
        coordinator.set_query(SearchQuery::new("alphabet", false).unwrap(), false);
        coordinator.wait_until_idle();

        let matches = coordinator.matches();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].file, PathBuf::from("root/a.txt"));
        assert_eq!(matches[0].line_number, 3);

        let after: Vec<Event> = requestor.events()[before..].to_vec();
        assert!(!after.contains(&Event::Clear));
        assert_eq!(
            after.iter().filter(|e| matches!(e, Event::Revoke(_, _))).count(),
            2
        );
        assert_eq!(
            after.iter().filter(|e| matches!(e, Event::Update(_, _))).count(),
            1
        );
    }

    #[test]
    fn test_widening_clears_and_restarts() {
        let query = SearchQuery::new("alphabet", false).unwrap();
        let (coordinator, requestor) = start(tree(), flat_priority(), query);
        coordinator.wait_until_idle();
        assert_eq!(coordinator.result_count(), 1);

        coordinator.set_query(SearchQuery::new("alpha", false).unwrap(), false);
        coordinator.wait_until_idle();

        assert_eq!(coordinator.result_count(), 3);
        assert!(requestor.events().contains(&Event::Clear));
    }

    #[test]
    fn test_equal_query_is_a_no_op_without_force() {
        let query = SearchQuery::new("alpha", false).unwrap();
        let (coordinator, requestor) = start(tree(), flat_priority(), query);
        coordinator.wait_until_idle();
        let before = requestor.events().len();

        coordinator.set_query(SearchQuery::new("alpha", false).unwrap(), false);
        coordinator.wait_until_idle();
        assert_eq!(requestor.events().len(), before);

        // Forcing the same query restarts from scratch.
        coordinator.set_query(SearchQuery::new("alpha", false).unwrap(), true);
        coordinator.wait_until_idle();
        assert!(requestor.events()[before..].contains(&Event::Clear));
        assert_eq!(coordinator.result_count(), 3);
    }

    #[test]
    fn test_result_cap_suspends_and_more_results_resumes() {
        let mut tree = MemTree::new();
        for i in 0..6 {
            tree = tree.with_file(&format!("root/f{i}.txt"), "needle\n");
        }
        // Start idle so the cap is in place before the walk begins.
        let (coordinator, _requestor) = start(Arc::new(tree), flat_priority(), SearchQuery::trivial());
        coordinator.set_max_results(2);
        coordinator.set_query(SearchQuery::new("needle", false).unwrap(), false);
        coordinator.wait_until_idle();

        assert_eq!(coordinator.result_count(), 2);
        assert!(!coordinator.is_done());
        assert!(!coordinator.is_active());

        coordinator.request_more_results();
        coordinator.wait_until_idle();
        // cap raised to max(2, 2 + max(2/10, 1)) = 3
        assert_eq!(coordinator.result_count(), 3);
        assert!(!coordinator.is_done());

        coordinator.set_max_results(100);
        coordinator.wait_until_idle();
        assert_eq!(coordinator.result_count(), 6);
        assert!(coordinator.is_done());
    }

    #[test]
    fn test_trivial_query_stays_idle() {
        let (coordinator, requestor) = start(tree(), flat_priority(), SearchQuery::trivial());
        coordinator.wait_until_idle();
        assert!(coordinator.is_done());
        assert_eq!(coordinator.result_count(), 0);
        assert!(requestor.events().is_empty());
    }

    #[test]
    fn test_path_filter_restarts_and_restricts() {
        let query = SearchQuery::new("alpha", false).unwrap();
        let (coordinator, requestor) = start(tree(), flat_priority(), query);
        coordinator.wait_until_idle();
        assert_eq!(coordinator.result_count(), 3);

        let filter: PathFilter = Arc::new(|p: &Path| p.ends_with("b.txt"));
        coordinator.set_path_filter(Some(filter));
        coordinator.wait_until_idle();

        assert!(requestor.events().contains(&Event::Clear));
        let matches = coordinator.matches();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].file, PathBuf::from("root/b.txt"));
    }

    #[test]
    fn test_cancel_stops_the_walk() {
        let query = SearchQuery::new("alpha", false).unwrap();
        let (coordinator, _requestor) = start(tree(), flat_priority(), query);
        coordinator.cancel();
        coordinator.wait_until_idle();
        assert!(coordinator.is_done());
    }
}
