//! Incremental, priority-ordered text search over a file tree.
//!
//! A [`SearchCoordinator`] owns a set of line matches and a
//! [`PriorityWalker`] that enumerates files in an order chosen by an
//! injected priority function. Query changes either narrow the existing
//! match set in place (when the new query is a sub-filter of the old one)
//! or restart the walk; results flow to the caller through the
//! [`SearchRequestor`] callback interface.
//!
//! # Architecture
//!
//! This is a **domain-layer** crate:
//! - Depends on: external crates only (regex, parking_lot, thiserror)
//! - Used by: sift (CLI)
//!
//! # Usage
//!
//! ```rust,ignore
//! use sift_search::{FsTree, SearchCoordinator, SearchQuery};
//!
//! let query = SearchQuery::new("needle", false)?;
//! let coordinator = SearchCoordinator::new(
//!     Arc::new(FsTree),
//!     root,
//!     priority_fn,
//!     query,
//!     Box::new(requestor),
//! );
//! coordinator.wait_until_idle();
//! ```

mod coordinator;
mod error;
mod query;
mod scanner;
mod tree;
mod walker;

#[cfg(test)]
pub(crate) mod testutil;

pub use coordinator::{PathFilter, SearchCoordinator, SearchRequestor, DEFAULT_MAX_RESULTS};
pub use error::{Result, SearchError};
pub use query::SearchQuery;
pub use scanner::{LineMatch, LineScanner, DEFAULT_MAX_LINE_LEN};
pub use tree::{CancelToken, FsTree, PriorityFn, TreeProvider, IGNORE};
pub use walker::{FileVisitor, PriorityWalker, WalkerState};
