//! Unified diff model, parsing, construction and application.
//!
//! This crate covers the full lifecycle of a line-based patch:
//! parse unified-diff text into file patches, apply them to original
//! content with per-hunk rejection, and build or rework patches
//! programmatically with consistent hunk offsets.
//!
//! # Architecture
//!
//! This is a **domain-layer** crate:
//! - Depends on: external crates only (chrono, similar, thiserror)
//! - Used by: sift (CLI)
//!
//! # Usage
//!
//! ```rust,ignore
//! use sift_patch::{PatchApplier, PatchParser};
//!
//! let set = PatchParser::parse_str(patch_text);
//! let applier = PatchApplier::new();
//! for file_patch in &set.file_patches {
//!     let result = applier.apply(&original, file_patch);
//!     if result.has_rejects() {
//!         // report rejected hunks, keep the applied ones
//!     }
//! }
//! ```

mod applier;
mod builder;
mod error;
mod hunk;
mod parser;

pub use applier::{ApplyOptions, ApplyResult, PatchApplier};
pub use builder::PatchBuilder;
pub use error::{PatchError, Result, SectionError};
pub use hunk::{FilePatch, Hunk, HunkKind, HunkLine, LinePrefix, DATE_UNKNOWN};
pub use parser::{PatchParser, PatchSet};
