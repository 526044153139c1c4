//! CLI argument parsing using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// sift - apply unified-diff patches and search file trees
#[derive(Parser, Debug)]
#[command(name = "sift")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Show verbose output (debug information)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Output results as JSON lines (for scripting/parsing)
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply a unified-diff patch to files on disk
    Apply {
        /// Patch file to read, or "-" for stdin
        patch: PathBuf,

        /// Directory the patched paths are resolved against
        #[arg(short = 'd', long, default_value = ".")]
        dir: PathBuf,

        /// Allow hunks to match up to this many lines away from their
        /// stated position (default: exact position only)
        #[arg(long)]
        fuzz: Option<usize>,

        /// Report what would change without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Number of leading path components to strip from patch paths
        #[arg(short = 'p', long, default_value_t = 1)]
        strip: usize,
    },

    /// Search for a pattern in a file tree, most relevant files first
    Search {
        /// Pattern to search for; `*` and `?` act as wildcards
        pattern: String,

        /// Root directory to search under
        #[arg(default_value = ".")]
        root: PathBuf,

        /// Match case-sensitively
        #[arg(short = 'c', long)]
        case_sensitive: bool,

        /// Stop after this many results
        #[arg(short = 'm', long)]
        max_results: Option<usize>,

        /// Only search files whose path contains this substring
        #[arg(long)]
        path: Option<String>,
    },
}
