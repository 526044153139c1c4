//! sift - apply unified-diff patches and search file trees from the
//! command line.
//!
//! ```bash
//! # Apply a patch, writing .rej files for hunks that do not fit
//! sift apply fix.patch -d ./checkout
//!
//! # Preview a patch without touching the tree
//! sift apply fix.patch --dry-run
//!
//! # Search a tree, most relevant files first
//! sift search "read_*_config" src/
//! ```

use clap::Parser;

mod args;
mod commands;

use args::{Cli, Command};

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match &cli.command {
        Command::Apply {
            patch,
            dir,
            fuzz,
            dry_run,
            strip,
        } => commands::apply::run(patch, dir, *fuzz, *dry_run, *strip, cli.json),
        Command::Search {
            pattern,
            root,
            case_sensitive,
            max_results,
            path,
        } => commands::search::run(
            pattern,
            root,
            *case_sensitive,
            *max_results,
            path.as_deref(),
            cli.json,
        ),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(2);
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(format!(
                    "sift={level},sift_patch={level},sift_search={level}"
                ))
            }),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
