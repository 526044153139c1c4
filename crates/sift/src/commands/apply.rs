//! `sift apply` - apply a parsed patch set to files on disk.
//!
//! Each file section is applied independently. Hunks that cannot be
//! placed are written to a `<file>.rej` sidecar in unified format, and
//! the process exits non-zero so scripts can react.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use sift_patch::{ApplyOptions, FilePatch, PatchApplier, PatchParser};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
struct FileReport {
    file: PathBuf,
    applied: usize,
    rejected: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    reject_file: Option<PathBuf>,
    dry_run: bool,
}

pub fn run(
    patch: &Path,
    dir: &Path,
    fuzz: Option<usize>,
    dry_run: bool,
    strip: usize,
    json: bool,
) -> Result<i32> {
    let text = read_patch(patch)?;
    let set = PatchParser::parse_str(&text);
    for err in &set.errors {
        tracing::warn!(line = err.line, message = %err.message, "skipping malformed patch section");
    }
    if set.file_patches.is_empty() {
        bail!("no file sections found in {}", patch.display());
    }

    let applier = PatchApplier::with_options(ApplyOptions { fuzz });
    let mut any_rejects = false;

    for file_patch in &set.file_patches {
        let target = resolve_target(dir, file_patch, strip)?;
        let original = fs::read_to_string(&target)
            .with_context(|| format!("reading {}", target.display()))?;
        let result = applier.apply(&original, file_patch);

        if !dry_run && result.has_matches() {
            fs::write(&target, result.patched())
                .with_context(|| format!("writing {}", target.display()))?;
        }

        let mut reject_file = None;
        if result.has_rejects() {
            any_rejects = true;
            if !dry_run {
                let path = reject_path(&target);
                fs::write(&path, result.rejected_unified())
                    .with_context(|| format!("writing {}", path.display()))?;
                reject_file = Some(path);
            }
        }

        let report = FileReport {
            file: target,
            applied: result.matched().len(),
            rejected: result.rejected().len(),
            reject_file,
            dry_run,
        };
        print_report(&report, json);
    }

    Ok(if any_rejects { 1 } else { 0 })
}

fn print_report(report: &FileReport, json: bool) {
    if json {
        if let Ok(line) = serde_json::to_string(report) {
            println!("{line}");
        }
        return;
    }
    let verb = if report.dry_run { "would apply" } else { "applied" };
    let mut line = format!(
        "{}: {verb} {} hunk(s), {} rejected",
        report.file.display(),
        report.applied,
        report.rejected
    );
    if let Some(rej) = &report.reject_file {
        line.push_str(&format!(" (see {})", rej.display()));
    }
    println!("{line}");
}

fn read_patch(patch: &Path) -> Result<String> {
    if patch.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("reading patch from stdin")?;
        return Ok(text);
    }
    fs::read_to_string(patch).with_context(|| format!("reading {}", patch.display()))
}

/// Resolve the on-disk target for one file section.
///
/// Prefers the post-image path so renames land on the new name; falls
/// back to the pre-image path for deletions against `/dev/null`.
fn resolve_target(dir: &Path, file_patch: &FilePatch, strip: usize) -> Result<PathBuf> {
    let raw = if file_patch.after_path.as_os_str() == "/dev/null" {
        &file_patch.before_path
    } else {
        &file_patch.after_path
    };
    let stripped = strip_components(raw, strip);
    if stripped.as_os_str().is_empty() {
        bail!(
            "path {} has fewer than {} component(s) to strip",
            raw.display(),
            strip
        );
    }
    Ok(dir.join(stripped))
}

fn strip_components(path: &Path, strip: usize) -> PathBuf {
    path.components().skip(strip).collect()
}

fn reject_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".rej");
    target.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATCH: &str = "\
--- a/greeting.txt\t2024-01-01 00:00:00 +0000
+++ b/greeting.txt\t2024-01-01 00:00:00 +0000
@@ -1,3 +1,3 @@
 hello
-world
+there
 goodbye
";

    #[test]
    fn test_strip_components() {
        assert_eq!(
            strip_components(Path::new("a/src/lib.rs"), 1),
            PathBuf::from("src/lib.rs")
        );
        assert_eq!(strip_components(Path::new("a/lib.rs"), 2), PathBuf::new());
    }

    #[test]
    fn test_reject_path_appends_suffix() {
        assert_eq!(
            reject_path(Path::new("src/lib.rs")),
            PathBuf::from("src/lib.rs.rej")
        );
    }

    #[test]
    fn test_apply_writes_patched_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("greeting.txt");
        fs::write(&target, "hello\nworld\ngoodbye\n").expect("write target");
        let patch_file = dir.path().join("fix.patch");
        fs::write(&patch_file, PATCH).expect("write patch");

        let code = run(&patch_file, dir.path(), None, false, 1, false).expect("apply");
        assert_eq!(code, 0);
        assert_eq!(
            fs::read_to_string(&target).expect("read back"),
            "hello\nthere\ngoodbye\n"
        );
        assert!(!dir.path().join("greeting.txt.rej").exists());
    }

    #[test]
    fn test_dry_run_leaves_file_untouched() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("greeting.txt");
        fs::write(&target, "hello\nworld\ngoodbye\n").expect("write target");
        let patch_file = dir.path().join("fix.patch");
        fs::write(&patch_file, PATCH).expect("write patch");

        let code = run(&patch_file, dir.path(), None, true, 1, false).expect("apply");
        assert_eq!(code, 0);
        assert_eq!(
            fs::read_to_string(&target).expect("read back"),
            "hello\nworld\ngoodbye\n"
        );
    }

    #[test]
    fn test_mismatched_hunk_writes_reject_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("greeting.txt");
        fs::write(&target, "completely\ndifferent\ncontent\n").expect("write target");
        let patch_file = dir.path().join("fix.patch");
        fs::write(&patch_file, PATCH).expect("write patch");

        let code = run(&patch_file, dir.path(), None, false, 1, false).expect("apply");
        assert_eq!(code, 1);
        let rej = dir.path().join("greeting.txt.rej");
        assert!(rej.exists());
        assert!(fs::read_to_string(&rej).expect("read rej").contains("@@"));
    }
}
