//! In-memory tree provider and recording requestor shared by the walker
//! and coordinator tests.

use crate::coordinator::SearchRequestor;
use crate::scanner::LineMatch;
use crate::tree::TreeProvider;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, BufRead, Cursor};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// In-memory file tree. Directories are implied by file paths.
#[derive(Debug, Default)]
pub struct MemTree {
    dirs: BTreeMap<PathBuf, BTreeSet<PathBuf>>,
    files: BTreeMap<PathBuf, Vec<u8>>,
}

impl MemTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        let path = PathBuf::from(path);
        let mut current = path.clone();
        while let Some(parent) = current.parent() {
            if parent.as_os_str().is_empty() {
                break;
            }
            self.dirs
                .entry(parent.to_path_buf())
                .or_default()
                .insert(current.clone());
            current = parent.to_path_buf();
        }
        self.files.insert(path, content.as_bytes().to_vec());
        self
    }
}

impl TreeProvider for MemTree {
    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.contains_key(path)
    }

    fn children(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        self.dirs
            .get(path)
            .map(|c| c.iter().cloned().collect())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such directory"))
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn BufRead + Send>> {
        self.files
            .get(path)
            .map(|bytes| Box::new(Cursor::new(bytes.clone())) as Box<dyn BufRead + Send>)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
    }
}

/// Requestor notification, as recorded for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Add(PathBuf, u64),
    Update(PathBuf, u64),
    Revoke(PathBuf, u64),
    Clear,
}

/// Requestor that records every notification it receives.
#[derive(Clone, Default)]
pub struct RecordingRequestor(pub Arc<Mutex<Vec<Event>>>);

impl RecordingRequestor {
    pub fn events(&self) -> Vec<Event> {
        self.0.lock().clone()
    }
}

impl SearchRequestor for RecordingRequestor {
    fn add(&mut self, item: &LineMatch) {
        self.0
            .lock()
            .push(Event::Add(item.file.clone(), item.line_number));
    }

    fn update(&mut self, item: &LineMatch) {
        self.0
            .lock()
            .push(Event::Update(item.file.clone(), item.line_number));
    }

    fn revoke(&mut self, item: &LineMatch) {
        self.0
            .lock()
            .push(Event::Revoke(item.file.clone(), item.line_number));
    }

    fn clear(&mut self) {
        self.0.lock().push(Event::Clear);
    }
}
