//! Shared test utilities for the prepo test suite.
//!
//! Provides fixture builders, lookup helpers that panic with a clear message
//! on a miss, and [`RecordingFs`], a [`Platform`] that records link calls and
//! can inject failures.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = photo_tree(&["2020 _noah_/_beach_/a.jpg", "b.jpg"]);
//! let photos = scan(&LocalFs, &[tmp.path().to_path_buf()], None).unwrap();
//!
//! assert_eq!(tag_list(find_photo(&photos, "a.jpg")), vec!["beach", "noah"]);
//! ```

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tempfile::TempDir;

use crate::link;
use crate::platform::{LocalFs, Platform};
use crate::types::{PhotoMap, PhotoRecord};

// =========================================================================
// Fixture setup
// =========================================================================

/// Create a temp directory holding the given relative file paths.
///
/// Parent directories are created as needed; files hold placeholder bytes
/// (nothing in prepo reads image content).
pub fn photo_tree(files: &[&str]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for rel in files {
        let path = tmp.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, "fake image").unwrap();
    }
    tmp
}

pub fn tag_set(tags: &[&str]) -> BTreeSet<String> {
    tags.iter().map(|t| t.to_string()).collect()
}

// =========================================================================
// Lookups: panic with a clear message on miss
// =========================================================================

/// Find a photo by basename. Panics if not found.
pub fn find_photo<'a>(photos: &'a PhotoMap, basename: &str) -> &'a PhotoRecord {
    photos
        .values()
        .find(|r| r.basename == basename)
        .unwrap_or_else(|| panic!("photo '{basename}' not found. Available: {:?}", basenames(photos)))
}

/// All basenames, sorted.
pub fn basenames(photos: &PhotoMap) -> Vec<&str> {
    let mut names: Vec<&str> = photos.values().map(|r| r.basename.as_str()).collect();
    names.sort_unstable();
    names
}

/// Tags of a record in sorted order.
pub fn tag_list(record: &PhotoRecord) -> Vec<&str> {
    record.tags.iter().map(String::as_str).collect()
}

/// Names of the managed links in `dir`, by link index.
pub fn managed_links(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .filter(|name| link::is_managed_link(name))
        .collect();
    names.sort_by_key(|name| link::link_index(name));
    names
}

// =========================================================================
// Recording platform
// =========================================================================

/// Listing and metadata come from the real filesystem; removals and link
/// creations are only recorded, optionally failing at a chosen point.
#[derive(Default)]
pub struct RecordingFs {
    /// Fail the link creation with this zero-based index.
    fail_link_at: Option<usize>,
    fail_remove: bool,
    removed: RefCell<Vec<PathBuf>>,
    linked: RefCell<Vec<PathBuf>>,
}

impl RecordingFs {
    pub fn failing_link(index: usize) -> Self {
        Self {
            fail_link_at: Some(index),
            ..Self::default()
        }
    }

    pub fn failing_remove() -> Self {
        Self {
            fail_remove: true,
            ..Self::default()
        }
    }

    pub fn removed(&self) -> Vec<PathBuf> {
        self.removed.borrow().clone()
    }

    pub fn linked(&self) -> Vec<PathBuf> {
        self.linked.borrow().clone()
    }

    fn record_link(&self, link: &Path) -> io::Result<()> {
        if self.fail_link_at == Some(self.linked.borrow().len()) {
            return Err(io::Error::other("injected link failure"));
        }
        self.linked.borrow_mut().push(link.to_path_buf());
        Ok(())
    }
}

impl Platform for RecordingFs {
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        LocalFs.read_dir(dir)
    }

    fn is_dir(&self, path: &Path) -> bool {
        LocalFs.is_dir(path)
    }

    fn is_symlink(&self, path: &Path) -> bool {
        LocalFs.is_symlink(path)
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        LocalFs.canonicalize(path)
    }

    fn created(&self, path: &Path) -> io::Result<SystemTime> {
        LocalFs.created(path)
    }

    fn symlink(&self, _original: &Path, link: &Path) -> io::Result<()> {
        self.record_link(link)
    }

    fn hard_link(&self, _original: &Path, link: &Path) -> io::Result<()> {
        self.record_link(link)
    }

    fn remove_link(&self, link: &Path) -> io::Result<()> {
        if self.fail_remove {
            return Err(io::Error::other("injected remove failure"));
        }
        self.removed.borrow_mut().push(link.to_path_buf());
        Ok(())
    }
}
