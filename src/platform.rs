//! Filesystem primitives used by the scan and link stages.
//!
//! [`LocalFs`] is the real implementation. The trait exists so tests can
//! inject failures part-way through a reconciliation.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub trait Platform {
    /// Full paths of the entries in `dir`, in listing order.
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    /// Whether `path` is a directory, following symlinks.
    fn is_dir(&self, path: &Path) -> bool;

    /// Whether `path` itself is a symlink.
    fn is_symlink(&self, path: &Path) -> bool;

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;

    /// Creation time of `path`, used when a name carries no date.
    fn created(&self, path: &Path) -> io::Result<SystemTime>;

    fn symlink(&self, original: &Path, link: &Path) -> io::Result<()>;

    fn hard_link(&self, original: &Path, link: &Path) -> io::Result<()>;

    /// Remove a link (or plain file) without following it.
    fn remove_link(&self, link: &Path) -> io::Result<()>;
}

/// The local filesystem via `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl Platform for LocalFs {
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_symlink(&self, path: &Path) -> bool {
        fs::symlink_metadata(path)
            .map(|meta| meta.file_type().is_symlink())
            .unwrap_or(false)
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        fs::canonicalize(path)
    }

    fn created(&self, path: &Path) -> io::Result<SystemTime> {
        let meta = fs::metadata(path)?;
        // Not every filesystem records birth time
        meta.created().or_else(|_| meta.modified())
    }

    #[cfg(unix)]
    fn symlink(&self, original: &Path, link: &Path) -> io::Result<()> {
        std::os::unix::fs::symlink(original, link)
    }

    #[cfg(windows)]
    fn symlink(&self, original: &Path, link: &Path) -> io::Result<()> {
        std::os::windows::fs::symlink_file(original, link)
    }

    fn hard_link(&self, original: &Path, link: &Path) -> io::Result<()> {
        fs::hard_link(original, link)
    }

    fn remove_link(&self, link: &Path) -> io::Result<()> {
        fs::remove_file(link)
    }
}
