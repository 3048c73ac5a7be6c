//! Link reconciliation: materializes the filtered photo list in the output
//! directory.
//!
//! Managed links are named by position, keeping the source extension:
//!
//! ```text
//! output/
//! ├── .prepo_cache.json
//! ├── photo_0.jpg  → /photos/2020 _noah_/_beach_/2020-07-01_sunset_.jpg
//! ├── photo_1.JPG  → /photos/100_1213 _baby nipples_.JPG
//! └── photo_2.png  → /photos/scans/_noah_ _park_.png
//! ```
//!
//! Every reconciliation first removes *all* existing `photo_<n>` entries and
//! only then creates the new set, so shrinking or reordering never collides
//! with a stale name. Nothing is rolled back on failure: old links removed
//! before the error stay removed and new links created before it stay.

use crate::platform::Platform;
use crate::types::LinkType;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

const LINK_PREFIX: &str = "photo_";

/// Source photo → link path, for the most recent reconciliation.
pub type LinkMap = BTreeMap<PathBuf, PathBuf>;

#[derive(Error, Debug)]
pub enum LinkError {
    #[error("cannot list output directory {path}: {source}")]
    List { path: PathBuf, source: io::Error },
    #[error("cannot remove old link {path}: {source}")]
    Remove { path: PathBuf, source: io::Error },
    #[error("cannot link {} → {}: {source}", .original.display(), .link.display())]
    Create {
        original: PathBuf,
        link: PathBuf,
        source: io::Error,
    },
}

/// Link file name for the photo at `index`: `photo_<index><.ext>`.
pub fn link_name(index: usize, source: &Path) -> String {
    match source.extension() {
        Some(ext) => format!("{LINK_PREFIX}{index}.{}", ext.to_string_lossy()),
        None => format!("{LINK_PREFIX}{index}"),
    }
}

/// Position encoded in a managed link name, or `None` for any other name.
///
/// - `photo_12.jpg` → Some(12)
/// - `photo_3` → Some(3)
/// - `photo_.jpg`, `photo_x.jpg`, `photos.txt` → None
pub fn link_index(name: &str) -> Option<usize> {
    let rest = name.strip_prefix(LINK_PREFIX)?;
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let tail = &rest[digits..];
    if !tail.is_empty() && !tail.starts_with('.') {
        return None;
    }
    rest[..digits].parse().ok()
}

pub fn is_managed_link(name: &str) -> bool {
    link_index(name).is_some()
}

/// Replace all managed links in `output_dir` with links to `sources`, in order.
///
/// The returned map records the intended links for every link type,
/// including `Test` and `None`, which leave the filesystem untouched apart
/// from removing stale links.
pub fn reconcile<P: Platform + ?Sized>(
    platform: &P,
    output_dir: &Path,
    link_type: LinkType,
    sources: &[&Path],
) -> Result<LinkMap, LinkError> {
    let removed = remove_managed_links(platform, output_dir)?;

    let mut links = LinkMap::new();
    for (index, source) in sources.iter().enumerate() {
        let link = output_dir.join(link_name(index, source));
        links.insert(source.to_path_buf(), link.clone());

        let created = match link_type {
            LinkType::Symbolic => platform.symlink(source, &link),
            LinkType::Hard => platform.hard_link(source, &link),
            LinkType::Test | LinkType::None => Ok(()),
        };
        created.map_err(|source_err| LinkError::Create {
            original: source.to_path_buf(),
            link: link.clone(),
            source: source_err,
        })?;
        debug!("{} → {}", link.display(), source.display());
    }

    info!(
        "Reconciled {}: removed {}, linked {} ({})",
        output_dir.display(),
        removed,
        links.len(),
        link_type
    );
    Ok(links)
}

fn remove_managed_links<P: Platform + ?Sized>(
    platform: &P,
    output_dir: &Path,
) -> Result<usize, LinkError> {
    let entries = platform
        .read_dir(output_dir)
        .map_err(|source| LinkError::List {
            path: output_dir.to_path_buf(),
            source,
        })?;

    let mut removed = 0;
    for entry in entries {
        let managed = entry
            .file_name()
            .map(|n| is_managed_link(&n.to_string_lossy()))
            .unwrap_or(false);
        if !managed {
            continue;
        }
        platform
            .remove_link(&entry)
            .map_err(|source| LinkError::Remove {
                path: entry.clone(),
                source,
            })?;
        removed += 1;
    }
    Ok(removed)
}
