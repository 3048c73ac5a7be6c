//! Photo discovery: walks ingest directories and builds the photo map.
//!
//! Every file below an ingest directory becomes a [`PhotoRecord`]. Tags come
//! from the file name and from every directory between the ingest root and
//! the file:
//!
//! ```text
//! /photos/                          # ingest directory (contributes nothing)
//! ├── 2020 _noah_/                  # → noah
//! │   ├── _beach_/                  # → noah, beach
//! │   │   └── 2020-07-01_sunset_.jpg   tags [beach, noah, sunset], 2020-07-01
//! │   └── IMG_0001.jpg                 tags [noah], date from creation time
//! └── .thumbnails/                  # hidden, skipped
//! ```
//!
//! Files whose names carry no date get the local calendar date of their
//! creation time.
//!
//! The walk uses an explicit stack of `(directory, inherited tags)` so deep
//! trees cannot exhaust the call stack. Sibling order follows the directory
//! listing and is not meaningful; the resulting map is ordered by path.
//!
//! Symlinked directories are not descended into, so a link back to an
//! ancestor cannot loop. Symlinked files are scanned like any other file.
//!
//! When the output directory lies inside an ingest directory, its managed
//! `photo_N` links are skipped; they are the previous update's output, not
//! photos.
//!
//! Any directory that cannot be listed aborts the scan. There is no partial
//! result.

use crate::link;
use crate::naming;
use crate::platform::Platform;
use crate::types::{PhotoMap, PhotoRecord};
use chrono::{DateTime, Local};
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("cannot read directory {path}: {source}")]
    ReadDir { path: PathBuf, source: io::Error },
    #[error("cannot read creation time of {path}: {source}")]
    Metadata { path: PathBuf, source: io::Error },
}

/// Scan every ingest directory into a fresh photo map.
///
/// Later directories overwrite entries for the same path. Managed links
/// directly inside `output_dir` are ignored.
pub fn scan<P: Platform + ?Sized>(
    platform: &P,
    ingest_dirs: &[PathBuf],
    output_dir: Option<&Path>,
) -> Result<PhotoMap, ScanError> {
    let mut photos = PhotoMap::new();
    for dir in ingest_dirs {
        let before = photos.len();
        scan_directory(platform, dir, output_dir, &mut photos)?;
        info!(
            "Scanned {}: {} photos",
            dir.display(),
            photos.len() - before
        );
    }
    Ok(photos)
}

fn scan_directory<P: Platform + ?Sized>(
    platform: &P,
    root: &Path,
    output_dir: Option<&Path>,
    photos: &mut PhotoMap,
) -> Result<(), ScanError> {
    let mut stack = vec![(root.to_path_buf(), BTreeSet::new())];

    while let Some((dir, inherited)) = stack.pop() {
        let entries = platform
            .read_dir(&dir)
            .map_err(|source| ScanError::ReadDir {
                path: dir.clone(),
                source,
            })?;

        let in_output_dir = output_dir == Some(dir.as_path());

        for entry in entries {
            let Some(name) = entry.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            if in_output_dir && link::is_managed_link(&name) {
                debug!("Skipping managed link {}", entry.display());
                continue;
            }

            if platform.is_dir(&entry) {
                if platform.is_symlink(&entry) {
                    debug!("Not following symlinked directory {}", entry.display());
                    continue;
                }
                let mut tags = inherited.clone();
                tags.extend(naming::parse_dir_name(&name));
                stack.push((entry, tags));
            } else {
                let record = build_record(platform, &entry, name, &inherited)?;
                debug!(
                    "{} → tags {:?}, date {:?}",
                    entry.display(),
                    record.tags,
                    record.date
                );
                photos.insert(entry, record);
            }
        }
    }

    Ok(())
}

fn build_record<P: Platform + ?Sized>(
    platform: &P,
    path: &Path,
    basename: String,
    inherited: &BTreeSet<String>,
) -> Result<PhotoRecord, ScanError> {
    let parsed = naming::parse_file_name(&basename);

    let date = match parsed.date {
        Some(date) => date,
        None => {
            let created = platform
                .created(path)
                .map_err(|source| ScanError::Metadata {
                    path: path.to_path_buf(),
                    source,
                })?;
            DateTime::<Local>::from(created).date_naive()
        }
    };

    let mut tags = inherited.clone();
    tags.extend(parsed.tags);

    Ok(PhotoRecord {
        tags,
        date: Some(date),
        basename,
    })
}
