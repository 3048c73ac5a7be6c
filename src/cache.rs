//! Repository state persistence.
//!
//! The whole [`RepoState`] is stored as pretty-printed JSON in
//! `<output_dir>/.prepo_cache.json`, next to the links it describes:
//!
//! ```json
//! {
//!   "ingest_dirs": ["/photos"],
//!   "photos": {
//!     "/photos/2020 _noah_/a.jpg": {"tags": ["noah"], "date": "2020-07-01", "basename": "a.jpg"}
//!   },
//!   "filter": {"required": ["noah"], "disallowed": [], "bool_expr": ["!blurry"]},
//!   "order": "any",
//!   "link_type": "symbolic"
//! }
//! ```
//!
//! # Loading
//!
//! Loading is an overlay onto defaults. Every field of the document is
//! optional: a field that is present replaces the default, even when it is
//! an empty list. A missing or `null` field keeps the default. Filter fields
//! overlay individually.
//!
//! Stored expressions are compiled while parsing, so a document containing an
//! invalid expression is treated like any other corrupt document.
//!
//! # Saving
//!
//! Saving always writes the complete state. Whether a save is *allowed* is
//! decided by the repository (see [`crate::repo`]): after a failed load it
//! refuses to overwrite the document with defaults.

use crate::expr::BoolExpr;
use crate::types::{LinkType, Order, PhotoMap, RepoState};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the state document within the output directory.
pub const CACHE_FILENAME: &str = ".prepo_cache.json";

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cannot read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("corrupt cache document {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("cannot serialize repository state: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("cannot write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// The cache document as read from disk: every field optional.
#[derive(Debug, Default, Deserialize)]
pub struct CacheDocument {
    pub ingest_dirs: Option<Vec<PathBuf>>,
    pub photos: Option<PhotoMap>,
    pub filter: Option<FilterDocument>,
    pub order: Option<Order>,
    pub link_type: Option<LinkType>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FilterDocument {
    pub required: Option<BTreeSet<String>>,
    pub disallowed: Option<BTreeSet<String>>,
    pub bool_expr: Option<Vec<BoolExpr>>,
}

impl CacheDocument {
    /// Overlay the fields present in this document onto `state`.
    pub fn apply(self, state: &mut RepoState) {
        if let Some(dirs) = self.ingest_dirs {
            state.ingest_dirs.clear();
            for dir in dirs {
                if !state.ingest_dirs.contains(&dir) {
                    state.ingest_dirs.push(dir);
                }
            }
        }
        if let Some(photos) = self.photos {
            state.photos = photos;
        }
        if let Some(filter) = self.filter {
            if let Some(required) = filter.required {
                state.filter.set_required(&required.into_iter().collect::<Vec<_>>());
            }
            if let Some(disallowed) = filter.disallowed {
                state
                    .filter
                    .set_disallowed(&disallowed.into_iter().collect::<Vec<_>>());
            }
            if let Some(exprs) = filter.bool_expr {
                state.filter.replace_bool_expr(exprs);
            }
        }
        if let Some(order) = self.order {
            state.order = order;
        }
        if let Some(link_type) = self.link_type {
            state.link_type = link_type;
        }
    }
}

/// Resolve the cache document path for an output directory.
pub fn cache_path(output_dir: &Path) -> PathBuf {
    output_dir.join(CACHE_FILENAME)
}

/// Read the cache document from the output directory.
///
/// Returns `Ok(None)` if there is no document yet.
pub fn load(output_dir: &Path) -> Result<Option<CacheDocument>, CacheError> {
    let path = cache_path(output_dir);
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path).map_err(|source| CacheError::Read {
        path: path.clone(),
        source,
    })?;
    let document = serde_json::from_str(&content)
        .map_err(|source| CacheError::Parse { path, source })?;
    Ok(Some(document))
}

/// Write the complete state to the output directory.
pub fn save(output_dir: &Path, state: &RepoState) -> Result<(), CacheError> {
    let path = cache_path(output_dir);
    let json = serde_json::to_string_pretty(state)?;
    fs::write(&path, json).map_err(|source| CacheError::Write { path, source })
}
