//! Shared types: photo records, repository state and its enumerated settings.
//!
//! [`RepoState`] is exactly what gets written to the cache document, so
//! field names here are the document's field names.

use crate::expr::ExprError;
use crate::filter::TagFilter;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Invalid configuration value, raised by the setter that received it.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid link type '{0}' (allowed: h, hard, s, symbolic, t, test, none)")]
    InvalidLinkType(String),
    #[error("invalid order '{0}' (allowed: any, random)")]
    InvalidOrder(String),
    #[error("invalid filter expression \"{expression}\": {source}")]
    Expression {
        expression: String,
        source: ExprError,
    },
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Metadata for one source photo, keyed by its absolute path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRecord {
    /// Directory tags and file tags, lowercase.
    pub tags: BTreeSet<String>,
    /// Capture date. Always set after a scan; `null` in a document is tolerated.
    pub date: Option<NaiveDate>,
    /// File name including extension.
    pub basename: String,
}

/// Path → record, iterated in path order.
pub type PhotoMap = BTreeMap<PathBuf, PhotoRecord>;

/// Order in which matching photos are linked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    /// Photo store order.
    #[default]
    Any,
    /// A fresh shuffle on every update.
    Random,
}

impl Order {
    /// Arrange `items` according to this order.
    pub fn arrange<T>(self, mut items: Vec<T>) -> Vec<T> {
        if self == Order::Random {
            fastrand::Rng::new().shuffle(&mut items);
        }
        items
    }
}

impl FromStr for Order {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "any" => Ok(Order::Any),
            "random" => Ok(Order::Random),
            other => Err(ConfigError::InvalidOrder(other.to_string())),
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Order::Any => f.write_str("any"),
            Order::Random => f.write_str("random"),
        }
    }
}

/// How matching photos are materialized in the output directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    Hard,
    #[default]
    Symbolic,
    /// Compute links without touching the filesystem.
    Test,
    None,
}

impl FromStr for LinkType {
    type Err = ConfigError;

    /// Accepts the short aliases `h`, `s` and `t` as well as the full names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "h" | "hard" => Ok(LinkType::Hard),
            "s" | "symbolic" => Ok(LinkType::Symbolic),
            "t" | "test" => Ok(LinkType::Test),
            "none" => Ok(LinkType::None),
            other => Err(ConfigError::InvalidLinkType(other.to_string())),
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkType::Hard => f.write_str("hard"),
            LinkType::Symbolic => f.write_str("symbolic"),
            LinkType::Test => f.write_str("test"),
            LinkType::None => f.write_str("none"),
        }
    }
}

/// Everything a repository persists.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RepoState {
    /// Unique absolute directories, in registration order.
    pub ingest_dirs: Vec<PathBuf>,
    pub photos: PhotoMap,
    pub filter: TagFilter,
    pub order: Order,
    pub link_type: LinkType,
}
