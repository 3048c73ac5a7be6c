//! # prepo
//!
//! Filtered, linked views of a photo collection. Your filenames are the
//! database: tags live between underscores, capture dates lead the name, and
//! directories pass their tags on to everything beneath them.
//!
//! # Pipeline
//!
//! One update cycle runs these stages:
//!
//! ```text
//! 1. Scan       ingest dirs  →  photo map        (names → dates + tags)
//! 2. Filter     photo map    →  matching photos  (required / disallowed / expressions)
//! 3. Order      matching     →  ordered list     (any | random)
//! 4. Reconcile  ordered list →  output/photo_N.* (symbolic | hard | test | none)
//! 5. Save       state        →  output/.prepo_cache.json
//! ```
//!
//! The photo map is rebuilt from scratch on every cycle; there is no
//! incremental scan. The cache document persists settings between runs and
//! records what the last scan saw.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`naming`] | Date and `_tag_` extraction from file and directory names |
//! | [`scan`] | Walks ingest directories into the photo map |
//! | [`expr`] | Boolean tag expressions: tokenizer, parser, evaluator |
//! | [`filter`] | Required/disallowed tags plus expressions |
//! | [`link`] | Wipes and recreates the managed `photo_N` links |
//! | [`cache`] | Loads and saves the state document |
//! | [`repo`] | Repository state, validated setters and the update cycle |
//! | [`platform`] | Filesystem primitives behind a trait |
//! | [`types`] | Shared records and settings (`PhotoRecord`, `Order`, `LinkType`) |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Expressions Are Parsed, Never Executed
//!
//! Filter expressions are user text. They are compiled once, when added, into
//! a small tree of tag tests and `&`/`|`/`!` nodes, and that tree is
//! interpreted per photo. A malformed expression is rejected at the setter
//! instead of surfacing halfway through an update.
//!
//! ## Wipe, Then Link
//!
//! Reconciliation removes every `photo_N` entry before creating any new one.
//! Diffing old against new would save a few syscalls but makes renumbering
//! after a filter change collide with stale names.
//!
//! ## Never Clobber an Unreadable Cache
//!
//! A cache document that fails to load could be a hand edit with a typo.
//! The repository keeps working from defaults but refuses to save until the
//! error is dismissed (`--force` on the CLI).

pub mod cache;
pub mod expr;
pub mod filter;
pub mod link;
pub mod naming;
pub mod output;
pub mod platform;
pub mod repo;
pub mod scan;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
