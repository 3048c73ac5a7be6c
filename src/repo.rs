//! The photo repository: state, setters and the full update cycle.
//!
//! A [`PhotoRepo`] owns one output directory. Opening it loads the cache
//! document from that directory (if any); [`PhotoRepo::update`] then runs
//! the whole pipeline:
//!
//! ```text
//! scan ingest dirs → filter → order → reconcile links → save document
//! ```
//!
//! # Safe to save
//!
//! If the cache document exists but cannot be read or parsed, the repository
//! starts from defaults and remembers the error. Until the caller calls
//! [`PhotoRepo::dismiss_load_error`], [`PhotoRepo::save`] does nothing, so a
//! typo in a hand-edited document never gets replaced by an empty state.
//!
//! # Ownership
//!
//! Nothing here locks the output directory. Two repositories on the same
//! output directory race on both the document and the `photo_*` names.

use crate::cache::{self, CacheError};
use crate::link::{self, LinkError, LinkMap};
use crate::platform::{LocalFs, Platform};
use crate::scan::{self, ScanError};
use crate::types::{ConfigError, LinkType, Order, PhotoRecord, RepoState};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum RepoError {
    #[error("output directory does not exist: {0}")]
    MissingOutputDir(PathBuf),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Link(#[from] LinkError),
    #[error(transparent)]
    Save(#[from] CacheError),
}

/// Outcome of one full update cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateSummary {
    /// Photos found across all ingest directories.
    pub scanned: usize,
    /// Photos that passed the filter (and were linked).
    pub matched: usize,
    /// Whether the cache document was written.
    pub saved: bool,
}

pub struct PhotoRepo<P: Platform = LocalFs> {
    output_dir: PathBuf,
    /// Canonical form, matched against scanned paths.
    canonical_output_dir: PathBuf,
    platform: P,
    state: RepoState,
    links: LinkMap,
    load_error: Option<CacheError>,
}

impl PhotoRepo<LocalFs> {
    /// Open the repository for `output_dir` on the local filesystem.
    pub fn open(output_dir: impl Into<PathBuf>) -> Result<Self, RepoError> {
        Self::with_platform(output_dir, LocalFs)
    }
}

impl<P: Platform> PhotoRepo<P> {
    /// Open the repository for `output_dir`, which must already exist.
    pub fn with_platform(output_dir: impl Into<PathBuf>, platform: P) -> Result<Self, RepoError> {
        let output_dir = output_dir.into();
        if !platform.is_dir(&output_dir) {
            return Err(RepoError::MissingOutputDir(output_dir));
        }
        let canonical_output_dir = platform
            .canonicalize(&output_dir)
            .unwrap_or_else(|_| output_dir.clone());

        let mut state = RepoState::default();
        let load_error = match cache::load(&output_dir) {
            Ok(Some(document)) => {
                document.apply(&mut state);
                info!(
                    "Loaded {}: {} ingest dirs, {} photos",
                    cache::cache_path(&output_dir).display(),
                    state.ingest_dirs.len(),
                    state.photos.len()
                );
                None
            }
            Ok(None) => {
                debug!("No cache document in {}", output_dir.display());
                None
            }
            Err(e) => {
                warn!("{e}; using defaults, saving disabled until the error is dismissed");
                Some(e)
            }
        };

        Ok(Self {
            output_dir,
            canonical_output_dir,
            platform,
            state,
            links: LinkMap::new(),
            load_error,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn state(&self) -> &RepoState {
        &self.state
    }

    /// Links from the most recent reconciliation.
    pub fn links(&self) -> &LinkMap {
        &self.links
    }

    // =========================================================================
    // Cache load error
    // =========================================================================

    pub fn load_error(&self) -> Option<&CacheError> {
        self.load_error.as_ref()
    }

    pub fn is_safe_to_save(&self) -> bool {
        self.load_error.is_none()
    }

    /// Accept that the unreadable document will be overwritten on next save.
    pub fn dismiss_load_error(&mut self) {
        if let Some(e) = self.load_error.take() {
            info!("Dismissed cache load error: {e}");
        }
    }

    // =========================================================================
    // Setters
    // =========================================================================

    /// Register an ingest directory. Returns `false` if it was already known.
    ///
    /// The directory must exist; it is stored canonicalized.
    pub fn add_ingest_dir(&mut self, dir: impl AsRef<Path>) -> Result<bool, ConfigError> {
        let dir = dir.as_ref();
        if !self.platform.is_dir(dir) {
            return Err(ConfigError::NotADirectory(dir.to_path_buf()));
        }
        let dir = self
            .platform
            .canonicalize(dir)
            .map_err(|_| ConfigError::NotADirectory(dir.to_path_buf()))?;
        if self.state.ingest_dirs.contains(&dir) {
            return Ok(false);
        }
        info!("Added ingest dir {}", dir.display());
        self.state.ingest_dirs.push(dir);
        Ok(true)
    }

    /// Unregister an ingest directory. Returns `false` if it was not known.
    pub fn remove_ingest_dir(&mut self, dir: impl AsRef<Path>) -> bool {
        let dir = dir.as_ref();
        let dir = self
            .platform
            .canonicalize(dir)
            .unwrap_or_else(|_| dir.to_path_buf());
        let before = self.state.ingest_dirs.len();
        self.state.ingest_dirs.retain(|d| *d != dir);
        before != self.state.ingest_dirs.len()
    }

    pub fn add_filter<S: AsRef<str>>(
        &mut self,
        required: &[S],
        disallowed: &[S],
        exprs: &[S],
    ) -> Result<(), ConfigError> {
        self.state.filter.add_filter(required, disallowed, exprs)
    }

    pub fn set_required<S: AsRef<str>>(&mut self, tags: &[S]) {
        self.state.filter.set_required(tags);
    }

    pub fn set_disallowed<S: AsRef<str>>(&mut self, tags: &[S]) {
        self.state.filter.set_disallowed(tags);
    }

    pub fn set_bool_expr<S: AsRef<str>>(&mut self, exprs: &[S]) -> Result<(), ConfigError> {
        self.state.filter.set_bool_expr(exprs)
    }

    /// Set the order from its name (`any` or `random`).
    pub fn set_order(&mut self, value: &str) -> Result<(), ConfigError> {
        self.state.order = value.parse::<Order>()?;
        Ok(())
    }

    /// Set the link type from its name or alias (`h`, `s`, `t`, `none`, ...).
    pub fn set_link_type(&mut self, value: &str) -> Result<(), ConfigError> {
        self.state.link_type = value.parse::<LinkType>()?;
        Ok(())
    }

    // =========================================================================
    // Pipeline
    // =========================================================================

    /// Discard all photo records and rescan every ingest directory.
    ///
    /// Links this repository manages are skipped if the output directory is
    /// itself being scanned.
    pub fn rebuild(&mut self) -> Result<usize, RepoError> {
        self.state.photos.clear();
        self.state.photos = scan::scan(
            &self.platform,
            &self.state.ingest_dirs,
            Some(self.canonical_output_dir.as_path()),
        )?;
        Ok(self.state.photos.len())
    }

    /// Photos passing the filter, in photo store order.
    pub fn matching_photos(&self) -> Vec<(&Path, &PhotoRecord)> {
        self.state
            .photos
            .iter()
            .filter(|(_, record)| self.state.filter.matches(&record.tags))
            .map(|(path, record)| (path.as_path(), record))
            .collect()
    }

    /// Matching photos arranged by the configured order.
    pub fn ordered_photos(&self) -> Vec<(&Path, &PhotoRecord)> {
        self.state.order.arrange(self.matching_photos())
    }

    /// Replace the managed links with the current ordered, filtered photos.
    pub fn reconcile(&mut self) -> Result<&LinkMap, RepoError> {
        self.links.clear();
        let links = {
            let sources: Vec<&Path> = self
                .ordered_photos()
                .into_iter()
                .map(|(path, _)| path)
                .collect();
            link::reconcile(
                &self.platform,
                &self.output_dir,
                self.state.link_type,
                &sources,
            )?
        };
        self.links = links;
        Ok(&self.links)
    }

    /// Write the cache document, unless a load error is pending.
    ///
    /// Returns whether the document was written.
    pub fn save(&self) -> Result<bool, RepoError> {
        if let Some(e) = &self.load_error {
            warn!("Not saving: cache failed to load ({e})");
            return Ok(false);
        }
        cache::save(&self.output_dir, &self.state)?;
        info!("Saved {}", cache::cache_path(&self.output_dir).display());
        Ok(true)
    }

    /// Full cycle: rescan, reconcile links, then save if allowed.
    ///
    /// Nothing is saved when any step fails.
    pub fn update(&mut self) -> Result<UpdateSummary, RepoError> {
        let scanned = self.rebuild()?;
        let matched = self.reconcile()?.len();
        let saved = self.save()?;
        info!("Update complete: {scanned} scanned, {matched} linked");
        Ok(UpdateSummary {
            scanned,
            matched,
            saved,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CACHE_FILENAME;
    use crate::test_helpers::*;
    use std::fs;
    use tempfile::TempDir;

    const NONE: &[&str] = &[];

    fn open_with(src: &TempDir, out: &TempDir) -> PhotoRepo {
        let mut repo = PhotoRepo::open(out.path()).unwrap();
        repo.add_ingest_dir(src.path()).unwrap();
        repo
    }

    #[test]
    fn open_requires_existing_output_dir() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("out");
        assert!(matches!(
            PhotoRepo::open(&missing),
            Err(RepoError::MissingOutputDir(p)) if p == missing
        ));
    }

    #[test]
    fn fresh_repo_has_defaults() {
        let out = TempDir::new().unwrap();
        let repo = PhotoRepo::open(out.path()).unwrap();
        assert_eq!(repo.state(), &RepoState::default());
        assert!(repo.is_safe_to_save());
    }

    #[test]
    fn ingest_dirs_are_canonical_and_unique() {
        let src = photo_tree(&["a.jpg"]);
        let out = TempDir::new().unwrap();
        let mut repo = PhotoRepo::open(out.path()).unwrap();

        assert!(repo.add_ingest_dir(src.path()).unwrap());
        assert!(!repo.add_ingest_dir(src.path().join(".")).unwrap());
        assert_eq!(
            repo.state().ingest_dirs,
            vec![fs::canonicalize(src.path()).unwrap()]
        );
    }

    #[test]
    fn missing_ingest_dir_is_rejected_at_registration() {
        let out = TempDir::new().unwrap();
        let mut repo = PhotoRepo::open(out.path()).unwrap();
        let missing = out.path().join("nope");
        assert!(matches!(
            repo.add_ingest_dir(&missing),
            Err(ConfigError::NotADirectory(_))
        ));
        assert!(repo.state().ingest_dirs.is_empty());
    }

    #[test]
    fn remove_ingest_dir() {
        let src = photo_tree(&["a.jpg"]);
        let out = TempDir::new().unwrap();
        let mut repo = open_with(&src, &out);
        assert!(repo.remove_ingest_dir(src.path()));
        assert!(!repo.remove_ingest_dir(src.path()));
        assert!(repo.state().ingest_dirs.is_empty());
    }

    #[test]
    fn invalid_settings_leave_state_unchanged() {
        let out = TempDir::new().unwrap();
        let mut repo = PhotoRepo::open(out.path()).unwrap();
        repo.set_order("random").unwrap();
        repo.set_link_type("h").unwrap();

        assert!(repo.set_order("sorted").is_err());
        assert!(repo.set_link_type("soft").is_err());
        assert!(repo.add_filter(&["x"], NONE, &["a $ b"]).is_err());

        assert_eq!(repo.state().order, Order::Random);
        assert_eq!(repo.state().link_type, LinkType::Hard);
        assert!(repo.state().filter.is_empty());
    }

    #[test]
    fn rebuild_replaces_all_photos() {
        let src = photo_tree(&["a.jpg", "b.jpg"]);
        let out = TempDir::new().unwrap();
        let mut repo = open_with(&src, &out);

        assert_eq!(repo.rebuild().unwrap(), 2);
        fs::remove_file(src.path().join("a.jpg")).unwrap();
        assert_eq!(repo.rebuild().unwrap(), 1);
        assert_eq!(basenames(&repo.state().photos), vec!["b.jpg"]);
    }

    #[test]
    fn matching_photos_apply_filter() {
        let src = photo_tree(&["_noah_/a.jpg", "_noah_/_blurry_ b.jpg", "c.jpg"]);
        let out = TempDir::new().unwrap();
        let mut repo = open_with(&src, &out);
        repo.add_filter(&["noah"], &["blurry"], NONE).unwrap();
        repo.rebuild().unwrap();

        let names: Vec<&str> = repo
            .matching_photos()
            .iter()
            .map(|(_, r)| r.basename.as_str())
            .collect();
        assert_eq!(names, vec!["a.jpg"]);
    }

    #[test]
    fn random_order_is_permutation_of_any() {
        let files: Vec<String> = (0..20).map(|i| format!("{i:02} x_a_.jpg")).collect();
        let refs: Vec<&str> = files.iter().map(String::as_str).collect();
        let src = photo_tree(&refs);
        let out = TempDir::new().unwrap();
        let mut repo = open_with(&src, &out);
        repo.rebuild().unwrap();

        let any: Vec<PathBuf> = repo
            .ordered_photos()
            .iter()
            .map(|(p, _)| p.to_path_buf())
            .collect();
        repo.set_order("random").unwrap();
        let mut random: Vec<PathBuf> = repo
            .ordered_photos()
            .iter()
            .map(|(p, _)| p.to_path_buf())
            .collect();
        random.sort();
        assert_eq!(random, any);
    }

    #[test]
    fn update_links_and_saves() {
        let src = photo_tree(&["_noah_/a.jpg", "_noah_/b.png", "c.jpg"]);
        let out = TempDir::new().unwrap();
        let mut repo = open_with(&src, &out);
        repo.set_link_type("t").unwrap();
        repo.set_required(&["noah"]);

        let summary = repo.update().unwrap();

        assert_eq!(
            summary,
            UpdateSummary {
                scanned: 3,
                matched: 2,
                saved: true
            }
        );
        assert_eq!(repo.links().len(), 2);
        assert!(out.path().join(CACHE_FILENAME).exists());
    }

    #[test]
    fn state_survives_reopen() {
        let src = photo_tree(&["_noah_/a.jpg"]);
        let out = TempDir::new().unwrap();
        let mut repo = open_with(&src, &out);
        repo.add_filter(&["noah"], &["blurry"], &["noah | x"]).unwrap();
        repo.set_order("random").unwrap();
        repo.set_link_type("none").unwrap();
        repo.update().unwrap();

        let reopened = PhotoRepo::open(out.path()).unwrap();
        assert_eq!(reopened.state(), repo.state());
    }

    #[test]
    fn cleared_filter_stays_cleared_after_reopen() {
        let out = TempDir::new().unwrap();
        let mut repo = PhotoRepo::open(out.path()).unwrap();
        repo.add_filter(&["noah"], NONE, &["noah"]).unwrap();
        repo.save().unwrap();

        repo.set_required(NONE);
        repo.set_bool_expr(NONE).unwrap();
        repo.save().unwrap();

        let reopened = PhotoRepo::open(out.path()).unwrap();
        assert!(reopened.state().filter.is_empty());
    }

    #[test]
    fn corrupt_cache_blocks_saves_until_dismissed() {
        let out = TempDir::new().unwrap();
        let cache = out.path().join(CACHE_FILENAME);
        fs::write(&cache, "{ not json").unwrap();

        let mut repo = PhotoRepo::open(out.path()).unwrap();
        assert!(matches!(repo.load_error(), Some(CacheError::Parse { .. })));
        assert_eq!(repo.state(), &RepoState::default());

        repo.set_order("random").unwrap();
        assert!(!repo.save().unwrap());
        assert_eq!(fs::read_to_string(&cache).unwrap(), "{ not json");

        repo.dismiss_load_error();
        assert!(repo.save().unwrap());
        let reopened = PhotoRepo::open(out.path()).unwrap();
        assert_eq!(reopened.state().order, Order::Random);
    }

    #[test]
    fn failed_update_does_not_save() {
        let src = photo_tree(&["a.jpg"]);
        let out = TempDir::new().unwrap();
        let mut repo = open_with(&src, &out);
        repo.set_link_type("t").unwrap();
        repo.update().unwrap();
        let saved = fs::read_to_string(out.path().join(CACHE_FILENAME)).unwrap();

        fs::remove_dir_all(src.path()).unwrap();
        repo.set_order("random").unwrap();
        assert!(matches!(repo.update(), Err(RepoError::Scan(_))));

        assert_eq!(
            fs::read_to_string(out.path().join(CACHE_FILENAME)).unwrap(),
            saved
        );
    }

    #[test]
    fn link_failure_surfaces_as_repo_error() {
        let src = photo_tree(&["a.jpg", "b.jpg"]);
        let out = TempDir::new().unwrap();
        let mut repo = PhotoRepo::with_platform(out.path(), RecordingFs::failing_link(0)).unwrap();
        repo.add_ingest_dir(src.path()).unwrap();

        assert!(matches!(repo.update(), Err(RepoError::Link(_))));
        assert!(repo.links().is_empty());
        assert!(!out.path().join(CACHE_FILENAME).exists());
    }

    #[test]
    fn output_dir_inside_ingest_dir_stays_stable() {
        let root = photo_tree(&["a.jpg", "b.jpg"]);
        let mut repo = PhotoRepo::open(root.path()).unwrap();
        repo.add_ingest_dir(root.path()).unwrap();
        repo.set_link_type("hard").unwrap();

        let counts: Vec<(usize, usize)> = (0..3)
            .map(|_| {
                let s = repo.update().unwrap();
                (s.scanned, s.matched)
            })
            .collect();

        assert_eq!(counts, vec![(2, 2); 3]);
        assert_eq!(managed_links(root.path()), vec!["photo_0.jpg", "photo_1.jpg"]);
    }

    #[cfg(unix)]
    #[test]
    fn directory_symlink_loop_does_not_break_update() {
        let src = photo_tree(&["a.jpg"]);
        std::os::unix::fs::symlink(src.path(), src.path().join("loop")).unwrap();
        let out = TempDir::new().unwrap();
        let mut repo = open_with(&src, &out);
        repo.set_link_type("t").unwrap();

        let summary = repo.update().unwrap();
        assert_eq!(summary.scanned, 1);
    }
}
