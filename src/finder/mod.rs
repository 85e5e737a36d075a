pub mod catalog;
pub mod matcher;
pub mod walker;

use crossbeam_channel::{bounded, unbounded, RecvTimeoutError};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::common::config::Config;
use crate::common::errors::{Result, RmappError};
use catalog::{CatalogEntry, PathCatalog, RootKind};
use matcher::{domain_hint, MatchScope, Matcher, TokenRunPolicy};
use walker::{Found, ScanContext, SizeMode};

pub use catalog::UserContext;

/// The application being removed. Immutable for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTarget {
    pub app_name: String,
    /// Reverse-DNS identifier, empty when it could not be resolved
    pub bundle_id: String,
}

impl ScanTarget {
    pub fn new(app_name: impl Into<String>, bundle_id: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            bundle_id: bundle_id.into(),
        }
    }
}

/// A discovered path belonging to the target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    pub path: PathBuf,
    pub is_symlink: bool,
    pub size: u64,
}

/// Tunable discovery heuristics
#[derive(Debug, Clone)]
pub struct FinderOptions {
    pub token_runs: TokenRunPolicy,
    pub prune_domain_dirs: bool,
    pub standard_depth: usize,
    pub preferences_depth: usize,
    pub size_mode: SizeMode,
}

impl Default for FinderOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for FinderOptions {
    fn from(config: &Config) -> Self {
        Self {
            token_runs: config.token_runs,
            prune_domain_dirs: config.prune_domain_dirs,
            standard_depth: config.standard_depth,
            preferences_depth: config.preferences_depth,
            size_mode: config.size_mode,
        }
    }
}

/// Concurrent discovery over a [`PathCatalog`]
#[derive(Debug, Clone, Default)]
pub struct Finder {
    options: FinderOptions,
}

impl Finder {
    pub fn new(options: FinderOptions) -> Self {
        Self { options }
    }

    /// Find every path belonging to `target`.
    ///
    /// One thread traverses each distinct root; all of them send into one
    /// channel. A coordinator thread joins the traversals and then drops the
    /// last sender, which ends the aggregation loop. Results are
    /// de-duplicated by path and returned sorted by path.
    pub fn discover(&self, target: &ScanTarget, catalog: &PathCatalog) -> Result<Vec<MatchRecord>> {
        self.discover_cancellable(target, catalog, &AtomicBool::new(false))
    }

    /// [`Finder::discover`] that stops every traversal once `cancel` is set.
    /// Matches emitted before that point are still returned.
    pub fn discover_cancellable(
        &self,
        target: &ScanTarget,
        catalog: &PathCatalog,
        cancel: &AtomicBool,
    ) -> Result<Vec<MatchRecord>> {
        if target.app_name.trim().is_empty() && target.bundle_id.trim().is_empty() {
            return Err(RmappError::InvalidTarget {
                message: "both the application name and bundle identifier are empty".into(),
            });
        }

        let start = Instant::now();
        let matcher = Matcher::new(&target.app_name, &target.bundle_id, self.options.token_runs);
        let hint = domain_hint(matcher.bundle_id()).to_string();
        let roots = distinct_roots(catalog);
        debug!(
            "Scanning {} roots for '{}' (bundle id '{}', domain hint '{}')",
            roots.len(),
            target.app_name,
            target.bundle_id,
            hint
        );

        let (tx, rx) = unbounded::<Found>();
        let mut found: BTreeMap<PathBuf, bool> = BTreeMap::new();

        thread::scope(|s| {
            let handles: Vec<_> = roots
                .iter()
                .map(|entry| {
                    let tx = tx.clone();
                    let ctx = self.context_for(entry, &matcher, &hint, cancel);
                    s.spawn(move || walker::walk_root(entry, &ctx, &tx))
                })
                .collect();

            let roots = &roots;
            s.spawn(move || {
                for (handle, entry) in handles.into_iter().zip(roots) {
                    match handle.join() {
                        Ok(n) if n > 0 => debug!("{} match(es) under {}", n, entry.path.display()),
                        Ok(_) => {}
                        Err(_) => warn!("Traversal of {} panicked", entry.path.display()),
                    }
                }
                drop(tx);
            });

            for hit in rx.iter() {
                found.entry(hit.path).or_insert(hit.is_symlink);
            }
        });

        let records: Vec<MatchRecord> = found
            .into_iter()
            .map(|(path, is_symlink)| {
                let size = self.options.size_mode.measure(&path);
                MatchRecord { path, is_symlink, size }
            })
            .collect();

        info!(
            "Found {} path(s) for '{}' in {:.2?}",
            records.len(),
            target.app_name,
            start.elapsed()
        );
        Ok(records)
    }

    /// [`Finder::discover`] bounded by a deadline. On timeout the traversals
    /// are cancelled and the partial results are discarded.
    pub fn discover_with_deadline(
        &self,
        target: &ScanTarget,
        catalog: &PathCatalog,
        deadline: Duration,
    ) -> Result<Vec<MatchRecord>> {
        let (done_tx, done_rx) = bounded(1);
        let finder = self.clone();
        let target = target.clone();
        let catalog = catalog.clone();
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancel);

        thread::spawn(move || {
            let _ = done_tx.send(finder.discover_cancellable(&target, &catalog, &flag));
        });

        match done_rx.recv_timeout(deadline) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                cancel.store(true, Ordering::Relaxed);
                Err(RmappError::Timeout {
                    operation: "Discovery",
                    secs: deadline.as_secs(),
                })
            }
            Err(RecvTimeoutError::Disconnected) => Err(RmappError::InvalidTarget {
                message: "discovery thread exited without a result".into(),
            }),
        }
    }

    fn context_for<'m>(
        &self,
        entry: &CatalogEntry,
        matcher: &'m Matcher,
        hint: &str,
        cancel: &'m AtomicBool,
    ) -> ScanContext<'m> {
        let (max_depth, scope) = match entry.kind {
            RootKind::Preferences => (self.options.preferences_depth, MatchScope::Standard),
            RootKind::Receipts => (self.options.standard_depth, MatchScope::Receipts),
            RootKind::Applications | RootKind::Standard => (self.options.standard_depth, MatchScope::Standard),
        };
        ScanContext {
            matcher,
            domain_hint: hint.to_lowercase(),
            max_depth,
            scope,
            prune_domain_dirs: self.options.prune_domain_dirs && entry.kind != RootKind::Preferences,
            cancel,
        }
    }
}

/// Roots with duplicates removed, comparing canonical paths so two aliases
/// of one directory are only traversed once
fn distinct_roots(catalog: &PathCatalog) -> Vec<CatalogEntry> {
    let mut seen = HashSet::new();
    catalog
        .entries()
        .iter()
        .filter(|entry| {
            let key = std::fs::canonicalize(&entry.path).unwrap_or_else(|_| entry.path.clone());
            seen.insert(key)
        })
        .cloned()
        .collect()
}

/// Largest first, for display
pub fn sort_by_size(records: &mut [MatchRecord]) {
    records.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path)));
}

/// Total size of a set of matches
pub fn total_size(records: &[MatchRecord]) -> u64 {
    records.iter().map(|r| r.size).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_by_size_descending() {
        let mut records = vec![
            MatchRecord { path: "/a".into(), is_symlink: false, size: 10 },
            MatchRecord { path: "/b".into(), is_symlink: false, size: 300 },
            MatchRecord { path: "/c".into(), is_symlink: true, size: 20 },
        ];
        sort_by_size(&mut records);
        let sizes: Vec<u64> = records.iter().map(|r| r.size).collect();
        assert_eq!(sizes, vec![300, 20, 10]);
        assert_eq!(total_size(&records), 330);
    }

    #[test]
    fn test_empty_target_rejected() {
        let finder = Finder::default();
        let result = finder.discover(&ScanTarget::new(" ", ""), &PathCatalog::default());
        assert!(matches!(result, Err(RmappError::InvalidTarget { .. })));
    }

    #[test]
    fn test_distinct_roots_collapses_duplicates() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut catalog = PathCatalog::default();
        catalog.push("a", dir.path(), RootKind::Standard);
        catalog.push("b", dir.path(), RootKind::Standard);
        catalog.push("missing", "/definitely/not/here", RootKind::Standard);
        assert_eq!(distinct_roots(&catalog).len(), 2);
    }
}
