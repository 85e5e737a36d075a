use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};
use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::catalog::{CatalogEntry, RootKind};
use super::matcher::{MatchScope, Matcher};

/// Directories at or above this depth are candidates for domain-hint pruning
const SHALLOW_DEPTH: usize = 1;

/// A path emitted by a traversal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Found {
    pub path: PathBuf,
    pub is_symlink: bool,
}

/// Per-root traversal parameters. One per root, never shared between roots.
#[derive(Debug)]
pub struct ScanContext<'a> {
    pub matcher: &'a Matcher,
    /// Lower-cased second label of the bundle identifier, may be empty
    pub domain_hint: String,
    pub max_depth: usize,
    pub scope: MatchScope,
    pub prune_domain_dirs: bool,
    /// Set once the caller no longer wants results
    pub cancel: &'a AtomicBool,
}

impl ScanContext<'_> {
    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Decide whether a non-matching directory should be skipped
    pub fn should_prune(&self, name: &str, depth: usize) -> bool {
        if depth > self.max_depth {
            return true;
        }
        self.prune_domain_dirs
            && depth <= SHALLOW_DEPTH
            && !self.domain_hint.is_empty()
            && name.to_lowercase().contains(&self.domain_hint)
    }
}

/// Traverse one catalog root, sending every match to `tx`.
///
/// Failures are logged and end this root's traversal only.
/// Returns the number of matches emitted.
pub fn walk_root(entry: &CatalogEntry, ctx: &ScanContext<'_>, tx: &Sender<Found>) -> usize {
    match std::fs::metadata(&entry.path) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            debug!("Root is not a directory, skipping: {}", entry.path.display());
            return 0;
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("Root does not exist, skipping: {}", entry.path.display());
            return 0;
        }
        Err(e) => {
            warn!("Cannot read root {}: {}", entry.path.display(), e);
            return 0;
        }
    }

    match entry.kind {
        RootKind::Applications => list_applications(&entry.path, ctx, tx),
        _ => walk_tree(&entry.path, ctx, tx),
    }
}

/// One-level listing: bundles are opaque directories, never recursed
fn list_applications(root: &Path, ctx: &ScanContext<'_>, tx: &Sender<Found>) -> usize {
    let entries = match std::fs::read_dir(root) {
        Ok(e) => e,
        Err(e) => {
            warn!("Cannot list {}: {}", root.display(), e);
            return 0;
        }
    };

    let mut emitted = 0;
    for entry in entries.filter_map(|e| e.ok()) {
        if ctx.is_cancelled() {
            break;
        }
        let file_type = match entry.file_type() {
            Ok(t) => t,
            Err(_) => continue,
        };
        if !file_type.is_dir() && !file_type.is_symlink() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        if ctx.matcher.is_match(&name, ctx.scope) && emit(tx, entry.path(), file_type.is_symlink()) {
            emitted += 1;
        }
    }
    emitted
}

fn walk_tree(root: &Path, ctx: &ScanContext<'_>, tx: &Sender<Found>) -> usize {
    let mut emitted = 0;
    let mut it = WalkDir::new(root).follow_links(false).min_depth(1).into_iter();

    loop {
        if ctx.is_cancelled() {
            debug!("Traversal of {} cancelled", root.display());
            break;
        }
        let entry = match it.next() {
            None => break,
            Some(Ok(entry)) => entry,
            Some(Err(err)) => {
                let denied = err
                    .io_error()
                    .is_some_and(|e| e.kind() == io::ErrorKind::PermissionDenied);
                let at = err.path().unwrap_or(root).display().to_string();
                if denied {
                    warn!("Permission denied while scanning {}", at);
                } else {
                    debug!("Skipping unreadable entry {}: {}", at, err);
                }
                continue;
            }
        };

        let name = entry.file_name().to_string_lossy();
        let file_type = entry.file_type();

        // Matched like files, never followed
        if file_type.is_symlink() {
            if ctx.matcher.is_match(&name, ctx.scope) && emit(tx, entry.path().to_path_buf(), true) {
                emitted += 1;
            }
            continue;
        }

        if file_type.is_dir() {
            if ctx.matcher.is_match(&name, ctx.scope) {
                if emit(tx, entry.path().to_path_buf(), false) {
                    emitted += 1;
                }
                it.skip_current_dir();
            } else if ctx.should_prune(&name, entry.depth()) {
                debug!("Pruned {}", entry.path().display());
                it.skip_current_dir();
            }
            continue;
        }

        if ctx.matcher.is_match(&name, ctx.scope) && emit(tx, entry.path().to_path_buf(), false) {
            emitted += 1;
        }
    }

    emitted
}

fn emit(tx: &Sender<Found>, path: PathBuf, is_symlink: bool) -> bool {
    if is_symlink {
        debug!("Symlink match found at: {}", path.display());
    } else {
        debug!("Match found at: {}", path.display());
    }
    // Fails only once the aggregation loop is gone
    tx.send(Found { path, is_symlink }).is_ok()
}

/// How the size of a match is measured
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeMode {
    /// Allocated blocks on disk
    #[default]
    Physical,
    /// Sum of apparent file lengths
    Logical,
}

impl SizeMode {
    pub fn measure(self, path: &Path) -> u64 {
        match self {
            SizeMode::Physical => disk_usage(path),
            SizeMode::Logical => logical_size(path),
        }
    }
}

/// Physical disk usage of a file, symlink or directory tree
pub fn disk_usage(path: &Path) -> u64 {
    tree_size(path, |m| m.blocks() * 512)
}

/// Apparent size of a file, symlink or directory tree
pub fn logical_size(path: &Path) -> u64 {
    tree_size(path, |m| m.len())
}

fn tree_size(path: &Path, size_of: impl Fn(&std::fs::Metadata) -> u64) -> u64 {
    let meta = match std::fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(_) => return 0,
    };
    if !meta.is_dir() {
        return size_of(&meta);
    }

    WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.metadata().map(|m| size_of(&m)).unwrap_or(0))
        .sum()
}
