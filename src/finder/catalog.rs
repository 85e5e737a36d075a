use std::path::{Path, PathBuf};

use crate::common::permissions;

/// How a root is traversed and matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    /// Holds `.app` bundles: listed one level deep, never recursed
    Applications,
    /// `~/Library/Preferences`: searched one level deeper to reach `ByHost/`
    Preferences,
    /// Package receipts: many sibling files named after their packages
    Receipts,
    /// Everything else
    Standard,
}

/// A semantic category mapped to an absolute root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub category: &'static str,
    pub path: PathBuf,
    pub kind: RootKind,
}

/// Identity of the user rmapp is cleaning up after
#[derive(Debug, Clone)]
pub struct UserContext {
    pub home: PathBuf,
    /// Set when running under `sudo` on behalf of another user
    pub sudo_user: Option<String>,
    /// Prefix for machine-wide locations, `/` outside of tests
    pub system_root: PathBuf,
}

impl UserContext {
    /// The invoking user, taken from the environment
    pub fn current() -> Self {
        Self {
            home: dirs::home_dir().unwrap_or_else(|| PathBuf::from("/var/root")),
            sudo_user: permissions::sudo_user(),
            system_root: PathBuf::from("/"),
        }
    }

    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            sudo_user: None,
            system_root: PathBuf::from("/"),
        }
    }

    pub fn with_system_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.system_root = root.into();
        self
    }
}

const SYSTEM_ROOTS: &[(&str, &str, RootKind)] = &[
    ("applications", "Applications", RootKind::Applications),
    ("system support files", "Library/Application Support", RootKind::Standard),
    ("system crash reports", "Library/Application Support/CrashReporter", RootKind::Standard),
    ("system caches", "Library/Caches", RootKind::Standard),
    ("system extensions", "Library/Extensions", RootKind::Standard),
    ("system internet plug-ins", "Library/Internet Plug-Ins", RootKind::Standard),
    ("system launch agents", "Library/LaunchAgents", RootKind::Standard),
    ("system launch daemons", "Library/LaunchDaemons", RootKind::Standard),
    ("system logs", "Library/Logs", RootKind::Standard),
    ("privileged helper tools", "Library/PrivilegedHelperTools", RootKind::Standard),
    ("receipts", "var/db/receipts", RootKind::Receipts),
    ("local binaries", "usr/local/bin", RootKind::Standard),
    ("local opt", "usr/local/opt", RootKind::Standard),
    ("local system binaries", "usr/local/sbin", RootKind::Standard),
    ("local shared data", "usr/local/share", RootKind::Standard),
    ("local variable data", "usr/local/var", RootKind::Standard),
];

const USER_ROOTS: &[(&str, &str, RootKind)] = &[
    ("user applications", "Applications", RootKind::Applications),
    ("user support files", "Library/Application Support", RootKind::Standard),
    ("user preferences", "Library/Preferences", RootKind::Preferences),
    ("user caches", "Library/Caches", RootKind::Standard),
    ("user containers", "Library/Containers", RootKind::Standard),
    ("user saved state", "Library/Saved Application State", RootKind::Standard),
    ("user http storages", "Library/HTTPStorages", RootKind::Standard),
    ("user group containers", "Library/Group Containers", RootKind::Standard),
    ("user internet plug-ins", "Library/Internet Plug-Ins", RootKind::Standard),
    ("user launch agents", "Library/LaunchAgents", RootKind::Standard),
    ("user logs", "Library/Logs", RootKind::Standard),
    ("user crash reports", "Library/Logs/DiagnosticReports", RootKind::Standard),
    ("user webkit data", "Library/WebKit", RootKind::Standard),
    ("user cookies", "Library/Cookies", RootKind::Standard),
    ("user application scripts", "Library/Application Scripts", RootKind::Standard),
];

/// The ordered set of roots macOS applications scatter data into
#[derive(Debug, Clone, Default)]
pub struct PathCatalog {
    entries: Vec<CatalogEntry>,
}

impl PathCatalog {
    /// Build the standard catalog for `user`. No I/O.
    pub fn build(user: &UserContext) -> Self {
        let system = SYSTEM_ROOTS.iter().map(|&(category, rel, kind)| CatalogEntry {
            category,
            path: user.system_root.join(rel),
            kind,
        });
        let per_user = USER_ROOTS.iter().map(|&(category, rel, kind)| CatalogEntry {
            category,
            path: user.home.join(rel),
            kind,
        });

        Self {
            entries: system.chain(per_user).collect(),
        }
    }

    /// Append a root; relative paths are ignored
    pub fn push(&mut self, category: &'static str, path: impl Into<PathBuf>, kind: RootKind) {
        let path = path.into();
        if !path.is_absolute() {
            tracing::warn!("Ignoring relative catalog root: {}", path.display());
            return;
        }
        self.entries.push(CatalogEntry { category, path, kind });
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|e| e.path.as_path())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
