use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::time::Duration;
use tempfile::TempDir;

use rmapp::common::config::Config;
use rmapp::finder::catalog::{PathCatalog, RootKind};
use rmapp::finder::matcher::TokenRunPolicy;
use rmapp::finder::walker::SizeMode;
use rmapp::finder::{Finder, FinderOptions, MatchRecord, ScanTarget, UserContext};

// ─── Fixture helpers ─────────────────────────────────────────────────────────

struct Fixture {
    _home: TempDir,
    _system: TempDir,
    home: PathBuf,
    system: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let home = TempDir::new().unwrap();
        let system = TempDir::new().unwrap();
        Self {
            home: home.path().to_path_buf(),
            system: system.path().to_path_buf(),
            _home: home,
            _system: system,
        }
    }

    fn user(&self) -> UserContext {
        UserContext::with_home(&self.home).with_system_root(&self.system)
    }

    fn catalog(&self) -> PathCatalog {
        PathCatalog::build(&self.user())
    }

    fn dir(&self, rel: &str) -> PathBuf {
        let path = self.home.join(rel);
        fs::create_dir_all(&path).unwrap();
        path
    }

    fn file(&self, rel: &str, len: usize) -> PathBuf {
        let path = self.home.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, vec![b'x'; len]).unwrap();
        path
    }

    fn system_file(&self, rel: &str) -> PathBuf {
        let path = self.system.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"receipt").unwrap();
        path
    }
}

fn logical_finder() -> Finder {
    Finder::new(FinderOptions {
        size_mode: SizeMode::Logical,
        ..FinderOptions::default()
    })
}

fn paths(records: &[MatchRecord]) -> Vec<&Path> {
    records.iter().map(|r| r.path.as_path()).collect()
}

fn demo() -> ScanTarget {
    ScanTarget::new("Demo", "com.example.demo")
}

// ─── Discovery ───────────────────────────────────────────────────────────────

#[test]
fn test_discovers_demo_artifacts() {
    let fx = Fixture::new();
    let bundle = fx.dir("Applications/Demo.app/Contents");
    let caches = fx.dir("Library/Caches/com.example.demo");
    let prefs = fx.file("Library/Preferences/com.example.demo.plist", 10);
    let support = fx.file("Library/Application Support/Demo/state.db", 100);
    let unrelated = fx.file("Library/Caches/com.other.tool/cache.db", 50);
    let documents = fx.file("Documents/Demo Notes.txt", 5);

    let records = logical_finder().discover(&demo(), &fx.catalog()).unwrap();
    let found = paths(&records);

    assert!(found.contains(&bundle.parent().unwrap()));
    assert!(found.contains(&caches.as_path()));
    assert!(found.contains(&prefs.as_path()));
    assert!(found.contains(&support.parent().unwrap()));
    assert!(!found.contains(&unrelated.parent().unwrap()));
    assert!(!found.contains(&documents.as_path()));
    assert_eq!(records.len(), 4);

    let support_record = records
        .iter()
        .find(|r| r.path == support.parent().unwrap())
        .unwrap();
    assert_eq!(support_record.size, 100);
}

#[test]
fn test_no_descendants_of_matched_directory() {
    let fx = Fixture::new();
    let support = fx.dir("Library/Application Support/Demo");
    fx.file("Library/Application Support/Demo/Demo.log", 1);

    let records = logical_finder().discover(&demo(), &fx.catalog()).unwrap();
    assert_eq!(paths(&records), vec![support.as_path()]);
}

#[test]
fn test_documents_included_only_as_extra_root() {
    let fx = Fixture::new();
    let notes = fx.file("Documents/Demo Notes.txt", 5);

    let records = logical_finder().discover(&demo(), &fx.catalog()).unwrap();
    assert!(records.is_empty());

    let config: Config = toml::from_str("extra_roots = [\"~/Documents\"]").unwrap();
    let mut catalog = fx.catalog();
    for root in config.expanded_extra_roots(&fx.home) {
        catalog.push("extra", root, RootKind::Standard);
    }
    let records = logical_finder().discover(&demo(), &catalog).unwrap();
    assert_eq!(paths(&records), vec![notes.as_path()]);
}

#[test]
fn test_application_listing_respects_bundle_boundaries() {
    let fx = Fixture::new();
    let apps = fx.system.join("Applications");
    fs::create_dir_all(apps.join("Demo.app")).unwrap();
    fs::create_dir_all(apps.join("Demo 2.app")).unwrap();
    fs::create_dir_all(apps.join("DemoHelper.app")).unwrap();
    fs::create_dir_all(apps.join("Other.app/Contents/Demo.app")).unwrap();

    let target = ScanTarget::new("Demo", "");
    let records = logical_finder().discover(&target, &fx.catalog()).unwrap();
    assert_eq!(
        paths(&records),
        vec![apps.join("Demo 2.app").as_path(), apps.join("Demo.app").as_path()]
    );
}

// ─── Depth and pruning ───────────────────────────────────────────────────────

#[test]
fn test_preferences_reach_one_level_deeper() {
    let fx = Fixture::new();
    let by_host = fx.file("Library/Preferences/ByHost/com.example.demo.ABCD.plist", 1);
    fx.file("Library/Caches/a/b/com.example.demo", 1);

    let records = logical_finder().discover(&demo(), &fx.catalog()).unwrap();
    assert_eq!(paths(&records), vec![by_host.as_path()]);
}

#[test]
fn test_domain_hint_pruning_is_configurable() {
    let fx = Fixture::new();
    let nested = fx.dir("Library/Application Support/example-tools/Demo");

    let pruning = Finder::new(FinderOptions {
        prune_domain_dirs: true,
        ..FinderOptions::default()
    });
    let records = pruning.discover(&demo(), &fx.catalog()).unwrap();
    assert!(records.is_empty());

    let descending = Finder::new(FinderOptions {
        prune_domain_dirs: false,
        ..FinderOptions::default()
    });
    let records = descending.discover(&demo(), &fx.catalog()).unwrap();
    assert_eq!(paths(&records), vec![nested.as_path()]);
}

#[test]
fn test_matching_vendor_directory_is_emitted_despite_hint() {
    let fx = Fixture::new();
    let vendor = fx.dir("Library/Application Support/com.example.demo.helper");

    let records = logical_finder().discover(&demo(), &fx.catalog()).unwrap();
    assert_eq!(paths(&records), vec![vendor.as_path()]);
}

// ─── Roots, symlinks and receipts ────────────────────────────────────────────

#[test]
fn test_duplicate_and_aliased_roots_scanned_once() {
    let fx = Fixture::new();
    let caches = fx.dir("Library/Caches");
    fx.dir("Library/Caches/com.example.demo");
    let alias = fx.home.join("caches-alias");
    std::os::unix::fs::symlink(&caches, &alias).unwrap();

    let mut catalog = PathCatalog::default();
    catalog.push("caches", &caches, RootKind::Standard);
    catalog.push("caches again", &caches, RootKind::Standard);
    catalog.push("caches alias", &alias, RootKind::Standard);

    let records = logical_finder().discover(&demo(), &catalog).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].path, caches.join("com.example.demo"));
}

#[test]
fn test_symlinks_flagged_and_not_followed() {
    let fx = Fixture::new();
    let outside = fx.dir("elsewhere");
    fs::write(outside.join("Demo.log"), b"x").unwrap();
    let link = fx.home.join("Library/Caches/com.example.demo");
    fx.dir("Library/Caches");
    std::os::unix::fs::symlink(&outside, &link).unwrap();

    let records = logical_finder().discover(&demo(), &fx.catalog()).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].path, link);
    assert!(records[0].is_symlink);
}

#[test]
fn test_receipts_use_token_runs() {
    let fx = Fixture::new();
    let receipt = fx.system_file("var/db/receipts/com.microsoft.package.Microsoft_Excel.app.plist");
    fx.file("Library/Caches/com.microsoft.package.Microsoft_Excel.app.plist", 1);

    let target = ScanTarget::new("Microsoft Excel", "com.microsoft.Excel");
    let records = logical_finder().discover(&target, &fx.catalog()).unwrap();
    assert_eq!(paths(&records), vec![receipt.as_path()]);

    let never = Finder::new(FinderOptions {
        token_runs: TokenRunPolicy::Never,
        ..FinderOptions::default()
    });
    assert!(never.discover(&target, &fx.catalog()).unwrap().is_empty());
}

#[test]
fn test_missing_roots_are_not_errors() {
    let fx = Fixture::new();
    let records = logical_finder().discover(&demo(), &fx.catalog()).unwrap();
    assert!(records.is_empty());
}

#[test]
fn test_deadline_returns_full_result() {
    let fx = Fixture::new();
    fx.dir("Library/Caches/com.example.demo");

    let finder = logical_finder();
    let plain = finder.discover(&demo(), &fx.catalog()).unwrap();
    let bounded = finder
        .discover_with_deadline(&demo(), &fx.catalog(), Duration::from_secs(30))
        .unwrap();
    assert_eq!(plain, bounded);
}

#[test]
fn test_cancelled_discovery_stops_traversal() {
    let fx = Fixture::new();
    fx.dir("Library/Caches/com.example.demo");
    fx.file("Library/Preferences/com.example.demo.plist", 1);

    let finder = logical_finder();
    let stopped = AtomicBool::new(true);
    let records = finder
        .discover_cancellable(&demo(), &fx.catalog(), &stopped)
        .unwrap();
    assert!(records.is_empty());

    let running = AtomicBool::new(false);
    let records = finder
        .discover_cancellable(&demo(), &fx.catalog(), &running)
        .unwrap();
    assert_eq!(records.len(), 2);
}
