//! Turning the name typed on the command line into a [`ScanTarget`].
//!
//! The bundle is looked up in `/Applications` and then `~/Applications`
//! (absolute paths are taken as-is). Its identifier comes from Spotlight
//! metadata when available, else from `Contents/Info.plist`.

use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

use crate::common::errors::{Result, RmappError};
use crate::finder::ScanTarget;

/// Source of a bundle's reverse-DNS identifier
pub trait BundleIdSource {
    fn bundle_id(&self, bundle: &Path) -> Option<String>;
}

/// `mdls -name kMDItemCFBundleIdentifier`, falling back to `Info.plist`
#[derive(Debug, Default, Clone, Copy)]
pub struct MdlsSource;

impl BundleIdSource for MdlsSource {
    fn bundle_id(&self, bundle: &Path) -> Option<String> {
        let output = Command::new("mdls")
            .args(["-name", "kMDItemCFBundleIdentifier"])
            .arg(bundle)
            .output();

        match output {
            Ok(out) if out.status.success() => {
                let stdout = String::from_utf8_lossy(&out.stdout);
                if let Some(id) = extract_quoted(&stdout) {
                    return Some(id);
                }
                debug!("mdls has no identifier for {}", bundle.display());
            }
            Ok(out) => debug!(
                "mdls failed for {}: {}",
                bundle.display(),
                String::from_utf8_lossy(&out.stderr).trim()
            ),
            Err(e) => debug!("mdls unavailable: {}", e),
        }
        PlistSource.bundle_id(bundle)
    }
}

/// `CFBundleIdentifier` from `Contents/Info.plist`
#[derive(Debug, Default, Clone, Copy)]
pub struct PlistSource;

impl BundleIdSource for PlistSource {
    fn bundle_id(&self, bundle: &Path) -> Option<String> {
        let plist_val = plist::Value::from_file(bundle.join("Contents/Info.plist")).ok()?;
        plist_val
            .as_dictionary()?
            .get("CFBundleIdentifier")
            .and_then(|v| v.as_string())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
    }
}

/// Text between the first pair of double quotes. `mdls` prints `(null)`
/// unquoted when the attribute is missing.
pub fn extract_quoted(output: &str) -> Option<String> {
    let start = output.find('"')? + 1;
    let len = output[start..].find('"')?;
    let value = output[start..start + len].trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Append `.app` unless already present
pub fn dot_app(name: &str) -> String {
    if name.to_lowercase().ends_with(".app") {
        name.to_string()
    } else {
        format!("{}.app", name)
    }
}

/// Result of resolving the user's input
#[derive(Debug, Clone)]
pub struct Resolution {
    pub target: ScanTarget,
    /// The installed bundle, `None` when only leftovers are being cleaned
    pub bundle: Option<PathBuf>,
}

pub struct Resolver<'a> {
    search_dirs: Vec<PathBuf>,
    source: &'a dyn BundleIdSource,
}

impl<'a> Resolver<'a> {
    /// Search `/Applications`, then `<home>/Applications`
    pub fn new(home: &Path, source: &'a dyn BundleIdSource) -> Self {
        Self::with_search_dirs(
            vec![PathBuf::from("/Applications"), home.join("Applications")],
            source,
        )
    }

    pub fn with_search_dirs(search_dirs: Vec<PathBuf>, source: &'a dyn BundleIdSource) -> Self {
        Self { search_dirs, source }
    }

    /// Locate the bundle for `name`
    pub fn locate(&self, name: &str) -> Option<PathBuf> {
        let file_name = dot_app(name);
        let given = Path::new(&file_name);
        if given.is_absolute() {
            return given.exists().then(|| given.to_path_buf());
        }
        self.search_dirs
            .iter()
            .map(|dir| dir.join(&file_name))
            .find(|candidate| candidate.exists())
    }

    /// Resolve `name` into a scan target.
    ///
    /// `bundle_id_override` replaces resolution and also allows a target
    /// whose bundle is already gone.
    pub fn resolve(&self, name: &str, bundle_id_override: Option<&str>) -> Result<Resolution> {
        let file_name = dot_app(name);
        let app_name = app_stem(&file_name);
        let bundle = self.locate(name);
        let override_id = bundle_id_override.map(str::trim).filter(|s| !s.is_empty());

        let bundle_id = match (&bundle, override_id) {
            (_, Some(id)) => id.to_string(),
            (Some(path), None) => {
                let id = self.source.bundle_id(path).unwrap_or_default();
                if id.is_empty() {
                    info!("No bundle identifier for {}, matching by name only", path.display());
                }
                id
            }
            (None, None) => return Err(RmappError::AppNotFound { name: file_name }),
        };

        debug!("Resolved '{}' to bundle id '{}'", app_name, bundle_id);
        Ok(Resolution {
            target: ScanTarget::new(app_name, bundle_id),
            bundle,
        })
    }
}

/// File name without the `.app` extension
fn app_stem(file_name: &str) -> String {
    let base = Path::new(file_name)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file_name.to_string());
    match base.len().checked_sub(4) {
        Some(cut) if base.is_char_boundary(cut) && base[cut..].eq_ignore_ascii_case(".app") => {
            base[..cut].to_string()
        }
        _ => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_app() {
        assert_eq!(dot_app("Slack"), "Slack.app");
        assert_eq!(dot_app("Slack.app"), "Slack.app");
        assert_eq!(dot_app("Demo.APP"), "Demo.APP");
    }

    #[test]
    fn test_extract_quoted() {
        assert_eq!(
            extract_quoted("kMDItemCFBundleIdentifier = \"com.tinyspeck.slackmacgap\"\n"),
            Some("com.tinyspeck.slackmacgap".to_string())
        );
        assert_eq!(extract_quoted("kMDItemCFBundleIdentifier = (null)\n"), None);
        assert_eq!(extract_quoted("x = \"\""), None);
    }

    #[test]
    fn test_app_stem() {
        assert_eq!(app_stem("Demo.app"), "Demo");
        assert_eq!(app_stem("/Applications/Demo Notes.app"), "Demo Notes");
        assert_eq!(app_stem("Plain"), "Plain");
    }

    struct Fixed(&'static str);
    impl BundleIdSource for Fixed {
        fn bundle_id(&self, _bundle: &Path) -> Option<String> {
            Some(self.0.to_string())
        }
    }

    #[test]
    fn test_missing_app_without_override_is_fatal() {
        let dir = tempfile::TempDir::new().unwrap();
        let resolver = Resolver::with_search_dirs(vec![dir.path().to_path_buf()], &Fixed("x"));
        let err = resolver.resolve("Ghost", None).unwrap_err();
        assert_eq!(err.to_string(), "App Ghost.app not found");
    }

    #[test]
    fn test_override_allows_missing_bundle() {
        let dir = tempfile::TempDir::new().unwrap();
        let resolver = Resolver::with_search_dirs(vec![dir.path().to_path_buf()], &Fixed("x"));
        let res = resolver.resolve("Ghost", Some("com.example.ghost")).unwrap();
        assert_eq!(res.target, ScanTarget::new("Ghost", "com.example.ghost"));
        assert!(res.bundle.is_none());
    }

    #[test]
    fn test_search_order() {
        let first = tempfile::TempDir::new().unwrap();
        let second = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(second.path().join("Demo.app")).unwrap();
        let resolver = Resolver::with_search_dirs(
            vec![first.path().to_path_buf(), second.path().to_path_buf()],
            &Fixed("com.example.demo"),
        );
        assert_eq!(resolver.locate("Demo"), Some(second.path().join("Demo.app")));

        std::fs::create_dir(first.path().join("Demo.app")).unwrap();
        assert_eq!(resolver.locate("Demo"), Some(first.path().join("Demo.app")));
    }

    #[test]
    fn test_plist_source() {
        let dir = tempfile::TempDir::new().unwrap();
        let bundle = dir.path().join("Demo.app");
        std::fs::create_dir_all(bundle.join("Contents")).unwrap();

        let mut dict = plist::Dictionary::new();
        dict.insert(
            "CFBundleIdentifier".to_string(),
            plist::Value::String("com.example.demo".to_string()),
        );
        plist::Value::Dictionary(dict)
            .to_file_xml(bundle.join("Contents/Info.plist"))
            .unwrap();

        assert_eq!(PlistSource.bundle_id(&bundle), Some("com.example.demo".to_string()));
        assert_eq!(PlistSource.bundle_id(dir.path()), None);

        let resolver = Resolver::with_search_dirs(vec![dir.path().to_path_buf()], &PlistSource);
        let res = resolver.resolve("Demo.app", None).unwrap();
        assert_eq!(res.target, ScanTarget::new("Demo", "com.example.demo"));
        assert_eq!(res.bundle, Some(bundle));
    }
}
