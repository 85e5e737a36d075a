use std::path::Path;

/// Paths that must NEVER be removed under any circumstances.
/// This is the safety net against an over-eager match.
const PROTECTED_PATHS: &[&str] = &[
    "/",
    "/System",
    "/Applications",
    "/Users",
    "/Library",
    "/Library/Application Support",
    "/Library/Caches",
    "/Library/LaunchAgents",
    "/Library/LaunchDaemons",
    "/Library/Logs",
    "/Library/PrivilegedHelperTools",
    "/usr",
    "/usr/local",
    "/usr/local/bin",
    "/usr/local/opt",
    "/usr/local/sbin",
    "/usr/local/share",
    "/usr/local/var",
    "/bin",
    "/sbin",
    "/var",
    "/var/db/receipts",
    "/etc",
    "/opt",
    "/private",
    "/Volumes",
];

/// Paths under home that must never be removed entirely
const PROTECTED_HOME_DIRS: &[&str] = &[
    "", // home dir itself
    "Desktop",
    "Documents",
    "Downloads",
    "Applications",
    "Library",
    "Library/Application Support",
    "Library/Caches",
    "Library/Containers",
    "Library/Group Containers",
    "Library/Preferences",
    "Library/LaunchAgents",
    "Library/Logs",
    ".ssh",
    ".gnupg",
];

/// Check if a path is protected and should NEVER be removed
pub fn is_protected(path: &Path) -> bool {
    if PROTECTED_PATHS.iter().any(|p| path == Path::new(p)) {
        return true;
    }

    if let Some(home) = dirs::home_dir() {
        return PROTECTED_HOME_DIRS.iter().any(|dir| {
            if dir.is_empty() {
                path == home
            } else {
                path == home.join(dir)
            }
        });
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_is_protected() {
        assert!(is_protected(Path::new("/")));
    }

    #[test]
    fn test_catalog_roots_protected() {
        assert!(is_protected(Path::new("/Applications")));
        assert!(is_protected(Path::new("/Library/Caches")));
        assert!(is_protected(Path::new("/var/db/receipts")));
        assert!(is_protected(Path::new("/usr/local/bin")));
    }

    #[test]
    fn test_home_dir_protected() {
        if let Some(home) = dirs::home_dir() {
            assert!(is_protected(&home));
            assert!(is_protected(&home.join("Documents")));
            assert!(is_protected(&home.join("Library/Preferences")));
        }
    }

    #[test]
    fn test_app_data_not_protected() {
        assert!(!is_protected(Path::new("/Applications/Demo.app")));
        assert!(!is_protected(Path::new("/Library/Caches/com.example.demo")));
        if let Some(home) = dirs::home_dir() {
            assert!(!is_protected(&home.join("Library/Caches/com.example.demo")));
            assert!(!is_protected(&home.join("Library/Preferences/com.example.demo.plist")));
        }
    }

    #[test]
    fn test_tmp_not_protected() {
        assert!(!is_protected(Path::new("/tmp/somefile")));
    }
}
