use std::path::Path;

/// Locations protected by System Integrity Protection. Even an
/// administrator cannot modify these, so escalation is pointless.
const SIP_PATHS: &[&str] = &[
    "/System",
    "/bin",
    "/sbin",
    "/usr/bin",
    "/usr/sbin",
    "/usr/lib",
    "/usr/libexec",
    "/usr/share",
];

/// Paths requiring Full Disk Access
const FDA_PATHS: &[&str] = &[
    "Library/Containers/com.apple.",
    "Library/Group Containers/group.com.apple.",
    "Library/Mail",
    "Library/Messages",
    "Library/Safari",
    "Library/Cookies",
];

/// Check if a path is SIP-protected
pub fn is_sip_protected(path: &Path) -> bool {
    SIP_PATHS
        .iter()
        .any(|p| path == Path::new(p) || path.starts_with(p))
}

/// Check if a path likely requires Full Disk Access
pub fn requires_full_disk_access(path: &Path) -> bool {
    let path_str = path.to_string_lossy();
    FDA_PATHS.iter().any(|p| path_str.contains(p))
}

/// The user rmapp is acting on behalf of when run under `sudo`
pub fn sudo_user() -> Option<String> {
    std::env::var("SUDO_USER")
        .ok()
        .filter(|u| !u.trim().is_empty())
}

/// Get a helpful message for permission issues
pub fn permission_hint(path: &Path) -> String {
    if is_sip_protected(path) {
        "This path is protected by System Integrity Protection (SIP) and cannot be modified."
            .to_string()
    } else if requires_full_disk_access(path) {
        "This path requires Full Disk Access. Grant it in System Settings > Privacy & Security > Full Disk Access."
            .to_string()
    } else {
        "rmapp will retry with administrator privileges.".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sip_protected() {
        assert!(is_sip_protected(Path::new("/System/Library/CoreServices")));
        assert!(is_sip_protected(Path::new("/usr/bin/ls")));
        assert!(!is_sip_protected(Path::new("/usr/local/bin/code")));
        assert!(!is_sip_protected(Path::new("/Library/Caches/com.example.app")));
        // Prefix on a component boundary only
        assert!(!is_sip_protected(Path::new("/Systemwide")));
    }

    #[test]
    fn test_fda_paths() {
        assert!(requires_full_disk_access(Path::new(
            "/Users/test/Library/Containers/com.apple.Notes"
        )));
        assert!(!requires_full_disk_access(Path::new(
            "/Users/test/Library/Containers/com.example.demo"
        )));
    }

    #[test]
    fn test_permission_hint() {
        assert!(permission_hint(Path::new("/usr/lib/foo")).contains("SIP"));
        assert!(permission_hint(Path::new("/Library/Logs/Demo")).contains("administrator"));
    }
}
