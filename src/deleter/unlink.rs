use std::fs;
use std::io;
use std::path::Path;

/// Unprivileged permanent removal primitive.
///
/// A `PermissionDenied` error sends the path to the privileged fallback;
/// any other error is final for that path.
pub trait Remover: Send + Sync {
    fn remove(&self, path: &Path, meta: &fs::Metadata) -> io::Result<()>;
}

/// Direct filesystem removal
#[derive(Debug, Default, Clone, Copy)]
pub struct FsRemover;

impl Remover for FsRemover {
    /// Symlinks and files are unlinked; only real directories are removed recursively
    fn remove(&self, path: &Path, meta: &fs::Metadata) -> io::Result<()> {
        if meta.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        }
    }
}
