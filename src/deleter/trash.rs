use std::path::Path;
use tracing::debug;

/// Unprivileged "move to Trash" primitive.
///
/// `false` means the move did not happen and the path should go through
/// the privileged fallback.
pub trait TrashCan: Send + Sync {
    fn move_to_trash(&self, path: &Path) -> bool;
}

/// The platform Trash, through the `trash` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTrash;

impl TrashCan for SystemTrash {
    fn move_to_trash(&self, path: &Path) -> bool {
        match trash::delete(path) {
            Ok(()) => true,
            Err(e) => {
                debug!("Unprivileged trash failed for {}: {}", path.display(), e);
                false
            }
        }
    }
}
