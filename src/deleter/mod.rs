pub mod escalation;
pub mod trash;
pub mod unlink;

use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, error, info, warn};

use crate::common::errors::RmappError;
use crate::common::{permissions, safety};
use crate::finder::walker::SizeMode;

pub use escalation::{Escalator, OsascriptEscalator};
pub use trash::{SystemTrash, TrashCan};
pub use unlink::{FsRemover, Remover};

static FS_REMOVER: FsRemover = FsRemover;

/// Trash (reversible) or force (irreversible)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalMode {
    #[default]
    Trash,
    Force,
}

impl std::fmt::Display for RemovalMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemovalMode::Trash => write!(f, "trash"),
            RemovalMode::Force => write!(f, "force"),
        }
    }
}

/// What happened to one path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum DeletionOutcome {
    /// Trashed or deleted by the unprivileged operation
    Removed,
    /// Did not exist any more
    Skipped,
    /// Handed to the batched privileged operation
    Escalated,
    /// Could not be removed; not retried
    Failed(String),
}

/// Per-path result together with the size measured before removal
#[derive(Debug, Clone, Serialize)]
pub struct PathOutcome {
    pub path: PathBuf,
    pub size: u64,
    pub outcome: DeletionOutcome,
}

/// Aggregate result of one [`Deleter::remove`] call
#[derive(Debug, Serialize)]
pub struct RemovalReport {
    pub mode: RemovalMode,
    pub outcomes: Vec<PathOutcome>,
    /// Paths sent to the privileged batch, sorted
    pub escalated: Vec<PathBuf>,
    pub bytes_freed: u64,
    #[serde(serialize_with = "serialize_error")]
    pub escalation_error: Option<RmappError>,
}

fn serialize_error<S: serde::Serializer>(
    err: &Option<RmappError>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match err {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

impl RemovalReport {
    /// The "total freed" summary is withheld when escalation failed
    pub fn summary_allowed(&self) -> bool {
        self.escalation_error.is_none()
    }

    pub fn count(&self, outcome: &DeletionOutcome) -> usize {
        self.outcomes.iter().filter(|o| &o.outcome == outcome).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &PathOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, DeletionOutcome::Failed(_)))
    }

    /// Bytes freed, or the escalation error
    pub fn into_result(self) -> crate::common::errors::Result<u64> {
        match self.escalation_error {
            Some(e) => Err(e),
            None => Ok(self.bytes_freed),
        }
    }
}

/// Concurrent trash-or-delete with a single batched privileged fallback
pub struct Deleter<'a> {
    trash: &'a dyn TrashCan,
    escalator: &'a dyn Escalator,
    remover: &'a dyn Remover,
    size_mode: SizeMode,
    sudo_user: Option<String>,
}

impl<'a> Deleter<'a> {
    pub fn new(trash: &'a dyn TrashCan, escalator: &'a dyn Escalator) -> Self {
        Self {
            trash,
            escalator,
            remover: &FS_REMOVER,
            size_mode: SizeMode::default(),
            sudo_user: None,
        }
    }

    pub fn with_size_mode(mut self, size_mode: SizeMode) -> Self {
        self.size_mode = size_mode;
        self
    }

    pub fn with_remover(mut self, remover: &'a dyn Remover) -> Self {
        self.remover = remover;
        self
    }

    /// Acting under `sudo` on behalf of `user`
    pub fn with_sudo_user(mut self, user: Option<String>) -> Self {
        self.sudo_user = user;
        self
    }

    /// Remove every path in `mode`.
    ///
    /// Sizes are measured up front, then each path is handled by its own
    /// task. Paths the unprivileged operation cannot touch are collected and,
    /// once every task has finished, handed to the escalator in one call.
    pub fn remove(&self, paths: &[PathBuf], mode: RemovalMode) -> RemovalReport {
        let sizes: Vec<u64> = paths.iter().map(|p| self.size_mode.measure(p)).collect();
        let pending = Mutex::new(Vec::new());

        let outcomes: Vec<DeletionOutcome> = paths
            .par_iter()
            .map(|path| self.remove_one(path, mode, &pending))
            .collect();

        let mut escalated = pending.into_inner().unwrap_or_else(PoisonError::into_inner);
        escalated.sort();

        let escalation_error = if escalated.is_empty() {
            None
        } else {
            let result = match mode {
                RemovalMode::Trash => self.escalator.trash(&escalated, self.sudo_user.as_deref()),
                RemovalMode::Force => self.escalator.delete(&escalated),
            };
            match result {
                Ok(()) => {
                    for path in &escalated {
                        info!("Removed {} with elevated privileges", path.display());
                    }
                    None
                }
                Err(e) => {
                    error!("{}", e);
                    Some(e)
                }
            }
        };

        let escalation_ok = escalation_error.is_none();
        let outcomes: Vec<PathOutcome> = paths
            .iter()
            .zip(sizes)
            .zip(outcomes)
            .map(|((path, size), outcome)| PathOutcome {
                path: path.clone(),
                size,
                outcome,
            })
            .collect();

        let bytes_freed = outcomes
            .iter()
            .filter(|o| match o.outcome {
                DeletionOutcome::Removed => true,
                DeletionOutcome::Escalated => escalation_ok,
                _ => false,
            })
            .map(|o| o.size)
            .sum();

        RemovalReport {
            mode,
            outcomes,
            escalated,
            bytes_freed,
            escalation_error,
        }
    }

    fn remove_one(&self, path: &Path, mode: RemovalMode, pending: &Mutex<Vec<PathBuf>>) -> DeletionOutcome {
        let escalate = || {
            pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(path.to_path_buf());
            DeletionOutcome::Escalated
        };

        let meta = match fs::symlink_metadata(path) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("File {} does not exist. Skipping...", path.display());
                return DeletionOutcome::Skipped;
            }
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                debug!("Cannot stat {}, escalating", path.display());
                return escalate();
            }
            Err(e) => {
                warn!("Cannot inspect {}: {}", path.display(), e);
                return DeletionOutcome::Failed(e.to_string());
            }
        };

        if safety::is_protected(path) {
            let err = RmappError::Protected {
                path: path.to_path_buf(),
            };
            warn!("{}", err);
            return DeletionOutcome::Failed(err.to_string());
        }
        if permissions::is_sip_protected(path) {
            let hint = permissions::permission_hint(path);
            warn!("Skipping {}: {}", path.display(), hint);
            return DeletionOutcome::Failed(hint);
        }

        match mode {
            RemovalMode::Trash => {
                // The unprivileged call would use root's Trash
                if self.sudo_user.is_some() {
                    return escalate();
                }
                if self.trash.move_to_trash(path) {
                    info!("Moved {} to Trash", path.display());
                    DeletionOutcome::Removed
                } else {
                    escalate()
                }
            }
            RemovalMode::Force => match self.remover.remove(path, &meta) {
                Ok(()) => {
                    info!("Deleted {}", path.display());
                    DeletionOutcome::Removed
                }
                Err(e) if e.kind() == io::ErrorKind::PermissionDenied => escalate(),
                Err(e) if e.kind() == io::ErrorKind::NotFound => DeletionOutcome::Skipped,
                Err(e) => {
                    error!("{} could not be deleted: {}", path.display(), e);
                    DeletionOutcome::Failed(e.to_string())
                }
            },
        }
    }
}
