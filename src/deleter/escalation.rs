use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, warn};

use crate::common::errors::{Result, RmappError};

/// Runs one elevated operation over a whole batch of paths.
///
/// Implementations report success or failure of the batch only; there is
/// no per-path status.
pub trait Escalator: Send + Sync {
    /// Move `paths` to the Trash with elevated rights. With `as_user` set the
    /// files go to that user's Trash rather than the administrator's.
    fn trash(&self, paths: &[PathBuf], as_user: Option<&str>) -> Result<()>;

    /// Recursively delete `paths` with elevated rights
    fn delete(&self, paths: &[PathBuf]) -> Result<()>;
}

/// Escalation through AppleScript, which shows a single authorization
/// prompt for the batch
#[derive(Debug, Default, Clone, Copy)]
pub struct OsascriptEscalator;

impl Escalator for OsascriptEscalator {
    fn trash(&self, paths: &[PathBuf], as_user: Option<&str>) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }
        warn!(
            "{} path(s) require elevated permissions to be moved to the Trash. Escalating with osascript...",
            paths.len()
        );

        let script = finder_delete_script(paths);
        let mut cmd = match as_user {
            Some(user) => {
                let mut cmd = Command::new("sudo");
                cmd.args(["-u", user, "osascript", "-e", script.as_str()]);
                cmd
            }
            None => {
                let mut cmd = Command::new("osascript");
                cmd.args(["-e", script.as_str()]);
                cmd
            }
        };
        run(&mut cmd, "trash", paths.len())
    }

    fn delete(&self, paths: &[PathBuf]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }
        warn!(
            "{} path(s) are permission protected. Escalating with osascript...",
            paths.len()
        );

        let script = privileged_rm_script(paths);
        let mut cmd = Command::new("osascript");
        cmd.args(["-e", script.as_str()]);
        run(&mut cmd, "delete", paths.len())
    }
}

fn run(cmd: &mut Command, action: &'static str, count: usize) -> Result<()> {
    debug!("Running {:?}", cmd);
    let output = cmd.output().map_err(|e| RmappError::EscalationFailed {
        action,
        count,
        message: e.to_string(),
    })?;

    if output.status.success() {
        Ok(())
    } else {
        Err(RmappError::EscalationFailed {
            action,
            count,
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Escape a value for use inside an AppleScript string literal
fn applescript_string(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// `tell application "Finder" to delete {POSIX file "...", ...}`
pub fn finder_delete_script(paths: &[PathBuf]) -> String {
    let files: Vec<String> = paths
        .iter()
        .map(|p| format!("POSIX file {}", applescript_string(&p.to_string_lossy())))
        .collect();
    format!("tell application \"Finder\" to delete {{{}}}", files.join(", "))
}

/// One `rm -rf` over every path, run with administrator privileges
pub fn privileged_rm_script(paths: &[PathBuf]) -> String {
    let args: Vec<String> = paths
        .iter()
        .map(|p| format!("quoted form of {}", applescript_string(&p.to_string_lossy())))
        .collect();
    format!(
        "do shell script \"rm -rf \" & {} with administrator privileges",
        args.join(" & \" \" & ")
    )
}
