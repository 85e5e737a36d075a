//! # rmapp
//!
//! Remove a macOS application together with the files it leaves behind.
//!
//! - **Finder**: walks a catalog of well-known Library locations in
//!   parallel and matches entries against the app name and bundle id
//! - **Deleter**: moves matches to the Trash (or deletes them), collecting
//!   anything that needs administrator rights into one privileged batch
//! - **Resolver**: turns `Slack` into `/Applications/Slack.app` and
//!   `com.tinyspeck.slackmacgap`
//! - **CLI**: `--peek` and `--size` previews, JSON output, shell completions

pub mod cli;
pub mod common;
pub mod deleter;
pub mod finder;
pub mod resolver;
