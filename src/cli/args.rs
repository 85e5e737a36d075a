use clap::{ArgGroup, Parser, ValueEnum};

/// rmapp: remove a macOS application together with the files it leaves behind
#[derive(Parser, Debug)]
#[command(
    name = "rmapp",
    version,
    about = "Remove macOS applications and their leftover files",
    long_about = "rmapp finds an application's bundle, caches, preferences, logs, launch\n\
                  agents and receipts, then moves them to the Trash (or deletes them with\n\
                  --force). Paths that need administrator rights are removed in one batch.",
    after_help = "EXAMPLES:\n  \
        rmapp Slack                              Move Slack and its files to the Trash\n  \
        rmapp \"Visual Studio Code\"               Quote names that contain spaces\n  \
        rmapp Slack --peek                       List what would be removed\n  \
        rmapp Slack --size --logical             Show apparent size only\n  \
        rmapp Slack --force --yes                Permanently delete without asking\n  \
        rmapp Slack --bundle-id com.tinyspeck.slackmacgap --peek\n  \
                                                 Look for leftovers of a removed app",
    group(ArgGroup::new("report").args(["peek", "size"]).multiple(false))
)]
pub struct Cli {
    /// Application name, with or without `.app`
    #[arg(value_name = "APP_NAME", required_unless_present = "completions")]
    pub app_name: Vec<String>,

    /// Permanently delete instead of moving to the Trash
    #[arg(long, short, conflicts_with = "report")]
    pub force: bool,

    /// List the files that would be removed, with sizes
    #[arg(long, short)]
    pub peek: bool,

    /// Print only the total size that would be freed
    #[arg(long, short)]
    pub size: bool,

    /// Report apparent file sizes instead of disk usage
    #[arg(long, short, requires = "report")]
    pub logical: bool,

    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Use this bundle identifier instead of resolving it
    #[arg(long, value_name = "ID")]
    pub bundle_id: Option<String>,

    /// Give up on discovery after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Output format
    #[arg(long, default_value = "human")]
    pub format: OutputFormat,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Verbose output
    #[arg(long, short)]
    pub verbose: bool,

    /// Print shell completions and exit
    #[arg(long, value_name = "SHELL", exclusive = true)]
    pub completions: Option<CompletionShell>,
}

impl Cli {
    /// The application name, when exactly one was given
    pub fn single_app_name(&self) -> Option<&str> {
        match self.app_name.as_slice() {
            [name] => Some(name.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    Quiet,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

impl From<CompletionShell> for clap_complete::Shell {
    fn from(shell: CompletionShell) -> Self {
        match shell {
            CompletionShell::Bash => clap_complete::Shell::Bash,
            CompletionShell::Zsh => clap_complete::Shell::Zsh,
            CompletionShell::Fish => clap_complete::Shell::Fish,
        }
    }
}
