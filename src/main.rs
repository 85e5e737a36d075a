use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use colored::Colorize;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use rmapp::cli::args::{Cli, OutputFormat};
use rmapp::cli::output;
use rmapp::common::config::Config;
use rmapp::common::logging;
use rmapp::deleter::{Deleter, OsascriptEscalator, RemovalMode, SystemTrash};
use rmapp::finder::catalog::{PathCatalog, RootKind};
use rmapp::finder::walker::SizeMode;
use rmapp::finder::{self, Finder, FinderOptions, MatchRecord, ScanTarget, UserContext};
use rmapp::resolver::{MdlsSource, Resolver};

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    if let Some(shell) = cli.completions {
        let mut cmd = Cli::command();
        clap_complete::generate(clap_complete::Shell::from(shell), &mut cmd, "rmapp", &mut std::io::stdout());
        return Ok(());
    }

    let config = Config::load().context("Failed to load ~/.rmapp/config.toml")?;
    let _log_guard = logging::init(cli.verbose, &config);

    let Some(app_name) = cli.single_app_name() else {
        output::print_quote_suggestion(&cli.app_name);
        return Ok(());
    };

    let user = UserContext::current();
    let resolution = Resolver::new(&user.home, &MdlsSource).resolve(app_name, cli.bundle_id.as_deref())?;
    let target = resolution.target;

    let size_mode = if cli.logical { SizeMode::Logical } else { config.size_mode };
    let mut records = discover(&cli, &config, &user, &target, size_mode)?;

    // Bundles given by absolute path may live outside every catalog root
    if let Some(bundle) = resolution.bundle {
        if !records.iter().any(|r| r.path == bundle) {
            records.push(MatchRecord {
                is_symlink: bundle.is_symlink(),
                size: size_mode.measure(&bundle),
                path: bundle,
            });
        }
    }

    let (mut records, excluded): (Vec<MatchRecord>, Vec<MatchRecord>) =
        records.into_iter().partition(|r| !config.is_excluded(&r.path));
    finder::sort_by_size(&mut records);

    if cli.peek {
        match cli.format {
            OutputFormat::Human => {
                output::print_peek(&target, &records, size_mode);
                let excluded: Vec<PathBuf> = excluded.into_iter().map(|r| r.path).collect();
                output::print_excluded(&excluded);
            }
            OutputFormat::Json => output::print_matches_json(&target, &records, size_mode),
            OutputFormat::Quiet => output::print_matches_quiet(&records),
        }
        return Ok(());
    }

    if cli.size {
        match cli.format {
            OutputFormat::Json => output::print_matches_json(&target, &records, size_mode),
            OutputFormat::Human | OutputFormat::Quiet => output::print_size(&records),
        }
        return Ok(());
    }

    if records.is_empty() {
        if cli.format == OutputFormat::Human {
            println!("  {} Nothing found for {}", "✨", target.app_name.bold());
        }
        return Ok(());
    }

    let mode = if cli.force { RemovalMode::Force } else { RemovalMode::Trash };
    if mode == RemovalMode::Force && !cli.yes && !confirm(&target, &records)? {
        println!("  {} Cancelled", "✗".red());
        return Ok(());
    }

    let paths: Vec<PathBuf> = records.iter().map(|r| r.path.clone()).collect();
    let deleter = Deleter::new(&SystemTrash, &OsascriptEscalator)
        .with_size_mode(size_mode)
        .with_sudo_user(user.sudo_user.clone());
    let report = deleter.remove(&paths, mode);

    match cli.format {
        OutputFormat::Human => output::print_removal_report(&target, &report),
        OutputFormat::Json => output::print_removal_json(&target, &report),
        OutputFormat::Quiet => output::print_removal_quiet(&report),
    }

    report.into_result()?;
    Ok(())
}

fn discover(
    cli: &Cli,
    config: &Config,
    user: &UserContext,
    target: &ScanTarget,
    size_mode: SizeMode,
) -> Result<Vec<MatchRecord>> {
    let mut catalog = PathCatalog::build(user);
    for root in config.expanded_extra_roots(&user.home) {
        catalog.push("extra", root, RootKind::Standard);
    }

    let mut options = FinderOptions::from(config);
    options.size_mode = size_mode;
    let finder = Finder::new(options);

    let spinner = output::make_spinner(
        cli.format == OutputFormat::Human,
        &format!("Searching for {} files...", target.app_name),
    );
    let result = match cli.timeout {
        Some(secs) => finder.discover_with_deadline(target, &catalog, Duration::from_secs(secs)),
        None => finder.discover(target, &catalog),
    };
    output::finish_spinner(spinner);
    Ok(result?)
}

fn confirm(target: &ScanTarget, records: &[MatchRecord]) -> Result<bool> {
    output::print_force_warning(target, records);
    print!("  Permanently delete these files? [y/N] ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}
