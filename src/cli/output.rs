use chrono::{DateTime, Utc};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;

use crate::common::format::{format_count, format_path, format_size, format_size_colored};
use crate::deleter::{DeletionOutcome, RemovalReport};
use crate::finder::walker::SizeMode;
use crate::finder::{total_size, MatchRecord, ScanTarget};

/// Machine-readable discovery result
#[derive(Debug, Serialize)]
pub struct MatchesJson<'a> {
    pub app_name: &'a str,
    pub bundle_id: &'a str,
    pub size_mode: SizeMode,
    pub total_bytes: u64,
    pub matches: &'a [MatchRecord],
    pub generated_at: DateTime<Utc>,
}

/// Machine-readable removal result
#[derive(Debug, Serialize)]
pub struct RemovalJson<'a> {
    pub app_name: &'a str,
    pub bundle_id: &'a str,
    #[serde(flatten)]
    pub report: &'a RemovalReport,
    pub finished_at: DateTime<Utc>,
}

fn rule() {
    println!("{}", "─".repeat(60).dimmed());
}

fn symlink_marker(record: &MatchRecord) -> ColoredString {
    if record.is_symlink {
        " (symlink)".cyan()
    } else {
        "".normal()
    }
}

/// Print the suggestion shown when an unquoted multi-word name was given
pub fn print_quote_suggestion(words: &[String]) {
    let joined = words.join(" ");
    println!(
        "  {} Detected multiple arguments. Did you mean {}?",
        "ℹ".cyan(),
        format!("rmapp \"{}\"", joined).bold()
    );
}

/// Print every match with its size, largest first
pub fn print_peek(target: &ScanTarget, records: &[MatchRecord], size_mode: SizeMode) {
    println!();
    println!("  {} Files for {}", "🔎", target.app_name.bold());
    if !target.bundle_id.is_empty() {
        println!("     {}", target.bundle_id.dimmed());
    }
    rule();

    if records.is_empty() {
        println!("  {} Nothing found", "✨");
        println!();
        return;
    }

    for record in records {
        println!(
            "  {:>10}  {}{}",
            format_size(record.size),
            format_path(&record.path),
            symlink_marker(record)
        );
    }

    rule();
    let label = match size_mode {
        SizeMode::Physical => "",
        SizeMode::Logical => " (logical)",
    };
    println!(
        "  {} Total: {} would be freed{}  •  {}",
        "💾",
        format_size_colored(total_size(records)),
        label.dimmed(),
        format_count(records.len()).dimmed()
    );
    println!();
}

/// Print only the total
pub fn print_size(records: &[MatchRecord]) {
    println!("{}", format_size(total_size(records)));
}

pub fn print_matches_json(target: &ScanTarget, records: &[MatchRecord], size_mode: SizeMode) {
    let doc = MatchesJson {
        app_name: &target.app_name,
        bundle_id: &target.bundle_id,
        size_mode,
        total_bytes: total_size(records),
        matches: records,
        generated_at: Utc::now(),
    };
    match serde_json::to_string_pretty(&doc) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing results: {}", e),
    }
}

/// One path per line, for piping
pub fn print_matches_quiet(records: &[MatchRecord]) {
    for record in records {
        println!("{}", record.path.display());
    }
}

/// Ask before an irreversible deletion
pub fn print_force_warning(target: &ScanTarget, records: &[MatchRecord]) {
    println!();
    println!(
        "  {} {} item(s) for {} will be {} ({})",
        "⚠".yellow(),
        records.len(),
        target.app_name.bold(),
        "permanently deleted".red().bold(),
        format_size(total_size(records))
    );
    for record in records {
        println!("    {} {}", "✗".red(), format_path(&record.path).dimmed());
    }
    println!();
}

pub fn print_removal_report(target: &ScanTarget, report: &RemovalReport) {
    println!();
    for item in &report.outcomes {
        let path = format_path(&item.path);
        match &item.outcome {
            DeletionOutcome::Removed => println!("    {} {}", "✓".green(), path.dimmed()),
            DeletionOutcome::Escalated if report.summary_allowed() => {
                println!("    {} {} {}", "✓".green(), path.dimmed(), "(admin)".dimmed())
            }
            DeletionOutcome::Escalated => println!("    {} {}", "✗".red(), path),
            DeletionOutcome::Skipped => println!("    {} {} {}", "-".dimmed(), path.dimmed(), "(gone)".dimmed()),
            DeletionOutcome::Failed(reason) => {
                println!("    {} {} {}", "⚠".yellow(), path, reason.dimmed())
            }
        }
    }
    println!();

    if !report.summary_allowed() {
        println!(
            "  {} {} path(s) still need administrator rights",
            "✗".red(),
            report.escalated.len()
        );
        println!();
        return;
    }

    let verb = match report.mode {
        crate::deleter::RemovalMode::Trash => "moved to Trash",
        crate::deleter::RemovalMode::Force => "deleted",
    };
    println!(
        "  {} {} {}  •  {} freed",
        "✓".green(),
        target.app_name.bold(),
        verb,
        format_size_colored(report.bytes_freed)
    );
    let failures = report.failures().count();
    if failures > 0 {
        println!("  {} {} path(s) could not be removed", "⚠".yellow(), failures);
    }
    println!();
}

pub fn print_removal_json(target: &ScanTarget, report: &RemovalReport) {
    let doc = RemovalJson {
        app_name: &target.app_name,
        bundle_id: &target.bundle_id,
        report,
        finished_at: Utc::now(),
    };
    match serde_json::to_string_pretty(&doc) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing results: {}", e),
    }
}

/// Bytes freed, or nothing when the summary is withheld
pub fn print_removal_quiet(report: &RemovalReport) {
    if report.summary_allowed() {
        println!("{}", format_size(report.bytes_freed));
    }
}

/// Paths that were matched but dropped by `exclude_paths`
pub fn print_excluded(excluded: &[PathBuf]) {
    for path in excluded {
        println!("  {} {} {}", "-".dimmed(), format_path(path).dimmed(), "(excluded)".dimmed());
    }
}

// ── Progress helpers ──────────────────────────────────────────────────────────

pub fn make_spinner(show: bool, msg: &str) -> Option<ProgressBar> {
    if show {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        Some(pb)
    } else {
        None
    }
}

pub fn finish_spinner(pb: Option<ProgressBar>) {
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
}
