//! Console output for the dirmirror CLI

use console::style;
use dirmirror_config::SyncConfig;
use dirmirror_sync::DriverSummary;
use dirmirror_types::{Result, SyncReport, SyncStats};
use std::fmt;
use std::time::Duration;

pub fn print_banner(config: &SyncConfig) {
    println!(
        "{} Mirroring {} {} {} every {}",
        style("⟲").blue().bold(),
        style(config.source.display()).cyan(),
        style("→").green().bold(),
        style(config.destination.display()).cyan(),
        style(config.interval).blue()
    );
    println!(
        "  Hash: {} ({} byte chunks), log: {}",
        config.hash.algorithm,
        config.hash.chunk_size,
        style(config.log_file.display()).cyan()
    );
    if config.options.dry_run {
        println!(
            "{} Dry run mode - no changes will be made",
            style("ℹ").yellow()
        );
    }
    println!(
        "{} Press Enter at any time to terminate at the end of the current update cycle",
        style("ℹ").yellow()
    );
}

pub fn print_startup_error(error: &impl fmt::Display) {
    eprintln!("{} {}", style("✗").red().bold(), style(error).red());
}

pub fn print_stop_requested() {
    println!(
        "{} Stopping at the end of the current update cycle",
        style("⏹").yellow().bold()
    );
}

pub fn print_pass(pass: u64, outcome: &Result<SyncReport>) {
    match outcome {
        Ok(report) if report.is_empty() => {
            println!(
                "{} Pass #{}: up to date ({})",
                style("✓").green(),
                pass,
                format_duration(report.stats.duration)
            );
        }
        Ok(report) => {
            let marker = if report.is_success() {
                style("✓").green()
            } else {
                style("⚠").yellow()
            };
            println!("{} Pass #{}: {}", marker, pass, describe(&report.stats));
        }
        Err(e) => {
            println!(
                "{} Pass #{} failed: {} (retrying next cycle)",
                style("✗").red().bold(),
                pass,
                style(e).red()
            );
        }
    }
}

pub fn print_terminated(summary: &DriverSummary) {
    let stats = &summary.stats;
    println!();
    println!("{}", style("Sync Statistics:").bold().underlined());
    println!("  Passes: {}", style(summary.passes).blue());
    println!(
        "  Failed passes: {}",
        if summary.failed_passes > 0 {
            style(summary.failed_passes).red()
        } else {
            style(summary.failed_passes).green()
        }
    );
    println!("  Files copied: {}", style(stats.files_copied).green());
    println!("  Files updated: {}", style(stats.files_updated).green());
    println!("  Entries deleted: {}", style(stats.entries_deleted).green());
    println!(
        "  Directories created: {}",
        style(stats.directories_created).green()
    );
    println!(
        "  Bytes copied: {}",
        style(format_bytes(stats.bytes_copied)).green()
    );
    println!(
        "  Errors: {}",
        if stats.errors > 0 {
            style(stats.errors).red()
        } else {
            style(stats.errors).green()
        }
    );
    println!(
        "  Time spent syncing: {}",
        style(format_duration(stats.duration)).blue()
    );
    println!("{} Terminated", style("✓").green().bold());
}

fn describe(stats: &SyncStats) -> String {
    format!(
        "{} copied, {} updated, {} deleted, {} errors, {} in {}",
        stats.files_copied,
        stats.files_updated,
        stats.entries_deleted,
        stats.errors,
        format_bytes(stats.bytes_copied),
        format_duration(stats.duration)
    )
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_index])
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{:.2}s", duration.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
