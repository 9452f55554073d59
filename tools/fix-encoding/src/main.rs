//! fix-encoding: repair double-encoded UTF-8 in source files.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use fix_encoding::{fix_file, FileOutcome, Method};

#[derive(Parser)]
#[command(name = "fix-encoding")]
#[command(about = "Repair UTF-8 text that was misread as Windows-1252 or Latin-1")]
#[command(version)]
struct Cli {
    /// Dry run: report changes without writing
    #[arg(long)]
    check: bool,

    /// Files to repair
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn print_outcome(outcome: &FileOutcome, dry_run: bool) {
    let report = &outcome.report;

    match report.method {
        Method::FullFile(codec) => println!("  Method: Full-file codec reversal ({})", codec.name()),
        Method::LineByLine { lines_fixed } => {
            println!("  Method: Line-by-line ({} lines fixed)", lines_fixed)
        }
        Method::Unchanged => {}
    }
    for fix in &report.control_fixes {
        println!("  Control char fix: {} x{}", fix.description, fix.count);
    }
    if !report.fallback.is_empty() {
        for fix in &report.fallback {
            println!("    Replaced {}: x{}", fix.description, fix.count);
        }
        let total: usize = report.fallback.iter().map(|f| f.count).sum();
        println!("  Fallback replacements: {} total", total);
    }

    if !report.is_changed() {
        println!("  No encoding issues found.");
        return;
    }

    println!(
        "  Characters collapsed: {}",
        report.original_chars.saturating_sub(report.fixed_chars())
    );
    println!(
        "  File size: {} -> {} chars",
        report.original_chars,
        report.fixed_chars()
    );
    for change in &report.samples {
        println!("  Line {}:", change.line);
        println!("    WAS: {}", change.was);
        println!("    NOW: {}", change.now);
    }
    if let Some(summary) = report.change_summary() {
        println!("  {}", summary);
    }

    if !report.remaining.is_empty() {
        println!("  WARNING: {} garbled sequences remain", report.remaining_count());
        for (pattern, count) in &report.remaining {
            println!("    {:?} x{}", pattern, count);
        }
    }

    match &outcome.backup {
        Some(backup) => {
            println!("  Backup: {}", backup.display());
            println!("  FIXED successfully");
        }
        None if dry_run => println!("  DRY RUN - no changes written"),
        None => {}
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let rule = "=".repeat(60);

    if cli.check {
        println!("DRY RUN MODE - no files will be modified\n");
    }

    let mut failed = 0;
    for path in &cli.files {
        println!("\n{}\nProcessing: {}\n{}", rule, path.display(), rule);
        match fix_file(path, cli.check) {
            Ok(outcome) => print_outcome(&outcome, cli.check),
            Err(e) => {
                println!("  ERROR: {:#}", e);
                failed += 1;
            }
        }
    }

    println!("\n{}", rule);
    if failed > 0 {
        bail!("{} of {} files had errors", failed, cli.files.len());
    }
    println!("All done!");
    Ok(())
}
