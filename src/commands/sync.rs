//! Main copy command

use crate::config::SyncMode;
use crate::diff::{generate_bucket_plan, generate_copy_plan, CopyPlan};
use crate::executor::{execute_plan, ExecutionEvent};
use crate::report::{write_report, ReportName};
use crate::scanner::{scan_directory, ProgressCallback};
use crate::types::{CollisionLog, CopyFailure, FileTree, RunOutcome, SyncError};
use crate::ui::ProgressReporter;
use crate::Config;
use chrono::Local;
use console::style;
use indicatif::HumanBytes;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};

/// Run one copy pass.
///
/// Scans the source, builds the plan for `config.mode`, executes it and
/// writes the collision report into the destination root. The report is
/// written even when a strict run aborts half way, so collisions that already
/// happened are never lost.
pub fn run(config: Config) -> Result<RunOutcome, SyncError> {
    config.validate()?;
    let started_at = Local::now();
    info!(
        source = %config.source.display(),
        destination = %config.destination.display(),
        mode = ?config.mode,
        policy = ?config.policy,
        dry_run = config.dry_run,
        "starting run"
    );

    let reporter = Arc::new(Mutex::new(ProgressReporter::new(config.progress)));

    let src_tree = scan_with_progress(&reporter, "source", &config.source, &config)?;
    if src_tree.protected_skipped > 0 {
        info!(
            count = src_tree.protected_skipped,
            "protected directories left out of the scan"
        );
    }

    if !config.dry_run {
        ensure_destination_root(&config.destination)?;
    }

    let plan = match config.mode {
        SyncMode::Mirror => {
            let dest_tree = if config.destination.is_dir() {
                scan_with_progress(&reporter, "destination", &config.destination, &config)?
            } else {
                FileTree::new(config.destination.clone())
            };
            generate_copy_plan(&src_tree, &dest_tree)
        }
        SyncMode::ByDate => generate_bucket_plan(&src_tree, &config.month_names),
    };
    print_plan_summary(&plan);

    let mut outcome = RunOutcome::new();
    outcome.skipped = plan.stats.skip_count;

    if config.dry_run {
        println!("{}", format_dry_run_actions(&plan, &config.destination));
        println!("Dry-run mode: no changes were made.");
        return Ok(outcome);
    }

    if plan.is_empty() {
        match config.mode {
            SyncMode::Mirror => println!(
                "Nothing to copy: every source file already exists at the destination."
            ),
            SyncMode::ByDate => println!("Nothing to copy: the source tree holds no files."),
        }
        info!("nothing to copy");
        return Ok(outcome);
    }

    if let Ok(mut progress) = reporter.lock() {
        progress.start_transfer(plan.actions.len() as u64);
    }
    let progress_cb = {
        let reporter = Arc::clone(&reporter);
        move |event: &ExecutionEvent| match event {
            ExecutionEvent::CopyStart { path, .. } => {
                if let Ok(progress) = reporter.lock() {
                    progress.set_current_file(path);
                }
            }
            ExecutionEvent::CopySuccess {
                bytes_copied,
                renamed,
                ..
            } => {
                if let Ok(mut progress) = reporter.lock() {
                    progress.complete_transfer_file(*bytes_copied, *renamed);
                }
            }
            ExecutionEvent::CopyError { path, message, .. } => {
                if let Ok(progress) = reporter.lock() {
                    progress.transfer_error(path, message);
                }
            }
            ExecutionEvent::Complete {
                copied,
                failed,
                bytes_copied,
            } => {
                if let Ok(progress) = reporter.lock() {
                    progress.finish_transfer(*copied, *failed, *bytes_copied);
                }
            }
        }
    };

    let result = execute_plan(&plan, &config, &mut outcome, Some(&progress_cb));

    let report_name = match config.mode {
        SyncMode::Mirror => ReportName::Fixed,
        SyncMode::ByDate => ReportName::Stamped(started_at),
    };
    let report_result = match write_report(&outcome.collisions, &config.destination, report_name)
    {
        Ok(path) => {
            outcome.report_path = path;
            Ok(())
        }
        Err(err) => {
            error!("{}", err);
            Err(err)
        }
    };

    println!("{}", format_outcome(&outcome));

    // An aborted copy outranks a failed report
    result?;
    if let Err(err) = report_result {
        if config.is_strict() {
            return Err(err);
        }
    }

    if outcome.is_complete() {
        info!(
            copied = outcome.copied,
            collisions = outcome.collisions.len(),
            "run finished"
        );
    } else {
        warn!(
            copied = outcome.copied,
            failed = outcome.failed(),
            "run finished with failures"
        );
    }
    Ok(outcome)
}

fn scan_with_progress(
    reporter: &Arc<Mutex<ProgressReporter>>,
    label: &'static str,
    root: &Path,
    config: &Config,
) -> Result<FileTree, SyncError> {
    if let Ok(progress) = reporter.lock() {
        progress.start_scan(label);
    }
    let on_progress: ProgressCallback = {
        let reporter = Arc::clone(reporter);
        Box::new(move |files: u64, bytes: u64| {
            if let Ok(progress) = reporter.lock() {
                progress.update_scan(label, files, bytes);
            }
        })
    };
    let tree = scan_directory(root, config, Some(&on_progress))?;
    if let Ok(progress) = reporter.lock() {
        progress.finish_scan(label, tree.total_files, tree.total_size);
    }
    info!(
        tree = label,
        files = tree.total_files,
        dirs = tree.total_dirs,
        "scan complete"
    );
    Ok(tree)
}

fn ensure_destination_root(destination: &Path) -> Result<(), SyncError> {
    if destination.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(destination).map_err(|e| SyncError::DestinationCreate {
        path: destination.to_path_buf(),
        source: e,
    })?;
    info!(path = %destination.display(), "created destination directory");
    Ok(())
}

fn print_plan_summary(plan: &CopyPlan) {
    println!("{}", format_plan_preview(plan));
}

fn format_plan_preview(plan: &CopyPlan) -> String {
    format!(
        "Plan:\n  Copy: {}  Skip: {}\n  Total bytes to copy: {}",
        plan.stats.copy_count,
        plan.stats.skip_count,
        HumanBytes(plan.stats.total_bytes)
    )
}

fn format_dry_run_actions(plan: &CopyPlan, dest_root: &Path) -> String {
    if plan.actions.is_empty() {
        return "Dry-run actions:\n  (no planned actions)".to_string();
    }

    let mut lines = Vec::with_capacity(plan.actions.len() + 2);
    lines.push("Dry-run actions:".to_string());
    for action in &plan.actions {
        lines.push(format!(
            "  COPY      {} -> {}",
            action.entry.path.display(),
            action.target_path(dest_root).display()
        ));
    }
    if plan.stats.skip_count > 0 {
        lines.push(format!(
            "  ({} existing file(s) omitted)",
            plan.stats.skip_count
        ));
    }
    lines.join("\n")
}

fn format_outcome(outcome: &RunOutcome) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} {} copied ({}), {} skipped, {} failed, {} renamed",
        style("Done:").bold(),
        outcome.copied,
        HumanBytes(outcome.bytes_copied),
        outcome.skipped,
        outcome.failed(),
        outcome.collisions.renamed_count()
    ));

    if !outcome.failures.is_empty() {
        lines.push(format_error_summary(&outcome.failures));
    }

    lines.push(format_collisions(&outcome.collisions));
    if let Some(path) = &outcome.report_path {
        lines.push(format!("Report saved to {}", path.display()));
    }
    lines.join("\n")
}

fn format_collisions(log: &CollisionLog) -> String {
    if log.is_empty() {
        return "No file was overwritten or renamed.".to_string();
    }

    let mut lines = Vec::with_capacity(log.len() + 1);
    lines.push(
        style("Files that already existed at the destination:")
            .yellow()
            .to_string(),
    );
    for record in log.records() {
        lines.push(format!("  {}", record));
    }
    lines.join("\n")
}

fn format_error_summary(failures: &[CopyFailure]) -> String {
    let mut groups: BTreeMap<&'static str, Vec<&CopyFailure>> = BTreeMap::new();
    for failure in failures {
        groups.entry(failure.kind).or_default().push(failure);
    }

    let mut lines = Vec::new();
    lines.push(style("Error summary:").red().to_string());
    for (kind, items) in groups {
        lines.push(format!("  {} ({}):", kind, items.len()));
        for failure in items.iter().take(3) {
            lines.push(format!("    - {}", failure.message));
            lines.push(format!("      Path: {}", failure.path.display()));
        }
        if items.len() > 3 {
            lines.push(format!("    - ... {} more", items.len() - 3));
        }
    }
    lines.join("\n")
}
