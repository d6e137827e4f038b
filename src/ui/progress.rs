//! Progress bars for the scan and copy phases

use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::{Duration, Instant};

/// Drives one spinner while trees are scanned and one bar while files copy
pub struct ProgressReporter {
    scan_bar: ProgressBar,
    copy_bar: ProgressBar,
    copy_started_at: Option<Instant>,
    copied_bytes: u64,
    renamed: usize,
}

impl ProgressReporter {
    /// Create a new progress reporter.
    ///
    /// Bars are drawn only when `enabled` and stderr is a terminal; otherwise
    /// they still count but render nothing, leaving the log stream clean.
    pub fn new(enabled: bool) -> Self {
        let visible = enabled && console::Term::stderr().is_term();

        let scan_bar = if visible {
            let bar = ProgressBar::new_spinner();
            bar.enable_steady_tick(Duration::from_millis(120));
            bar
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            scan_bar.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
        }

        let copy_bar = if visible {
            ProgressBar::new(0)
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) =
            ProgressStyle::with_template("{bar:30.green/white} {pos}/{len} | {msg}")
        {
            copy_bar.set_style(style.progress_chars("##-"));
        }

        Self {
            scan_bar,
            copy_bar,
            copy_started_at: None,
            copied_bytes: 0,
            renamed: 0,
        }
    }

    pub fn start_scan(&self, tree: &str) {
        self.scan_bar.set_message(format!("Listing {} tree...", tree));
    }

    pub fn update_scan(&self, tree: &str, files: u64, bytes: u64) {
        self.scan_bar.set_message(format!(
            "Listing {} tree: {} files, {}",
            tree,
            files,
            HumanBytes(bytes)
        ));
    }

    pub fn finish_scan(&self, tree: &str, files: usize, bytes: u64) {
        self.scan_bar.finish_with_message(format!(
            "{} tree: {} files, {}",
            tree,
            files,
            HumanBytes(bytes)
        ));
    }

    /// Reset counters for a plan of `planned` files.
    pub fn start_transfer(&mut self, planned: u64) {
        self.copy_started_at = Some(Instant::now());
        self.copied_bytes = 0;
        self.renamed = 0;
        self.copy_bar.set_length(planned);
        self.copy_bar.set_position(0);
        self.copy_bar.set_message("starting".to_string());
    }

    pub fn set_current_file(&self, path: &Path) {
        self.copy_bar.set_message(path.display().to_string());
    }

    /// One file landed; `renamed` when it had to take a `name(n)` form.
    pub fn complete_transfer_file(&mut self, bytes: u64, renamed: bool) {
        self.copied_bytes = self.copied_bytes.saturating_add(bytes);
        if renamed {
            self.renamed += 1;
        }
        self.copy_bar.inc(1);
        self.copy_bar.set_message(self.status_line());
    }

    /// Count a failed file and print it above the bar.
    pub fn transfer_error(&self, path: &Path, err: &str) {
        self.copy_bar.inc(1);
        self.copy_bar
            .println(format!("FAILED {}: {}", path.display(), err));
    }

    pub fn finish_transfer(&self, copied: usize, failed: usize, bytes: u64) {
        self.copy_bar.finish_with_message(format!(
            "{} copied, {} renamed, {} failed | {} at {}/s",
            copied,
            self.renamed,
            failed,
            HumanBytes(bytes),
            HumanBytes(self.bytes_per_second())
        ));
    }

    fn status_line(&self) -> String {
        let mut line = format!(
            "{} | {}/s",
            HumanBytes(self.copied_bytes),
            HumanBytes(self.bytes_per_second())
        );
        if self.renamed > 0 {
            line.push_str(&format!(" | {} renamed", self.renamed));
        }
        line
    }

    fn bytes_per_second(&self) -> u64 {
        let Some(started) = self.copy_started_at else {
            return 0;
        };
        let secs = started.elapsed().as_secs_f64();
        if secs > 0.0 {
            (self.copied_bytes as f64 / secs) as u64
        } else {
            0
        }
    }
}
