//! Console progress and run reports.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use comic_dl_core::{BookInfo, CatalogError, Chapter, ErrorRecord, RunObserver, RunOutcome};
use indicatif::{ProgressBar, ProgressStyle};

/// Process exit outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessExit {
    /// Every book finished or was already complete.
    Success,
    /// A storage or setup error stopped the run.
    Failure,
    /// A catalog could not be resolved.
    CatalogFailed,
    /// Some chapters or assets failed; re-run to retry them.
    Partial,
}

impl ProcessExit {
    /// Numeric process exit code.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::CatalogFailed => 2,
            Self::Partial => 3,
        }
    }

    /// Keeps the most severe of two outcomes, for multi-book update runs.
    #[must_use]
    pub fn worst(self, other: Self) -> Self {
        if other.severity() > self.severity() {
            other
        } else {
            self
        }
    }

    fn severity(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Partial => 1,
            Self::CatalogFailed => 2,
            Self::Failure => 3,
        }
    }
}

/// Maps a run outcome to the process exit outcome.
pub fn determine_exit_outcome(outcome: &RunOutcome) -> ProcessExit {
    match outcome {
        RunOutcome::AlreadyComplete { .. } | RunOutcome::AllComplete { .. } => ProcessExit::Success,
        RunOutcome::CatalogParseFailed { .. } => ProcessExit::CatalogFailed,
        RunOutcome::CompleteWithErrors { .. } => ProcessExit::Partial,
    }
}

/// Drives one chapter progress bar from run callbacks.
pub struct ConsoleObserver {
    quiet: bool,
    bar: Mutex<Option<ProgressBar>>,
}

impl ConsoleObserver {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            bar: Mutex::new(None),
        }
    }

    fn finish_bar(&self) {
        if let Ok(mut bar) = self.bar.lock()
            && let Some(bar) = bar.take()
        {
            bar.finish_and_clear();
        }
    }

    fn say(&self, line: &str) {
        if !self.quiet {
            println!("{line}");
        }
    }
}

impl RunObserver for ConsoleObserver {
    fn catalog_resolution_failed(&self, target_ref: &str, error: &CatalogError) {
        eprintln!("Could not read the catalog of {target_ref}: {error}");
    }

    fn run_was_interrupted(&self, interrupted: bool) {
        if interrupted {
            self.say("Previous download was interrupted, resuming");
        }
    }

    fn run_started(&self, book: &BookInfo, remaining: usize) {
        self.say(&format!(
            "{}: {remaining} of {} chapters to download",
            book.name,
            book.chapters.len()
        ));
        if self.quiet {
            return;
        }
        let bar = ProgressBar::new(remaining as u64);
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.set_message(book.name.clone());
        if let Ok(mut slot) = self.bar.lock() {
            *slot = Some(bar);
        }
    }

    fn chapter_finished(&self, chapter: &Chapter, recorded: bool) {
        if let Ok(slot) = self.bar.lock()
            && let Some(bar) = slot.as_ref()
        {
            if !recorded {
                bar.println(format!("  failed: {}", chapter.raw_name));
            }
            bar.inc(1);
        }
    }

    fn run_finished_with_errors(
        &self,
        book: &BookInfo,
        attempted: &[Chapter],
        errors: &[ErrorRecord],
    ) {
        self.finish_bar();
        let report = error_report_lines(errors);
        eprintln!(
            "{}: {} of {} chapters incomplete, run again to retry",
            book.name,
            report.chapters,
            attempted.len()
        );
        for line in report.lines {
            eprintln!("{line}");
        }
    }

    fn run_finished_success(&self, book_name: &str, book_dir: &Path, attempted: Option<&[Chapter]>) {
        self.finish_bar();
        match attempted {
            Some(chapters) => self.say(&format!(
                "{book_name}: downloaded {} chapters to {}",
                chapters.len(),
                book_dir.display()
            )),
            None => self.say(&format!("{book_name}: already up to date")),
        }
    }
}

/// Error records grouped by chapter, ready to print.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ErrorReport {
    /// Distinct chapters with at least one error.
    pub chapters: usize,
    pub lines: Vec<String>,
}

/// Groups error records by chapter in catalog order.
pub fn error_report_lines(errors: &[ErrorRecord]) -> ErrorReport {
    let mut by_chapter: BTreeMap<usize, (&str, Vec<&ErrorRecord>)> = BTreeMap::new();
    for error in errors {
        by_chapter
            .entry(error.chapter.index)
            .or_insert_with(|| (error.chapter.raw_name.as_str(), Vec::new()))
            .1
            .push(error);
    }

    let mut lines = Vec::new();
    for (title, records) in by_chapter.values() {
        lines.push(format!("  {title}"));
        for record in records {
            match &record.asset_url {
                Some(url) => lines.push(format!("    {url}: {}", record.reason)),
                None => lines.push(format!("    {}", record.reason)),
            }
        }
    }

    ErrorReport {
        chapters: by_chapter.len(),
        lines,
    }
}
