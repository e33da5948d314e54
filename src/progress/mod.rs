// Progress reporting for ingestion.
// Notifications are advisory; nothing in the pipeline depends on them.


use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::documents::DocumentOutcome;

/// Receives ingestion progress notifications
pub trait ProgressReporter: Send + Sync {
    /// A document is about to be fetched; `index` is zero-based
    fn document_started(&self, _name: &str, _index: usize, _total: usize) {}

    fn document_finished(&self, _name: &str, _outcome: &DocumentOutcome) {}

    /// Emitted before each embedding batch with the batch offset, and once more
    /// with `done == total` after the last batch
    fn embedding_progress(&self, _done: usize, _total: usize) {}

    fn finished(&self) {}
}

/// Discards every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {}

/// Terminal progress bar; hidden when stderr is not attended
#[derive(Debug)]
pub struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    #[inline]
    pub fn new() -> Self {
        let bar = if console::user_attended_stderr() {
            ProgressBar::new(0).with_style(
                ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
                    .expect("style template is valid")
                    .progress_chars("=> "),
            )
        } else {
            ProgressBar::hidden()
        };
        Self { bar }
    }
}

impl Default for TerminalProgress {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for TerminalProgress {
    fn document_started(&self, name: &str, index: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(index as u64);
        self.bar.set_message(format!("Processing {name}..."));
    }

    fn document_finished(&self, name: &str, outcome: &DocumentOutcome) {
        let line = match outcome {
            DocumentOutcome::Loaded { chars } => {
                format!("{} {} ({} chars)", style("✓").green(), name, chars)
            }
            DocumentOutcome::Skipped { reason } => {
                format!("{} {} ({})", style("-").dim(), name, reason)
            }
            DocumentOutcome::Failed { reason } => {
                format!("{} {}: {}", style("✗").red(), name, style(reason).red())
            }
        };
        self.bar.println(line);
        self.bar.inc(1);
    }

    fn embedding_progress(&self, done: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(done as u64);
        self.bar
            .set_message(format!("Generating embeddings ({done}/{total})"));
    }

    fn finished(&self) {
        self.bar.finish_with_message("Processing complete");
    }
}
