//! Terminal progress display.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use patentfetch_retrieval::events::{RetrievalObserver, StatusKind};
use patentfetch_retrieval::BatchSummary;

/// Renders pipeline callbacks as an indicatif bar: log lines scroll above
/// it, the status line is the bar message.
pub struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    pub fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Self { bar }
    }

    pub fn finish(&self, summary: &BatchSummary) {
        let text = format!("{}/{} successful", summary.successful, summary.total);
        if summary.cancelled {
            self.bar.abandon_with_message(format!("{} {}", style("■").yellow(), text));
        } else {
            self.bar.finish_with_message(format!("{} {}", style("✓").green(), text));
        }
    }
}

fn decorate(text: &str, kind: StatusKind) -> String {
    match kind {
        StatusKind::Info        => style(text).dim().to_string(),
        StatusKind::Downloading => format!("{} {}", style("↓").cyan(), text),
        StatusKind::Success     => format!("{} {}", style("✓").green(), text),
        StatusKind::Error       => format!("{} {}", style("✗").red(), style(text).red()),
        StatusKind::Complete    => style(text).green().bold().to_string(),
    }
}

impl RetrievalObserver for ProgressObserver {
    fn on_progress(&self, current: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(current as u64);
    }

    fn on_log_line(&self, line: &str) {
        self.bar.println(line);
    }

    fn on_status(&self, text: &str, kind: StatusKind) {
        self.bar.set_message(decorate(text, kind));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_moves_bar() {
        let obs = ProgressObserver::new(5);
        obs.on_progress(3, 5);
        assert_eq!(obs.bar.position(), 3);
        assert_eq!(obs.bar.length(), Some(5));
    }

    #[test]
    fn test_status_text_is_kept() {
        console::set_colors_enabled(false);
        assert_eq!(decorate("Saved US1", StatusKind::Success), "✓ Saved US1");
        assert_eq!(decorate("Starting", StatusKind::Info), "Starting");
    }
}
