// Outcome reporter: receives every line's outcome as it happens and turns
// the finished run into a process exit code. Each failure is logged on its
// own with the raw line, so it can be fixed and replayed individually.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::outcome::{ImportSummary, LineOutcome};
use crate::pipeline::SubmitMode;
use crate::session::Session;

/// Sink for per-line outcomes, called in input order.
pub trait Reporter {
    /// Called once after login, before the first line is read.
    fn started(&mut self, _session: &Session, _mode: SubmitMode) {}

    fn report(&mut self, line_number: usize, outcome: LineOutcome);

    /// Called once when the run ends, including after cancellation.
    fn finish(&mut self, _summary: &ImportSummary) {}
}

/// Decides which runs count as failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExitPolicy {
    /// Also fail when individual lines could not be imported.
    pub fail_on_line_errors: bool,
}

impl ExitPolicy {
    pub fn exit_code(&self, summary: &ImportSummary) -> u8 {
        if summary.cancelled || (self.fail_on_line_errors && summary.failures() > 0) {
            1
        } else {
            0
        }
    }
}

/// Reporter that writes outcomes through `tracing` and keeps a spinner
/// ticking between log lines. The spinner only starts once the import
/// begins, so login logs are never drawn over.
pub struct LogReporter {
    show_progress: bool,
    spinning: bool,
    progress: ProgressBar,
}

impl LogReporter {
    pub fn new(show_progress: bool) -> Self {
        LogReporter {
            show_progress,
            spinning: false,
            progress: ProgressBar::hidden(),
        }
    }

    pub fn is_spinning(&self) -> bool {
        self.spinning
    }
}

fn spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} ({elapsed})") {
        spinner.set_style(style);
    }
    spinner.set_message("Importing...");
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

impl Reporter for LogReporter {
    fn started(&mut self, session: &Session, mode: SubmitMode) {
        tracing::info!(instance = %session.base_url(), "starting import");
        if mode == SubmitMode::DryRun {
            tracing::info!("dry run: no posts will be created");
        }
        if self.show_progress {
            self.progress = spinner();
            self.spinning = true;
        }
    }

    fn report(&mut self, line_number: usize, outcome: LineOutcome) {
        // Hide the spinner while the log line is written.
        self.progress.suspend(|| log_outcome(line_number, &outcome));
        self.progress.inc(1);
        self.progress
            .set_message(format!("Importing... {line_number} lines processed"));
    }

    fn finish(&mut self, summary: &ImportSummary) {
        self.progress.finish_and_clear();
        self.spinning = false;
        if summary.cancelled {
            tracing::warn!(
                lines = summary.lines,
                posted = summary.posted,
                failed = summary.failures(),
                "import cancelled, remaining lines were not read"
            );
        } else {
            tracing::info!(
                lines = summary.lines,
                posted = summary.posted,
                previewed = summary.previewed,
                decode_errors = summary.decode_errors,
                validation_errors = summary.validation_errors,
                submit_errors = summary.submit_errors,
                "import finished"
            );
        }
    }
}

fn log_outcome(line: usize, outcome: &LineOutcome) {
    match outcome {
        LineOutcome::Success {
            submission,
            post_id,
            post_url,
        } => tracing::info!(
            line,
            id = %submission.id,
            post_id,
            post_url = post_url.as_deref().unwrap_or("-"),
            "imported \"{}\"",
            submission.title
        ),
        LineOutcome::Previewed { request } => tracing::info!(
            line,
            community_id = %request.community_id,
            url = request.url.as_deref().unwrap_or("-"),
            body = %request.body,
            nsfw = request.nsfw,
            "would post \"{}\"",
            request.name
        ),
        LineOutcome::DecodeError(error) => tracing::warn!(
            line,
            raw = %error.line,
            error = %error,
            "skipping line that is not a JSON record"
        ),
        LineOutcome::ValidationError(error) => tracing::warn!(
            line,
            raw = %error.line,
            error = %error,
            "skipping record with invalid fields"
        ),
        LineOutcome::SubmitError { submission, cause } => tracing::error!(
            line,
            id = %submission.id,
            permalink = %submission.permalink,
            error = %cause,
            "failed to create post \"{}\"",
            submission.title
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::test_session;

    #[test]
    fn spinner_waits_for_import_start() {
        let mut reporter = LogReporter::new(true);
        assert!(!reporter.is_spinning());
        reporter.started(&test_session("jwt"), SubmitMode::Submit);
        assert!(reporter.is_spinning());
        reporter.finish(&ImportSummary::default());
        assert!(!reporter.is_spinning());
    }

    #[test]
    fn quiet_reporter_never_spins() {
        let mut reporter = LogReporter::new(false);
        reporter.started(&test_session("jwt"), SubmitMode::DryRun);
        assert!(!reporter.is_spinning());
    }

    #[test]
    fn completed_run_exits_zero_despite_line_errors_by_default() {
        let summary = ImportSummary {
            lines: 3,
            posted: 1,
            submit_errors: 1,
            decode_errors: 1,
            ..Default::default()
        };
        assert_eq!(ExitPolicy::default().exit_code(&summary), 0);
    }

    #[test]
    fn strict_policy_fails_on_line_errors() {
        let policy = ExitPolicy {
            fail_on_line_errors: true,
        };
        let clean = ImportSummary {
            lines: 2,
            posted: 2,
            ..Default::default()
        };
        let dirty = ImportSummary {
            lines: 2,
            posted: 1,
            validation_errors: 1,
            ..Default::default()
        };
        assert_eq!(policy.exit_code(&clean), 0);
        assert_eq!(policy.exit_code(&dirty), 1);
    }

    #[test]
    fn cancelled_run_always_fails() {
        let summary = ImportSummary {
            lines: 1,
            posted: 1,
            cancelled: true,
            ..Default::default()
        };
        assert_eq!(ExitPolicy::default().exit_code(&summary), 1);
    }
}
