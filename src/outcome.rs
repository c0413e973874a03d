// Per-line results of an import run and the running tally over them.

use crate::api::{ApiError, CreatePost};
use crate::submission::{DecodeError, Submission, ValidationError};

/// What happened to one input line.
#[derive(Debug)]
pub enum LineOutcome {
    /// The post was created. `post_id` is the id Lemmy assigned and
    /// `post_url` its federated URL, when the instance returned one.
    Success {
        submission: Submission,
        post_id: i64,
        post_url: Option<String>,
    },
    DecodeError(DecodeError),
    ValidationError(ValidationError),
    SubmitError {
        submission: Submission,
        cause: ApiError,
    },
    /// Dry run: the request that would have been sent.
    Previewed { request: CreatePost },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    Success,
    DecodeError,
    ValidationError,
    SubmitError,
    Previewed,
}

impl LineOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            LineOutcome::Success { .. } => OutcomeKind::Success,
            LineOutcome::DecodeError(_) => OutcomeKind::DecodeError,
            LineOutcome::ValidationError(_) => OutcomeKind::ValidationError,
            LineOutcome::SubmitError { .. } => OutcomeKind::SubmitError,
            LineOutcome::Previewed { .. } => OutcomeKind::Previewed,
        }
    }
}

/// Counts over a finished (or cancelled) run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub lines: usize,
    pub posted: usize,
    pub previewed: usize,
    pub decode_errors: usize,
    pub validation_errors: usize,
    pub submit_errors: usize,
    /// The run stopped early because cancellation was requested.
    pub cancelled: bool,
}

impl ImportSummary {
    pub fn record(&mut self, kind: OutcomeKind) {
        self.lines += 1;
        match kind {
            OutcomeKind::Success => self.posted += 1,
            OutcomeKind::Previewed => self.previewed += 1,
            OutcomeKind::DecodeError => self.decode_errors += 1,
            OutcomeKind::ValidationError => self.validation_errors += 1,
            OutcomeKind::SubmitError => self.submit_errors += 1,
        }
    }

    pub fn failures(&self) -> usize {
        self.decode_errors + self.validation_errors + self.submit_errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tallies_by_kind() {
        let mut summary = ImportSummary::default();
        for kind in [
            OutcomeKind::Success,
            OutcomeKind::Success,
            OutcomeKind::DecodeError,
            OutcomeKind::SubmitError,
            OutcomeKind::ValidationError,
        ] {
            summary.record(kind);
        }
        assert_eq!(summary.lines, 5);
        assert_eq!(summary.posted, 2);
        assert_eq!(summary.failures(), 3);
    }
}
