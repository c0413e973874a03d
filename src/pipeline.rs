// Import pipeline: authenticate once, then stream the input line by line
// through decode -> map -> submit. A failing line produces an outcome and
// the loop moves on; only a missing input, a failed login or a broken read
// end the run early. Lines are processed strictly one after another and
// outcomes reach the reporter in input order.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncBufRead;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::api::{ApiError, CommunityId, LemmyApi};
use crate::mapper::to_create_post;
use crate::outcome::{ImportSummary, LineOutcome};
use crate::report::Reporter;
use crate::session::{self, AuthError, Credentials, Session};
use crate::source::LineSource;
use crate::submission::{self, RecordError};

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("cannot open input {}: {source}", .path.display())]
    InputUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("reading input failed after line {line}: {source}")]
    InputRead {
        line: usize,
        #[source]
        source: io::Error,
    },

    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),
}

/// Whether posts are actually created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubmitMode {
    #[default]
    Submit,
    /// Log the requests that would be sent instead of sending them.
    DryRun,
}

/// Everything one run needs besides the input and the transport.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub base_url: String,
    pub credentials: Credentials,
    pub community_id: CommunityId,
    pub mode: SubmitMode,
}

/// Open `input` and run the import against it.
pub async fn import_file<A, C, R>(
    input: &Path,
    connect: C,
    options: &ImportOptions,
    reporter: &mut R,
    cancel: &CancellationToken,
) -> Result<ImportSummary, ImportError>
where
    A: LemmyApi,
    C: FnOnce(Url) -> Result<A, ApiError>,
    R: Reporter,
{
    let source = LineSource::open(input).await?;
    run_import(source, connect, options, reporter, cancel).await
}

/// Run the import over an already opened line source. The source is closed
/// on every return path.
pub async fn run_import<S, A, C, R>(
    mut source: LineSource<S>,
    connect: C,
    options: &ImportOptions,
    reporter: &mut R,
    cancel: &CancellationToken,
) -> Result<ImportSummary, ImportError>
where
    S: AsyncBufRead + Unpin,
    A: LemmyApi,
    C: FnOnce(Url) -> Result<A, ApiError>,
    R: Reporter,
{
    let (api, session) =
        match session::authenticate(connect, &options.base_url, &options.credentials).await {
            Ok(authenticated) => authenticated,
            Err(error) => {
                tracing::error!(input = %source.label(), "closing input due to authentication error");
                source.close();
                return Err(error.into());
            }
        };

    reporter.started(&session, options.mode);

    let mut summary = ImportSummary::default();
    loop {
        if cancel.is_cancelled() {
            summary.cancelled = true;
            break;
        }

        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                summary.cancelled = true;
                break;
            }
            next = source.next_line() => next,
        };

        let raw = match next {
            Ok(Some(raw)) => raw,
            Ok(None) => break,
            Err(error) => {
                let line = source.lines_read();
                source.close();
                reporter.finish(&summary);
                return Err(ImportError::InputRead {
                    line,
                    source: error,
                });
            }
        };

        let line_number = source.lines_read();
        let outcome = process_line(&api, &session, options, &raw).await;
        summary.record(outcome.kind());
        reporter.report(line_number, outcome);
    }

    source.close();
    reporter.finish(&summary);
    Ok(summary)
}

async fn process_line<A: LemmyApi>(
    api: &A,
    session: &Session,
    options: &ImportOptions,
    raw: &[u8],
) -> LineOutcome {
    let submission = match submission::decode_bytes(raw) {
        Ok(submission) => submission,
        Err(RecordError::Decode(error)) => return LineOutcome::DecodeError(error),
        Err(RecordError::Validation(error)) => return LineOutcome::ValidationError(error),
    };

    let request = to_create_post(&submission, session, options.community_id);
    if options.mode == SubmitMode::DryRun {
        return LineOutcome::Previewed { request };
    }

    match api.create_post(&request).await {
        Ok(response) => LineOutcome::Success {
            submission,
            post_id: response.post_view.post.id,
            post_url: response.post_view.post.ap_id,
        },
        Err(cause) => LineOutcome::SubmitError { submission, cause },
    }
}
