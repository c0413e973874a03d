// Library root
// -----------
// This crate imports a bluuit submission export (one JSON record per line)
// into a Lemmy instance. The binary (`main.rs`) wires the modules below
// into a command line tool.
//
// Module responsibilities:
// - `submission`: decodes and validates one line into a `Submission`.
// - `api`: the Lemmy HTTP client and the `LemmyApi` trait it implements.
// - `session`: logs in once and holds the resulting bearer token.
// - `mapper`: turns a `Submission` into a create-post request.
// - `source`: reads the input file line by line.
// - `pipeline`: drives a run from login to the last line, with cancellation.
// - `outcome` / `report`: per-line results, logging and the exit policy.
// - `cli` / `ui`: command line options and the password prompt.
pub mod api;
pub mod cli;
pub mod mapper;
pub mod outcome;
pub mod pipeline;
pub mod report;
pub mod session;
pub mod source;
pub mod submission;
pub mod ui;

pub use outcome::{ImportSummary, LineOutcome};
pub use pipeline::{import_file, run_import, ImportError, ImportOptions, SubmitMode};
pub use report::{ExitPolicy, LogReporter, Reporter};
pub use session::{Credentials, Session};
pub use submission::Submission;
