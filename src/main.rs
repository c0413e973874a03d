// Entrypoint for the importer.
// - Opens the input before asking for a password so a typo in the path
//   fails immediately.
// - Ctrl-C cancels the run between lines; the input is closed and the
//   process exits non-zero.
// - An unanswered password prompt exits the process after one minute.

use std::process::ExitCode;

use bluuit_importer::api::LemmyClient;
use bluuit_importer::cli::Cli;
use bluuit_importer::source::LineSource;
use bluuit_importer::ui::{PasswordSource, PromptTimedOut};
use bluuit_importer::{run_import, Credentials, ImportOptions, LogReporter};
use clap::Parser;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("bluuit-importer error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let source = LineSource::open(&cli.input).await?;

    let password_source = if cli.no_prompt {
        PasswordSource::EnvOnly
    } else {
        PasswordSource::EnvOrPrompt
    };
    let password = match password_source.acquire_async(cli.user.clone()).await {
        Ok(password) => password,
        // The prompt thread is still blocked on stdin and would keep the
        // runtime from shutting down, so leave right away.
        Err(error) if error.is::<PromptTimedOut>() => {
            eprintln!("bluuit-importer error: {error}");
            std::process::exit(1);
        }
        Err(error) => return Err(error),
    };

    let options = ImportOptions {
        base_url: cli.lemmy.clone(),
        credentials: Credentials::new(cli.user.clone(), password),
        community_id: cli.community_id(),
        mode: cli.mode(),
    };

    let cancel = CancellationToken::new();
    let watcher = cancel.clone();
    tokio::spawn(async move {
        // Reported by the reporter's summary once the current line is done.
        if tokio::signal::ctrl_c().await.is_ok() {
            watcher.cancel();
        }
    });

    let mut reporter = LogReporter::new(!cli.quiet);
    let summary = run_import(source, LemmyClient::new, &options, &mut reporter, &cancel).await?;

    Ok(ExitCode::from(cli.exit_policy().exit_code(&summary)))
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("BLUUIT_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
