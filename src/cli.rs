// Command line surface. Every option except the input path can also come
// from the environment (or a `.env` file loaded at startup).

use clap::Parser;
use std::path::PathBuf;

use crate::api::CommunityId;
use crate::pipeline::SubmitMode;
use crate::report::ExitPolicy;

#[derive(Debug, Parser)]
#[command(
    name = "bluuit-importer",
    version,
    about = "imports bluuit data into a lemmy instance"
)]
pub struct Cli {
    /// Path to the input file (one JSON submission per line)
    #[arg(short, long, value_name = "PATH")]
    pub input: PathBuf,

    /// Username or email of the lemmy admin
    #[arg(short, long, env = "LEMMY_USER")]
    pub user: String,

    /// URL of the lemmy instance
    #[arg(short, long, value_name = "URL", env = "LEMMY_URL")]
    pub lemmy: String,

    /// Id of the community posts are created in
    #[arg(short, long, value_name = "ID", env = "LEMMY_COMMUNITY_ID")]
    pub community_id: i32,

    /// Fail instead of prompting when LEMMY_PASSWORD is not set
    #[arg(long)]
    pub no_prompt: bool,

    /// Log the posts that would be created without creating them
    #[arg(long)]
    pub dry_run: bool,

    /// Exit non-zero if any line could not be imported
    #[arg(long)]
    pub strict: bool,

    /// Show debug logs
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only show errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    pub fn community_id(&self) -> CommunityId {
        CommunityId(self.community_id)
    }

    pub fn mode(&self) -> SubmitMode {
        if self.dry_run {
            SubmitMode::DryRun
        } else {
            SubmitMode::Submit
        }
    }

    pub fn exit_policy(&self) -> ExitPolicy {
        ExitPolicy {
            fail_on_line_errors: self.strict,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_flags() {
        let cli = Cli::try_parse_from([
            "bluuit-importer",
            "-i",
            "export.jsonl",
            "-u",
            "admin",
            "-l",
            "https://lemmy.test",
            "-c",
            "4",
            "--dry-run",
        ])
        .unwrap();
        assert_eq!(cli.input, PathBuf::from("export.jsonl"));
        assert_eq!(cli.community_id(), CommunityId(4));
        assert_eq!(cli.mode(), SubmitMode::DryRun);
        assert!(!cli.exit_policy().fail_on_line_errors);
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        let result = Cli::try_parse_from([
            "bluuit-importer",
            "-i",
            "x",
            "-u",
            "a",
            "-l",
            "http://l",
            "-c",
            "1",
            "-v",
            "-q",
        ]);
        assert!(result.is_err());
    }
}
