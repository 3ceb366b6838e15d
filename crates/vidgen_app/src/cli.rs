use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use engine_logging::LogDestination;
use vidgen_core::{AssetCategory, PollSettings};
use vidgen_engine::DEFAULT_API_URL;

#[derive(Debug, Parser)]
#[command(
    name = "vidgen",
    version,
    about = "Create, watch and collect jobs on a video generation backend"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Base URL of the backend.
    #[arg(long, env = "VIDGEN_API_URL", default_value = DEFAULT_API_URL, global = true)]
    pub api_url: String,

    /// Directory holding the remembered selection and the log file.
    #[arg(long, env = "VIDGEN_STATE_DIR", global = true)]
    pub state_dir: Option<PathBuf>,

    /// Delay between status polls while watching a job.
    #[arg(
        long,
        env = "VIDGEN_POLL_INTERVAL_MS",
        default_value_t = PollSettings::DEFAULT_INTERVAL_MS,
        global = true
    )]
    pub poll_interval_ms: u64,

    #[arg(long, env = "VIDGEN_REQUEST_TIMEOUT_SECS", default_value_t = 15, global = true)]
    pub request_timeout_secs: u64,

    #[arg(long, value_enum, default_value_t = LogTarget::Terminal, global = true)]
    pub log: LogTarget,

    /// Raise log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogTarget {
    Terminal,
    File,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::File => LogDestination::File,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Check that the backend answers.
    Test,
    /// Show the rendering tool version reported by the backend.
    ToolVersion,
    /// Upload a reference file.
    Upload { file: PathBuf },
    /// List known jobs.
    Jobs,
    /// Submit a new job.
    Create {
        prompt: String,
        /// Target length in seconds.
        #[arg(long)]
        duration: Option<u32>,
        #[arg(long)]
        style: Option<String>,
        /// Keep polling the new job until it settles.
        #[arg(long)]
        watch: bool,
    },
    /// Print the current status of a job once.
    Status { job_id: String },
    /// Poll a job until it reaches a final state. Defaults to the last selected job.
    Watch { job_id: Option<String> },
    Cancel { job_id: String },
    /// Print the generated script.
    Script { job_id: String },
    /// List generated assets by category.
    Assets { job_id: String },
    DownloadVideo {
        job_id: String,
        /// Target directory.
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
    DownloadAsset {
        job_id: String,
        #[arg(value_parser = parse_category)]
        category: AssetCategory,
        filename: String,
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
}

fn parse_category(value: &str) -> Result<AssetCategory, String> {
    AssetCategory::from_key(value)
        .ok_or_else(|| format!("unknown asset category `{value}` (images, audio, models, videos)"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_create_with_options() {
        let cli = Cli::try_parse_from([
            "vidgen",
            "--api-url",
            "http://backend:5000",
            "create",
            "a sunrise",
            "--duration",
            "10",
            "--watch",
        ])
        .unwrap();
        assert_eq!(cli.global.api_url, "http://backend:5000");
        match cli.command {
            Command::Create {
                prompt,
                duration,
                style,
                watch,
            } => {
                assert_eq!(prompt, "a sunrise");
                assert_eq!(duration, Some(10));
                assert_eq!(style, None);
                assert!(watch);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::try_parse_from(["vidgen", "watch", "-vv", "--log", "both"]).unwrap();
        assert_eq!(cli.global.verbose, 2);
        assert_eq!(cli.global.log, LogTarget::Both);
        assert!(matches!(cli.command, Command::Watch { job_id: None }));
    }

    #[test]
    fn asset_category_is_validated() {
        let ok = Cli::try_parse_from(["vidgen", "download-asset", "abc", "Images", "sky.png"]);
        assert!(ok.is_ok());
        let err = Cli::try_parse_from(["vidgen", "download-asset", "abc", "fonts", "a.ttf"]);
        assert!(err.is_err());
    }
}
