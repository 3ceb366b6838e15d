use std::path::PathBuf;
use std::time::Duration;

use engine_logging::LogDestination;
use log::LevelFilter;
use thiserror::Error;
use url::Url;
use vidgen_core::PollSettings;
use vidgen_engine::BackendSettings;

use crate::cli::GlobalArgs;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid api url `{url}`: {reason}")]
    InvalidApiUrl { url: String, reason: String },
    #[error("api url must use http or https, got `{0}`")]
    UnsupportedScheme(String),
    #[error("poll interval {value}ms is outside {min}..={max}ms")]
    PollIntervalOutOfRange { value: u64, min: u64, max: u64 },
    #[error("request timeout must be at least one second")]
    ZeroTimeout,
}

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_url: Url,
    pub state_dir: PathBuf,
    pub poll: PollSettings,
    pub request_timeout: Duration,
    pub log_destination: LogDestination,
    pub log_level: LevelFilter,
}

impl AppConfig {
    pub fn from_args(args: &GlobalArgs) -> Result<Self, ConfigError> {
        let raw_url = args.api_url.trim();
        let api_url = Url::parse(raw_url).map_err(|err| ConfigError::InvalidApiUrl {
            url: raw_url.to_string(),
            reason: err.to_string(),
        })?;
        if !matches!(api_url.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme(api_url.scheme().to_string()));
        }

        let interval = args.poll_interval_ms;
        if !(PollSettings::MIN_INTERVAL_MS..=PollSettings::MAX_INTERVAL_MS).contains(&interval) {
            return Err(ConfigError::PollIntervalOutOfRange {
                value: interval,
                min: PollSettings::MIN_INTERVAL_MS,
                max: PollSettings::MAX_INTERVAL_MS,
            });
        }
        if args.request_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        let state_dir = match &args.state_dir {
            Some(dir) => dir.clone(),
            None => PathBuf::from("."),
        };
        let log_level = match args.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };

        Ok(Self {
            api_url,
            state_dir,
            poll: PollSettings::with_interval_ms(interval),
            request_timeout: Duration::from_secs(args.request_timeout_secs),
            log_destination: args.log.into(),
            log_level,
        })
    }

    pub fn backend_settings(&self) -> BackendSettings {
        BackendSettings {
            base_url: self.api_url.to_string(),
            request_timeout: self.request_timeout,
            ..BackendSettings::default()
        }
    }
}
