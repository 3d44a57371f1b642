//! Runtime configuration, read from the environment (and `.env`).

use std::path::PathBuf;
use std::time::Duration;

use crate::error::MirrorError;
use crate::logging::LogFormat;
use crate::model::ItemType;

/// Default state file, relative to the working directory.
pub const DEFAULT_STATE_FILE: &str = "github_tracking.json";

/// Default reconciliation interval.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(300);

/// Default operator command polling interval.
pub const DEFAULT_COMMAND_POLL: Duration = Duration::from_secs(10);

/// Public GitHub REST API base.
pub const GITHUB_API_BASE: &str = "https://api.github.com";

/// Public Discord REST API base.
pub const DISCORD_API_BASE: &str = "https://discord.com/api/v10";

/// What a failed fetch means for the item type's tracked messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchFailurePolicy {
    /// Leave the item type untouched until the next pass.
    #[default]
    Skip,
    /// Treat the failure as "no open items": every tracked message is
    /// deleted.
    TreatAsEmpty,
}

impl FetchFailurePolicy {
    fn parse(raw: &str) -> Result<Self, MirrorError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "empty" | "treat_as_empty" => Ok(Self::TreatAsEmpty),
            other => Err(MirrorError::Config(format!(
                "MIRROR_FETCH_FAILURE must be `skip` or `empty`, got `{other}`"
            ))),
        }
    }
}

/// Destination channel ids, one per item type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destinations {
    /// Channel receiving issue summaries.
    pub issues: String,
    /// Channel receiving pull request summaries.
    pub prs: String,
}

impl Destinations {
    /// Channel id configured for an item type.
    #[must_use]
    pub fn channel_for(&self, item_type: ItemType) -> &str {
        match item_type {
            ItemType::Issue => &self.issues,
            ItemType::PullRequest => &self.prs,
        }
    }
}

/// Everything the mirror needs to run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Discord bot token; required by the live channel gateway.
    pub discord_token: Option<String>,
    /// GitHub token; unauthenticated requests when absent.
    pub github_token: Option<String>,
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Destination channels.
    pub destinations: Destinations,
    /// Reserved for build-status notifications; not used yet.
    pub build_channel: Option<String>,
    /// Channel polled for operator commands.
    pub command_channel: Option<String>,
    /// Path of the tracking state file.
    pub state_file: PathBuf,
    /// Time between reconciliation passes.
    pub interval: Duration,
    /// Time between command channel polls.
    pub command_poll: Duration,
    /// How fetch failures are handled.
    pub fetch_failure: FetchFailurePolicy,
    /// GitHub REST API base URL.
    pub github_api: String,
    /// Discord REST API base URL.
    pub discord_api: String,
    /// Directory for recorded cassettes, when recording.
    pub record_dir: Option<PathBuf>,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Config {
    /// Loads `.env` (if present) and reads the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::Config`] when a required variable is missing or
    /// a value cannot be parsed.
    pub fn from_env() -> Result<Self, MirrorError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::Config`] when a required key is missing or a
    /// value cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, MirrorError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |key: &str| {
            get(key).ok_or_else(|| MirrorError::Config(format!("{key} is not set")))
        };
        let channel = |key: &str, value: String| -> Result<String, MirrorError> {
            value.parse::<u64>().map(|_| value.clone()).map_err(|_| {
                MirrorError::Config(format!("{key} must be a numeric channel id, got `{value}`"))
            })
        };
        let seconds = |key: &str, default: Duration| -> Result<Duration, MirrorError> {
            get(key).map_or(Ok(default), |raw| match raw.parse::<u64>() {
                Ok(0) | Err(_) => Err(MirrorError::Config(format!(
                    "{key} must be a positive number of seconds, got `{raw}`"
                ))),
                Ok(secs) => Ok(Duration::from_secs(secs)),
            })
        };

        let destinations = Destinations {
            issues: channel("ISSUES_CHANNEL_ID", require("ISSUES_CHANNEL_ID")?)?,
            prs: channel("PRS_CHANNEL_ID", require("PRS_CHANNEL_ID")?)?,
        };
        let build_channel =
            get("BUILD_CHANNEL_ID").map(|v| channel("BUILD_CHANNEL_ID", v)).transpose()?;
        let command_channel =
            get("COMMAND_CHANNEL_ID").map(|v| channel("COMMAND_CHANNEL_ID", v)).transpose()?;

        Ok(Self {
            discord_token: get("DISCORD_TOKEN"),
            github_token: get("GITHUB_TOKEN"),
            owner: require("GITHUB_OWNER")?,
            repo: require("GITHUB_REPO")?,
            destinations,
            build_channel,
            command_channel,
            state_file: get("MIRROR_STATE_FILE")
                .map_or_else(|| PathBuf::from(DEFAULT_STATE_FILE), PathBuf::from),
            interval: seconds("MIRROR_INTERVAL_SECS", DEFAULT_INTERVAL)?,
            command_poll: seconds("MIRROR_COMMAND_POLL_SECS", DEFAULT_COMMAND_POLL)?,
            fetch_failure: get("MIRROR_FETCH_FAILURE")
                .map_or(Ok(FetchFailurePolicy::default()), |raw| FetchFailurePolicy::parse(&raw))?,
            github_api: get("MIRROR_GITHUB_API").unwrap_or_else(|| GITHUB_API_BASE.to_string()),
            discord_api: get("MIRROR_DISCORD_API").unwrap_or_else(|| DISCORD_API_BASE.to_string()),
            record_dir: get("MIRROR_RECORD").map(PathBuf::from),
            log_format: get("MIRROR_LOG_FORMAT")
                .map_or(Ok(LogFormat::default()), |raw| LogFormat::parse(&raw))?,
        })
    }

    /// `owner/repo`.
    #[must_use]
    pub fn repository(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// The Discord token, or a config error naming the variable.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::Config`] when `DISCORD_TOKEN` is unset.
    pub fn require_discord_token(&self) -> Result<&str, MirrorError> {
        self.discord_token
            .as_deref()
            .ok_or_else(|| MirrorError::Config("DISCORD_TOKEN is not set".into()))
    }
}
