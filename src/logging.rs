//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::error::MirrorError;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "issue_mirror=info";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    pub(crate) fn parse(raw: &str) -> Result<Self, MirrorError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(MirrorError::Config(format!(
                "MIRROR_LOG_FORMAT must be `pretty` or `json`, got `{other}`"
            ))),
        }
    }
}

/// Installs the global subscriber. Logs go to stderr so command output on
/// stdout stays clean. Calling this twice is harmless.
pub fn init(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let _ = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
