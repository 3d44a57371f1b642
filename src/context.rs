//! Service context bundling all port trait objects.

use std::path::{Path, PathBuf};

use crate::adapters::live::channel::DiscordGateway;
use crate::adapters::live::filesystem::LiveFileSystem;
use crate::adapters::live::tracker::GitHubIssueSource;
use crate::adapters::recording::{
    RecordingChannelGateway, RecordingFileSystem, RecordingIssueSource,
};
use crate::adapters::replaying::{
    ReplayingChannelGateway, ReplayingFileSystem, ReplayingIssueSource,
};
use crate::cassette::format::Cassette;
use crate::cassette::replayer::CassetteReplayer;
use crate::cassette::session::RecordingSession;
use crate::config::Config;
use crate::ports::{ChannelGateway, FileSystem, IssueSource};

/// Bundles all port trait objects into a single context.
///
/// Constructors wire up different adapter implementations (live, recording,
/// replaying); the mirror core only ever sees the traits.
pub struct ServiceContext {
    /// Filesystem holding the tracking state.
    pub fs: Box<dyn FileSystem>,
    /// Source of open issues and pull requests.
    pub tracker: Box<dyn IssueSource>,
    /// Chat platform the summaries are mirrored to.
    pub channels: Box<dyn ChannelGateway>,
}

impl ServiceContext {
    /// Wires the given adapters together.
    #[must_use]
    pub fn new(
        fs: Box<dyn FileSystem>,
        tracker: Box<dyn IssueSource>,
        channels: Box<dyn ChannelGateway>,
    ) -> Self {
        Self { fs, tracker, channels }
    }

    /// Creates a context talking to GitHub, Discord and the local disk.
    ///
    /// Without a Discord token every chat call fails with an authorization
    /// error; commands that need the chat platform check for it first.
    #[must_use]
    pub fn live(config: &Config) -> Self {
        Self::new(
            Box::new(LiveFileSystem),
            Box::new(GitHubIssueSource::new(
                &config.github_api,
                &config.owner,
                &config.repo,
                config.github_token.clone(),
            )),
            Box::new(DiscordGateway::new(
                &config.discord_api,
                config.discord_token.clone().unwrap_or_default(),
            )),
        )
    }

    /// Creates a live context whose port calls are recorded into a new
    /// session directory under `root`.
    ///
    /// Drop the context before calling [`RecordingSession::finish`].
    ///
    /// # Errors
    ///
    /// Returns an error if the session directory cannot be created.
    pub fn recording_at(
        config: &Config,
        root: PathBuf,
    ) -> Result<(Self, RecordingSession), String> {
        let session = RecordingSession::new(root)?;
        let live = Self::live(config);
        let ctx = Self::new(
            Box::new(RecordingFileSystem::new(live.fs, session.fs.clone())),
            Box::new(RecordingIssueSource::new(live.tracker, session.tracker.clone())),
            Box::new(RecordingChannelGateway::new(live.channels, session.channel.clone())),
        );
        Ok((ctx, session))
    }

    /// Creates a replaying context from a single cassette holding the
    /// interactions of every port.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be read or parsed.
    pub fn replaying(path: &Path) -> Result<Self, String> {
        let cassette = load_cassette(path)?;
        Ok(Self::new(
            Box::new(ReplayingFileSystem::new(CassetteReplayer::new(&cassette))),
            Box::new(ReplayingIssueSource::new(CassetteReplayer::new(&cassette))),
            Box::new(ReplayingChannelGateway::new(CassetteReplayer::new(&cassette))),
        ))
    }

    /// Creates a replaying context from a recorded session directory with
    /// one `<port>.cassette.yaml` per port. A port without a file replays
    /// nothing and panics on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if a cassette file exists but cannot be read or parsed.
    pub fn replaying_session(dir: &Path) -> Result<Self, String> {
        let replayer = |port: &str| -> Result<CassetteReplayer, String> {
            let path = dir.join(format!("{port}.cassette.yaml"));
            let cassette =
                if path.exists() { load_cassette(&path)? } else { Cassette::empty(port) };
            Ok(CassetteReplayer::new(&cassette))
        };
        Ok(Self::new(
            Box::new(ReplayingFileSystem::new(replayer("fs")?)),
            Box::new(ReplayingIssueSource::new(replayer("tracker")?)),
            Box::new(ReplayingChannelGateway::new(replayer("channel")?)),
        ))
    }
}

fn load_cassette(path: &Path) -> Result<Cassette, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read cassette file {}: {e}", path.display()))?;
    serde_yaml::from_str(&content)
        .map_err(|e| format!("Failed to parse cassette file {}: {e}", path.display()))
}
