//! The mirror service: one context, one config, one reconciliation at a time.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{error, info};

use crate::config::Config;
use crate::context::ServiceContext;
use crate::error::MirrorError;
use crate::model::ItemType;
use crate::ports::FileLock;
use crate::reconcile::{PassReport, Reconciler};
use crate::store::StateStore;

/// Pause between attempts on a state lock held by another process.
const LOCK_RETRY: Duration = Duration::from_millis(250);

/// How long a run waits for another process to release the state lock.
pub const LOCK_TIMEOUT: Duration = Duration::from_secs(120);

/// Counts reported by the `status` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    /// Tracked issues.
    pub issues: usize,
    /// Tracked pull requests.
    pub prs: usize,
    /// `owner/repo`.
    pub repository: String,
}

impl StatusReport {
    /// Multi-line text shown to operators.
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "GitHub Monitor Status\nTracked Issues: {}\nTracked PRs: {}\nRepository: {}",
            self.issues, self.prs, self.repository
        )
    }
}

/// Owns the ports and settings and serializes runs over the tracking state.
pub struct MirrorService {
    ctx: ServiceContext,
    config: Config,
    run_lock: Mutex<()>,
}

impl MirrorService {
    /// Creates a service over `ctx`.
    #[must_use]
    pub fn new(ctx: ServiceContext, config: Config) -> Self {
        Self { ctx, config, run_lock: Mutex::new(()) }
    }

    /// The settings this service runs with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The ports this service runs against.
    #[must_use]
    pub fn context(&self) -> &ServiceContext {
        &self.ctx
    }

    fn store(&self) -> StateStore<'_> {
        StateStore::new(&self.ctx, &self.config.state_file)
    }

    /// Takes the state lock shared with other processes, waiting up to
    /// [`LOCK_TIMEOUT`] for a run elsewhere to save.
    async fn lock_state(&self) -> Result<FileLock, MirrorError> {
        let store = self.store();
        let deadline = Instant::now() + LOCK_TIMEOUT;
        let mut waiting = false;
        loop {
            if let Some(lock) = store.try_lock()? {
                return Ok(lock);
            }
            if Instant::now() >= deadline {
                return Err(MirrorError::Store(format!(
                    "{} is still held by another issue-mirror process",
                    store.lock_path().display()
                )));
            }
            if !waiting {
                info!(lock = %store.lock_path().display(), "waiting for another run to save");
                waiting = true;
            }
            tokio::time::sleep(LOCK_RETRY).await;
        }
    }

    /// Runs one reconciliation pass. Waits for any pass already running,
    /// here or in another process sharing the state file.
    ///
    /// # Errors
    ///
    /// Returns an error when the pass was aborted (see
    /// [`Reconciler::reconcile_all`]) or the state lock was not released in
    /// time.
    pub async fn refresh(&self) -> Result<PassReport, MirrorError> {
        let _guard = self.run_lock.lock().await;
        let _state = self.lock_state().await?;

        let reconciler = Reconciler::new(
            &self.ctx,
            self.store(),
            &self.config.destinations,
            self.config.fetch_failure,
        );
        match reconciler.reconcile_all().await {
            Ok(report) => {
                info!(
                    issues_posted = report.issues.posted.len(),
                    issues_removed = report.issues.removed.len(),
                    prs_posted = report.pulls.posted.len(),
                    prs_removed = report.pulls.removed.len(),
                    "reconciliation pass finished"
                );
                Ok(report)
            }
            Err(e) => {
                error!(error = %e, "reconciliation pass aborted");
                Err(e)
            }
        }
    }

    /// Tracked counts and the mirrored repository.
    ///
    /// # Errors
    ///
    /// Returns an error if the state file cannot be read.
    pub fn status(&self) -> Result<StatusReport, MirrorError> {
        let tracking = self.store().load()?;
        Ok(StatusReport {
            issues: tracking.count(ItemType::Issue),
            prs: tracking.count(ItemType::PullRequest),
            repository: self.config.repository(),
        })
    }

    /// Forgets every tracked item. Posted messages are left in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the state file cannot be written or the state lock
    /// was not released in time.
    pub async fn clear(&self) -> Result<(), MirrorError> {
        let _guard = self.run_lock.lock().await;
        let _state = self.lock_state().await?;
        self.store().clear()?;
        info!("Tracking data cleared");
        Ok(())
    }
}
