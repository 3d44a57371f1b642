//! `issue-mirror refresh` command.

use crate::model::ItemType;
use crate::reconcile::TypeOutcome;
use crate::service::MirrorService;

/// Runs one reconciliation pass and prints what changed.
///
/// # Errors
///
/// Returns an error string if the Discord token is missing or the pass was
/// aborted. Per-item failures are printed, not returned.
pub async fn run(service: &MirrorService) -> Result<(), String> {
    service.config().require_discord_token().map_err(|e| e.to_string())?;
    let report = service.refresh().await.map_err(|e| e.to_string())?;
    for item_type in ItemType::ALL {
        println!("{}", summarize(item_type, report.outcome(item_type)));
    }
    Ok(())
}

fn summarize(item_type: ItemType, outcome: &TypeOutcome) -> String {
    if let Some(err) = outcome.fetch_error.as_deref().filter(|_| outcome.skipped) {
        return format!("{item_type}: skipped ({err})");
    }
    let mut line = format!(
        "{item_type}: {} posted, {} removed",
        outcome.posted.len(),
        outcome.removed.len()
    );
    if !outcome.failed_posts.is_empty() {
        line.push_str(&format!(", {} failed to post", outcome.failed_posts.len()));
    }
    if !outcome.failed_deletes.is_empty() {
        line.push_str(&format!(", {} messages not deleted", outcome.failed_deletes.len()));
    }
    line
}
