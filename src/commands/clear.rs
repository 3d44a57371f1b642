//! `issue-mirror clear` command.

use crate::operator::CLEARED;
use crate::service::MirrorService;

/// Resets the tracking state to empty.
///
/// # Errors
///
/// Returns an error string if the state file cannot be written.
pub async fn run(service: &MirrorService) -> Result<(), String> {
    service.clear().await.map_err(|e| e.to_string())?;
    println!("{CLEARED}");
    Ok(())
}
