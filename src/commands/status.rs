//! `issue-mirror status` command.

use crate::service::MirrorService;

/// Prints tracked counts and the mirrored repository.
///
/// # Errors
///
/// Returns an error string if the state file cannot be read.
pub fn run(service: &MirrorService) -> Result<(), String> {
    let status = service.status().map_err(|e| e.to_string())?;
    println!("{}", status.render());
    Ok(())
}
