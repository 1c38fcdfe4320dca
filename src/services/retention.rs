//! Retention policy: which stored runs to prune.

use crate::error::Result;
use crate::models::manifest::Manifest;
use crate::storage::Target;

/// Pure overflow calculation: keep the `keep` most recent manifests by
/// `date` and return the rest. Ties on identical dates are broken by input
/// order (stable sort), keeping the result deterministic. Never mutates
/// its input.
pub fn calculate_retention(manifests: &[Manifest], keep: usize) -> Vec<Manifest> {
    if manifests.len() <= keep {
        return Vec::new();
    }
    let mut ordered: Vec<&Manifest> = manifests.iter().collect();
    ordered.sort_by(|a, b| b.date.cmp(&a.date));
    ordered[keep..].iter().map(|m| (*m).clone()).collect()
}

/// Apply the policy against a target: delete every overflow entry for
/// `container`, logging per-item failures without aborting the remainder.
/// Returns the number of backups actually deleted. Errors only when the
/// target cannot list its stored backups at all.
pub async fn prune(target: &dyn Target, container: &str, keep: usize) -> Result<usize> {
    let stored: Vec<Manifest> = target
        .all_backups()
        .await?
        .into_iter()
        .filter(|m| m.container_name == container)
        .collect();

    let mut deleted = 0;
    for old in calculate_retention(&stored, keep) {
        match target.delete_backup(&old).await {
            Ok(()) => {
                tracing::info!(container, id = %old.id, date = %old.date, "Removed old backup");
                deleted += 1;
            }
            Err(e) => {
                tracing::warn!(container, id = %old.id, error = %e, "Failed to remove old backup");
            }
        }
    }
    Ok(deleted)
}
