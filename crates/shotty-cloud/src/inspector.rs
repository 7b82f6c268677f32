//! Snapshot state inspection

use crate::error::Result;
use crate::model::Volume;
use crate::provider::ComputeProvider;
use futures_util::TryStreamExt;

/// Whether `volume` has a snapshot in flight.
///
/// Only the newest snapshot is looked at: an older snapshot that is still
/// `pending` behind a newer one does not count. The snapshot list is read
/// fresh on every call, so call this right before requesting a new snapshot.
pub async fn has_pending_snapshot(provider: &dyn ComputeProvider, volume: &Volume) -> Result<bool> {
    let mut snapshots = provider.snapshots(volume);
    let latest = snapshots.try_next().await?;

    let pending = latest.as_ref().is_some_and(|s| s.is_pending());
    tracing::debug!(
        "Latest snapshot of {}: {}",
        volume.id,
        latest.as_ref().map_or("none", |s| s.state.as_str())
    );
    Ok(pending)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeProvider;
    use crate::model::{Snapshot, SnapshotState};

    fn volume() -> Volume {
        Volume::new("vol-1", "i-1")
    }

    fn provider_with(states: &[SnapshotState]) -> FakeProvider {
        states
            .iter()
            .enumerate()
            .fold(FakeProvider::new(), |p, (n, state)| {
                p.with_snapshot(Snapshot::new(format!("snap-{n}"), "vol-1", *state))
            })
    }

    #[tokio::test]
    async fn test_no_snapshots_is_not_pending() {
        let provider = provider_with(&[]);
        assert!(!has_pending_snapshot(&provider, &volume()).await.unwrap());
    }

    #[tokio::test]
    async fn test_newest_pending_is_pending() {
        let provider = provider_with(&[SnapshotState::Pending, SnapshotState::Completed]);
        assert!(has_pending_snapshot(&provider, &volume()).await.unwrap());
    }

    #[tokio::test]
    async fn test_newest_completed_or_error_is_not_pending() {
        for newest in [SnapshotState::Completed, SnapshotState::Error] {
            let provider = provider_with(&[newest]);
            assert!(!has_pending_snapshot(&provider, &volume()).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_older_pending_snapshot_is_ignored() {
        let provider = provider_with(&[SnapshotState::Completed, SnapshotState::Pending]);
        assert!(!has_pending_snapshot(&provider, &volume()).await.unwrap());
    }

    #[tokio::test]
    async fn test_listing_error_is_returned() {
        let provider = provider_with(&[SnapshotState::Pending]).fail_snapshots("vol-1");
        assert!(has_pending_snapshot(&provider, &volume()).await.is_err());
    }
}
