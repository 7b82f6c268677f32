//! Nested instance → volume → snapshot listings
//!
//! Every listing walks the filtered instances in provider order and hands one
//! flat record per resource to a caller-supplied sink. Records render as a
//! single comma-joined line through `Display`.

use crate::error::Result;
use crate::filter::filter_instances;
use crate::model::{Instance, InstanceState, ProjectFilter, SnapshotState, Volume, VolumeState};
use crate::provider::ComputeProvider;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;

/// Date/time rendering of snapshot start times (`Sun Jul  8 00:34:60 2001`)
pub const START_TIME_FORMAT: &str = "%c";

/// How many snapshots to emit per volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnapshotListing {
    /// Stop after the first `completed` snapshot of each volume
    #[default]
    Latest,
    /// Every snapshot of every volume
    All,
}

impl SnapshotListing {
    pub fn from_all_flag(all: bool) -> Self {
        if all { Self::All } else { Self::Latest }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceRecord {
    pub id: String,
    pub instance_type: String,
    pub availability_zone: String,
    pub state: InstanceState,
    pub public_dns_name: String,
    pub name: String,
}

impl From<&Instance> for InstanceRecord {
    fn from(instance: &Instance) -> Self {
        Self {
            id: instance.id.clone(),
            instance_type: instance.instance_type.clone(),
            availability_zone: instance.availability_zone.clone(),
            state: instance.state,
            public_dns_name: instance.public_dns_name.clone(),
            name: instance.tags.display_name().to_string(),
        }
    }
}

impl std::fmt::Display for InstanceRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{},{},{},{},{},{}",
            self.id,
            self.instance_type,
            self.availability_zone,
            self.state,
            self.public_dns_name,
            self.name
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeRecord {
    pub id: String,
    pub instance_id: String,
    pub state: VolumeState,
    pub size_gib: i32,
    pub encrypted: bool,
}

impl VolumeRecord {
    pub fn new(volume: &Volume, instance: &Instance) -> Self {
        Self {
            id: volume.id.clone(),
            instance_id: instance.id.clone(),
            state: volume.state,
            size_gib: volume.size_gib,
            encrypted: volume.encrypted,
        }
    }

    pub fn encryption_label(&self) -> &'static str {
        if self.encrypted {
            "Encrypted"
        } else {
            "Not Encrypted"
        }
    }
}

impl std::fmt::Display for VolumeRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{},{},{},{}GiB,{}",
            self.id,
            self.instance_id,
            self.state,
            self.size_gib,
            self.encryption_label()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRecord {
    pub id: String,
    pub volume_id: String,
    pub instance_id: String,
    pub state: SnapshotState,
    pub progress: String,
    pub start_time: Option<DateTime<Utc>>,
}

impl SnapshotRecord {
    /// Start time as a human-readable date/time, empty if unknown
    pub fn started(&self) -> String {
        self.start_time
            .map(|t| t.format(START_TIME_FORMAT).to_string())
            .unwrap_or_default()
    }
}

impl std::fmt::Display for SnapshotRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{},{},{},{},{},{}",
            self.id,
            self.volume_id,
            self.instance_id,
            self.state,
            self.progress,
            self.started()
        )
    }
}

/// Emits one record per instance. Returns the number of records emitted.
pub async fn list_instances<F>(
    provider: &dyn ComputeProvider,
    filter: &ProjectFilter,
    mut emit: F,
) -> Result<usize>
where
    F: FnMut(InstanceRecord),
{
    let mut count = 0;
    let mut instances = filter_instances(provider, filter);
    while let Some(instance) = instances.try_next().await? {
        emit(InstanceRecord::from(&instance));
        count += 1;
    }
    Ok(count)
}

/// Emits one record per volume of every instance
pub async fn list_volumes<F>(
    provider: &dyn ComputeProvider,
    filter: &ProjectFilter,
    mut emit: F,
) -> Result<usize>
where
    F: FnMut(VolumeRecord),
{
    let mut count = 0;
    let mut instances = filter_instances(provider, filter);
    while let Some(instance) = instances.try_next().await? {
        let mut volumes = provider.volumes(&instance);
        while let Some(volume) = volumes.try_next().await? {
            emit(VolumeRecord::new(&volume, &instance));
            count += 1;
        }
    }
    Ok(count)
}

/// Emits snapshot records, newest first within each volume.
///
/// With [`SnapshotListing::Latest`] a volume's listing ends right after its
/// first `completed` snapshot; snapshots before it (pending, error) are
/// still emitted.
pub async fn list_snapshots<F>(
    provider: &dyn ComputeProvider,
    filter: &ProjectFilter,
    mode: SnapshotListing,
    mut emit: F,
) -> Result<usize>
where
    F: FnMut(SnapshotRecord),
{
    let mut count = 0;
    let mut instances = filter_instances(provider, filter);
    while let Some(instance) = instances.try_next().await? {
        let mut volumes = provider.volumes(&instance);
        while let Some(volume) = volumes.try_next().await? {
            let mut snapshots = provider.snapshots(&volume);
            while let Some(snapshot) = snapshots.try_next().await? {
                let completed = snapshot.is_completed();
                emit(SnapshotRecord {
                    id: snapshot.id,
                    volume_id: volume.id.clone(),
                    instance_id: instance.id.clone(),
                    state: snapshot.state,
                    progress: snapshot.progress,
                    start_time: snapshot.start_time,
                });
                count += 1;

                if completed && mode == SnapshotListing::Latest {
                    break;
                }
            }
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeProvider;
    use crate::model::Snapshot;
    use chrono::TimeZone;

    fn snapshot(id: &str, volume: &str, state: SnapshotState) -> Snapshot {
        Snapshot::new(id, volume, state)
    }

    fn fleet() -> FakeProvider {
        FakeProvider::new()
            .with_instance(
                Instance::new("i-1")
                    .with_type("t3.micro")
                    .with_zone("us-east-1a")
                    .with_state(InstanceState::Running)
                    .with_public_dns("ec2-1-2-3-4.compute-1.amazonaws.com")
                    .with_tag("Name", "web"),
            )
            .with_instance(
                Instance::new("i-2")
                    .with_type("t3.small")
                    .with_zone("us-east-1b")
                    .with_state(InstanceState::Stopped),
            )
            .with_volume(Volume::new("vol-a", "i-1").with_size(8).with_encryption(true))
            .with_volume(Volume::new("vol-b", "i-1").with_size(100))
            .with_volume(
                Volume::new("vol-c", "i-2")
                    .with_size(30)
                    .with_state(VolumeState::Available),
            )
            // vol-a: newest completed
            .with_snapshot(snapshot("snap-a3", "vol-a", SnapshotState::Completed))
            .with_snapshot(snapshot("snap-a2", "vol-a", SnapshotState::Completed))
            .with_snapshot(snapshot("snap-a1", "vol-a", SnapshotState::Completed))
            // vol-b: newest pending
            .with_snapshot(snapshot("snap-b2", "vol-b", SnapshotState::Pending))
            .with_snapshot(snapshot("snap-b1", "vol-b", SnapshotState::Completed))
            .with_snapshot(snapshot("snap-b0", "vol-b", SnapshotState::Completed))
    }

    async fn snapshot_ids(provider: &FakeProvider, mode: SnapshotListing) -> Vec<String> {
        let mut ids = Vec::new();
        list_snapshots(provider, &ProjectFilter::all(), mode, |r| ids.push(r.id))
            .await
            .unwrap();
        ids
    }

    #[tokio::test]
    async fn test_instance_records() {
        let provider = fleet();
        let mut lines = Vec::new();
        let count = list_instances(&provider, &ProjectFilter::all(), |r| {
            lines.push(r.to_string())
        })
        .await
        .unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            lines,
            vec![
                "i-1,t3.micro,us-east-1a,running,ec2-1-2-3-4.compute-1.amazonaws.com,web",
                "i-2,t3.small,us-east-1b,stopped,,<no name>",
            ]
        );
    }

    #[tokio::test]
    async fn test_instance_listing_is_repeatable() {
        let provider = fleet();
        let mut first = String::new();
        let mut second = String::new();
        list_instances(&provider, &ProjectFilter::all(), |r| {
            first.push_str(&format!("{r}\n"))
        })
        .await
        .unwrap();
        list_instances(&provider, &ProjectFilter::all(), |r| {
            second.push_str(&format!("{r}\n"))
        })
        .await
        .unwrap();

        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_volume_records() {
        let provider = fleet();
        let mut lines = Vec::new();
        list_volumes(&provider, &ProjectFilter::all(), |r| lines.push(r.to_string()))
            .await
            .unwrap();

        assert_eq!(
            lines,
            vec![
                "vol-a,i-1,in-use,8GiB,Encrypted",
                "vol-b,i-1,in-use,100GiB,Not Encrypted",
                "vol-c,i-2,available,30GiB,Not Encrypted",
            ]
        );
    }

    #[tokio::test]
    async fn test_volume_listing_respects_project() {
        let provider = fleet();
        let mut ids = Vec::new();
        list_volumes(&provider, &"web".into(), |r| ids.push(r.id))
            .await
            .unwrap();
        assert_eq!(ids, vec!["vol-a", "vol-b"]);
    }

    #[tokio::test]
    async fn test_latest_stops_after_completed_snapshot() {
        let provider = fleet();
        let ids = snapshot_ids(&provider, SnapshotListing::Latest).await;

        // vol-a: newest is completed, one record.
        // vol-b: pending first, then the first completed one ends the volume.
        assert_eq!(ids, vec!["snap-a3", "snap-b2", "snap-b1"]);
    }

    #[tokio::test]
    async fn test_all_emits_every_snapshot_newest_first() {
        let provider = fleet();
        let ids = snapshot_ids(&provider, SnapshotListing::All).await;
        assert_eq!(
            ids,
            vec!["snap-a3", "snap-a2", "snap-a1", "snap-b2", "snap-b1", "snap-b0"]
        );
    }

    #[tokio::test]
    async fn test_latest_without_completed_emits_everything() {
        let provider = FakeProvider::new()
            .with_instance(Instance::new("i-1"))
            .with_volume(Volume::new("vol-1", "i-1"))
            .with_snapshot(snapshot("snap-3", "vol-1", SnapshotState::Pending))
            .with_snapshot(snapshot("snap-2", "vol-1", SnapshotState::Error))
            .with_snapshot(snapshot("snap-1", "vol-1", SnapshotState::Pending));

        let ids = snapshot_ids(&provider, SnapshotListing::Latest).await;
        assert_eq!(ids, vec!["snap-3", "snap-2", "snap-1"]);
    }

    #[test]
    fn test_snapshot_record_line() {
        let record = SnapshotRecord {
            id: "snap-1".to_string(),
            volume_id: "vol-1".to_string(),
            instance_id: "i-1".to_string(),
            state: SnapshotState::Completed,
            progress: "100%".to_string(),
            start_time: Some(Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap()),
        };
        assert_eq!(
            record.to_string(),
            "snap-1,vol-1,i-1,completed,100%,Tue Mar  5 14:07:09 2024"
        );

        let unknown = SnapshotRecord {
            start_time: None,
            progress: String::new(),
            ..record
        };
        assert_eq!(unknown.to_string(), "snap-1,vol-1,i-1,completed,,");
    }

    #[test]
    fn test_listing_error_aborts() {
        let provider = fleet().fail_volumes("i-2");
        let mut ids = Vec::new();
        let result = tokio_test::block_on(list_volumes(&provider, &ProjectFilter::all(), |r| {
            ids.push(r.id)
        }));

        assert!(result.is_err());
        // Records emitted before the failure stay emitted.
        assert_eq!(ids, vec!["vol-a", "vol-b"]);
    }

    #[test]
    fn test_all_flag() {
        assert_eq!(SnapshotListing::from_all_flag(true), SnapshotListing::All);
        assert_eq!(SnapshotListing::from_all_flag(false), SnapshotListing::Latest);
        assert_eq!(SnapshotListing::default(), SnapshotListing::Latest);
    }
}
