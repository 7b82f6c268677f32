//! EC2 SDK types → shotty model

use aws_sdk_ec2::primitives::DateTime as AwsDateTime;
use aws_sdk_ec2::types;
use chrono::{DateTime, Utc};
use shotty_cloud::{Instance, InstanceState, Snapshot, SnapshotState, Tags, Volume, VolumeState};

pub fn instance(src: &types::Instance) -> Instance {
    let tags: Tags = src
        .tags()
        .iter()
        .filter_map(|t| Some((t.key()?, t.value().unwrap_or_default())))
        .collect();

    Instance {
        id: src.instance_id().unwrap_or_default().to_string(),
        instance_type: src
            .instance_type()
            .map(|t| t.as_str().to_string())
            .unwrap_or_default(),
        availability_zone: src
            .placement()
            .and_then(|p| p.availability_zone())
            .unwrap_or_default()
            .to_string(),
        state: src
            .state()
            .and_then(|s| s.name())
            .map_or(InstanceState::Unknown, |n| InstanceState::from(n.as_str())),
        public_dns_name: src.public_dns_name().unwrap_or_default().to_string(),
        tags,
    }
}

/// `instance_id` is the instance the volume was listed under.
pub fn volume(src: &types::Volume, instance_id: &str) -> Volume {
    Volume {
        id: src.volume_id().unwrap_or_default().to_string(),
        instance_id: instance_id.to_string(),
        size_gib: src.size().unwrap_or_default(),
        encrypted: src.encrypted().unwrap_or(false),
        state: src
            .state()
            .map_or(VolumeState::Unknown, |s| VolumeState::from(s.as_str())),
    }
}

pub fn snapshot(src: &types::Snapshot) -> Snapshot {
    Snapshot {
        id: src.snapshot_id().unwrap_or_default().to_string(),
        volume_id: src.volume_id().unwrap_or_default().to_string(),
        state: src
            .state()
            .map_or(SnapshotState::Unknown, |s| SnapshotState::from(s.as_str())),
        progress: src.progress().unwrap_or_default().to_string(),
        start_time: src.start_time().and_then(timestamp),
    }
}

fn timestamp(t: &AwsDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(t.secs(), t.subsec_nanos())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_ec2::types::{
        InstanceStateName, InstanceType, Placement, SnapshotState as AwsSnapshotState, Tag,
        VolumeState as AwsVolumeState,
    };
    use chrono::TimeZone;

    #[test]
    fn test_instance_conversion() {
        let src = types::Instance::builder()
            .instance_id("i-0abc")
            .instance_type(InstanceType::T3Micro)
            .placement(Placement::builder().availability_zone("eu-west-1b").build())
            .state(
                types::InstanceState::builder()
                    .name(InstanceStateName::ShuttingDown)
                    .build(),
            )
            .public_dns_name("")
            .tags(Tag::builder().key("team").value("ops").build())
            .tags(Tag::builder().key("Name").value("builder").build())
            .build();

        let instance = instance(&src);
        assert_eq!(instance.id, "i-0abc");
        assert_eq!(instance.instance_type, "t3.micro");
        assert_eq!(instance.availability_zone, "eu-west-1b");
        assert_eq!(instance.state, InstanceState::ShuttingDown);
        assert_eq!(instance.public_dns_name, "");
        assert_eq!(instance.tags.display_name(), "builder");
        assert_eq!(instance.tags.get("team"), Some("ops"));
    }

    #[test]
    fn test_untagged_instance_has_no_name() {
        let src = types::Instance::builder().instance_id("i-1").build();
        let instance = instance(&src);
        assert_eq!(instance.tags.display_name(), "<no name>");
        assert_eq!(instance.state, InstanceState::Unknown);
    }

    #[test]
    fn test_volume_conversion() {
        let src = types::Volume::builder()
            .volume_id("vol-1")
            .size(16)
            .encrypted(true)
            .state(AwsVolumeState::InUse)
            .build();

        let volume = volume(&src, "i-1");
        assert_eq!(volume.instance_id, "i-1");
        assert_eq!(volume.size_gib, 16);
        assert!(volume.encrypted);
        assert_eq!(volume.state, VolumeState::InUse);
    }

    #[test]
    fn test_snapshot_conversion() {
        let src = types::Snapshot::builder()
            .snapshot_id("snap-1")
            .volume_id("vol-1")
            .state(AwsSnapshotState::Pending)
            .progress("42%")
            .start_time(AwsDateTime::from_secs(1_700_000_000))
            .build();

        let snapshot = snapshot(&src);
        assert!(snapshot.is_pending());
        assert_eq!(snapshot.progress, "42%");
        assert_eq!(
            snapshot.start_time,
            Some(Utc.timestamp_opt(1_700_000_000, 0).unwrap())
        );
    }
}
