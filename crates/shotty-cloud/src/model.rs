//! Provider-reported resources
//!
//! These are transient views read from the provider for the duration of one
//! command. Nothing here is persisted or cached across provider calls.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Placeholder shown for instances without a `Name` tag
pub const NO_NAME: &str = "<no name>";

/// Tag key used both for display names and project filtering
pub const NAME_TAG: &str = "Name";

/// Power state of an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstanceState {
    Pending,
    Running,
    Stopping,
    Stopped,
    ShuttingDown,
    Terminated,
    Unknown,
}

impl InstanceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceState::Pending => "pending",
            InstanceState::Running => "running",
            InstanceState::Stopping => "stopping",
            InstanceState::Stopped => "stopped",
            InstanceState::ShuttingDown => "shutting-down",
            InstanceState::Terminated => "terminated",
            InstanceState::Unknown => "unknown",
        }
    }
}

impl From<&str> for InstanceState {
    fn from(s: &str) -> Self {
        match s {
            "pending" => InstanceState::Pending,
            "running" => InstanceState::Running,
            "stopping" => InstanceState::Stopping,
            "stopped" => InstanceState::Stopped,
            "shutting-down" => InstanceState::ShuttingDown,
            "terminated" => InstanceState::Terminated,
            _ => InstanceState::Unknown,
        }
    }
}

impl std::fmt::Display for InstanceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of a block-storage volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VolumeState {
    Creating,
    Available,
    InUse,
    Deleting,
    Deleted,
    Error,
    Unknown,
}

impl VolumeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            VolumeState::Creating => "creating",
            VolumeState::Available => "available",
            VolumeState::InUse => "in-use",
            VolumeState::Deleting => "deleting",
            VolumeState::Deleted => "deleted",
            VolumeState::Error => "error",
            VolumeState::Unknown => "unknown",
        }
    }
}

impl From<&str> for VolumeState {
    fn from(s: &str) -> Self {
        match s {
            "creating" => VolumeState::Creating,
            "available" => VolumeState::Available,
            "in-use" => VolumeState::InUse,
            "deleting" => VolumeState::Deleting,
            "deleted" => VolumeState::Deleted,
            "error" => VolumeState::Error,
            _ => VolumeState::Unknown,
        }
    }
}

impl std::fmt::Display for VolumeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of a snapshot. Snapshots start `pending` and are materialised
/// asynchronously by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotState {
    Pending,
    Completed,
    Error,
    Unknown,
}

impl SnapshotState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotState::Pending => "pending",
            SnapshotState::Completed => "completed",
            SnapshotState::Error => "error",
            SnapshotState::Unknown => "unknown",
        }
    }
}

impl From<&str> for SnapshotState {
    fn from(s: &str) -> Self {
        match s {
            "pending" => SnapshotState::Pending,
            "completed" => SnapshotState::Completed,
            "error" => SnapshotState::Error,
            _ => SnapshotState::Unknown,
        }
    }
}

impl std::fmt::Display for SnapshotState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag mapping of an instance, built once from the provider's key/value pairs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags(BTreeMap<String, String>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Value of the `Name` tag, if any
    pub fn name(&self) -> Option<&str> {
        self.get(NAME_TAG)
    }

    /// `Name` tag or [`NO_NAME`]
    pub fn display_name(&self) -> &str {
        self.name().unwrap_or(NO_NAME)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Later pairs win when a key repeats.
impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Tags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tags = Tags::new();
        for (k, v) in iter {
            tags.insert(k, v);
        }
        tags
    }
}

/// A compute instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub id: String,
    pub instance_type: String,
    pub availability_zone: String,
    pub state: InstanceState,
    /// Empty when the instance has no public DNS name
    pub public_dns_name: String,
    pub tags: Tags,
}

impl Instance {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            instance_type: String::new(),
            availability_zone: String::new(),
            state: InstanceState::Unknown,
            public_dns_name: String::new(),
            tags: Tags::new(),
        }
    }

    pub fn with_type(mut self, instance_type: impl Into<String>) -> Self {
        self.instance_type = instance_type.into();
        self
    }

    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.availability_zone = zone.into();
        self
    }

    pub fn with_state(mut self, state: InstanceState) -> Self {
        self.state = state;
        self
    }

    pub fn with_public_dns(mut self, dns: impl Into<String>) -> Self {
        self.public_dns_name = dns.into();
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key, value);
        self
    }
}

/// A block-storage volume attached to an instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    pub id: String,
    /// Back-reference to the instance the volume was listed under
    pub instance_id: String,
    pub size_gib: i32,
    pub encrypted: bool,
    pub state: VolumeState,
}

impl Volume {
    pub fn new(id: impl Into<String>, instance_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            instance_id: instance_id.into(),
            size_gib: 0,
            encrypted: false,
            state: VolumeState::InUse,
        }
    }

    pub fn with_size(mut self, size_gib: i32) -> Self {
        self.size_gib = size_gib;
        self
    }

    pub fn with_encryption(mut self, encrypted: bool) -> Self {
        self.encrypted = encrypted;
        self
    }

    pub fn with_state(mut self, state: VolumeState) -> Self {
        self.state = state;
        self
    }
}

/// A point-in-time copy of a volume
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub id: String,
    pub volume_id: String,
    pub state: SnapshotState,
    /// Percentage string such as `"100%"`
    pub progress: String,
    pub start_time: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn new(id: impl Into<String>, volume_id: impl Into<String>, state: SnapshotState) -> Self {
        Self {
            id: id.into(),
            volume_id: volume_id.into(),
            state,
            progress: String::new(),
            start_time: None,
        }
    }

    pub fn with_progress(mut self, progress: impl Into<String>) -> Self {
        self.progress = progress.into();
        self
    }

    pub fn with_start_time(mut self, start_time: DateTime<Utc>) -> Self {
        self.start_time = Some(start_time);
        self
    }

    pub fn is_pending(&self) -> bool {
        self.state == SnapshotState::Pending
    }

    pub fn is_completed(&self) -> bool {
        self.state == SnapshotState::Completed
    }
}

/// Project selector: exact, case-sensitive match on the `Name` tag
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFilter(Option<String>);

impl ProjectFilter {
    /// Matches every instance visible to the credentials
    pub fn all() -> Self {
        Self(None)
    }

    /// An empty project is the same as no project.
    pub fn new(project: Option<impl Into<String>>) -> Self {
        Self(project.map(Into::into).filter(|p| !p.is_empty()))
    }

    pub fn project(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_all(&self) -> bool {
        self.0.is_none()
    }

    /// Whether an instance's tags satisfy this filter. Real providers apply
    /// the filter server-side; this is the in-memory equivalent.
    #[cfg(any(test, feature = "test-util"))]
    pub fn matches(&self, tags: &Tags) -> bool {
        match &self.0 {
            Some(project) => tags.name() == Some(project.as_str()),
            None => true,
        }
    }
}

impl From<&str> for ProjectFilter {
    fn from(project: &str) -> Self {
        Self::new(Some(project))
    }
}

impl std::fmt::Display for ProjectFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Some(project) => write!(f, "{}={}", NAME_TAG, project),
            None => f.write_str("all"),
        }
    }
}
