//! In-memory provider for tests
//!
//! Holds instances, volumes and snapshots in memory, records every call it
//! receives and lets tests inject failures per resource id.

use crate::error::{CloudError, Result};
use crate::model::{Instance, InstanceState, ProjectFilter, Snapshot, SnapshotState, Volume};
use crate::provider::{ComputeProvider, ResourceStream};
use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

/// A provider call as observed by [`FakeProvider`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListInstances(Option<String>),
    ListVolumes(String),
    ListSnapshots(String),
    Stop(String),
    Start(String),
    WaitStopped(String),
    WaitRunning(String),
    CreateSnapshot { volume_id: String, description: String },
}

#[derive(Debug, Default)]
struct World {
    instances: Vec<Instance>,
    volumes: HashMap<String, Vec<Volume>>,
    /// Newest first
    snapshots: HashMap<String, Vec<Snapshot>>,
    calls: Vec<Call>,
    failures: HashSet<(Op, String)>,
    next_snapshot: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Op {
    ListInstances,
    ListVolumes,
    ListSnapshots,
    Stop,
    Start,
    WaitStopped,
    WaitRunning,
    CreateSnapshot,
}

const ANY: &str = "*";

/// In-memory [`ComputeProvider`]
#[derive(Debug, Default)]
pub struct FakeProvider {
    world: Mutex<World>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instance(self, instance: Instance) -> Self {
        self.lock().instances.push(instance);
        self
    }

    pub fn with_volume(self, volume: Volume) -> Self {
        self.lock()
            .volumes
            .entry(volume.instance_id.clone())
            .or_default()
            .push(volume);
        self
    }

    /// Snapshots must be added newest first.
    pub fn with_snapshot(self, snapshot: Snapshot) -> Self {
        self.lock()
            .snapshots
            .entry(snapshot.volume_id.clone())
            .or_default()
            .push(snapshot);
        self
    }

    /// Every instance listing fails
    pub fn fail_listing(self) -> Self {
        self.fail(Op::ListInstances, ANY)
    }

    pub fn fail_volumes(self, instance_id: &str) -> Self {
        self.fail(Op::ListVolumes, instance_id)
    }

    pub fn fail_snapshots(self, volume_id: &str) -> Self {
        self.fail(Op::ListSnapshots, volume_id)
    }

    pub fn fail_stop(self, instance_id: &str) -> Self {
        self.fail(Op::Stop, instance_id)
    }

    pub fn fail_start(self, instance_id: &str) -> Self {
        self.fail(Op::Start, instance_id)
    }

    pub fn fail_wait_stopped(self, instance_id: &str) -> Self {
        self.fail(Op::WaitStopped, instance_id)
    }

    pub fn fail_wait_running(self, instance_id: &str) -> Self {
        self.fail(Op::WaitRunning, instance_id)
    }

    pub fn fail_create_snapshot(self, volume_id: &str) -> Self {
        self.fail(Op::CreateSnapshot, volume_id)
    }

    fn fail(self, op: Op, id: &str) -> Self {
        self.lock().failures.insert((op, id.to_string()));
        self
    }

    /// Calls received so far, in order
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn instance_state(&self, instance_id: &str) -> Option<InstanceState> {
        self.lock()
            .instances
            .iter()
            .find(|i| i.id == instance_id)
            .map(|i| i.state)
    }

    /// Snapshots currently held for a volume, newest first
    pub fn snapshots_of(&self, volume_id: &str) -> Vec<Snapshot> {
        self.lock()
            .snapshots
            .get(volume_id)
            .cloned()
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, World> {
        // A panicking test thread must not hide the calls recorded before it.
        self.world.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, call: Call, op: Op, id: &str) -> Result<()> {
        let mut world = self.lock();
        world.calls.push(call);
        if world.failures.contains(&(op, id.to_string()))
            || world.failures.contains(&(op, ANY.to_string()))
        {
            let message = format!("injected {:?} failure for {}", op, id);
            return Err(match op {
                Op::WaitStopped | Op::WaitRunning => CloudError::Timeout(message),
                _ => CloudError::Api(message),
            });
        }
        Ok(())
    }

    fn set_state(&self, instance_id: &str, state: InstanceState) {
        if let Some(instance) = self
            .lock()
            .instances
            .iter_mut()
            .find(|i| i.id == instance_id)
        {
            instance.state = state;
        }
    }
}

fn ready<'a, T: Send + 'a>(result: Result<Vec<T>>) -> ResourceStream<'a, T> {
    match result {
        Ok(items) => stream::iter(items.into_iter().map(Ok)).boxed(),
        Err(e) => stream::once(async move { Err(e) }).boxed(),
    }
}

#[async_trait]
impl ComputeProvider for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }

    fn instances(&self, filter: &ProjectFilter) -> ResourceStream<'_, Instance> {
        let call = Call::ListInstances(filter.project().map(str::to_string));
        let result = self.record(call, Op::ListInstances, ANY).map(|()| {
            self.lock()
                .instances
                .iter()
                .filter(|i| filter.matches(&i.tags))
                .cloned()
                .collect()
        });
        ready(result)
    }

    fn volumes(&self, instance: &Instance) -> ResourceStream<'_, Volume> {
        let call = Call::ListVolumes(instance.id.clone());
        let result = self.record(call, Op::ListVolumes, &instance.id).map(|()| {
            self.lock()
                .volumes
                .get(&instance.id)
                .cloned()
                .unwrap_or_default()
        });
        ready(result)
    }

    fn snapshots(&self, volume: &Volume) -> ResourceStream<'_, Snapshot> {
        let call = Call::ListSnapshots(volume.id.clone());
        let result = self
            .record(call, Op::ListSnapshots, &volume.id)
            .map(|()| self.snapshots_of(&volume.id));
        ready(result)
    }

    async fn stop_instance(&self, instance: &Instance) -> Result<()> {
        self.record(Call::Stop(instance.id.clone()), Op::Stop, &instance.id)?;
        self.set_state(&instance.id, InstanceState::Stopping);
        Ok(())
    }

    async fn start_instance(&self, instance: &Instance) -> Result<()> {
        self.record(Call::Start(instance.id.clone()), Op::Start, &instance.id)?;
        self.set_state(&instance.id, InstanceState::Pending);
        Ok(())
    }

    async fn wait_until_stopped(&self, instance: &Instance) -> Result<()> {
        let call = Call::WaitStopped(instance.id.clone());
        self.record(call, Op::WaitStopped, &instance.id)?;
        self.set_state(&instance.id, InstanceState::Stopped);
        Ok(())
    }

    async fn wait_until_running(&self, instance: &Instance) -> Result<()> {
        let call = Call::WaitRunning(instance.id.clone());
        self.record(call, Op::WaitRunning, &instance.id)?;
        self.set_state(&instance.id, InstanceState::Running);
        Ok(())
    }

    async fn create_snapshot(&self, volume: &Volume, description: &str) -> Result<String> {
        let call = Call::CreateSnapshot {
            volume_id: volume.id.clone(),
            description: description.to_string(),
        };
        self.record(call, Op::CreateSnapshot, &volume.id)?;

        let mut world = self.lock();
        world.next_snapshot += 1;
        let id = format!("snap-fake{:04}", world.next_snapshot);
        let snapshot = Snapshot::new(&id, &volume.id, SnapshotState::Pending).with_progress("0%");
        world
            .snapshots
            .entry(volume.id.clone())
            .or_default()
            .insert(0, snapshot);
        Ok(id)
    }
}
