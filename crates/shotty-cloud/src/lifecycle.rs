//! Instance power and snapshot lifecycle
//!
//! Instances are handled one at a time in the order the provider returns
//! them. A failure on one instance is recorded in the [`BatchReport`] and the
//! batch moves on; only a failure to enumerate the instances themselves aborts
//! the whole batch.

use crate::error::{CloudError, Result};
use crate::filter::filter_instances;
use crate::inspector::has_pending_snapshot;
use crate::model::{Instance, ProjectFilter, Volume};
use crate::provider::ComputeProvider;
use futures_util::TryStreamExt;
use std::time::Instant;

/// Description attached to every snapshot created by the orchestrator
pub const DEFAULT_SNAPSHOT_DESCRIPTION: &str = "Created by shotty";

/// Options for lifecycle operations
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    pub snapshot_description: String,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            snapshot_description: DEFAULT_SNAPSHOT_DESCRIPTION.to_string(),
        }
    }
}

/// Where an instance is in the snapshot workflow
///
/// `Running → Stopping → Stopped → Snapshotting → Starting → Running`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Running,
    Stopping,
    Stopped,
    Snapshotting,
    Starting,
}

impl std::fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecyclePhase::Running => write!(f, "running"),
            LifecyclePhase::Stopping => write!(f, "stopping"),
            LifecyclePhase::Stopped => write!(f, "stopped"),
            LifecyclePhase::Snapshotting => write!(f, "snapshotting"),
            LifecyclePhase::Starting => write!(f, "starting"),
        }
    }
}

/// Which step of an instance's processing failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    StopRequest,
    StartRequest,
    WaitStopped,
    WaitRunning,
    Snapshot,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::StopRequest => write!(f, "stop request"),
            FailureKind::StartRequest => write!(f, "start request"),
            FailureKind::WaitStopped => write!(f, "wait for stopped"),
            FailureKind::WaitRunning => write!(f, "wait for running"),
            FailureKind::Snapshot => write!(f, "snapshot"),
        }
    }
}

/// A failed step together with the provider's error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceFailure {
    pub kind: FailureKind,
    /// Volume the failure relates to, for snapshot failures
    pub volume_id: Option<String>,
    pub error: CloudError,
}

impl InstanceFailure {
    pub fn new(kind: FailureKind, error: CloudError) -> Self {
        Self {
            kind,
            volume_id: None,
            error,
        }
    }

    pub fn on_volume(mut self, volume_id: impl Into<String>) -> Self {
        self.volume_id = Some(volume_id.into());
        self
    }
}

impl std::fmt::Display for InstanceFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.volume_id {
            Some(volume) => write!(f, "{} failed on {}: {}", self.kind, volume, self.error),
            None => write!(f, "{} failed: {}", self.kind, self.error),
        }
    }
}

/// What was done to an instance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Ids of snapshots requested for this instance
    pub created: Vec<String>,
    /// Volumes skipped because a snapshot was already pending
    pub skipped: Vec<String>,
}

/// Result for one instance of a batch
///
/// `outcome` holds whatever was done before processing stopped, so snapshots
/// requested ahead of a failure are still reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceReport {
    pub instance_id: String,
    /// Last phase reached
    pub phase: LifecyclePhase,
    pub outcome: Outcome,
    /// In the order they happened; empty on success
    pub failures: Vec<InstanceFailure>,
}

impl InstanceReport {
    fn succeeded(instance_id: String, phase: LifecyclePhase, outcome: Outcome) -> Self {
        Self {
            instance_id,
            phase,
            outcome,
            failures: Vec::new(),
        }
    }

    fn halted(instance_id: String, phase: LifecyclePhase, failure: InstanceFailure) -> Self {
        Self {
            instance_id,
            phase,
            outcome: Outcome::default(),
            failures: vec![failure],
        }
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// The failure that decided the instance's result. A snapshot failure
    /// ranks ahead of a later restart failure.
    pub fn failure(&self) -> Option<&InstanceFailure> {
        self.failures.first()
    }
}

/// Per-instance results of a batch, in processing order
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub instances: Vec<InstanceReport>,

    /// Total execution time in milliseconds
    pub duration_ms: u64,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_success(&self) -> bool {
        self.instances.iter().all(InstanceReport::is_success)
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &InstanceReport> {
        self.instances.iter().filter(|r| r.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &InstanceReport> {
        self.instances.iter().filter(|r| !r.is_success())
    }

    fn push(&mut self, report: InstanceReport) {
        self.instances.push(report);
    }
}

impl std::fmt::Display for BatchReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} succeeded, {} failed ({} ms)",
            self.succeeded().count(),
            self.failed().count(),
            self.duration_ms
        )
    }
}

/// Progress notification, one per outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    Stopping { instance_id: String },
    Starting { instance_id: String },
    WaitingStopped { instance_id: String },
    WaitingRunning { instance_id: String },
    SnapshotCreating { volume_id: String },
    SnapshotCreated { volume_id: String, snapshot_id: String },
    SnapshotSkipped { volume_id: String },
    Failed { instance_id: String, failure: InstanceFailure },
    Done { instance_id: String },
}

/// Drives stop/start/snapshot transitions over a filtered instance set
pub struct Orchestrator<'a> {
    provider: &'a dyn ComputeProvider,
    options: LifecycleOptions,
}

impl<'a> Orchestrator<'a> {
    pub fn new(provider: &'a dyn ComputeProvider, options: LifecycleOptions) -> Self {
        Self { provider, options }
    }

    /// Issues a stop request for every instance
    pub async fn stop_instances<F>(
        &self,
        filter: &ProjectFilter,
        on_event: F,
    ) -> Result<BatchReport>
    where
        F: FnMut(&LifecycleEvent),
    {
        self.power_batch(filter, Power::Stop, on_event).await
    }

    /// Issues a start request for every instance
    pub async fn start_instances<F>(
        &self,
        filter: &ProjectFilter,
        on_event: F,
    ) -> Result<BatchReport>
    where
        F: FnMut(&LifecycleEvent),
    {
        self.power_batch(filter, Power::Start, on_event).await
    }

    async fn power_batch<F>(
        &self,
        filter: &ProjectFilter,
        power: Power,
        mut on_event: F,
    ) -> Result<BatchReport>
    where
        F: FnMut(&LifecycleEvent),
    {
        let start = Instant::now();
        let mut report = BatchReport::new();
        let mut instances = filter_instances(self.provider, filter);

        while let Some(instance) = instances.try_next().await? {
            let instance_id = instance.id.clone();
            let (phase, result) = match power {
                Power::Stop => {
                    on_event(&LifecycleEvent::Stopping {
                        instance_id: instance_id.clone(),
                    });
                    tracing::info!("Stopping {}", instance_id);
                    let result = self.provider.stop_instance(&instance).await;
                    (LifecyclePhase::Stopping, result.map_err(|e| (FailureKind::StopRequest, e)))
                }
                Power::Start => {
                    on_event(&LifecycleEvent::Starting {
                        instance_id: instance_id.clone(),
                    });
                    tracing::info!("Starting {}", instance_id);
                    let result = self.provider.start_instance(&instance).await;
                    (LifecyclePhase::Starting, result.map_err(|e| (FailureKind::StartRequest, e)))
                }
            };

            let instance_report = match result {
                Ok(()) => InstanceReport::succeeded(instance_id, phase, Outcome::default()),
                Err((kind, error)) => {
                    let failure = InstanceFailure::new(kind, error);
                    tracing::warn!("{}: {}", instance_id, failure);
                    on_event(&LifecycleEvent::Failed {
                        instance_id: instance_id.clone(),
                        failure: failure.clone(),
                    });
                    InstanceReport::halted(instance_id, phase, failure)
                }
            };

            report.push(instance_report);
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        Ok(report)
    }

    /// Stops each instance, snapshots its volumes and starts it again.
    ///
    /// Instances are processed strictly one after the other. Per instance the
    /// order is: stop, wait until stopped, one snapshot per volume that has no
    /// pending snapshot, start, wait until running.
    ///
    /// A failed stop request or stop wait ends that instance's processing
    /// right there: no volume is touched and no start is attempted. A failed
    /// volume step skips the remaining volumes but the instance is still
    /// started again; if that restart fails too, both failures are reported,
    /// snapshot failure first.
    pub async fn snapshot_instances<F>(
        &self,
        filter: &ProjectFilter,
        mut on_event: F,
    ) -> Result<BatchReport>
    where
        F: FnMut(&LifecycleEvent),
    {
        let start = Instant::now();
        let mut report = BatchReport::new();
        let mut instances = filter_instances(self.provider, filter);

        while let Some(instance) = instances.try_next().await? {
            let instance_report = self.snapshot_instance(&instance, &mut on_event).await;
            if instance_report.is_success() {
                on_event(&LifecycleEvent::Done {
                    instance_id: instance.id.clone(),
                });
            }
            for failure in &instance_report.failures {
                tracing::warn!(
                    "{} halted while {}: {}",
                    instance.id,
                    instance_report.phase,
                    failure
                );
                on_event(&LifecycleEvent::Failed {
                    instance_id: instance.id.clone(),
                    failure: failure.clone(),
                });
            }
            report.push(instance_report);
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        Ok(report)
    }

    async fn snapshot_instance<F>(&self, instance: &Instance, on_event: &mut F) -> InstanceReport
    where
        F: FnMut(&LifecycleEvent),
    {
        let id = instance.id.clone();
        let halt = |phase: LifecyclePhase, kind: FailureKind, error: CloudError| {
            InstanceReport::halted(id.clone(), phase, InstanceFailure::new(kind, error))
        };

        on_event(&LifecycleEvent::Stopping {
            instance_id: id.clone(),
        });
        tracing::info!("{}: running -> stopping", id);
        if let Err(e) = self.provider.stop_instance(instance).await {
            return halt(LifecyclePhase::Running, FailureKind::StopRequest, e);
        }

        on_event(&LifecycleEvent::WaitingStopped {
            instance_id: id.clone(),
        });
        if let Err(e) = self.provider.wait_until_stopped(instance).await {
            return halt(LifecyclePhase::Stopping, FailureKind::WaitStopped, e);
        }
        tracing::info!("{}: stopped -> snapshotting", id);

        let mut outcome = Outcome::default();
        let snapshot_failure = self
            .snapshot_volumes(instance, &mut outcome, on_event)
            .await
            .err();

        on_event(&LifecycleEvent::Starting {
            instance_id: id.clone(),
        });
        tracing::info!("{}: snapshotting -> starting", id);
        let restarted = match self.provider.start_instance(instance).await {
            Err(e) => Err((LifecyclePhase::Stopped, FailureKind::StartRequest, e)),
            Ok(()) => {
                on_event(&LifecycleEvent::WaitingRunning {
                    instance_id: id.clone(),
                });
                self.provider
                    .wait_until_running(instance)
                    .await
                    .map_err(|e| (LifecyclePhase::Starting, FailureKind::WaitRunning, e))
            }
        };

        let mut report = InstanceReport::succeeded(id.clone(), LifecyclePhase::Running, outcome);
        report.failures.extend(snapshot_failure);
        match restarted {
            Ok(()) => tracing::info!("{}: starting -> running", id),
            Err((phase, kind, error)) => {
                report.phase = phase;
                report.failures.push(InstanceFailure::new(kind, error));
            }
        }
        report
    }

    async fn snapshot_volumes<F>(
        &self,
        instance: &Instance,
        outcome: &mut Outcome,
        on_event: &mut F,
    ) -> std::result::Result<(), InstanceFailure>
    where
        F: FnMut(&LifecycleEvent),
    {
        let snapshot_failure = |error: CloudError, volume: Option<&Volume>| {
            let failure = InstanceFailure::new(FailureKind::Snapshot, error);
            match volume {
                Some(v) => failure.on_volume(&v.id),
                None => failure,
            }
        };

        let mut volumes = self.provider.volumes(instance);
        while let Some(volume) = volumes
            .try_next()
            .await
            .map_err(|e| snapshot_failure(e, None))?
        {
            // Re-read right before creating; the snapshot set is a live view.
            let pending = has_pending_snapshot(self.provider, &volume)
                .await
                .map_err(|e| snapshot_failure(e, Some(&volume)))?;

            if pending {
                tracing::info!("Skipping {}: snapshot already pending", volume.id);
                on_event(&LifecycleEvent::SnapshotSkipped {
                    volume_id: volume.id.clone(),
                });
                outcome.skipped.push(volume.id.clone());
                continue;
            }

            on_event(&LifecycleEvent::SnapshotCreating {
                volume_id: volume.id.clone(),
            });
            let snapshot_id = self
                .provider
                .create_snapshot(&volume, &self.options.snapshot_description)
                .await
                .map_err(|e| snapshot_failure(e, Some(&volume)))?;

            tracing::info!("Requested {} of {}", snapshot_id, volume.id);
            on_event(&LifecycleEvent::SnapshotCreated {
                volume_id: volume.id.clone(),
                snapshot_id: snapshot_id.clone(),
            });
            outcome.created.push(snapshot_id);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum Power {
    Stop,
    Start,
}
