use crate::output;
use colored::Colorize;
use shotty_cloud::{ComputeProvider, LifecycleOptions, Orchestrator, ProjectFilter, listing};

pub async fn handle_list(
    provider: &dyn ComputeProvider,
    project: ProjectFilter,
) -> anyhow::Result<()> {
    let count = listing::list_instances(provider, &project, |record| {
        println!("{}", record);
    })
    .await?;

    tracing::debug!("Listed {} instances", count);
    Ok(())
}

/// Per-instance failures are printed, never returned.
pub async fn handle_stop(
    provider: &dyn ComputeProvider,
    project: ProjectFilter,
) -> anyhow::Result<()> {
    let orchestrator = Orchestrator::new(provider, LifecycleOptions::default());
    let report = orchestrator
        .stop_instances(&project, output::print_event)
        .await?;

    output::print_summary(&report);
    Ok(())
}

pub async fn handle_start(
    provider: &dyn ComputeProvider,
    project: ProjectFilter,
) -> anyhow::Result<()> {
    let orchestrator = Orchestrator::new(provider, LifecycleOptions::default());
    let report = orchestrator
        .start_instances(&project, output::print_event)
        .await?;

    output::print_summary(&report);
    Ok(())
}

pub async fn handle_snapshot(
    provider: &dyn ComputeProvider,
    options: LifecycleOptions,
    project: ProjectFilter,
) -> anyhow::Result<()> {
    println!("{}", format!("Snapshotting instances ({})", project).blue());

    let orchestrator = Orchestrator::new(provider, options);
    let report = orchestrator
        .snapshot_instances(&project, output::print_event)
        .await?;

    let created: usize = report
        .instances
        .iter()
        .map(|r| r.outcome.created.len())
        .sum();
    tracing::info!("{} snapshots requested", created);

    output::print_summary(&report);
    Ok(())
}
