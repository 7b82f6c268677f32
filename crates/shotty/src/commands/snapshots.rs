use shotty_cloud::{ComputeProvider, ProjectFilter, SnapshotListing, listing};

pub async fn handle_list(
    provider: &dyn ComputeProvider,
    project: ProjectFilter,
    mode: SnapshotListing,
) -> anyhow::Result<()> {
    let count = listing::list_snapshots(provider, &project, mode, |record| {
        println!("{}", record);
    })
    .await?;

    tracing::debug!("Listed {} snapshots ({:?})", count, mode);
    Ok(())
}
