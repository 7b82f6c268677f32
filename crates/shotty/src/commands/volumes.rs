use shotty_cloud::{ComputeProvider, ProjectFilter, listing};

pub async fn handle_list(
    provider: &dyn ComputeProvider,
    project: ProjectFilter,
) -> anyhow::Result<()> {
    let count = listing::list_volumes(provider, &project, |record| {
        println!("{}", record);
    })
    .await?;

    tracing::debug!("Listed {} volumes", count);
    Ok(())
}
