mod cli;
mod commands;
mod output;

use clap::Parser;
use cli::{Cli, Commands, InstanceCommands, SnapshotCommands, VolumeCommands};
use shotty_cloud::SnapshotListing;
use shotty_cloud_aws::Ec2Provider;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries records and outcome lines only; logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    // Version needs no provider connection
    if matches!(cli.command, Commands::Version) {
        println!("shotty {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let provider = Ec2Provider::connect(&cli.settings.aws()).await?;

    match cli.command {
        Commands::Snapshots(SnapshotCommands::List { project, all }) => {
            commands::snapshots::handle_list(
                &provider,
                project.filter(),
                SnapshotListing::from_all_flag(all),
            )
            .await?;
        }
        Commands::Volumes(VolumeCommands::List { project }) => {
            commands::volumes::handle_list(&provider, project.filter()).await?;
        }
        Commands::Instances(instance_cmd) => match instance_cmd {
            InstanceCommands::List { project } => {
                commands::instances::handle_list(&provider, project.filter()).await?;
            }
            InstanceCommands::Stop { project } => {
                commands::instances::handle_stop(&provider, project.filter()).await?;
            }
            InstanceCommands::Start { project } => {
                commands::instances::handle_start(&provider, project.filter()).await?;
            }
            InstanceCommands::Snapshot {
                project,
                description,
            } => {
                commands::instances::handle_snapshot(
                    &provider,
                    InstanceCommands::lifecycle(&description),
                    project.filter(),
                )
                .await?;
            }
        },
        Commands::Version => {
            unreachable!("Version is handled before connecting");
        }
    }

    Ok(())
}
