use clap::{Args, Parser, Subcommand};
use shotty_cloud::{LifecycleOptions, ProjectFilter};
use shotty_cloud_aws::AwsSettings;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "shotty")]
#[command(about = "Shotty manages EC2 instances, volumes and snapshots", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub settings: Settings,

    #[command(subcommand)]
    pub command: Commands,
}

/// Connection and workflow settings shared by every command
#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// AWS shared-config profile (default: SDK credential chain)
    #[arg(long, global = true)]
    pub profile: Option<String>,

    /// AWS region (default: taken from the profile)
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Seconds to wait for an instance to stop or start
    #[arg(
        long,
        global = true,
        default_value_t = 600,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub wait_timeout: u64,
}

impl Settings {
    pub fn aws(&self) -> AwsSettings {
        AwsSettings {
            profile: self.profile.clone(),
            region: self.region.clone(),
            wait_timeout: Duration::from_secs(self.wait_timeout),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Commands for snapshots
    #[command(subcommand)]
    Snapshots(SnapshotCommands),
    /// Commands for volumes
    #[command(subcommand)]
    Volumes(VolumeCommands),
    /// Commands for instances
    #[command(subcommand)]
    Instances(InstanceCommands),
    /// Show version information
    Version,
}

/// Project tag selector shared by every subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct ProjectArg {
    /// Only resources of instances whose Name tag equals PROJECT
    #[arg(long)]
    pub project: Option<String>,
}

impl ProjectArg {
    pub fn filter(&self) -> ProjectFilter {
        ProjectFilter::new(self.project.clone())
    }
}

#[derive(Subcommand, Debug)]
pub enum SnapshotCommands {
    /// List snapshots (latest completed one per volume unless --all)
    List {
        #[command(flatten)]
        project: ProjectArg,
        /// List every snapshot of every volume
        #[arg(long)]
        all: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum VolumeCommands {
    /// List volumes
    List {
        #[command(flatten)]
        project: ProjectArg,
    },
}

#[derive(Subcommand, Debug)]
pub enum InstanceCommands {
    /// List instances
    List {
        #[command(flatten)]
        project: ProjectArg,
    },
    /// Stop instances
    Stop {
        #[command(flatten)]
        project: ProjectArg,
    },
    /// Start instances
    Start {
        #[command(flatten)]
        project: ProjectArg,
    },
    /// Stop instances, snapshot their volumes and start them again
    Snapshot {
        #[command(flatten)]
        project: ProjectArg,
        /// Description stored on every new snapshot
        #[arg(long, default_value = shotty_cloud::DEFAULT_SNAPSHOT_DESCRIPTION)]
        description: String,
    },
}

impl InstanceCommands {
    pub fn lifecycle(description: &str) -> LifecycleOptions {
        LifecycleOptions {
            snapshot_description: description.to_string(),
        }
    }
}
