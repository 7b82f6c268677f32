//! EC2 provider implementation

use crate::convert;
use crate::error::{AwsError, Result};
use crate::settings::AwsSettings;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_ec2::Client;
use aws_sdk_ec2::client::Waiters;
use aws_sdk_ec2::config::Region;
use aws_sdk_ec2::types::Filter;
use futures_util::stream::{self, StreamExt, TryStreamExt};
use shotty_cloud::{
    CloudError, ComputeProvider, Instance, Page, ProjectFilter, ResourceStream, Snapshot, Volume,
    paginate,
};
use std::time::Duration;

/// `ComputeProvider` backed by the EC2 API
#[derive(Debug, Clone)]
pub struct Ec2Provider {
    client: Client,
    wait_timeout: Duration,
}

impl Ec2Provider {
    /// Loads SDK configuration (default credential chain, optionally pinned
    /// to a profile and region) and builds a client.
    pub async fn connect(settings: &AwsSettings) -> Result<Self> {
        settings.validate()?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(profile) = &settings.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(region) = &settings.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let config = loader.load().await;

        let region = config.region().ok_or(AwsError::MissingRegion)?;
        tracing::debug!(
            "Connected to EC2 in {} (profile: {})",
            region,
            settings.profile.as_deref().unwrap_or("default chain")
        );

        Ok(Self::from_client(Client::new(&config), settings.wait_timeout))
    }

    pub fn from_client(client: Client, wait_timeout: Duration) -> Self {
        Self {
            client,
            wait_timeout,
        }
    }
}

fn filter(name: &str, value: &str) -> Filter {
    Filter::builder().name(name).values(value).build()
}

/// Server-side project restriction
fn project_filters(project: &ProjectFilter) -> Option<Vec<Filter>> {
    project
        .project()
        .map(|p| vec![filter(&format!("tag:{}", shotty_cloud::model::NAME_TAG), p)])
}

#[async_trait]
impl ComputeProvider for Ec2Provider {
    fn name(&self) -> &str {
        "aws-ec2"
    }

    fn instances(&self, project: &ProjectFilter) -> ResourceStream<'_, Instance> {
        let client = self.client.clone();
        let filters = project_filters(project);

        paginate(move |token| {
            let request = client
                .describe_instances()
                .set_filters(filters.clone())
                .set_next_token(token);
            async move {
                tracing::debug!("DescribeInstances");
                let output = request
                    .send()
                    .await
                    .map_err(|e| AwsError::sdk("DescribeInstances", e))?;

                let items = output
                    .reservations()
                    .iter()
                    .flat_map(|r| r.instances())
                    .map(convert::instance)
                    .collect();
                Ok::<_, CloudError>(Page::new(items, output.next_token().map(str::to_string)))
            }
        })
    }

    fn volumes(&self, instance: &Instance) -> ResourceStream<'_, Volume> {
        let client = self.client.clone();
        let instance_id = instance.id.clone();

        paginate(move |token| {
            let request = client
                .describe_volumes()
                .filters(filter("attachment.instance-id", &instance_id))
                .set_next_token(token);
            let instance_id = instance_id.clone();
            async move {
                tracing::debug!("DescribeVolumes for {}", instance_id);
                let output = request
                    .send()
                    .await
                    .map_err(|e| AwsError::sdk("DescribeVolumes", e))?;

                let items = output
                    .volumes()
                    .iter()
                    .map(|v| convert::volume(v, &instance_id))
                    .collect();
                Ok::<_, CloudError>(Page::new(items, output.next_token().map(str::to_string)))
            }
        })
    }

    /// EC2 does not promise any order here, so every page of the volume is
    /// read and sorted newest-first before the first item is yielded.
    fn snapshots(&self, volume: &Volume) -> ResourceStream<'_, Snapshot> {
        let client = self.client.clone();
        let volume_id = volume.id.clone();

        let pages = paginate(move |token| {
            let request = client
                .describe_snapshots()
                .filters(filter("volume-id", &volume_id))
                .set_next_token(token);
            let volume_id = volume_id.clone();
            async move {
                tracing::debug!("DescribeSnapshots for {}", volume_id);
                let output = request
                    .send()
                    .await
                    .map_err(|e| AwsError::sdk("DescribeSnapshots", e))?;

                let items = output.snapshots().iter().map(convert::snapshot).collect();
                Ok::<_, CloudError>(Page::new(items, output.next_token().map(str::to_string)))
            }
        });

        stream::once(async move {
            let mut snapshots: Vec<Snapshot> = pages.try_collect().await?;
            snapshots.sort_by(|a, b| b.start_time.cmp(&a.start_time));
            Ok::<_, CloudError>(stream::iter(snapshots.into_iter().map(Ok)))
        })
        .try_flatten()
        .boxed()
    }

    async fn stop_instance(&self, instance: &Instance) -> shotty_cloud::Result<()> {
        tracing::debug!("StopInstances {}", instance.id);
        self.client
            .stop_instances()
            .instance_ids(&instance.id)
            .send()
            .await
            .map_err(|e| AwsError::sdk("StopInstances", e))?;
        Ok(())
    }

    async fn start_instance(&self, instance: &Instance) -> shotty_cloud::Result<()> {
        tracing::debug!("StartInstances {}", instance.id);
        self.client
            .start_instances()
            .instance_ids(&instance.id)
            .send()
            .await
            .map_err(|e| AwsError::sdk("StartInstances", e))?;
        Ok(())
    }

    async fn wait_until_stopped(&self, instance: &Instance) -> shotty_cloud::Result<()> {
        tracing::debug!("Waiting up to {:?} for {} to stop", self.wait_timeout, instance.id);
        self.client
            .wait_until_instance_stopped()
            .instance_ids(&instance.id)
            .wait(self.wait_timeout)
            .await
            .map_err(|e| AwsError::wait(&instance.id, "stopped", e))?;
        Ok(())
    }

    async fn wait_until_running(&self, instance: &Instance) -> shotty_cloud::Result<()> {
        tracing::debug!("Waiting up to {:?} for {} to run", self.wait_timeout, instance.id);
        self.client
            .wait_until_instance_running()
            .instance_ids(&instance.id)
            .wait(self.wait_timeout)
            .await
            .map_err(|e| AwsError::wait(&instance.id, "running", e))?;
        Ok(())
    }

    async fn create_snapshot(
        &self,
        volume: &Volume,
        description: &str,
    ) -> shotty_cloud::Result<String> {
        tracing::debug!("CreateSnapshot {} ({})", volume.id, description);
        let output = self
            .client
            .create_snapshot()
            .volume_id(&volume.id)
            .description(description)
            .send()
            .await
            .map_err(|e| AwsError::sdk("CreateSnapshot", e))?;

        output.snapshot_id().map(str::to_string).ok_or_else(|| {
            CloudError::Api(format!("CreateSnapshot for {} returned no id", volume.id))
        })
    }
}
