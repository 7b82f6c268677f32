//! AWS provider for shotty
//!
//! Implements [`ComputeProvider`](shotty_cloud::ComputeProvider) on top of
//! the EC2 API: instances, their attached EBS volumes, and EBS snapshots.
//!
//! # Requirements
//!
//! - Credentials resolvable by the AWS SDK default chain (environment,
//!   shared config/credentials files, SSO, instance profile, ...)
//! - A region, either from `AwsSettings::region` or the resolved profile
//!
//! # Example
//!
//! ```ignore
//! use shotty_cloud::{ProjectFilter, listing};
//! use shotty_cloud_aws::{AwsSettings, Ec2Provider};
//!
//! let provider = Ec2Provider::connect(&AwsSettings::default()).await?;
//! listing::list_instances(&provider, &ProjectFilter::all(), |r| println!("{r}")).await?;
//! ```

mod convert;
pub mod error;
pub mod provider;
pub mod settings;

pub use error::{AwsError, Result};
pub use provider::Ec2Provider;
pub use settings::{AwsSettings, DEFAULT_WAIT_TIMEOUT};
