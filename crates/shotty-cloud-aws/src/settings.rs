//! Connection settings for the EC2 provider

use crate::error::{AwsError, Result};
use std::time::Duration;

/// Matches the classic EC2 waiter budget of 40 polls at 15 second intervals.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(600);

/// How to reach EC2
///
/// Credentials are always resolved by the SDK's default chain; `profile`
/// only pins which shared-config profile that chain reads.
#[derive(Debug, Clone)]
pub struct AwsSettings {
    pub profile: Option<String>,
    pub region: Option<String>,
    /// Upper bound for each stop/start wait
    pub wait_timeout: Duration,
}

impl Default for AwsSettings {
    fn default() -> Self {
        Self {
            profile: None,
            region: None,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
        }
    }
}

impl AwsSettings {
    pub fn validate(&self) -> Result<()> {
        if self.wait_timeout.is_zero() {
            return Err(AwsError::InvalidSettings(
                "wait timeout must be greater than zero".to_string(),
            ));
        }
        if self.profile.as_deref() == Some("") {
            return Err(AwsError::InvalidSettings(
                "profile name must not be empty".to_string(),
            ));
        }
        if self.region.as_deref() == Some("") {
            return Err(AwsError::InvalidSettings(
                "region must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
