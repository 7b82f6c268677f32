//! AWS provider error types

use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use shotty_cloud::CloudError;
use thiserror::Error;

/// EC2 error codes that mean the credentials are missing or not allowed
const AUTH_ERROR_CODES: &[&str] = &[
    "AuthFailure",
    "UnauthorizedOperation",
    "InvalidClientTokenId",
    "OptInRequired",
    "SignatureDoesNotMatch",
    "ExpiredToken",
];

#[derive(Error, Debug)]
pub enum AwsError {
    #[error("No AWS region configured. Pass --region or set one in the profile")]
    MissingRegion,

    #[error("Invalid AWS settings: {0}")]
    InvalidSettings(String),

    #[error("{operation} failed: {code}: {message}")]
    Service {
        operation: &'static str,
        code: String,
        message: String,
    },

    #[error("{operation} failed: {detail}")]
    Transport {
        operation: &'static str,
        detail: String,
    },

    #[error("{instance_id} did not reach '{target}': {detail}")]
    Wait {
        instance_id: String,
        target: &'static str,
        detail: String,
    },
}

impl AwsError {
    /// Wraps an SDK error, keeping the service error code when there is one
    pub fn sdk<E, R>(operation: &'static str, err: SdkError<E, R>) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + 'static,
        R: std::fmt::Debug,
    {
        match err.code() {
            Some(code) => AwsError::Service {
                operation,
                code: code.to_string(),
                message: err.message().unwrap_or_default().to_string(),
            },
            None => AwsError::Transport {
                operation,
                detail: DisplayErrorContext(&err).to_string(),
            },
        }
    }

    pub fn wait<E>(instance_id: &str, target: &'static str, err: E) -> Self
    where
        E: std::error::Error,
    {
        AwsError::Wait {
            instance_id: instance_id.to_string(),
            target,
            detail: DisplayErrorContext(&err).to_string(),
        }
    }

    fn is_auth_failure(&self) -> bool {
        matches!(self, AwsError::Service { code, .. } if AUTH_ERROR_CODES.contains(&code.as_str()))
    }

    fn is_not_found(&self) -> bool {
        matches!(self, AwsError::Service { code, .. } if code.ends_with(".NotFound"))
    }
}

impl From<AwsError> for CloudError {
    fn from(err: AwsError) -> Self {
        let message = err.to_string();
        match err {
            AwsError::MissingRegion | AwsError::InvalidSettings(_) => {
                CloudError::InvalidConfig(message)
            }
            AwsError::Wait { .. } => CloudError::Timeout(message),
            ref e if e.is_auth_failure() => CloudError::AuthenticationFailed(message),
            ref e if e.is_not_found() => CloudError::ResourceNotFound(message),
            _ => CloudError::Api(message),
        }
    }
}

pub type Result<T> = std::result::Result<T, AwsError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn service(code: &str) -> AwsError {
        AwsError::Service {
            operation: "DescribeInstances",
            code: code.to_string(),
            message: "nope".to_string(),
        }
    }

    #[test]
    fn test_auth_codes_map_to_authentication_failed() {
        let err = CloudError::from(service("UnauthorizedOperation"));
        assert_eq!(
            err,
            CloudError::AuthenticationFailed(
                "DescribeInstances failed: UnauthorizedOperation: nope".to_string()
            )
        );
    }

    #[test]
    fn test_not_found_codes() {
        let err = CloudError::from(service("InvalidInstanceID.NotFound"));
        assert!(matches!(err, CloudError::ResourceNotFound(_)));
    }

    #[test]
    fn test_other_codes_are_api_errors() {
        let err = CloudError::from(service("RequestLimitExceeded"));
        assert!(matches!(err, CloudError::Api(_)));
    }

    #[test]
    fn test_wait_and_settings_mapping() {
        let wait = AwsError::Wait {
            instance_id: "i-1".to_string(),
            target: "stopped",
            detail: "exceeded max wait time".to_string(),
        };
        assert_eq!(
            CloudError::from(wait),
            CloudError::Timeout("i-1 did not reach 'stopped': exceeded max wait time".to_string())
        );
        assert!(matches!(
            CloudError::from(AwsError::MissingRegion),
            CloudError::InvalidConfig(_)
        ));
    }
}
