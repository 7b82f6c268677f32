//! Project filter resolution

use crate::model::{Instance, ProjectFilter};
use crate::provider::{ComputeProvider, ResourceStream};

/// Resolves `filter` into the instances in scope for a command.
///
/// The restriction is applied by the provider; the returned stream is not
/// re-filtered here. Provider errors come back unchanged through the stream.
pub fn filter_instances<'a>(
    provider: &'a dyn ComputeProvider,
    filter: &ProjectFilter,
) -> ResourceStream<'a, Instance> {
    tracing::debug!("Resolving instances on {} for {}", provider.name(), filter);
    provider.instances(filter)
}
