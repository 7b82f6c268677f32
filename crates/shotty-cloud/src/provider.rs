//! Cloud provider trait definition

use crate::error::{CloudError, Result};
use crate::model::{Instance, ProjectFilter, Snapshot, Volume};
use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, StreamExt, TryStreamExt};
use std::future::Future;

/// Lazy, finite sequence of provider resources. Consumed once.
pub type ResourceStream<'a, T> = BoxStream<'a, Result<T>>;

/// Compute/storage control plane consumed by the orchestrator
///
/// The handle is created once at startup and passed to every component that
/// talks to the provider. Implementations must not retry internally; errors
/// are handed back verbatim.
#[async_trait]
pub trait ComputeProvider: Send + Sync {
    /// Returns the provider name (e.g., "aws-ec2")
    fn name(&self) -> &str;

    /// Instances matching `filter`, restricted on the provider side
    fn instances(&self, filter: &ProjectFilter) -> ResourceStream<'_, Instance>;

    /// Volumes attached to `instance`
    fn volumes(&self, instance: &Instance) -> ResourceStream<'_, Volume>;

    /// Snapshots of `volume`, newest first
    fn snapshots(&self, volume: &Volume) -> ResourceStream<'_, Snapshot>;

    async fn stop_instance(&self, instance: &Instance) -> Result<()>;

    async fn start_instance(&self, instance: &Instance) -> Result<()>;

    /// Blocks until the instance reports `stopped`, bounded by the provider's
    /// own timeout.
    async fn wait_until_stopped(&self, instance: &Instance) -> Result<()>;

    /// Blocks until the instance reports `running`, bounded by the provider's
    /// own timeout.
    async fn wait_until_running(&self, instance: &Instance) -> Result<()>;

    /// Requests a new snapshot and returns its id. The snapshot starts out
    /// `pending`; completion is not awaited.
    async fn create_snapshot(&self, volume: &Volume, description: &str) -> Result<String>;
}

/// One page of a token-paginated listing
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_token: Option<String>) -> Self {
        Self { items, next_token }
    }
}

enum Cursor {
    Start,
    Next(String),
    Done,
}

/// Turns a token-paginated API into a [`ResourceStream`]
///
/// `fetch` is called with `None` for the first page and with the previous
/// page's token afterwards. Pages are only requested as the stream is
/// polled; an empty or missing token ends the stream. The first error ends
/// the stream as well.
pub fn paginate<'a, T, F, Fut>(fetch: F) -> ResourceStream<'a, T>
where
    T: Send + 'a,
    F: FnMut(Option<String>) -> Fut + Send + 'a,
    Fut: Future<Output = Result<Page<T>>> + Send + 'a,
{
    stream::try_unfold((Cursor::Start, fetch), |(cursor, mut fetch)| async move {
        let token = match cursor {
            Cursor::Start => None,
            Cursor::Next(token) => Some(token),
            Cursor::Done => return Ok(None),
        };

        let page = fetch(token).await?;
        let cursor = match page.next_token {
            Some(token) if !token.is_empty() => Cursor::Next(token),
            _ => Cursor::Done,
        };

        let items = stream::iter(page.items.into_iter().map(Ok::<T, CloudError>));
        Ok(Some((items, (cursor, fetch))))
    })
    .try_flatten()
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_paginate_follows_tokens() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let items: Vec<u32> = paginate(move |token| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move {
                Ok(match token.as_deref() {
                    None => Page::new(vec![1, 2], Some("p2".to_string())),
                    Some("p2") => Page::new(vec![3], Some(String::new())),
                    Some(other) => panic!("unexpected token {other}"),
                })
            }
        })
        .try_collect()
        .await
        .unwrap();

        assert_eq!(items, vec![1, 2, 3]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_paginate_is_lazy() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let mut stream = paginate(move |token| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move {
                let next = token.map_or(1, |t| t.parse::<u32>().unwrap() + 1);
                Ok(Page::new(vec![next], Some(next.to_string())))
            }
        });

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(stream.next().await, Some(Ok(1)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_paginate_stops_on_error() {
        let mut stream = paginate(|token: Option<String>| async move {
            match token {
                None => Ok(Page::new(vec!["a"], Some("next".to_string()))),
                Some(_) => Err(CloudError::Api("throttled".to_string())),
            }
        });

        assert_eq!(stream.next().await, Some(Ok("a")));
        assert_eq!(
            stream.next().await,
            Some(Err(CloudError::Api("throttled".to_string())))
        );
        assert_eq!(stream.next().await, None);
    }
}
