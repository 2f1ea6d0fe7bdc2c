use std::time::Duration;

use jobrelay_core::{ChannelError, PageId};
use serde_json::Value;
use tokio::sync::watch;

/// Lifecycle of a page as reported by its host. Later states imply earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PageStatus {
    Loading,
    /// The load event fired.
    Complete,
    /// Client-side rendering has settled as well.
    Rendered,
}

/// One-shot wait on a page's load status.
///
/// Waiting consumes the subscription, so it fires at most once; dropping it
/// unsubscribes.
pub struct LoadSubscription {
    status: watch::Receiver<PageStatus>,
}

impl LoadSubscription {
    pub fn new(status: watch::Receiver<PageStatus>) -> Self {
        Self { status }
    }

    /// Resolves once the page reports `Complete`, then waits for `Rendered`
    /// for at most `settle`. There is no bound on the first wait.
    pub async fn settle(mut self, settle: Duration) -> Result<(), ChannelError> {
        self.status
            .wait_for(|status| *status >= PageStatus::Complete)
            .await
            .map_err(|_| ChannelError::Closed)?;
        let rendered = self
            .status
            .wait_for(|status| *status >= PageStatus::Rendered);
        match tokio::time::timeout(settle, rendered).await {
            Ok(Ok(_)) | Err(_) => Ok(()),
            Ok(Err(_)) => Err(ChannelError::Closed),
        }
    }
}

/// Host of isolated page contexts, seen from the privileged context.
///
/// Pages never share memory with the caller: every interaction is a message
/// that may fail on its own.
#[async_trait::async_trait]
pub trait Browser: Send + Sync {
    /// Opens a new inactive page navigated to `url`.
    async fn open_page(&self, url: &str) -> Result<PageId, ChannelError>;

    fn subscribe_load(&self, page: PageId) -> Result<LoadSubscription, ChannelError>;

    /// Installs the extraction agent in the page.
    async fn inject_agent(&self, page: PageId) -> Result<(), ChannelError>;

    /// Sends one request to the page's agent and waits for its reply.
    async fn send(&self, page: PageId, request: Value) -> Result<Value, ChannelError>;

    async fn close_page(&self, page: PageId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn settle_waits_full_budget_without_render_signal() {
        let (tx, rx) = watch::channel(PageStatus::Loading);
        let sub = LoadSubscription::new(rx);
        let started = tokio::time::Instant::now();

        let waiter = tokio::spawn(sub.settle(Duration::from_millis(2000)));
        tx.send(PageStatus::Complete).unwrap();

        assert_eq!(waiter.await.unwrap(), Ok(()));
        assert!(started.elapsed() >= Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn settle_returns_early_once_rendered() {
        let (tx, rx) = watch::channel(PageStatus::Rendered);
        let started = tokio::time::Instant::now();

        LoadSubscription::new(rx)
            .settle(Duration::from_millis(2000))
            .await
            .unwrap();

        assert!(started.elapsed() < Duration::from_millis(2000));
        drop(tx);
    }

    #[tokio::test]
    async fn settle_fails_when_page_goes_away() {
        let (tx, rx) = watch::channel(PageStatus::Loading);
        drop(tx);
        assert_eq!(
            LoadSubscription::new(rx).settle(Duration::from_millis(10)).await,
            Err(ChannelError::Closed)
        );
    }
}
