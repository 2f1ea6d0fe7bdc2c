use std::sync::Arc;
use std::time::Duration;

use jobrelay_core::{encode_extraction_reply, JobRecord, Request};
use jobrelay_logging::{relay_debug, relay_trace};
use serde_json::Value;

use crate::clipboard::ClipboardChain;
use crate::extract::RecordExtractor;
use crate::PageSource;

/// How long the agent keeps re-reading a page that has not rendered its
/// title or company yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total extraction attempts, including the first.
    pub attempts: u32,
    /// Pause before each retry.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 2,
            delay: Duration::from_millis(1000),
        }
    }
}

/// Current document state of the page the agent lives in.
pub trait DocumentSource: Send + Sync {
    fn snapshot(&self) -> PageSource;
}

/// A page whose markup never changes after load.
pub struct StaticDocument(pub PageSource);

impl DocumentSource for StaticDocument {
    fn snapshot(&self) -> PageSource {
        self.0.clone()
    }
}

/// Page-side responder: answers extraction and clipboard requests.
pub struct ExtractionAgent {
    source: Arc<dyn DocumentSource>,
    extractor: Arc<dyn RecordExtractor>,
    clipboard: ClipboardChain,
    retry: RetryPolicy,
}

impl ExtractionAgent {
    pub fn new(
        source: Arc<dyn DocumentSource>,
        extractor: Arc<dyn RecordExtractor>,
        clipboard: ClipboardChain,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            source,
            extractor,
            clipboard,
            retry,
        }
    }

    /// Answers one raw request. Unknown or malformed requests get no reply.
    pub async fn handle(&self, request: Value) -> Option<Value> {
        match Request::from_value(request)? {
            Request::ExtractJobData => {
                let record = self.extract().await;
                Some(encode_extraction_reply(Some(&record)))
            }
            Request::CopyToClipboard { data } => {
                let reply = self.clipboard.copy(&data).await;
                serde_json::to_value(reply).ok()
            }
            Request::SendToGoogleSheets { .. } => {
                relay_trace!("Page agent ignores relay requests");
                None
            }
        }
    }

    /// Extracts, re-reading the page after `retry.delay` while neither title
    /// nor company is present. The last attempt is returned even if empty.
    pub async fn extract(&self) -> JobRecord {
        let mut record = self.extractor.extract(&self.source.snapshot());
        let mut attempt = 1;
        while !record.has_identity() && attempt < self.retry.attempts {
            relay_debug!(
                "Extraction attempt {} came back empty, retrying in {:?}",
                attempt,
                self.retry.delay
            );
            tokio::time::sleep(self.retry.delay).await;
            record = self.extractor.extract(&self.source.snapshot());
            attempt += 1;
        }
        record
    }
}
