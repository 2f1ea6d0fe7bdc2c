use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use jobrelay_core::{ChannelError, PageId};
use jobrelay_logging::{relay_debug, relay_info, relay_warn};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::agent::{ExtractionAgent, StaticDocument};
use crate::browser::{Browser, LoadSubscription, PageStatus};
use crate::fetch::Fetcher;
use crate::PageSource;

const PAGE_QUEUE_DEPTH: usize = 16;

/// Builds the agent installed into a page once its document is known.
pub type AgentFactory = Arc<dyn Fn(Arc<StaticDocument>) -> ExtractionAgent + Send + Sync>;

enum PageCommand {
    Inject {
        reply: oneshot::Sender<Result<(), ChannelError>>,
    },
    Deliver {
        request: Value,
        reply: oneshot::Sender<Result<Value, ChannelError>>,
    },
}

struct PageEntry {
    status: watch::Receiver<PageStatus>,
    commands: mpsc::Sender<PageCommand>,
    task: JoinHandle<()>,
}

/// Page host that loads pages over HTTP. Each page runs as its own task and
/// is reachable only through its command channel.
pub struct HttpBrowser {
    fetcher: Arc<dyn Fetcher>,
    agent_factory: AgentFactory,
    pages: Mutex<HashMap<PageId, PageEntry>>,
    next_id: AtomicU64,
}

impl HttpBrowser {
    pub fn new(fetcher: Arc<dyn Fetcher>, agent_factory: AgentFactory) -> Self {
        Self {
            fetcher,
            agent_factory,
            pages: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn open_pages(&self) -> usize {
        self.pages.lock().map(|pages| pages.len()).unwrap_or(0)
    }

    fn commands(&self, page: PageId) -> Result<mpsc::Sender<PageCommand>, ChannelError> {
        let pages = self.pages.lock().map_err(|_| ChannelError::Closed)?;
        pages
            .get(&page)
            .map(|entry| entry.commands.clone())
            .ok_or(ChannelError::NoReceiver)
    }
}

#[async_trait::async_trait]
impl Browser for HttpBrowser {
    async fn open_page(&self, url: &str) -> Result<PageId, ChannelError> {
        let page = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (status_tx, status_rx) = watch::channel(PageStatus::Loading);
        let (cmd_tx, cmd_rx) = mpsc::channel(PAGE_QUEUE_DEPTH);
        let task = tokio::spawn(run_page(
            page,
            url.to_string(),
            self.fetcher.clone(),
            self.agent_factory.clone(),
            status_tx,
            cmd_rx,
        ));

        let mut pages = self.pages.lock().map_err(|_| ChannelError::Closed)?;
        pages.insert(
            page,
            PageEntry {
                status: status_rx,
                commands: cmd_tx,
                task,
            },
        );
        relay_info!("Opened page {} on {}", page, url);
        Ok(page)
    }

    fn subscribe_load(&self, page: PageId) -> Result<LoadSubscription, ChannelError> {
        let pages = self.pages.lock().map_err(|_| ChannelError::Closed)?;
        pages
            .get(&page)
            .map(|entry| LoadSubscription::new(entry.status.clone()))
            .ok_or(ChannelError::NoReceiver)
    }

    async fn inject_agent(&self, page: PageId) -> Result<(), ChannelError> {
        let commands = self
            .commands(page)
            .map_err(|err| ChannelError::Injection(err.to_string()))?;
        let (reply, rx) = oneshot::channel();
        commands
            .send(PageCommand::Inject { reply })
            .await
            .map_err(|_| ChannelError::Injection("page is gone".to_string()))?;
        rx.await
            .map_err(|_| ChannelError::Injection("page is gone".to_string()))?
    }

    async fn send(&self, page: PageId, request: Value) -> Result<Value, ChannelError> {
        let commands = self.commands(page)?;
        let (reply, rx) = oneshot::channel();
        commands
            .send(PageCommand::Deliver { request, reply })
            .await
            .map_err(|_| ChannelError::NoReceiver)?;
        rx.await.map_err(|_| ChannelError::Closed)?
    }

    async fn close_page(&self, page: PageId) {
        let removed = match self.pages.lock() {
            Ok(mut pages) => pages.remove(&page),
            Err(_) => None,
        };
        match removed {
            Some(entry) => {
                entry.task.abort();
                relay_info!("Closed page {}", page);
            }
            None => relay_warn!("Close requested for unknown page {}", page),
        }
    }
}

async fn run_page(
    page: PageId,
    url: String,
    fetcher: Arc<dyn Fetcher>,
    agent_factory: AgentFactory,
    status: watch::Sender<PageStatus>,
    mut commands: mpsc::Receiver<PageCommand>,
) {
    let source = match fetcher.load(&url).await {
        Ok(source) => source,
        Err(err) => {
            // A failed navigation still finishes loading; it just shows nothing useful.
            relay_warn!("Page {} failed to load {}: {}", page, url, err);
            PageSource::new(url, String::new())
        }
    };
    let document = Arc::new(StaticDocument(source));
    // Served markup is final, so rendering settles with the load event.
    let _ = status.send(PageStatus::Complete);
    let _ = status.send(PageStatus::Rendered);

    let mut agent: Option<ExtractionAgent> = None;
    while let Some(command) = commands.recv().await {
        match command {
            PageCommand::Inject { reply } => {
                if agent.is_none() {
                    agent = Some((agent_factory)(document.clone()));
                    relay_debug!("Agent installed in page {}", page);
                }
                let _ = reply.send(Ok(()));
            }
            PageCommand::Deliver { request, reply } => {
                let response = match agent.as_ref() {
                    None => Err(ChannelError::NoReceiver),
                    Some(agent) => agent.handle(request).await.ok_or(ChannelError::Closed),
                };
                let _ = reply.send(response);
            }
        }
    }
}
