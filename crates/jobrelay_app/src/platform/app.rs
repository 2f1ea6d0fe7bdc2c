use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use jobrelay_core::{
    classify, decode_extraction_reply, ChannelError, PageId, PageKind, RawJobRecord, RelayReply,
    Request, RunOutcome, EXTRACT_COMMAND,
};
use jobrelay_engine::{
    AgentFactory, Browser, ClipboardChain, ExtractionAgent, HttpBrowser, HttpSheetRelay,
    ListingExtractor, ReqwestFetcher, TabOrchestrator,
};
use jobrelay_logging::{relay_debug, relay_info};
use serde_json::Value;

use super::config::AppConfig;
use super::logging::{self, LogDestination};
use super::notify::TerminalNotificationSink;
use super::popup::{self, PopupView};
use super::{Cli, CliCommand};

/// Page id passed when the active URL has no page open in the host.
const DETACHED_PAGE: PageId = 0;

pub async fn run_app(cli: Cli) -> anyhow::Result<()> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(endpoint) = cli.endpoint {
        config.endpoint = endpoint;
    }

    let destination = if cli.log_file || config.log_file {
        LogDestination::Both
    } else {
        LogDestination::Terminal
    };
    logging::initialize(destination, logging::level_for(cli.verbose));
    relay_debug!("Configuration: {:?}", config);

    let shell = Shell::build(&config)?;
    match cli.command {
        CliCommand::ExtractJobData { active_url } => shell.extract(&active_url).await,
        CliCommand::Show { url, copy, send } => shell.show(&url, copy, send).await,
        CliCommand::Send { record } => shell.send(&record).await,
    }
}

struct Shell {
    browser: Arc<HttpBrowser>,
    orchestrator: TabOrchestrator,
    load_settle: Duration,
}

impl Shell {
    fn build(config: &AppConfig) -> anyhow::Result<Self> {
        let retry = config.retry_policy();
        let agent_factory: AgentFactory = Arc::new(move |document| {
            ExtractionAgent::new(
                document,
                Arc::new(ListingExtractor::new()),
                ClipboardChain::system(),
                retry,
            )
        });
        let fetcher = Arc::new(ReqwestFetcher::new(config.fetch_settings()));
        let browser = Arc::new(HttpBrowser::new(fetcher, agent_factory));
        let relay = HttpSheetRelay::new(config.relay_config())
            .context("invalid relay configuration")?;
        let settings = config.orchestrator_settings();
        let orchestrator = TabOrchestrator::new(
            browser.clone(),
            Arc::new(relay),
            Arc::new(TerminalNotificationSink),
            settings,
        );

        Ok(Self {
            browser,
            orchestrator,
            load_settle: settings.budget.after_load,
        })
    }

    /// The keyboard command: extract from the active page (or the job it
    /// points at) and relay the result.
    async fn extract(&self, active_url: &str) -> anyhow::Result<()> {
        let active_page = match classify(active_url) {
            PageKind::DetailView => Some(self.open_settled(active_url).await?),
            PageKind::CollectionView { .. } | PageKind::Unsupported => None,
        };

        let report = self
            .orchestrator
            .handle_command(
                EXTRACT_COMMAND,
                active_page.unwrap_or(DETACHED_PAGE),
                active_url,
            )
            .await;
        if let Some(page) = active_page {
            self.browser.close_page(page).await;
        }

        match report.outcome {
            RunOutcome::Relayed => {
                if let Some(record) = report.record {
                    println!("{}", record.display_lines());
                }
                Ok(())
            }
            RunOutcome::Ignored => {
                println!("{}", popup::NOT_A_JOB_PAGE);
                Ok(())
            }
            RunOutcome::Empty => {
                println!("{}", popup::NO_JOB_DATA);
                Ok(())
            }
            RunOutcome::RelayFailed(error) => bail!("relay failed: {error}"),
            RunOutcome::OpenFailed | RunOutcome::InjectionFailed | RunOutcome::ChannelFailed => {
                bail!("{}", popup::EXTRACTION_FAILED)
            }
        }
    }

    /// The popup: show the record for a job view, then copy or send it.
    async fn show(&self, url: &str, copy: bool, send: bool) -> anyhow::Result<()> {
        if !popup::is_job_view(url) {
            println!("{}", popup::NOT_A_JOB_PAGE);
            return Ok(());
        }
        let page = self.open_settled(url).await?;
        let shown = self.show_page(page, copy, send).await;
        self.browser.close_page(page).await;
        shown
    }

    async fn show_page(&self, page: PageId, copy: bool, send: bool) -> anyhow::Result<()> {
        let reply = match self.browser.inject_agent(page).await {
            Ok(()) => self
                .request(page, &Request::ExtractJobData)
                .await
                .and_then(decode_extraction_reply),
            Err(err) => Err(err),
        };
        let record = match popup::view_for(reply) {
            PopupView::Message(message) => {
                println!("{message}");
                return Ok(());
            }
            PopupView::Record(record) => record,
        };
        println!("{}", record.display_lines());

        if copy {
            let data = record.to_pretty_json()?;
            let reply = self
                .request(page, &Request::CopyToClipboard { data })
                .await
                .ok();
            println!("{}", popup::copy_label(reply));
        }
        if send {
            let message = Request::SendToGoogleSheets {
                data: record.into(),
            }
            .to_value()?;
            let reply = self.orchestrator.handle_runtime_message(message).await;
            println!("{}", popup::send_label(reply));
        }
        Ok(())
    }

    /// Relays a stored record through the runtime message handler.
    async fn send(&self, path: &Path) -> anyhow::Result<()> {
        let text =
            fs::read_to_string(path).with_context(|| format!("could not read {path:?}"))?;
        let data: RawJobRecord = serde_json::from_str(&text)
            .with_context(|| format!("{path:?} does not hold a JSON job record"))?;

        let message = Request::SendToGoogleSheets { data }.to_value()?;
        let reply = self
            .orchestrator
            .handle_runtime_message(message)
            .await
            .and_then(|value| serde_json::from_value::<RelayReply>(value).ok());
        match reply {
            Some(RelayReply {
                success: true,
                result,
                ..
            }) => {
                relay_info!("Relayed record from {:?}", path);
                println!("Sent! {}", result.unwrap_or_default());
                Ok(())
            }
            Some(RelayReply { error, .. }) => {
                bail!("Send Failed: {}", error.unwrap_or_default())
            }
            None => bail!("Send Failed"),
        }
    }

    async fn open_settled(&self, url: &str) -> anyhow::Result<PageId> {
        let page = self
            .browser
            .open_page(url)
            .await
            .with_context(|| format!("could not open {url}"))?;
        let loaded = match self.browser.subscribe_load(page) {
            Ok(subscription) => subscription.settle(self.load_settle).await,
            Err(err) => Err(err),
        };
        if let Err(err) = loaded {
            self.browser.close_page(page).await;
            return Err(err).with_context(|| format!("{url} did not finish loading"));
        }
        Ok(page)
    }

    async fn request(&self, page: PageId, request: &Request) -> Result<Value, ChannelError> {
        self.browser.send(page, request.to_value()?).await
    }
}
