//! Job relay engine: page extraction, page hosting, relay and effect execution.
mod agent;
mod browser;
mod clipboard;
mod document;
mod extract;
mod fetch;
mod http_browser;
mod notify;
mod orchestrator;
mod relay;
pub mod rules;
mod text;
mod types;

pub use agent::{DocumentSource, ExtractionAgent, RetryPolicy, StaticDocument};
pub use browser::{Browser, LoadSubscription, PageStatus};
pub use clipboard::{
    Clipboard, ClipboardChain, ClipboardError, CommandClipboard, Osc52Clipboard,
    UnavailableClipboard,
};
pub use document::Document;
pub use extract::{
    clean_location, clean_summary, insight_text, labelled_section, parse_meta_block,
    split_insights, Clock, ListingExtractor, RecordExtractor,
};
pub use fetch::{decode_body, FetchSettings, Fetcher, ReqwestFetcher};
pub use http_browser::{AgentFactory, HttpBrowser};
pub use notify::{LogNotificationSink, NotificationSink};
pub use orchestrator::{DerivedPageHandle, OrchestratorSettings, RunReport, TabOrchestrator};
pub use relay::{encode_form, HttpSheetRelay, RelayConfig, RelayError, SheetRelay, DEFAULT_ENDPOINT};
pub use text::inner_text;
pub use types::{FailureKind, FetchError, FetchMetadata, FetchOutput, PageSource};
