use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use jobrelay_core::{ChannelError, JobRecord, Notice, PageId, RunOutcome};
use jobrelay_engine::{
    Browser, LoadSubscription, NotificationSink, OrchestratorSettings, PageStatus, RelayError,
    SheetRelay, TabOrchestrator,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio::sync::watch;

const COLLECTION_URL: &str =
    "https://www.linkedin.com/jobs/collections/recommended/?currentJobId=4012345678";
const DETAIL_URL: &str = "https://www.linkedin.com/jobs/view/4012345678/";
const ACTIVE_PAGE: PageId = 1;

type Log = Arc<Mutex<Vec<String>>>;

struct FakeBrowser {
    log: Log,
    next_page: AtomicU64,
    open_error: Option<ChannelError>,
    inject_error: Option<ChannelError>,
    reply: Result<Value, ChannelError>,
    statuses: Mutex<Vec<watch::Sender<PageStatus>>>,
}

impl FakeBrowser {
    fn replying(log: &Log, reply: Result<Value, ChannelError>) -> Self {
        Self {
            log: log.clone(),
            next_page: AtomicU64::new(100),
            open_error: None,
            inject_error: None,
            reply,
            statuses: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, event: String) {
        self.log.lock().unwrap().push(event);
    }
}

#[async_trait::async_trait]
impl Browser for FakeBrowser {
    async fn open_page(&self, url: &str) -> Result<PageId, ChannelError> {
        self.record(format!("open {url}"));
        if let Some(err) = &self.open_error {
            return Err(err.clone());
        }
        Ok(self.next_page.fetch_add(1, Ordering::SeqCst))
    }

    fn subscribe_load(&self, _page: PageId) -> Result<LoadSubscription, ChannelError> {
        let (tx, rx) = watch::channel(PageStatus::Rendered);
        self.statuses.lock().unwrap().push(tx);
        Ok(LoadSubscription::new(rx))
    }

    async fn inject_agent(&self, page: PageId) -> Result<(), ChannelError> {
        self.record(format!("inject {page}"));
        match &self.inject_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn send(&self, page: PageId, _request: Value) -> Result<Value, ChannelError> {
        self.record(format!("send {page}"));
        self.reply.clone()
    }

    async fn close_page(&self, page: PageId) {
        self.record(format!("close {page}"));
    }
}

struct FakeRelay {
    log: Log,
    result: Result<String, RelayError>,
    submitted: Mutex<Vec<JobRecord>>,
}

impl FakeRelay {
    fn new(log: &Log, result: Result<String, RelayError>) -> Arc<Self> {
        Arc::new(Self {
            log: log.clone(),
            result,
            submitted: Mutex::new(Vec::new()),
        })
    }

    fn submitted(&self) -> Vec<JobRecord> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl SheetRelay for FakeRelay {
    async fn submit(&self, record: &JobRecord) -> Result<String, RelayError> {
        self.log.lock().unwrap().push(format!("submit {}", record.title));
        self.submitted.lock().unwrap().push(record.clone());
        self.result.clone()
    }
}

#[derive(Default)]
struct RecordingSink {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingSink {
    fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

struct Harness {
    log: Log,
    relay: Arc<FakeRelay>,
    sink: Arc<RecordingSink>,
    orchestrator: TabOrchestrator,
}

impl Harness {
    fn new(browser: FakeBrowser, log: Log, relay: Arc<FakeRelay>) -> Self {
        Self::with_settings(browser, log, relay, OrchestratorSettings::default())
    }

    fn with_settings(
        browser: FakeBrowser,
        log: Log,
        relay: Arc<FakeRelay>,
        settings: OrchestratorSettings,
    ) -> Self {
        jobrelay_logging::initialize_for_tests();
        let sink = Arc::new(RecordingSink::default());
        let orchestrator =
            TabOrchestrator::new(Arc::new(browser), relay.clone(), sink.clone(), settings);
        Self {
            log,
            relay,
            sink,
            orchestrator,
        }
    }

    fn events(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

fn harness(reply: Result<Value, ChannelError>) -> Harness {
    let log = Log::default();
    let browser = FakeBrowser::replying(&log, reply);
    let relay = FakeRelay::new(&log, Ok("Success".into()));
    Harness::new(browser, log, relay)
}

fn listing_reply() -> Value {
    json!({
        "title": "Senior Rust Engineer",
        "company": "Acme Robotics",
        "location": "Bucharest, Romania",
        "url": "https://www.linkedin.com/jobs/view/4012345678/"
    })
}

#[tokio::test(start_paused = true)]
async fn collection_view_extracts_from_derived_page_and_closes_it_before_submitting() {
    let h = harness(Ok(listing_reply()));

    let report = h
        .orchestrator
        .handle_command("extract-job-data", ACTIVE_PAGE, COLLECTION_URL)
        .await;

    assert_eq!(report.outcome, RunOutcome::Relayed);
    assert_eq!(report.derived_page, Some(100));
    assert_eq!(
        h.events(),
        vec![
            "open https://www.linkedin.com/jobs/view/4012345678",
            "inject 100",
            "send 100",
            "close 100",
            "submit Senior Rust Engineer",
        ]
    );
    let submitted = h.relay.submitted();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].platform, "LinkedIn");
    assert_eq!(submitted[0].summary, "");
    assert_eq!(h.sink.notices(), vec![Notice::Sent]);
}

#[tokio::test(start_paused = true)]
async fn detail_view_extracts_in_place_and_never_closes_the_page() {
    let h = harness(Ok(listing_reply()));

    let report = h
        .orchestrator
        .handle_command("extract-job-data", ACTIVE_PAGE, DETAIL_URL)
        .await;

    assert_eq!(report.outcome, RunOutcome::Relayed);
    assert_eq!(report.derived_page, None);
    assert_eq!(
        h.events(),
        vec!["inject 1", "send 1", "submit Senior Rust Engineer"]
    );
}

#[tokio::test(start_paused = true)]
async fn empty_results_close_each_derived_page_once_and_never_submit() {
    let h = harness(Ok(Value::Null));

    for _ in 0..2 {
        let report = h
            .orchestrator
            .handle_command("extract-job-data", ACTIVE_PAGE, COLLECTION_URL)
            .await;
        assert_eq!(report.outcome, RunOutcome::Empty);
    }

    let closes: Vec<_> = h
        .events()
        .into_iter()
        .filter(|event| event.starts_with("close"))
        .collect();
    assert_eq!(closes, vec!["close 100", "close 101"]);
    assert!(h.relay.submitted().is_empty());
    assert!(h.sink.notices().is_empty());
}

#[tokio::test(start_paused = true)]
async fn record_without_title_or_company_is_not_submitted() {
    let h = harness(Ok(json!({ "location": "Remote", "summary": "Rust" })));

    let report = h
        .orchestrator
        .handle_command("extract-job-data", ACTIVE_PAGE, COLLECTION_URL)
        .await;

    assert_eq!(report.outcome, RunOutcome::Empty);
    assert!(h.relay.submitted().is_empty());
    assert!(h.events().contains(&"close 100".to_string()));
}

#[tokio::test(start_paused = true)]
async fn channel_failure_still_closes_derived_page() {
    let h = harness(Err(ChannelError::NoReceiver));

    let report = h
        .orchestrator
        .handle_command("extract-job-data", ACTIVE_PAGE, COLLECTION_URL)
        .await;

    assert_eq!(report.outcome, RunOutcome::ChannelFailed);
    assert_eq!(h.events().last().map(String::as_str), Some("close 100"));
    assert!(h.relay.submitted().is_empty());
    assert!(h.sink.notices().is_empty());
}

#[tokio::test(start_paused = true)]
async fn malformed_reply_is_a_channel_failure() {
    let h = harness(Ok(json!("not a record")));

    let report = h
        .orchestrator
        .handle_command("extract-job-data", ACTIVE_PAGE, COLLECTION_URL)
        .await;

    assert_eq!(report.outcome, RunOutcome::ChannelFailed);
    assert!(h.events().contains(&"close 100".to_string()));
}

#[tokio::test(start_paused = true)]
async fn injection_failure_closes_derived_page_without_requesting() {
    let log = Log::default();
    let mut browser = FakeBrowser::replying(&log, Ok(listing_reply()));
    browser.inject_error = Some(ChannelError::Injection("restricted page".into()));
    let relay = FakeRelay::new(&log, Ok("Success".into()));
    let h = Harness::new(browser, log, relay);

    let report = h
        .orchestrator
        .handle_command("extract-job-data", ACTIVE_PAGE, COLLECTION_URL)
        .await;

    assert_eq!(report.outcome, RunOutcome::InjectionFailed);
    assert_eq!(
        h.events(),
        vec![
            "open https://www.linkedin.com/jobs/view/4012345678",
            "inject 100",
            "close 100",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn failed_open_leaves_nothing_to_close() {
    let log = Log::default();
    let mut browser = FakeBrowser::replying(&log, Ok(listing_reply()));
    browser.open_error = Some(ChannelError::Closed);
    let relay = FakeRelay::new(&log, Ok("Success".into()));
    let h = Harness::new(browser, log, relay);

    let report = h
        .orchestrator
        .handle_command("extract-job-data", ACTIVE_PAGE, COLLECTION_URL)
        .await;

    assert_eq!(report.outcome, RunOutcome::OpenFailed);
    assert_eq!(report.derived_page, None);
    assert_eq!(
        h.events(),
        vec!["open https://www.linkedin.com/jobs/view/4012345678"]
    );
}

#[tokio::test(start_paused = true)]
async fn unsupported_pages_and_unknown_commands_do_nothing() {
    let h = harness(Ok(listing_reply()));

    let report = h
        .orchestrator
        .handle_command("extract-job-data", ACTIVE_PAGE, "https://example.com/jobs/view/1")
        .await;
    assert_eq!(report.outcome, RunOutcome::Ignored);

    let report = h
        .orchestrator
        .handle_command(
            "extract-job-data",
            ACTIVE_PAGE,
            "https://www.linkedin.com/jobs/collections/recommended/",
        )
        .await;
    assert_eq!(report.outcome, RunOutcome::Ignored);

    let report = h
        .orchestrator
        .handle_command("open-settings", ACTIVE_PAGE, DETAIL_URL)
        .await;
    assert_eq!(report.outcome, RunOutcome::Ignored);

    assert!(h.events().is_empty());
    assert!(h.sink.notices().is_empty());
}

#[tokio::test(start_paused = true)]
async fn relay_failure_shows_failure_notice() {
    let log = Log::default();
    let browser = FakeBrowser::replying(&log, Ok(listing_reply()));
    let relay = FakeRelay::new(&log, Err(RelayError::HttpStatus(500)));
    let h = Harness::new(browser, log, relay);

    let report = h
        .orchestrator
        .handle_command("extract-job-data", ACTIVE_PAGE, COLLECTION_URL)
        .await;

    assert_eq!(
        report.outcome,
        RunOutcome::RelayFailed("HTTP error! status: 500".into())
    );
    assert_eq!(h.sink.notices(), vec![Notice::Failed]);
    assert_eq!(h.relay.submitted().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn derived_page_waits_for_injection_settle() {
    let h = harness(Ok(listing_reply()));
    let started = tokio::time::Instant::now();

    h.orchestrator
        .handle_command("extract-job-data", ACTIVE_PAGE, COLLECTION_URL)
        .await;

    assert!(started.elapsed() >= std::time::Duration::from_millis(500));
}

#[tokio::test]
async fn runtime_relay_request_replies_without_notifying() {
    let h = harness(Ok(Value::Null));

    let reply = h
        .orchestrator
        .handle_runtime_message(json!({
            "action": "sendToGoogleSheets",
            "data": { "title": "QA Engineer" }
        }))
        .await;

    assert_eq!(reply, Some(json!({ "success": true, "result": "Success" })));
    let submitted = h.relay.submitted();
    assert_eq!(submitted[0].title, "QA Engineer");
    assert_eq!(submitted[0].platform, "LinkedIn");
    assert!(h.sink.notices().is_empty());
}

#[tokio::test]
async fn runtime_relay_failure_is_reported_in_reply() {
    let log = Log::default();
    let browser = FakeBrowser::replying(&log, Ok(Value::Null));
    let relay = FakeRelay::new(&log, Err(RelayError::HttpStatus(503)));
    let h = Harness::new(browser, log, relay);

    let reply = h
        .orchestrator
        .handle_runtime_message(json!({ "action": "sendToGoogleSheets", "data": {} }))
        .await;

    assert_eq!(
        reply,
        Some(json!({ "success": false, "error": "HTTP error! status: 503" }))
    );
}

#[tokio::test]
async fn runtime_ignores_other_actions() {
    let h = harness(Ok(Value::Null));

    assert_eq!(
        h.orchestrator
            .handle_runtime_message(json!({ "action": "extractJobData" }))
            .await,
        None
    );
    assert_eq!(
        h.orchestrator
            .handle_runtime_message(json!({ "action": "unknown" }))
            .await,
        None
    );
    assert!(h.relay.submitted().is_empty());
}

#[tokio::test(start_paused = true)]
async fn serialized_runs_do_not_interleave() {
    let log = Log::default();
    let browser = FakeBrowser::replying(&log, Ok(Value::Null));
    let relay = FakeRelay::new(&log, Ok("Success".into()));
    let h = Harness::with_settings(
        browser,
        log,
        relay,
        OrchestratorSettings {
            serialize_runs: true,
            ..OrchestratorSettings::default()
        },
    );

    tokio::join!(
        h.orchestrator
            .handle_command("extract-job-data", ACTIVE_PAGE, COLLECTION_URL),
        h.orchestrator
            .handle_command("extract-job-data", ACTIVE_PAGE, COLLECTION_URL),
    );

    let lifecycle: Vec<_> = h
        .events()
        .into_iter()
        .filter(|event| event.starts_with("open") || event.starts_with("close"))
        .map(|event| event.split(' ').next().unwrap_or_default().to_string())
        .collect();
    assert_eq!(lifecycle, vec!["open", "close", "open", "close"]);
}

#[tokio::test(start_paused = true)]
async fn overlapping_runs_each_own_their_page() {
    let h = harness(Ok(Value::Null));

    let (first, second) = tokio::join!(
        h.orchestrator
            .handle_command("extract-job-data", ACTIVE_PAGE, COLLECTION_URL),
        h.orchestrator
            .handle_command("extract-job-data", ACTIVE_PAGE, COLLECTION_URL),
    );

    assert_eq!(first.derived_page, Some(100));
    assert_eq!(second.derived_page, Some(101));
    let events = h.events();
    assert_eq!(events.iter().filter(|e| *e == "close 100").count(), 1);
    assert_eq!(events.iter().filter(|e| *e == "close 101").count(), 1);
    let second_open = events
        .iter()
        .rposition(|e| e.starts_with("open"))
        .unwrap();
    let first_close = events.iter().position(|e| e == "close 100").unwrap();
    assert!(second_open < first_close, "{events:?}");
}
