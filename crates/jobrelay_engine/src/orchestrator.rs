use std::collections::VecDeque;
use std::sync::Arc;

use jobrelay_core::{
    decode_extraction_reply, update, Effect, JobRecord, Msg, OrchestrationState, PageId,
    RawJobRecord, RelayReply, Request, RunOutcome, SettleBudget,
};
use jobrelay_logging::{relay_debug, relay_info, relay_warn};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::browser::Browser;
use crate::notify::NotificationSink;
use crate::relay::SheetRelay;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrchestratorSettings {
    pub budget: SettleBudget,
    /// Run triggers one at a time instead of letting them overlap.
    pub serialize_runs: bool,
}

/// What a triggered run did, for callers and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub record: Option<JobRecord>,
    pub derived_page: Option<PageId>,
}

/// A page opened only to run extraction. Closing consumes the handle; if a
/// handle is dropped while still open, the close is scheduled on the runtime.
pub struct DerivedPageHandle {
    browser: Arc<dyn Browser>,
    page: Option<PageId>,
}

impl DerivedPageHandle {
    fn new(browser: Arc<dyn Browser>, page: PageId) -> Self {
        Self {
            browser,
            page: Some(page),
        }
    }

    pub fn id(&self) -> Option<PageId> {
        self.page
    }

    pub async fn close(mut self) {
        if let Some(page) = self.page.take() {
            self.browser.close_page(page).await;
        }
    }
}

impl Drop for DerivedPageHandle {
    fn drop(&mut self) {
        let Some(page) = self.page.take() else {
            return;
        };
        relay_warn!("Derived page {} dropped while open; closing it", page);
        let browser = self.browser.clone();
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(async move { browser.close_page(page).await });
        }
    }
}

/// Privileged-context coordinator: turns a trigger into at most one relay
/// submission, executing the effects of the orchestration state machine.
pub struct TabOrchestrator {
    browser: Arc<dyn Browser>,
    relay: Arc<dyn SheetRelay>,
    notifier: Arc<dyn NotificationSink>,
    settings: OrchestratorSettings,
    run_lock: Mutex<()>,
}

impl TabOrchestrator {
    pub fn new(
        browser: Arc<dyn Browser>,
        relay: Arc<dyn SheetRelay>,
        notifier: Arc<dyn NotificationSink>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            browser,
            relay,
            notifier,
            settings,
            run_lock: Mutex::new(()),
        }
    }

    /// Handles one user command invoked while `active_page` shows `active_url`.
    pub async fn handle_command(
        &self,
        command: &str,
        active_page: PageId,
        active_url: &str,
    ) -> RunReport {
        let _serialized = if self.settings.serialize_runs {
            Some(self.run_lock.lock().await)
        } else {
            None
        };

        let mut state = OrchestrationState::new(self.settings.budget);
        let mut derived: Option<DerivedPageHandle> = None;
        let mut derived_page = None;
        let mut inbox = VecDeque::from([Msg::Triggered {
            command: command.to_string(),
            active_page,
            active_url: active_url.to_string(),
        }]);

        while let Some(msg) = inbox.pop_front() {
            let before = state.phase();
            let (next, effects) = update(state, msg);
            state = next;
            if state.phase() != before {
                relay_debug!("Orchestration {:?} -> {:?}", before, state.phase());
            }
            for effect in effects {
                if let Effect::OpenDerivedPage { url } = &effect {
                    match self.browser.open_page(url).await {
                        Ok(page) => {
                            derived = Some(DerivedPageHandle::new(self.browser.clone(), page));
                            derived_page = Some(page);
                            inbox.push_back(Msg::DerivedPageOpened { page });
                        }
                        Err(err) => inbox.push_back(Msg::DerivedPageFailed {
                            reason: err.to_string(),
                        }),
                    }
                    continue;
                }
                if let Effect::ClosePage { page } = &effect {
                    match derived.take() {
                        Some(handle) if handle.id() == Some(*page) => handle.close().await,
                        other => {
                            relay_warn!("Close requested for page {} this run does not own", page);
                            derived = other;
                        }
                    }
                    continue;
                }
                if let Some(reply) = self.run_effect(effect).await {
                    inbox.push_back(reply);
                }
            }
        }

        if let Some(handle) = derived.take() {
            relay_warn!("Run ended with its derived page still open; closing it");
            handle.close().await;
        }

        let outcome = state.outcome().cloned().unwrap_or(RunOutcome::Ignored);
        relay_info!("Command {:?} on {} finished: {:?}", command, active_url, outcome);
        RunReport {
            outcome,
            record: state.record().cloned(),
            derived_page,
        }
    }

    async fn run_effect(&self, effect: Effect) -> Option<Msg> {
        match effect {
            Effect::AwaitLoad { page, settle } => {
                let waited = match self.browser.subscribe_load(page) {
                    Ok(subscription) => subscription.settle(settle).await,
                    Err(err) => Err(err),
                };
                match waited {
                    Ok(()) => Some(Msg::PageReady { page }),
                    Err(error) => {
                        relay_warn!("Page {} went away while loading: {}", page, error);
                        Some(Msg::PageLost { page, error })
                    }
                }
            }
            Effect::InjectAgent { page, settle } => {
                let result = self.browser.inject_agent(page).await;
                match &result {
                    Ok(()) => tokio::time::sleep(settle).await,
                    Err(err) => relay_warn!("Injection into page {} failed: {}", page, err),
                }
                Some(Msg::AgentInjected { page, result })
            }
            Effect::RequestExtraction { page } => {
                let reply = match Request::ExtractJobData.to_value() {
                    Ok(request) => self.browser.send(page, request).await,
                    Err(err) => Err(err),
                }
                .and_then(decode_extraction_reply);
                if let Err(err) = &reply {
                    relay_warn!("Extraction request to page {} failed: {}", page, err);
                }
                Some(Msg::ExtractionReplied { page, reply })
            }
            Effect::Submit { record } => {
                let result = self
                    .relay
                    .submit(&record)
                    .await
                    .map_err(|err| err.to_string());
                Some(Msg::RelayFinished { result })
            }
            Effect::Notify(notice) => {
                self.notifier.notify(notice);
                None
            }
            Effect::OpenDerivedPage { .. } | Effect::ClosePage { .. } => None,
        }
    }

    /// Answers messages addressed to the privileged context. Only relay
    /// requests are understood; this path never shows a notification.
    pub async fn handle_runtime_message(&self, message: Value) -> Option<Value> {
        let Request::SendToGoogleSheets { data } = Request::from_value(message)? else {
            return None;
        };
        Some(self.relay_record(data).await)
    }

    async fn relay_record(&self, data: RawJobRecord) -> Value {
        let record = data.normalize();
        let reply = match self.relay.submit(&record).await {
            Ok(result) => RelayReply::sent(result),
            Err(err) => RelayReply::failed(err.to_string()),
        };
        serde_json::to_value(reply).unwrap_or(Value::Null)
    }
}
