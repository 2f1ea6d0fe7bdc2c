use std::time::Duration;

use crate::{JobRecord, PageId};

/// Fixed waits the orchestration tolerates for client-side rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleBudget {
    /// Upper bound on the wait after a derived page reports "loaded".
    pub after_load: Duration,
    /// Pause between installing the agent and the first request.
    pub after_injection: Duration,
}

impl Default for SettleBudget {
    fn default() -> Self {
        Self {
            after_load: Duration::from_millis(2000),
            after_injection: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Opening,
    AwaitingLoad,
    Injecting,
    Extracting,
    Relaying,
    Done,
}

/// Whether the orchestration owns the page it extracts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOrigin {
    Derived,
    Original,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTarget {
    pub page: PageId,
    pub origin: PageOrigin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Unknown command or unsupported page; nothing was touched.
    Ignored,
    /// The derived page could not be opened.
    OpenFailed,
    InjectionFailed,
    ChannelFailed,
    /// The agent answered without a title or company.
    Empty,
    Relayed,
    RelayFailed(String),
}

/// State of one orchestration run, from trigger to `Phase::Done`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrchestrationState {
    budget: SettleBudget,
    phase: Phase,
    target: Option<PageTarget>,
    derived_closed: bool,
    record: Option<JobRecord>,
    outcome: Option<RunOutcome>,
}

impl OrchestrationState {
    pub fn new(budget: SettleBudget) -> Self {
        Self {
            budget,
            ..Self::default()
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn target(&self) -> Option<PageTarget> {
        self.target
    }

    pub fn record(&self) -> Option<&JobRecord> {
        self.record.as_ref()
    }

    pub fn outcome(&self) -> Option<&RunOutcome> {
        self.outcome.as_ref()
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    pub(crate) fn budget(&self) -> SettleBudget {
        self.budget
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub(crate) fn set_target(&mut self, target: PageTarget) {
        self.target = Some(target);
    }

    pub(crate) fn set_record(&mut self, record: JobRecord) {
        self.record = Some(record);
    }

    pub(crate) fn finish(&mut self, outcome: RunOutcome) {
        self.phase = Phase::Done;
        self.outcome = Some(outcome);
    }

    /// Returns the derived page to close, at most once per run.
    pub(crate) fn take_derived_for_close(&mut self) -> Option<PageId> {
        match self.target {
            Some(PageTarget {
                page,
                origin: PageOrigin::Derived,
            }) if !self.derived_closed => {
                self.derived_closed = true;
                Some(page)
            }
            _ => None,
        }
    }

    /// True while this run owns a derived page that has not been closed yet.
    pub fn holds_open_page(&self) -> bool {
        matches!(
            self.target,
            Some(PageTarget {
                origin: PageOrigin::Derived,
                ..
            })
        ) && !self.derived_closed
    }
}
