use std::time::Duration;

use crate::{JobRecord, PageId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Open a new, inactive page on `url` and report it with `Msg::DerivedPageOpened`.
    OpenDerivedPage { url: String },
    /// Wait for the page to report "loaded", then for render readiness up to `settle`.
    AwaitLoad { page: PageId, settle: Duration },
    /// Install the extraction agent, then pause for `settle` before reporting.
    InjectAgent { page: PageId, settle: Duration },
    RequestExtraction { page: PageId },
    ClosePage { page: PageId },
    Submit { record: JobRecord },
    Notify(Notice),
}

/// The two user-visible toasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Sent,
    Failed,
}

impl Notice {
    pub const TITLE: &'static str = "LinkedIn Job Logger";
    pub const ICON: &'static str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    pub fn message(self) -> &'static str {
        match self {
            Notice::Sent => "Job data sent to Google Sheets!",
            Notice::Failed => "Failed to send to Google Sheets",
        }
    }
}
