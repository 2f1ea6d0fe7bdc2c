use crate::{ChannelError, PageId, RawJobRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User invoked a command while `active_page` showed `active_url`.
    Triggered {
        command: String,
        active_page: PageId,
        active_url: String,
    },
    /// The page requested by `Effect::OpenDerivedPage` exists.
    DerivedPageOpened { page: PageId },
    /// The derived page could not be created at all.
    DerivedPageFailed { reason: String },
    /// Load completed and the settle window is over.
    PageReady { page: PageId },
    AgentInjected {
        page: PageId,
        result: Result<(), ChannelError>,
    },
    ExtractionReplied {
        page: PageId,
        reply: Result<Option<RawJobRecord>, ChannelError>,
    },
    /// The page stopped answering before extraction could start.
    PageLost { page: PageId, error: ChannelError },
    /// Outcome of the sheet submission; the error is already human-readable.
    RelayFinished { result: Result<String, String> },
}
