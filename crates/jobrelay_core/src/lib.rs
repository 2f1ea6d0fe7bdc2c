//! Job relay core: records, message protocol and the pure orchestration state machine.
mod effect;
mod message;
mod msg;
mod record;
mod state;
mod trigger;
mod update;

/// Identifier of a page (tab) in the host that runs the page contexts.
pub type PageId = u64;

pub use effect::{Effect, Notice};
pub use message::{
    decode_extraction_reply, encode_extraction_reply, ChannelError, ClipboardReply, RelayReply,
    Request,
};
pub use msg::Msg;
pub use record::{
    JobRecord, RawJobRecord, DEFAULT_PLATFORM, ELLIPSIS_MARKER, FIELD_NAMES, SUMMARY_LIMIT,
};
pub use state::{OrchestrationState, PageOrigin, PageTarget, Phase, RunOutcome, SettleBudget};
pub use trigger::{classify, detail_url, Command, PageKind, EXTRACT_COMMAND};
pub use update::update;
