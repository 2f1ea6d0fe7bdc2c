use jobrelay_core::Notice;
use jobrelay_engine::NotificationSink;
use jobrelay_logging::{relay_info, relay_warn};

/// Shows relay notices on stderr, standing in for a desktop toast.
pub struct TerminalNotificationSink;

impl NotificationSink for TerminalNotificationSink {
    fn notify(&self, notice: Notice) {
        match notice {
            Notice::Sent => relay_info!("notice: {}", notice.message()),
            Notice::Failed => relay_warn!("notice: {}", notice.message()),
        }
        eprintln!("[{}] {}", Notice::TITLE, notice.message());
    }
}
