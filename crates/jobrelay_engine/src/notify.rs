use jobrelay_core::Notice;
use jobrelay_logging::{relay_info, relay_warn};

/// Displays the transient success/failure toast.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Writes notices to the log instead of a desktop toast.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotificationSink;

impl NotificationSink for LogNotificationSink {
    fn notify(&self, notice: Notice) {
        match notice {
            Notice::Sent => relay_info!("[{}] {}", Notice::TITLE, notice.message()),
            Notice::Failed => relay_warn!("[{}] {}", Notice::TITLE, notice.message()),
        }
    }
}
