use jobrelay_core::{ChannelError, ClipboardReply, JobRecord, RawJobRecord, RelayReply};
use serde_json::Value;

pub const NOT_A_JOB_PAGE: &str = "Please navigate to a LinkedIn job page first.";
pub const EXTRACTION_FAILED: &str = "Error: Could not extract job data. Try refreshing the page.";
pub const NO_JOB_DATA: &str = "No job data found. Make sure the page is fully loaded.";

/// The popup only works on a single job view.
pub fn is_job_view(url: &str) -> bool {
    url.contains("linkedin.com/jobs/view/")
}

#[derive(Debug, PartialEq, Eq)]
pub enum PopupView {
    Record(JobRecord),
    Message(&'static str),
}

pub fn view_for(reply: Result<Option<RawJobRecord>, ChannelError>) -> PopupView {
    match reply {
        Err(_) => PopupView::Message(EXTRACTION_FAILED),
        Ok(None) => PopupView::Message(NO_JOB_DATA),
        Ok(Some(raw)) => {
            let record = raw.normalize();
            if record.has_identity() {
                PopupView::Record(record)
            } else {
                PopupView::Message(NO_JOB_DATA)
            }
        }
    }
}

/// Button label after a copy attempt.
pub fn copy_label(reply: Option<Value>) -> &'static str {
    let copied = reply
        .and_then(|value| serde_json::from_value::<ClipboardReply>(value).ok())
        .is_some_and(|reply| reply.success);
    if copied {
        "Copied!"
    } else {
        "Copy Failed"
    }
}

/// Button label after a send attempt.
pub fn send_label(reply: Option<Value>) -> &'static str {
    let sent = reply
        .and_then(|value| serde_json::from_value::<RelayReply>(value).ok())
        .is_some_and(|reply| reply.success);
    if sent {
        "Sent!"
    } else {
        "Send Failed"
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn only_job_views_are_accepted() {
        assert!(is_job_view("https://www.linkedin.com/jobs/view/123/"));
        assert!(!is_job_view(
            "https://www.linkedin.com/jobs/collections/recommended/?currentJobId=1"
        ));
        assert!(!is_job_view("https://example.com/"));
    }

    #[test]
    fn replies_map_to_popup_messages() {
        assert_eq!(
            view_for(Err(ChannelError::NoReceiver)),
            PopupView::Message(EXTRACTION_FAILED)
        );
        assert_eq!(view_for(Ok(None)), PopupView::Message(NO_JOB_DATA));
        assert_eq!(
            view_for(Ok(Some(RawJobRecord::default()))),
            PopupView::Message(NO_JOB_DATA)
        );
    }

    #[test]
    fn record_is_normalized_for_display() {
        let raw = RawJobRecord {
            company: Some("Initech".into()),
            ..RawJobRecord::default()
        };
        let PopupView::Record(record) = view_for(Ok(Some(raw))) else {
            panic!("expected a record");
        };
        assert_eq!(record.company, "Initech");
        assert_eq!(record.platform, "LinkedIn");
        assert_eq!(record.title, "");
    }

    #[test]
    fn button_labels_follow_reply_success() {
        assert_eq!(copy_label(Some(json!({ "success": true }))), "Copied!");
        assert_eq!(
            copy_label(Some(json!({ "success": false, "error": "x" }))),
            "Copy Failed"
        );
        assert_eq!(copy_label(None), "Copy Failed");
        assert_eq!(
            send_label(Some(json!({ "success": true, "result": "ok" }))),
            "Sent!"
        );
        assert_eq!(send_label(None), "Send Failed");
    }
}
