//! Typed messages exchanged between the privileged context and page contexts.
//!
//! On the wire every request is a JSON object tagged by `action`. Anything
//! that does not decode into a known [`Request`] is dropped without a reply.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{JobRecord, RawJobRecord};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    /// Ask the page agent for a record; the reply is a record or `null`.
    ExtractJobData,
    /// Ask the page agent to place `data` on the clipboard.
    CopyToClipboard { data: String },
    /// Ask the privileged context to relay `data` to the sheet endpoint.
    SendToGoogleSheets { data: RawJobRecord },
}

impl Request {
    /// Decodes a request, returning `None` for unknown or malformed actions.
    pub fn from_value(value: Value) -> Option<Self> {
        serde_json::from_value(value).ok()
    }

    pub fn to_value(&self) -> Result<Value, ChannelError> {
        serde_json::to_value(self).map_err(|err| ChannelError::Malformed(err.to_string()))
    }
}

/// Reply to [`Request::CopyToClipboard`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipboardReply {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Reply to [`Request::SendToGoogleSheets`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayReply {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RelayReply {
    pub fn sent(result: String) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(error: String) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error),
        }
    }
}

/// Decodes the reply to [`Request::ExtractJobData`].
///
/// `null` means the agent had nothing to report; any other non-object shape
/// is a protocol violation.
pub fn decode_extraction_reply(value: Value) -> Result<Option<RawJobRecord>, ChannelError> {
    if value.is_null() {
        return Ok(None);
    }
    serde_json::from_value(value)
        .map(Some)
        .map_err(|err| ChannelError::Malformed(err.to_string()))
}

pub fn encode_extraction_reply(record: Option<&JobRecord>) -> Value {
    match record {
        Some(record) => serde_json::to_value(record).unwrap_or(Value::Null),
        None => Value::Null,
    }
}

/// Failures of a cross-context exchange, independent of application logic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("no receiver is listening in the target page")]
    NoReceiver,
    #[error("message channel closed before a reply arrived")]
    Closed,
    #[error("agent could not be installed in the page: {0}")]
    Injection(String),
    #[error("malformed message: {0}")]
    Malformed(String),
}
