use std::time::Duration;

use jobrelay_core::JobRecord;
use jobrelay_logging::{relay_info, relay_warn};
use reqwest::header::CONTENT_TYPE;
use thiserror::Error;
use url::form_urlencoded;

pub const DEFAULT_ENDPOINT: &str = "https://script.google.com/macros/s/AKfycbxfcdmmlF5lE970GZAvxsyOs_cD_AfI_2TqZxmvwgOg9NCn2pGd7wdTAcI5Ck6cMrPaXw/exec";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub endpoint: String,
    /// Whole-request timeout. `None` waits for as long as the endpoint takes.
    pub timeout: Option<Duration>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("HTTP error! status: {0}")]
    HttpStatus(u16),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("invalid relay endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Submits records to the remote sheet. One call is one attempt.
#[async_trait::async_trait]
pub trait SheetRelay: Send + Sync {
    /// Returns the endpoint's raw response body on success.
    async fn submit(&self, record: &JobRecord) -> Result<String, RelayError>;
}

#[derive(Debug, Clone)]
pub struct HttpSheetRelay {
    client: reqwest::Client,
    endpoint: reqwest::Url,
}

impl HttpSheetRelay {
    pub fn new(config: RelayConfig) -> Result<Self, RelayError> {
        let endpoint = reqwest::Url::parse(&config.endpoint)
            .map_err(|err| RelayError::InvalidEndpoint(format!("{}: {err}", config.endpoint)))?;
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| RelayError::Transport(err.to_string()))?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait::async_trait]
impl SheetRelay for HttpSheetRelay {
    async fn submit(&self, record: &JobRecord) -> Result<String, RelayError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(encode_form(record))
            .send()
            .await
            .map_err(|err| {
                relay_warn!("Relay transport failure: {}", err);
                RelayError::Transport(err.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            relay_warn!("Relay rejected with status {}", status);
            return Err(RelayError::HttpStatus(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| RelayError::Transport(err.to_string()))?;
        relay_info!("Relayed {:?} ({} byte reply)", record.title, body.len());
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

/// Form body with every record field, in display order.
pub fn encode_form(record: &JobRecord) -> String {
    let mut form = form_urlencoded::Serializer::new(String::new());
    for (name, value) in record.fields() {
        form.append_pair(name, value);
    }
    form.finish()
}
