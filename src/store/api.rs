use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};

use crate::store::schema::SlotProgress;
use crate::store::{ProgressBackend, StoreError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Progress stored by the tracker web service. One request per call, no
/// retries; failures go back to the caller.
pub struct ApiClient {
    base_url: String,
    session_token: String,
    client: Client,
}

impl ApiClient {
    pub fn new(base_url: &str, session_token: &str) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            session_token: session_token.to_string(),
            client,
        })
    }

    pub fn progress_url(&self, slot: u8) -> String {
        format!("{}/api/slots/{slot}/progress", self.base_url)
    }

    fn check(response: Response, url: &str) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(StoreError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            })
        }
    }
}

impl ProgressBackend for ApiClient {
    fn label(&self) -> &'static str {
        "remote"
    }

    fn load_progress(&self, slot: u8) -> Result<SlotProgress, StoreError> {
        let url = self.progress_url(slot);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.session_token)
            .send()?;
        // a slot the server has never seen is an empty one
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(SlotProgress::default());
        }
        let progress = Self::check(response, &url)?.json::<SlotProgress>()?;
        tracing::info!(slot, url = %url, "loaded remote progress");
        Ok(progress)
    }

    fn save_progress(&self, slot: u8, progress: &SlotProgress) -> Result<(), StoreError> {
        let url = self.progress_url(slot);
        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.session_token)
            .json(progress)
            .send()?;
        Self::check(response, &url)?;
        Ok(())
    }
}
