use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::{debug, info, warn};

use super::response::interpret;
use super::Platform;
use crate::constants::{HTTP_CONNECT_TIMEOUT_SECS, HTTP_REQUEST_TIMEOUT_SECS};
use crate::error::SendError;
use crate::retry::RetryPolicy;
use crate::traits::{Photo, PlatformApi};

/// Client for the Telegram-style Bot API that both Telegram and Bale expose.
pub(crate) struct BotApiClient {
    platform: Platform,
    http: Client,
    api_base: String,
    token: String,
    classifier: RetryPolicy,
}

impl BotApiClient {
    pub(crate) fn new(platform: Platform, token: impl Into<String>, api_base: Option<String>) -> Self {
        Self {
            platform,
            http: build_http_client(),
            api_base: api_base.unwrap_or_else(|| platform.default_api_base().to_string()),
            token: token.into(),
            classifier: RetryPolicy::default(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{method}",
            self.api_base.trim_end_matches('/'),
            self.token
        )
    }

    async fn check(&self, response: reqwest::Response) -> Result<(), SendError> {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        interpret(status, &body, &self.classifier)
    }
}

fn build_http_client() -> Client {
    match Client::builder()
        .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "Failed to build HTTP client with timeouts, using defaults");
            Client::new()
        }
    }
}

#[async_trait]
impl PlatformApi for BotApiClient {
    async fn open(&self) -> Result<(), SendError> {
        let response = self.http.post(self.api_url("getMe")).send().await?;
        self.check(response).await?;
        info!(platform = self.platform.name(), "Bot session opened");
        Ok(())
    }

    async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), SendError> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });
        let response = self
            .http
            .post(self.api_url("sendMessage"))
            .json(&body)
            .send()
            .await?;
        self.check(response).await
    }

    async fn send_photo(
        &self,
        chat_id: &str,
        photo: &Photo,
        caption: &str,
    ) -> Result<(), SendError> {
        let part = Part::bytes(photo.bytes.clone()).file_name(photo.file_name.clone());
        let mut form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("photo", part);
        if !caption.is_empty() {
            form = form.text("caption", caption.to_string());
        }
        let response = self
            .http
            .post(self.api_url("sendPhoto"))
            .multipart(form)
            .send()
            .await?;
        self.check(response).await
    }

    async fn close(&self) {
        debug!(platform = self.platform.name(), "Bot session closed");
    }
}
