//! Slack-compatible incoming-webhook sink.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde::Serialize;
use url::Url;

use crate::config::ServerConfig;
use crate::failure::Failure;
use crate::reporting::sink::{ErrorSink, ReportError};

#[derive(Debug, Serialize)]
struct WebhookMessage {
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    channel: Option<String>,
}

/// Posts one message per server-class failure to a webhook URL.
#[derive(Debug, Clone)]
pub struct WebhookSink {
    client: reqwest::Client,
    url: Url,
    channel: Option<String>,
    origin: Arc<str>,
}

impl WebhookSink {
    pub fn new(config: &ServerConfig, url: Url) -> Result<Self, ReportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.reporting.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url,
            channel: config.reporting.channel.clone(),
            origin: format!("{}@{} ({})", config.name, config.version, config.service).into(),
        })
    }

    fn message(&self, failure: &Failure) -> WebhookMessage {
        let mut text = format!("*{}* {}", self.origin, failure.status());
        if let Some(origin) = failure.origin() {
            text.push_str(&format!(" {} {}", origin.method, origin.url));
        }
        text.push_str(&format!("\n{}", failure));
        for cause in failure.cause_chain() {
            text.push_str(&format!("\ncaused by: {cause}"));
        }

        WebhookMessage {
            text,
            channel: self.channel.clone(),
        }
    }
}

impl ErrorSink for WebhookSink {
    fn report(&self, failure: Failure) -> BoxFuture<'static, Result<(), ReportError>> {
        let request = self
            .client
            .post(self.url.clone())
            .json(&self.message(&failure));

        async move {
            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(ReportError::Rejected {
                    status: status.as_u16(),
                });
            }
            Ok(())
        }
        .boxed()
    }
}
