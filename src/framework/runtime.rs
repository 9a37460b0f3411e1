//! HTTP client for the agent runtime.

use anyhow::Context;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest_eventsource::retry::Never;
use reqwest_eventsource::{Event as SseEvent, RequestBuilderExt};
use serde::Serialize;
use serde_json::Value;

use super::{AgentFramework, AgentSpec, RawEventStream, RunOutput};

#[derive(Serialize)]
struct RunBody<'a> {
    agent: &'a AgentSpec,
    message: &'a str,
    stream: bool,
}

/// Talks to `POST {base_url}/v1/runs`.
#[derive(Clone)]
pub struct RuntimeClient {
    base_url: String,
    client: reqwest::Client,
}

impl RuntimeClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn runs_url(&self) -> String {
        format!("{}/v1/runs", self.base_url)
    }
}

#[async_trait]
impl AgentFramework for RuntimeClient {
    async fn run(&self, agent: &AgentSpec, message: &str) -> anyhow::Result<RunOutput> {
        let body = RunBody {
            agent,
            message,
            stream: false,
        };
        let resp = self
            .client
            .post(self.runs_url())
            .json(&body)
            .send()
            .await
            .context("Failed to call agent runtime /v1/runs")?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            anyhow::bail!("Agent runtime run failed: {} - {}", status, text);
        }

        let output: RunOutput = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse agent runtime response: {}", text))?;
        Ok(output)
    }

    async fn stream(&self, agent: &AgentSpec, message: &str) -> anyhow::Result<RawEventStream> {
        let body = RunBody {
            agent,
            message,
            stream: true,
        };
        let mut source = self
            .client
            .post(self.runs_url())
            .header("Accept", "text/event-stream")
            .json(&body)
            .eventsource()
            .context("Failed to open agent runtime event stream")?;
        // A run is not resumable; reconnecting would start a second one.
        source.set_retry_policy(Box::new(Never));

        let stream = async_stream::stream! {
            while let Some(next) = source.next().await {
                match next {
                    Ok(SseEvent::Open) => tracing::debug!("Agent runtime stream opened"),
                    Ok(SseEvent::Message(msg)) => {
                        if msg.data.trim().is_empty() {
                            continue;
                        }
                        yield Ok(parse_event_data(&msg.event, &msg.data));
                    }
                    Err(reqwest_eventsource::Error::StreamEnded) => break,
                    Err(e) => {
                        yield Err(anyhow::anyhow!("Agent runtime stream failed: {}", e));
                        break;
                    }
                }
            }
            source.close();
        };

        Ok(stream.boxed())
    }
}

/// Decode one SSE `data:` payload.
///
/// Non-JSON payloads are passed on as strings rather than dropped. When the payload has no
/// kind tag of its own, a named SSE event supplies it.
fn parse_event_data(sse_event: &str, data: &str) -> Value {
    let mut value = match serde_json::from_str::<Value>(data) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Agent runtime sent non-JSON event data: {}", e);
            return Value::String(data.to_string());
        }
    };

    if let Some(obj) = value.as_object_mut() {
        let tagged = obj.contains_key("event") || obj.contains_key("type");
        if !tagged && !sse_event.is_empty() && sse_event != "message" {
            obj.insert("event".to_string(), Value::String(sse_event.to_string()));
        }
    }
    value
}
