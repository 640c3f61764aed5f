use std::collections::BTreeMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::multipart::Form;
use reqwest::{Client, Response};
use serde_json::Value;

use crate::config::PlaygroundApiConfig;
use crate::driver::{await_or_cancel, drive_stream, CancellationSignal, MessageSink, StreamOutcome};
use crate::error::{parse_error_message, PlaygroundApiError};
use crate::request::{RunBody, RunRequest};
use crate::sessions::SessionEntry;
use crate::url::{agent_endpoint, normalize_base_url};

#[derive(Debug)]
pub struct PlaygroundApiClient {
    http: Client,
    config: PlaygroundApiConfig,
}

impl PlaygroundApiClient {
    pub fn new(config: PlaygroundApiConfig) -> Result<Self, PlaygroundApiError> {
        url::Url::parse(&normalize_base_url(&config.base_url))
            .map_err(|error| PlaygroundApiError::InvalidBaseUrl(format!("{}: {error}", config.base_url)))?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(PlaygroundApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &PlaygroundApiConfig {
        &self.config
    }

    /// Configured headers overlaid with per-request headers.
    pub fn build_headers(
        &self,
        overrides: &BTreeMap<String, String>,
    ) -> Result<HeaderMap, PlaygroundApiError> {
        let mut merged = BTreeMap::new();
        for (key, value) in self.config.extra_headers.iter().chain(overrides) {
            merged.insert(key.trim().to_ascii_lowercase(), value.trim().to_owned());
        }

        let mut out = HeaderMap::new();
        for (key, value) in merged {
            out.insert(
                HeaderName::from_bytes(key.as_bytes()).map_err(|_| {
                    PlaygroundApiError::InvalidHeader(format!("invalid header key: {key}"))
                })?,
                HeaderValue::from_str(&value).map_err(|_| {
                    PlaygroundApiError::InvalidHeader(format!("invalid header value for {key}"))
                })?,
            );
        }
        Ok(out)
    }

    pub fn build_run_request(
        &self,
        agent_id: &str,
        request: &RunRequest,
    ) -> Result<reqwest::RequestBuilder, PlaygroundApiError> {
        let endpoint = agent_endpoint(&self.config.base_url, agent_id, "runs")?;
        let mut headers = self.build_headers(&request.headers)?;

        let builder = self.http.post(endpoint);
        Ok(match &request.body {
            RunBody::Json(body) => {
                headers
                    .entry(CONTENT_TYPE)
                    .or_insert(HeaderValue::from_static("application/json"));
                builder.headers(headers).json(body)
            }
            RunBody::Form(fields) => {
                // The multipart boundary must come from the transport.
                headers.remove(CONTENT_TYPE);
                let form = fields
                    .iter()
                    .fold(Form::new(), |form, (key, value)| {
                        form.text(key.clone(), value.clone())
                    });
                builder.headers(headers).multipart(form)
            }
        })
    }

    /// Send the run request and return the response once its status is a success.
    pub async fn send_run(
        &self,
        agent_id: &str,
        request: &RunRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<Response, PlaygroundApiError> {
        let pending = self.build_run_request(agent_id, request)?.send();
        let response = await_or_cancel(pending, cancellation).await??;
        ensure_success(response, cancellation).await
    }

    /// Stream one run into `sink`.
    ///
    /// Transport and HTTP failures, including those before the first fragment,
    /// reach `sink.on_error` exactly once. Nothing is retried.
    pub async fn stream_run<K>(
        &self,
        agent_id: &str,
        request: &RunRequest,
        cancellation: Option<&CancellationSignal>,
        sink: &mut K,
    ) -> StreamOutcome
    where
        K: MessageSink + ?Sized,
    {
        tracing::debug!(agent_id, form = request.is_form(), "starting run stream");

        let response = match self.send_run(agent_id, request, cancellation).await {
            Ok(response) => response,
            Err(PlaygroundApiError::Cancelled) => return StreamOutcome::Cancelled,
            Err(error) => {
                tracing::warn!(%error, agent_id, "run request failed");
                sink.on_error(error);
                return StreamOutcome::Failed;
            }
        };

        drive_stream(response.bytes_stream(), sink, cancellation).await
    }

    /// Stream one run and collect every message.
    pub async fn collect_run(
        &self,
        agent_id: &str,
        request: &RunRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<Vec<Value>, PlaygroundApiError> {
        let mut sink = CollectingSink::default();
        match self.stream_run(agent_id, request, cancellation, &mut sink).await {
            StreamOutcome::Completed => Ok(sink.messages),
            StreamOutcome::Cancelled => Err(PlaygroundApiError::Cancelled),
            StreamOutcome::Failed => Err(sink
                .error
                .unwrap_or_else(|| PlaygroundApiError::Transport("stream failed".to_owned()))),
        }
    }

    /// Fetch the agent's session listing, filtered to `user_id` when given.
    pub async fn list_sessions(
        &self,
        agent_id: &str,
        user_id: Option<u64>,
    ) -> Result<Vec<SessionEntry>, PlaygroundApiError> {
        let endpoint = agent_endpoint(&self.config.base_url, agent_id, "sessions")?;
        let mut headers = self.build_headers(&BTreeMap::new())?;
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = self.http.get(endpoint).headers(headers);
        if let Some(user_id) = user_id {
            builder = builder.query(&[("user_id", user_id.to_string())]);
        }

        let response = ensure_success(builder.send().await?, None).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

async fn ensure_success(
    response: Response,
    cancellation: Option<&CancellationSignal>,
) -> Result<Response, PlaygroundApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = await_or_cancel(response.text(), cancellation)
        .await?
        .unwrap_or_default();
    Err(PlaygroundApiError::Status(
        status,
        parse_error_message(status, &body),
    ))
}

#[derive(Default)]
struct CollectingSink {
    messages: Vec<Value>,
    error: Option<PlaygroundApiError>,
}

impl MessageSink for CollectingSink {
    fn on_message(&mut self, message: Value) {
        self.messages.push(message);
    }

    fn on_error(&mut self, error: PlaygroundApiError) {
        self.error = Some(error);
    }

    fn on_complete(&mut self) {}
}
