// Blocking HTTP plumbing shared by the service clients and the HTTP document source.
// Requests run on the blocking pool so every call has an explicit await point that
// a cancellation token can interrupt.


use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use ureq::http::StatusCode;

use crate::QaError;

/// Upper bound on any single response body; documents are the largest payloads.
const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

#[derive(Debug, Clone)]
pub(crate) struct RawResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    error: ServiceErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ServiceErrorDetail {
    message: Option<String>,
}

/// Agent that hands non-2xx responses back to the caller instead of failing,
/// so the service's error body can be read.
pub(crate) fn build_agent(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

pub(crate) fn get(agent: &ureq::Agent, url: &str) -> Result<RawResponse, ureq::Error> {
    debug!("GET {}", url);
    let mut response = agent.get(url).call()?;
    let status = response.status();
    let body = response
        .body_mut()
        .with_config()
        .limit(MAX_BODY_BYTES)
        .read_to_vec()?;
    Ok(RawResponse { status, body })
}

pub(crate) fn post_json(
    agent: &ureq::Agent,
    url: &str,
    api_key: &str,
    body: &str,
) -> Result<RawResponse, ureq::Error> {
    debug!("POST {} ({} bytes)", url, body.len());
    let mut response = agent
        .post(url)
        .header("Content-Type", "application/json")
        .header("Authorization", format!("Bearer {api_key}"))
        .send(body)?;
    let status = response.status();
    let body = response
        .body_mut()
        .with_config()
        .limit(MAX_BODY_BYTES)
        .read_to_vec()?;
    Ok(RawResponse { status, body })
}

/// The `error.message` reported by the service, or the status text when the
/// body carries none.
pub(crate) fn service_error_message(response: &RawResponse) -> String {
    serde_json::from_slice::<ServiceErrorBody>(&response.body)
        .ok()
        .and_then(|body| body.error.message)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| status_text(response.status))
}

fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map_or_else(|| status.as_str().to_string(), str::to_string)
}

/// Run a blocking request on the blocking pool, giving up as soon as `cancel` fires.
///
/// A cancelled request is abandoned, not interrupted: the worker thread finishes
/// on its own and its result is discarded.
pub(crate) async fn run_cancellable<T, F>(cancel: &CancellationToken, request: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    if cancel.is_cancelled() {
        return Err(QaError::Cancelled.into());
    }

    let task = tokio::task::spawn_blocking(request);

    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(QaError::Cancelled.into()),
        joined = task => joined.context("HTTP worker task panicked")?,
    }
}
