//! HTTP access to the task backend.
//!
//! A batch is created with `POST tasks` (multipart, one `file` part per image); the
//! answer carries a `Location` header naming the status resource. `GET` on that
//! resource returns `{}` while the recognizer runs and the array of results once it
//! is done; the reference backend gets there through a `303` to `/tags/<id>`, which
//! the HTTP client follows on its own.

use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, LOCATION};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};
use std::time::Duration;

use crate::error::{PollError, WorkflowError};
use crate::model::{StatusPayload, TaskHandle};
use crate::selection::FileSelection;

/// Form field every uploaded file is sent under.
pub const FILE_FIELD: &str = "file";

/// The two calls a batch makes against the backend.
#[async_trait]
pub trait TaskApi: Send + Sync {
    /// Create a task for the whole selection and return where to poll.
    async fn submit(&self, selection: &FileSelection) -> Result<TaskHandle, WorkflowError>;

    /// Ask once for the task's current state.
    async fn status(&self, handle: &TaskHandle) -> Result<StatusPayload, PollError>;
}

#[derive(Debug, Clone)]
pub struct HttpTaskApi {
    client: Client,
    base_url: Url,
}

impl HttpTaskApi {
    pub fn new(base_url: &str, request_timeout: Duration) -> anyhow::Result<Self> {
        let base_url = normalize_base(base_url)?;
        let client = Client::builder().timeout(request_timeout).build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn tasks_url(&self) -> Result<Url, WorkflowError> {
        self.base_url
            .join("tasks")
            .map_err(|e| WorkflowError::SubmissionFailed(e.to_string()))
    }
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    async fn submit(&self, selection: &FileSelection) -> Result<TaskHandle, WorkflowError> {
        let url = self.tasks_url()?;
        let mut form = Form::new();
        for file in selection.files() {
            let part = Part::bytes(file.bytes.clone())
                .file_name(file.name.clone())
                .mime_str(file.mime().as_ref())
                .map_err(|e| WorkflowError::SubmissionFailed(e.to_string()))?;
            form = form.part(FILE_FIELD, part);
        }

        tracing::info!("submitting {} file(s) to {url}", selection.len());
        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| WorkflowError::SubmissionFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WorkflowError::SubmissionFailed(format!(
                "server answered {status}"
            )));
        }

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                WorkflowError::SubmissionFailed("response has no location header".to_string())
            })?;
        let handle = resolve_location(&self.base_url, location)
            .map_err(WorkflowError::SubmissionFailed)?;
        tracing::info!("task created, polling {handle}");
        Ok(handle)
    }

    async fn status(&self, handle: &TaskHandle) -> Result<StatusPayload, PollError> {
        let response = self
            .client
            .get(handle.url().clone())
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| PollError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PollError::Status(status.as_u16()));
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| PollError::Transport(e.to_string()))?;
        StatusPayload::from_json(&body).map_err(|e| PollError::MalformedResponse(e.to_string()))
    }
}

/// Parse the server root, making sure relative joins stay below it.
pub fn normalize_base(raw: &str) -> anyhow::Result<Url> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&with_slash)?;
    if url.cannot_be_a_base() {
        anyhow::bail!("{raw:?} cannot be used as a server url");
    }
    Ok(url)
}

/// Resolve a `Location` value the way a browser would against the page root.
pub fn resolve_location(base: &Url, raw: &str) -> Result<TaskHandle, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("empty location header".to_string());
    }
    base.join(raw)
        .map(TaskHandle)
        .map_err(|e| format!("invalid location {raw:?}: {e}"))
}
