//! Wire types exchanged with the task backend.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Detections for one uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationResult {
    /// Path-like identifier; its last segment is the uploaded file name.
    pub identifier: String,
    /// Rectangles as `[x, y, width, height]`.
    #[serde(default)]
    pub bounding_rects: Vec<[i64; 4]>,
    /// Predicted label, displayed verbatim.
    #[serde(default)]
    pub digits: String,
}

impl AnnotationResult {
    /// File name this result belongs to.
    pub fn file_key(&self) -> &str {
        self.identifier
            .rsplit(|c| c == '/' || c == '\\')
            .next()
            .unwrap_or(&self.identifier)
    }
}

/// Where to poll for a submitted batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskHandle(pub Url);

impl TaskHandle {
    pub fn url(&self) -> &Url {
        &self.0
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Body of a status response.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusPayload {
    /// A JSON array: the batch is finished.
    Completed(Vec<AnnotationResult>),
    /// Any other JSON value, e.g. `{}` while the backend is still working.
    InProgress(serde_json::Value),
}

impl StatusPayload {
    /// Classify a status body. Only arrays count as completed.
    pub fn from_json(body: &[u8]) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_slice(body)?;
        if value.is_array() {
            let results = serde_json::from_value(value)?;
            Ok(StatusPayload::Completed(results))
        } else {
            Ok(StatusPayload::InProgress(value))
        }
    }
}

/// Completed results keyed by file name.
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    by_file: HashMap<String, AnnotationResult>,
}

impl BatchResult {
    /// Later entries win when two identifiers end in the same file name.
    pub fn from_results(results: Vec<AnnotationResult>) -> Self {
        let mut by_file = HashMap::with_capacity(results.len());
        for result in results {
            let key = result.file_key().to_string();
            if by_file.insert(key.clone(), result).is_some() {
                tracing::warn!("duplicate result for {key}, keeping the last one");
            }
        }
        Self { by_file }
    }

    pub fn len(&self) -> usize {
        self.by_file.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_file.is_empty()
    }

    pub fn get(&self, file_name: &str) -> Option<&AnnotationResult> {
        self.by_file.get(file_name)
    }

    /// File names that have a result.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.by_file.keys().map(String::as_str)
    }
}
