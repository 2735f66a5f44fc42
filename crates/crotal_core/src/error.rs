//! Error taxonomy for one upload batch.
//!
//! Batch-level errors abort the whole batch; [`FileError`] is scoped to a single file and
//! ends up on that file's card while the rest of the batch keeps rendering.

use std::time::Duration;
use thiserror::Error;

/// Failure that ends a batch before any card is rendered.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The task-creation request failed or returned no usable location.
    #[error("submission failed: {0}")]
    SubmissionFailed(String),
    /// The status endpoint kept failing past the retry budget.
    #[error("polling failed after {attempts} consecutive errors: {last}")]
    PollFailed { attempts: u32, last: String },
    /// The status endpoint never reported a completed collection.
    #[error("no result after {0:?}")]
    PollTimeout(Duration),
    /// The batch was superseded or cancelled by the user.
    #[error("batch cancelled")]
    Cancelled,
    /// The task running the batch died.
    #[error("batch aborted: {0}")]
    Aborted(String),
}

/// Transient error returned by a single status request.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("server answered {0}")]
    Status(u16),
    #[error("malformed status body: {0}")]
    MalformedResponse(String),
}

/// Failure to turn file bytes into a raster.
#[derive(Debug, Error)]
#[error("cannot decode {name}: {reason}")]
pub struct DecodeError {
    pub name: String,
    pub reason: String,
}

/// Per-file failure shown on that file's card.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileError {
    /// The backend returned no annotation whose identifier ends in this file name.
    #[error("no result returned for {0}")]
    UnmatchedResult(String),
    /// The image could not be decoded.
    #[error("{0}")]
    DecodeFailed(String),
    #[error("render worker stopped: {0}")]
    Worker(String),
}

impl From<DecodeError> for FileError {
    fn from(err: DecodeError) -> Self {
        FileError::DecodeFailed(err.to_string())
    }
}
