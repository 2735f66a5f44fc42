//! The upload batch lifecycle: capture, submit, poll, render.

use std::fmt;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::client::TaskApi;
use crate::error::WorkflowError;
use crate::model::BatchResult;
use crate::overlay::OverlayStyle;
use crate::poll::{PollPolicy, poll_until_complete};
use crate::render::{RenderSummary, RenderTarget, render_batch};
use crate::selection::FileSelection;

/// Where a batch currently is.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WorkflowState {
    #[default]
    Idle,
    Capturing,
    Submitting,
    /// `attempts` status requests sent so far.
    Polling {
        attempts: u32,
    },
    Rendering,
    Completed(RenderSummary),
    Failed(String),
    Cancelled,
}

impl WorkflowState {
    /// True once the batch can no longer change.
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            WorkflowState::Completed(_) | WorkflowState::Failed(_) | WorkflowState::Cancelled
        )
    }

    pub fn is_busy(&self) -> bool {
        !self.is_finished() && *self != WorkflowState::Idle
    }
}

/// Runs single batches against one backend.
pub struct UploadWorkflow<A: TaskApi + ?Sized> {
    api: Arc<A>,
    policy: PollPolicy,
    style: OverlayStyle,
}

impl<A: TaskApi + ?Sized> UploadWorkflow<A> {
    pub fn new(api: Arc<A>, policy: PollPolicy, style: OverlayStyle) -> Self {
        Self { api, policy, style }
    }

    /// Run one batch to completion, reporting every transition to `target`.
    ///
    /// The final state (`Completed`, `Failed` or `Cancelled`) is always reported.
    pub async fn run<T>(
        &self,
        selection: FileSelection,
        target: &mut T,
        cancel: &CancellationToken,
    ) -> Result<RenderSummary, WorkflowError>
    where
        T: RenderTarget + ?Sized,
    {
        let outcome = self.drive(selection, target, cancel).await;
        let last = match &outcome {
            Ok(summary) => {
                tracing::info!(
                    "batch done: {} rendered, {} failed",
                    summary.rendered,
                    summary.failed
                );
                WorkflowState::Completed(*summary)
            }
            Err(WorkflowError::Cancelled) => {
                tracing::info!("batch cancelled");
                WorkflowState::Cancelled
            }
            Err(err) => {
                tracing::error!("batch failed: {err}");
                WorkflowState::Failed(err.to_string())
            }
        };
        target.set_state(&last);
        outcome
    }

    async fn drive<T>(
        &self,
        selection: FileSelection,
        target: &mut T,
        cancel: &CancellationToken,
    ) -> Result<RenderSummary, WorkflowError>
    where
        T: RenderTarget + ?Sized,
    {
        target.set_state(&WorkflowState::Capturing);
        target.clear();
        target.show_placeholders(&selection.placeholders());
        tracing::info!("captured {} file(s)", selection.len());

        target.set_state(&WorkflowState::Submitting);
        let handle = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(WorkflowError::Cancelled),
            submitted = self.api.submit(&selection) => submitted?,
        };

        target.set_state(&WorkflowState::Polling { attempts: 0 });
        let results = poll_until_complete(&*self.api, &handle, &self.policy, cancel, |attempts| {
            target.set_state(&WorkflowState::Polling { attempts })
        })
        .await?;

        target.set_state(&WorkflowState::Rendering);
        let batch = BatchResult::from_results(results);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(WorkflowError::Cancelled),
            summary = render_batch(selection, batch, self.style, &mut *target) => Ok(summary),
        }
    }
}

/// Identifies one batch started by a [`BatchController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BatchId(pub u64);

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "batch #{}", self.0)
    }
}

struct RunningBatch {
    id: BatchId,
    cancel: CancellationToken,
    task: JoinHandle<Result<RenderSummary, WorkflowError>>,
}

/// Owns the batch in flight. Starting a new batch cancels the previous one.
pub struct BatchController<A: TaskApi + ?Sized + 'static> {
    workflow: Arc<UploadWorkflow<A>>,
    runtime: Handle,
    current: Option<RunningBatch>,
    next_id: u64,
}

impl<A: TaskApi + ?Sized + 'static> BatchController<A> {
    pub fn new(workflow: UploadWorkflow<A>, runtime: Handle) -> Self {
        Self {
            workflow: Arc::new(workflow),
            runtime,
            current: None,
            next_id: 1,
        }
    }

    /// Swap the workflow used by future batches, e.g. after a settings change.
    /// The batch in flight keeps the one it started with.
    pub fn set_workflow(&mut self, workflow: UploadWorkflow<A>) {
        self.workflow = Arc::new(workflow);
    }

    /// Cancel whatever runs and start `selection` as a new batch. `make_target`
    /// receives the new id so the target can tag what it reports.
    pub fn start<T, F>(&mut self, selection: FileSelection, make_target: F) -> BatchId
    where
        T: RenderTarget + 'static,
        F: FnOnce(BatchId) -> T,
    {
        self.cancel();

        let id = BatchId(self.next_id);
        self.next_id += 1;
        let cancel = CancellationToken::new();
        let mut target = make_target(id);
        let workflow = self.workflow.clone();
        let token = cancel.clone();

        tracing::info!("starting {id}");
        let task = self
            .runtime
            .spawn(async move { workflow.run(selection, &mut target, &token).await });

        self.current = Some(RunningBatch { id, cancel, task });
        id
    }

    /// Cancel the batch in flight, if any.
    pub fn cancel(&mut self) {
        if let Some(batch) = &self.current
            && !batch.cancel.is_cancelled()
            && !batch.task.is_finished()
        {
            tracing::info!("cancelling {}", batch.id);
            batch.cancel.cancel();
        }
    }

    pub fn current_id(&self) -> Option<BatchId> {
        self.current.as_ref().map(|b| b.id)
    }

    pub fn is_running(&self) -> bool {
        self.current.as_ref().is_some_and(|b| !b.task.is_finished())
    }

    /// Wait for the current batch and hand back its outcome.
    pub async fn wait(&mut self) -> Option<Result<RenderSummary, WorkflowError>> {
        let batch = self.current.take()?;
        Some(match batch.task.await {
            Ok(outcome) => outcome,
            Err(err) if err.is_cancelled() => Err(WorkflowError::Cancelled),
            Err(err) => Err(WorkflowError::Aborted(err.to_string())),
        })
    }
}

impl<A: TaskApi + ?Sized + 'static> Drop for BatchController<A> {
    fn drop(&mut self) {
        if let Some(batch) = &self.current {
            batch.cancel.cancel();
        }
    }
}
