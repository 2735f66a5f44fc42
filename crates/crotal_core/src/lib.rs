//! Client side of the crotal tag recognizer: upload a batch of images, wait for the
//! backend to finish, and paint the detected tag regions back onto each image.

pub mod client;
pub mod config;
pub mod decode;
pub mod error;
pub mod model;
pub mod overlay;
pub mod poll;
pub mod render;
pub mod selection;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use client::{HttpTaskApi, TaskApi};
pub use config::Config;
pub use error::{FileError, PollError, WorkflowError};
pub use model::{AnnotationResult, BatchResult, StatusPayload, TaskHandle};
pub use overlay::OverlayStyle;
pub use poll::PollPolicy;
pub use render::{AnnotatedImage, RenderSummary, RenderTarget, RenderedCard};
pub use selection::{FileSelection, ScanOptions, SelectedFile, scan_folder};
pub use workflow::{BatchController, BatchId, UploadWorkflow, WorkflowState};
pub use tokio_util::sync::CancellationToken;
