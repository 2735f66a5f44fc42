//! In-memory backend and render target shared by the unit tests.

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use reqwest::Url;
use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use crate::client::TaskApi;
use crate::error::{PollError, WorkflowError};
use crate::model::{AnnotationResult, StatusPayload, TaskHandle};
use crate::render::{RenderTarget, RenderedCard};
use crate::selection::{FileSelection, SelectedFile};
use crate::workflow::WorkflowState;

pub(crate) fn sample_handle() -> TaskHandle {
    TaskHandle(Url::parse("http://backend.test/tasks/42").unwrap())
}

pub(crate) fn in_progress() -> Result<StatusPayload, PollError> {
    Ok(StatusPayload::InProgress(serde_json::json!({})))
}

pub(crate) fn annotation(identifier: &str, rects: &[[i64; 4]], digits: &str) -> AnnotationResult {
    AnnotationResult {
        identifier: identifier.to_string(),
        bounding_rects: rects.to_vec(),
        digits: digits.to_string(),
    }
}

pub(crate) fn completed(results: Vec<AnnotationResult>) -> Result<StatusPayload, PollError> {
    Ok(StatusPayload::Completed(results))
}

pub(crate) fn encoded_image(format: ImageFormat, w: u32, h: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([200, 200, 200])));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).unwrap();
    out.into_inner()
}

/// `a.png` (png, 20x10) and `b.tif` (tiff, 6x6).
pub(crate) fn png_and_tiff() -> FileSelection {
    FileSelection::new(vec![
        SelectedFile::from_bytes("a.png", encoded_image(ImageFormat::Png, 20, 10)),
        SelectedFile::from_bytes("b.tif", encoded_image(ImageFormat::Tiff, 6, 6)),
    ])
    .unwrap()
}

/// Backend answering status requests from a script, then `{}` forever.
pub(crate) struct ScriptedApi {
    submit_error: Mutex<Option<WorkflowError>>,
    statuses: Mutex<VecDeque<Result<StatusPayload, PollError>>>,
    submit_calls: AtomicU32,
    status_calls: AtomicU32,
}

impl ScriptedApi {
    pub(crate) fn with_statuses(statuses: Vec<Result<StatusPayload, PollError>>) -> Self {
        Self {
            submit_error: Mutex::new(None),
            statuses: Mutex::new(statuses.into()),
            submit_calls: AtomicU32::new(0),
            status_calls: AtomicU32::new(0),
        }
    }

    pub(crate) fn failing_submit(error: WorkflowError) -> Self {
        let api = Self::with_statuses(vec![]);
        *api.submit_error.lock().unwrap() = Some(error);
        api
    }

    pub(crate) fn submit_calls(&self) -> u32 {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn status_calls(&self) -> u32 {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskApi for ScriptedApi {
    async fn submit(&self, _selection: &FileSelection) -> Result<TaskHandle, WorkflowError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        match self.submit_error.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(sample_handle()),
        }
    }

    async fn status(&self, _handle: &TaskHandle) -> Result<StatusPayload, PollError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(in_progress)
    }
}

/// Everything a workflow showed, in order.
#[derive(Default)]
pub(crate) struct Recorded {
    pub placeholders: Vec<String>,
    pub states: Vec<WorkflowState>,
    pub cards: Vec<RenderedCard>,
    pub clears: usize,
}

/// Render target whose recording stays readable after the batch task moved it.
#[derive(Clone, Default)]
pub(crate) struct RecordingTarget(pub Arc<Mutex<Recorded>>);

impl RenderTarget for RecordingTarget {
    fn show_placeholders(&mut self, names: &[String]) {
        self.0.lock().unwrap().placeholders = names.to_vec();
    }

    fn set_state(&mut self, state: &WorkflowState) {
        self.0.lock().unwrap().states.push(state.clone());
    }

    fn clear(&mut self) {
        let mut recorded = self.0.lock().unwrap();
        recorded.clears += 1;
        recorded.cards.clear();
    }

    fn push_card(&mut self, card: RenderedCard) {
        self.0.lock().unwrap().cards.push(card);
    }
}
