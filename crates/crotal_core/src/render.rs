//! Rendering a finished batch: one card per selected file.

use futures::future::join_all;
use image::RgbaImage;

use crate::decode::decode_image;
use crate::error::FileError;
use crate::model::{AnnotationResult, BatchResult};
use crate::overlay::{OverlayStyle, paint_rects};
use crate::selection::{FileSelection, SelectedFile};
use crate::workflow::WorkflowState;

/// Decoded image with its detections painted on.
#[derive(Debug, Clone)]
pub struct AnnotatedImage {
    pub image: RgbaImage,
    pub label: String,
    pub rect_count: usize,
}

#[derive(Debug, Clone)]
pub struct RenderedCard {
    pub file_name: String,
    pub outcome: Result<AnnotatedImage, FileError>,
}

impl RenderedCard {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub rendered: usize,
    pub failed: usize,
}

/// Where one batch shows its progress and cards. Each batch gets its own target.
pub trait RenderTarget: Send {
    /// Acknowledge the selection before anything is uploaded.
    fn show_placeholders(&mut self, names: &[String]);

    fn set_state(&mut self, _state: &WorkflowState) {}

    /// Drop whatever the batch showed so far.
    fn clear(&mut self);

    fn push_card(&mut self, card: RenderedCard);
}

impl RenderTarget for Vec<RenderedCard> {
    fn show_placeholders(&mut self, _names: &[String]) {}

    fn clear(&mut self) {
        Vec::clear(self);
    }

    fn push_card(&mut self, card: RenderedCard) {
        self.push(card);
    }
}

/// Decode and annotate every file, then replace the target's content with the
/// cards in selection order.
///
/// Nothing is pushed until every file is done. Files without a matching result or
/// that fail to decode still get a card, carrying the error.
pub async fn render_batch<T>(
    selection: FileSelection,
    results: BatchResult,
    style: OverlayStyle,
    target: &mut T,
) -> RenderSummary
where
    T: RenderTarget + ?Sized,
{
    let unused = results
        .keys()
        .filter(|key| !selection.files().iter().any(|f| f.name == *key))
        .count();
    // Files sharing a base name all get the same result.
    let jobs: Vec<_> = selection
        .into_files()
        .into_iter()
        .map(|file| {
            let result = results.get(&file.name).cloned();
            render_file(file, result, style)
        })
        .collect();
    let cards = join_all(jobs).await;

    let mut summary = RenderSummary::default();
    target.clear();
    for card in cards {
        match &card.outcome {
            Ok(_) => summary.rendered += 1,
            Err(err) => {
                tracing::warn!("{}: {err}", card.file_name);
                summary.failed += 1;
            }
        }
        target.push_card(card);
    }
    if unused > 0 {
        tracing::debug!("{unused} result(s) matched no selected file");
    }
    summary
}

async fn render_file(
    file: SelectedFile,
    result: Option<AnnotationResult>,
    style: OverlayStyle,
) -> RenderedCard {
    let file_name = file.name.clone();
    let Some(result) = result else {
        return RenderedCard {
            outcome: Err(FileError::UnmatchedResult(file_name.clone())),
            file_name,
        };
    };

    let joined = tokio::task::spawn_blocking(move || -> Result<AnnotatedImage, FileError> {
        let mut image = decode_image(&file)?;
        let rect_count = paint_rects(&mut image, &result.bounding_rects, &style);
        Ok(AnnotatedImage {
            image,
            label: result.digits,
            rect_count,
        })
    })
    .await;

    RenderedCard {
        file_name,
        outcome: joined.unwrap_or_else(|e| Err(FileError::Worker(e.to_string()))),
    }
}
