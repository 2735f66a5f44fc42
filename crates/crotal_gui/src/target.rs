//! Bridges a running batch to the UI thread.

use crotal_core::{BatchId, RenderTarget, RenderedCard, WorkflowState};
use eframe::egui;
use std::sync::mpsc::Sender;

#[derive(Debug)]
pub enum UiEventKind {
    Placeholders(Vec<String>),
    State(WorkflowState),
    Clear,
    Card(RenderedCard),
}

#[derive(Debug)]
pub struct UiEvent {
    pub batch: BatchId,
    pub kind: UiEventKind,
}

/// Render target handed to one batch. Everything it receives is tagged with the
/// batch id and forwarded to the UI thread, which drops events of stale batches.
pub struct GuiTarget {
    batch: BatchId,
    tx: Sender<UiEvent>,
    ctx: Option<egui::Context>,
}

impl GuiTarget {
    pub fn new(batch: BatchId, tx: Sender<UiEvent>, ctx: Option<egui::Context>) -> Self {
        Self { batch, tx, ctx }
    }

    fn send(&self, kind: UiEventKind) {
        // The UI may be gone during shutdown.
        let _ = self.tx.send(UiEvent {
            batch: self.batch,
            kind,
        });
        if let Some(ctx) = &self.ctx {
            ctx.request_repaint();
        }
    }
}

impl RenderTarget for GuiTarget {
    fn show_placeholders(&mut self, names: &[String]) {
        self.send(UiEventKind::Placeholders(names.to_vec()));
    }

    fn set_state(&mut self, state: &WorkflowState) {
        self.send(UiEventKind::State(state.clone()));
    }

    fn clear(&mut self) {
        self.send(UiEventKind::Clear);
    }

    fn push_card(&mut self, card: RenderedCard) {
        self.send(UiEventKind::Card(card));
    }
}
