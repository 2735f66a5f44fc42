//! Main window: selection, batch progress and result cards.

mod cards;
mod settings;

use anyhow::Result;
use crotal_core::{
    BatchController, Config, FileSelection, HttpTaskApi, ScanOptions, UploadWorkflow,
    WorkflowState, scan_folder,
};
use eframe::{App, Frame, egui};
use rfd::FileDialog;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use tokio::runtime::Runtime;

use crate::i18n::Language;
use crate::store::{SettingsStore, UiPrefs};
use crate::target::{GuiTarget, UiEvent, UiEventKind};
use cards::CardView;
use settings::PendingSettings;

const IMAGE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "bmp", "gif", "tif", "tiff"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Panel {
    Results,
    Settings,
}

pub struct UiApp {
    controller: BatchController<HttpTaskApi>,
    /// Runs the batches; dropped after the controller has cancelled them.
    _runtime: Runtime,
    events_tx: Sender<UiEvent>,
    events_rx: Receiver<UiEvent>,
    store: SettingsStore,
    config: Config,
    prefs: UiPrefs,
    pending: PendingSettings,
    language: Language,
    panel: Panel,
    state: WorkflowState,
    placeholders: Vec<String>,
    cards: Vec<CardView>,
    status: String,
    app_version: &'static str,
}

pub fn build_workflow(config: &Config) -> Result<UploadWorkflow<HttpTaskApi>> {
    let api = HttpTaskApi::new(&config.server.base_url, config.request_timeout())?;
    Ok(UploadWorkflow::new(
        Arc::new(api),
        config.poll_policy(),
        config.overlay_style()?,
    ))
}

impl UiApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Result<Self> {
        Self::with_store(SettingsStore::platform())
    }

    fn with_store(store: SettingsStore) -> Result<Self> {
        let prefs = store.load_prefs();
        let language = prefs.language.resolve();
        let mut status = String::new();
        let config = match store.load_config() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("falling back to default settings: {e:#}");
                status = format!(
                    "{}: {e}",
                    language.pick("Ajustes no válidos", "Invalid settings")
                );
                Config::default()
            }
        };

        let runtime = Runtime::new()?;
        let controller =
            BatchController::new(build_workflow(&config)?, runtime.handle().clone());
        let (events_tx, events_rx) = channel();
        tracing::info!("using backend {}", config.server.base_url);

        Ok(Self {
            controller,
            _runtime: runtime,
            events_tx,
            events_rx,
            pending: PendingSettings::from_config(&config, &prefs),
            store,
            config,
            prefs,
            language,
            panel: Panel::Results,
            state: WorkflowState::Idle,
            placeholders: Vec::new(),
            cards: Vec::new(),
            status,
            app_version: env!("CROTALPATH_VERSION"),
        })
    }

    fn tr<'a>(&self, es: &'a str, en: &'a str) -> &'a str {
        self.language.pick(es, en)
    }

    fn start_batch(&mut self, ctx: &egui::Context, paths: Vec<PathBuf>) {
        if paths.is_empty() {
            self.status = self
                .tr("No hay imágenes en la carpeta", "No images in folder")
                .to_string();
            return;
        }
        let selection = match FileSelection::from_paths(&paths) {
            Ok(selection) => selection,
            Err(e) => {
                self.status = format!("{}: {e:#}", self.tr("No se pudo leer", "Cannot read"));
                return;
            }
        };

        self.cards.clear();
        self.placeholders = selection.placeholders();
        self.state = WorkflowState::Capturing;
        self.status.clear();
        self.panel = Panel::Results;

        let tx = self.events_tx.clone();
        let repaint = ctx.clone();
        self.controller
            .start(selection, move |id| GuiTarget::new(id, tx, Some(repaint)));
    }

    fn drain_events(&mut self, ctx: &egui::Context) {
        let current = self.controller.current_id();
        while let Ok(event) = self.events_rx.try_recv() {
            if Some(event.batch) != current {
                continue;
            }
            match event.kind {
                UiEventKind::Placeholders(names) => {
                    self.cards.clear();
                    self.placeholders = names;
                }
                UiEventKind::State(state) => self.state = state,
                UiEventKind::Clear => {
                    self.cards.clear();
                    self.placeholders.clear();
                }
                UiEventKind::Card(card) => self.cards.push(CardView::load(ctx, card)),
            }
        }
    }

    /// Returns whether the edits were valid and are now in use.
    fn apply_settings(&mut self) -> bool {
        let (config, prefs) = match self.pending.to_settings(&self.config) {
            Ok(settings) => settings,
            Err(e) => {
                self.status = format!(
                    "{}: {e:#}",
                    self.tr("Ajustes no válidos", "Invalid settings")
                );
                return false;
            }
        };
        let workflow = match build_workflow(&config) {
            Ok(workflow) => workflow,
            Err(e) => {
                self.status = format!(
                    "{}: {e:#}",
                    self.tr("Ajustes no válidos", "Invalid settings")
                );
                return false;
            }
        };
        self.controller.set_workflow(workflow);
        if let Err(e) = self.store.save_config(&config) {
            tracing::warn!("cannot save config: {e:#}");
        }
        if let Err(e) = self.store.save_prefs(&prefs) {
            tracing::warn!("cannot save ui preferences: {e:#}");
        }
        self.language = prefs.language.resolve();
        self.config = config;
        self.prefs = prefs;
        self.status = self.tr("Ajustes guardados.", "Settings saved.").to_string();
        true
    }

    /// Save button: leave the form only once the edits are in use.
    fn save_settings(&mut self) {
        if self.apply_settings() {
            self.panel = Panel::Results;
        }
    }

    fn state_text(&self) -> String {
        match &self.state {
            WorkflowState::Idle => String::new(),
            WorkflowState::Capturing => self.tr("Preparando…", "Preparing…").to_string(),
            WorkflowState::Submitting => self
                .tr("Subiendo imágenes…", "Uploading images…")
                .to_string(),
            WorkflowState::Polling { attempts } => format!(
                "{} ({attempts})",
                self.tr("Esperando resultados", "Waiting for results")
            ),
            WorkflowState::Rendering => self
                .tr("Dibujando resultados…", "Drawing results…")
                .to_string(),
            WorkflowState::Completed(summary) => format!(
                "{}: {} / {}: {}",
                self.tr("Listo", "Done"),
                summary.rendered,
                self.tr("fallidos", "failed"),
                summary.failed
            ),
            WorkflowState::Failed(reason) => format!("{}: {reason}", self.tr("Error", "Error")),
            WorkflowState::Cancelled => self.tr("Cancelado", "Cancelled").to_string(),
        }
    }

    fn render_top_bar(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui
                .button(self.tr("Seleccionar imágenes…", "Select images…"))
                .clicked()
                && let Some(paths) = FileDialog::new()
                    .add_filter(self.tr("Imágenes", "Images"), &IMAGE_EXTENSIONS)
                    .pick_files()
            {
                self.start_batch(ctx, paths);
            }

            if ui
                .button(self.tr("Seleccionar carpeta…", "Select folder…"))
                .clicked()
                && let Some(dir) = FileDialog::new().set_directory(".").pick_folder()
            {
                let opts = ScanOptions {
                    recursive: self.prefs.recursive_folders,
                };
                match scan_folder(&dir, opts) {
                    Ok(paths) => self.start_batch(ctx, paths),
                    Err(e) => self.status = format!("{e:#}"),
                }
            }

            if ui
                .add_enabled(
                    self.controller.is_running(),
                    egui::Button::new(self.tr("Cancelar", "Cancel")),
                )
                .clicked()
            {
                self.controller.cancel();
            }

            let settings_label = match self.panel {
                Panel::Results => self.tr("Ajustes", "Settings"),
                Panel::Settings => self.tr("Resultados", "Results"),
            };
            if ui.button(settings_label).clicked() {
                self.panel = match self.panel {
                    Panel::Results => Panel::Settings,
                    Panel::Settings => Panel::Results,
                };
            }

            if self.state.is_busy() {
                ui.spinner();
            }
            let state_text = self.state_text();
            match &self.state {
                WorkflowState::Failed(_) => {
                    ui.colored_label(egui::Color32::from_rgb(220, 50, 50), state_text);
                }
                _ => {
                    ui.label(state_text);
                }
            }
            if !self.status.is_empty() {
                ui.label(&self.status);
            }
        });
    }

    fn render_results(&mut self, ui: &mut egui::Ui) {
        if self.cards.is_empty() && self.placeholders.is_empty() {
            ui.vertical_centered(|ui| {
                ui.add_space(40.0);
                ui.heading(self.tr(
                    "Selecciona imágenes de crotales para leerlas",
                    "Select ear tag images to read them",
                ));
            });
            return;
        }

        egui::ScrollArea::vertical()
            .auto_shrink([false; 2])
            .show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    if self.cards.is_empty() {
                        for name in &self.placeholders {
                            cards::placeholder(ui, name);
                        }
                    } else {
                        for card in &self.cards {
                            card.show(ui);
                        }
                    }
                });
            });
    }
}

impl App for UiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.drain_events(ctx);

        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            self.render_top_bar(ctx, ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| match self.panel {
            Panel::Results => self.render_results(ui),
            Panel::Settings => self.render_settings_panel(ui),
        });
    }
}
