//! Settings panel: backend, polling, overlay and language.

use super::UiApp;
use crate::i18n::{Language, LanguagePreference};
use crate::store::UiPrefs;
use anyhow::Result;
use crotal_core::Config;
use crotal_core::config::{INTERVAL_MS_RANGE, STROKE_WIDTH_RANGE, TIMEOUT_SECS_RANGE};
use eframe::egui;

/// Edits in progress; applied only when the user saves.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSettings {
    pub base_url: String,
    pub interval_ms: u64,
    pub timeout_secs: u64,
    pub stroke_width: u32,
    pub color: String,
    pub language: LanguagePreference,
    pub recursive_folders: bool,
}

impl PendingSettings {
    pub fn from_config(config: &Config, prefs: &UiPrefs) -> Self {
        Self {
            base_url: config.server.base_url.clone(),
            interval_ms: config.poll.interval_ms,
            timeout_secs: config.poll.timeout_secs,
            stroke_width: config.overlay.stroke_width,
            color: config.overlay.color.clone(),
            language: prefs.language,
            recursive_folders: prefs.recursive_folders,
        }
    }

    /// Merge the edits into `base`. Fields the panel does not show are kept.
    pub fn to_settings(&self, base: &Config) -> Result<(Config, UiPrefs)> {
        let mut config = base.clone();
        config.server.base_url = self.base_url.trim().to_string();
        config.poll.interval_ms = self.interval_ms;
        config.poll.timeout_secs = self.timeout_secs;
        config.overlay.stroke_width = self.stroke_width;
        config.overlay.color = self.color.trim().to_string();
        config.validate()?;
        let prefs = UiPrefs {
            language: self.language,
            recursive_folders: self.recursive_folders,
        };
        Ok((config, prefs))
    }
}

fn language_label(ui_lang: Language, option: LanguagePreference) -> &'static str {
    match option {
        LanguagePreference::System => ui_lang.pick("Sistema (automático)", "System (auto)"),
        LanguagePreference::Spanish => ui_lang.pick("Español", "Spanish"),
        LanguagePreference::English => ui_lang.pick("Inglés", "English"),
    }
}

impl UiApp {
    pub(super) fn render_settings_panel(&mut self, ui: &mut egui::Ui) {
        let lang = self.language;
        ui.heading(self.tr("Ajustes", "Settings"));
        ui.add_space(8.0);

        ui.horizontal(|ui| {
            ui.label(lang.pick("Idioma", "Language"));
            let pending = &mut self.pending;
            egui::ComboBox::from_id_salt("language-select")
                .selected_text(language_label(lang, pending.language))
                .show_ui(ui, |ui| {
                    for option in [
                        LanguagePreference::System,
                        LanguagePreference::Spanish,
                        LanguagePreference::English,
                    ] {
                        ui.selectable_value(
                            &mut pending.language,
                            option,
                            language_label(lang, option),
                        );
                    }
                });
        });
        ui.add_space(12.0);

        ui.horizontal(|ui| {
            ui.label(lang.pick("Servidor", "Server"));
            ui.text_edit_singleline(&mut self.pending.base_url);
        });
        ui.horizontal(|ui| {
            ui.label(lang.pick("Intervalo de consulta (ms)", "Poll interval (ms)"));
            ui.add(
                egui::DragValue::new(&mut self.pending.interval_ms)
                    .range(INTERVAL_MS_RANGE)
                    .speed(50),
            );
        });
        ui.horizontal(|ui| {
            ui.label(lang.pick("Tiempo máximo (s)", "Give up after (s)"));
            ui.add(
                egui::DragValue::new(&mut self.pending.timeout_secs)
                    .range(TIMEOUT_SECS_RANGE)
                    .speed(1),
            );
        });
        ui.add_space(12.0);

        ui.horizontal(|ui| {
            ui.label(lang.pick("Grosor del recuadro", "Box stroke width"));
            ui.add(
                egui::DragValue::new(&mut self.pending.stroke_width)
                    .range(STROKE_WIDTH_RANGE)
                    .speed(1),
            );
        });
        ui.horizontal(|ui| {
            ui.label(lang.pick("Color del recuadro", "Box color"));
            ui.text_edit_singleline(&mut self.pending.color);
        });
        ui.checkbox(
            &mut self.pending.recursive_folders,
            lang.pick("Incluir subcarpetas", "Include subfolders"),
        );
        ui.add_space(12.0);

        ui.horizontal(|ui| {
            if ui.button(lang.pick("Guardar", "Save")).clicked() {
                self.save_settings();
            }
            if ui.button(lang.pick("Descartar", "Discard")).clicked() {
                self.pending = PendingSettings::from_config(&self.config, &self.prefs);
            }
        });

        ui.add_space(16.0);
        ui.separator();
        ui.label(format!(
            "{} {}",
            lang.pick("Versión", "Version"),
            self.app_version
        ));
    }
}
