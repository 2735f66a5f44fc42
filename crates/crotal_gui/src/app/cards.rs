//! Result cards: file name, annotated image, predicted label.

use crotal_core::RenderedCard;
use eframe::egui;

pub const CARD_WIDTH: f32 = 320.0;
const PLACEHOLDER_SIZE: f32 = 120.0;
const ERROR_RED: egui::Color32 = egui::Color32::from_rgb(220, 50, 50);

struct Annotated {
    texture: egui::TextureHandle,
    size: egui::Vec2,
    label: String,
}

pub struct CardView {
    file_name: String,
    body: Result<Annotated, String>,
}

impl CardView {
    /// Upload the annotated raster as a texture. Done once per card.
    pub fn load(ctx: &egui::Context, card: RenderedCard) -> Self {
        let body = match card.outcome {
            Ok(annotated) => {
                let (w, h) = annotated.image.dimensions();
                let color = egui::ColorImage::from_rgba_unmultiplied(
                    [w as usize, h as usize],
                    annotated.image.as_raw(),
                );
                let texture = ctx.load_texture(
                    format!("card:{}", card.file_name),
                    color,
                    egui::TextureOptions::LINEAR,
                );
                let [dw, dh] = fit_width(w, h, CARD_WIDTH);
                Ok(Annotated {
                    texture,
                    size: egui::vec2(dw, dh),
                    label: annotated.label,
                })
            }
            Err(err) => Err(err.to_string()),
        };
        Self {
            file_name: card.file_name,
            body,
        }
    }

    pub fn show(&self, ui: &mut egui::Ui) {
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.set_width(CARD_WIDTH);
            ui.vertical_centered(|ui| {
                ui.strong(&self.file_name);
                ui.add_space(4.0);
                match &self.body {
                    Ok(annotated) => {
                        let (resp, painter) =
                            ui.allocate_painter(annotated.size, egui::Sense::hover());
                        let uv =
                            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
                        painter.image(annotated.texture.id(), resp.rect, uv, egui::Color32::WHITE);
                        ui.add_space(4.0);
                        ui.heading(&annotated.label);
                    }
                    Err(reason) => {
                        ui.colored_label(ERROR_RED, reason);
                    }
                }
            });
        });
    }
}

/// Acknowledgment tile shown while the batch is uploaded and processed.
pub fn placeholder(ui: &mut egui::Ui, name: &str) {
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.set_width(PLACEHOLDER_SIZE);
        ui.vertical_centered(|ui| {
            let (resp, painter) =
                ui.allocate_painter(egui::vec2(PLACEHOLDER_SIZE, PLACEHOLDER_SIZE * 0.75), egui::Sense::hover());
            painter.rect_filled(resp.rect, 4.0, egui::Color32::from_gray(40));
            painter.rect_stroke(
                resp.rect,
                4.0,
                egui::Stroke::new(1.0, egui::Color32::DARK_GRAY),
                egui::StrokeKind::Inside,
            );
            ui.small(name);
        });
    });
}

/// Scale `w`x`h` down to at most `max_width`, keeping the aspect ratio.
/// Smaller images keep their size.
pub fn fit_width(w: u32, h: u32, max_width: f32) -> [f32; 2] {
    let (w, h) = (w as f32, h as f32);
    if w <= max_width || w == 0.0 {
        return [w, h];
    }
    let scale = max_width / w;
    [max_width, h * scale]
}
