use egui::{Color32, RichText};

use crate::session::{Notice, Session, ViewState};
use crate::types::Language;

const ERROR_COLOR: Color32 = Color32::from_rgb(220, 80, 80);
const ACCENT: Color32 = Color32::from_rgb(163, 230, 53);

fn field_error(ui: &mut egui::Ui, message: Option<&str>) {
    if let Some(message) = message {
        ui.colored_label(ERROR_COLOR, message);
    }
}

fn language_picker(ui: &mut egui::Ui, language: &mut Language) {
    egui::ComboBox::from_id_source("output_language")
        .width(ui.available_width())
        .selected_text(if language.as_value().is_empty() { "Other…" } else { language.label() })
        .show_ui(ui, |ui| {
            for preset in Language::PRESETS.iter() {
                ui.selectable_value(language, preset.clone(), preset.label());
            }
            let is_other = matches!(language, Language::Other(_));
            if ui.selectable_label(is_other, "Other…").clicked() && !is_other {
                *language = Language::Other(String::new());
            }
        });
    if let Language::Other(text) = language {
        ui.add(
            egui::TextEdit::singleline(text)
                .hint_text("e.g. french")
                .desired_width(f32::INFINITY),
        );
    }
}

/// Draws the form (also shown, disabled, while a request is streaming).
/// Returns true when Generate was pressed.
pub fn show_form(ui: &mut egui::Ui, session: &mut Session) -> bool {
    let generating = session.state() == ViewState::Streaming;
    let errors = session.field_errors().clone();
    let mut submitted = false;

    ui.vertical_centered(|ui| {
        ui.add_space(24.0);
        ui.heading(RichText::new("Create a vocabulary based reading").strong());
        ui.label(
            RichText::new("Create a reading passage based on vocabulary words")
                .color(ui.visuals().weak_text_color())
                .size(16.0),
        );
        ui.add_space(20.0);
    });

    let width = (ui.available_width() * 2.0 / 3.0).max(320.0);
    ui.vertical_centered(|ui| {
        ui.set_max_width(width);
        ui.with_layout(egui::Layout::top_down(egui::Align::Min), |ui| {
            ui.add_enabled_ui(!generating, |ui| {
                ui.label("Vocabulary words");
                ui.add(
                    egui::TextEdit::singleline(&mut session.form.vocab)
                        .hint_text("talk, walk")
                        .desired_width(f32::INFINITY),
                );
                field_error(ui, errors.vocab);
                ui.add_space(12.0);

                ui.label("Additional instructions (optional)");
                ui.add(
                    egui::TextEdit::multiline(&mut session.form.instruction)
                        .hint_text(
                            "Create one short reading passage with two paragraphs for primary 1 students",
                        )
                        .desired_rows(3)
                        .desired_width(f32::INFINITY),
                );
                field_error(ui, errors.instruction);
                ui.add_space(12.0);

                ui.label("Output language");
                language_picker(ui, &mut session.form.language);
                field_error(ui, errors.language);
                ui.add_space(16.0);
            });

            let button_size = egui::vec2(ui.available_width(), 36.0);
            if generating {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Generating...");
                });
            } else {
                let button = egui::Button::new(
                    RichText::new("✨ Generate Reading Passage").color(Color32::BLACK),
                )
                .fill(ACCENT)
                .min_size(button_size);
                if ui.add(button).clicked() {
                    submitted = true;
                }
            }

            if let Some(notice) = session.notice() {
                ui.add_space(12.0);
                let color = match notice {
                    Notice::MissingSections => ui.visuals().warn_fg_color,
                    Notice::UpstreamFailed(_) => ui.visuals().error_fg_color,
                };
                ui.colored_label(color, notice.to_string());
            }

            if !generating && !session.buffer().is_empty() {
                ui.collapsing("Raw response", |ui| {
                    egui::ScrollArea::vertical()
                        .id_source("raw_response_scroll")
                        .max_height(240.0)
                        .show(ui, |ui| {
                            let mut raw = session.buffer().as_str().to_string();
                            ui.add(
                                egui::TextEdit::multiline(&mut raw)
                                    .font(egui::TextStyle::Monospace)
                                    .desired_width(f32::INFINITY)
                                    .interactive(false),
                            );
                        });
                });
            }
        });
    });

    submitted
}
