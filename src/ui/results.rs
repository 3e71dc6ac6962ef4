use egui::{Color32, RichText};

use super::markdown::{markdown_layout, MarkdownStyle};
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultsAction {
    None,
    Back,
    Save,
}

fn pane(ui: &mut egui::Ui, title: &str, body: &str, style: &MarkdownStyle) {
    egui::Frame::group(ui.style())
        .rounding(10.0)
        .inner_margin(egui::Margin::same(0.0))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            egui::Frame::none()
                .fill(ui.visuals().faint_bg_color)
                .inner_margin(egui::Margin::symmetric(12.0, 8.0))
                .show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.label(title);
                });
            egui::Frame::none()
                .inner_margin(egui::Margin::symmetric(12.0, 16.0))
                .show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.label(markdown_layout(body, style));
                });
        });
}

pub fn show_results(
    ui: &mut egui::Ui,
    session: &Session,
    save_status: Option<&Result<String, String>>,
) -> ResultsAction {
    let mut action = ResultsAction::None;
    let style = MarkdownStyle::from_visuals(ui.visuals());
    let parsed = session.buffer().parsed();

    egui::Frame::none()
        .fill(ui.visuals().extreme_bg_color)
        .inner_margin(egui::Margin::symmetric(16.0, 8.0))
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                if ui.button("⬅ Back").clicked() {
                    action = ResultsAction::Back;
                }
                if session.is_generating() {
                    ui.spinner();
                    ui.label("Generating...");
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let save = egui::Button::new(RichText::new("Save").color(Color32::BLACK))
                        .fill(Color32::from_rgb(163, 230, 53));
                    if ui.add_enabled(session.can_save(), save).clicked() {
                        action = ResultsAction::Save;
                    }
                    match save_status {
                        Some(Ok(destination)) => {
                            ui.label(format!("Saved to {}", destination));
                        }
                        Some(Err(e)) => {
                            ui.colored_label(ui.visuals().error_fg_color, e.as_str());
                        }
                        None => {}
                    }
                });
            });
        });

    if let Some(notice) = session.notice() {
        ui.colored_label(ui.visuals().error_fg_color, notice.to_string());
    }
    ui.add_space(12.0);

    egui::ScrollArea::vertical()
        .id_source("results_scroll")
        .auto_shrink([false, false])
        .stick_to_bottom(session.is_generating())
        .show(ui, |ui| {
            pane(ui, "Passage", &parsed.passage, &style);
            ui.add_space(16.0);
            let vocabulary = parsed.vocabulary.as_deref().unwrap_or_default();
            pane(ui, "Vocabulary Words", vocabulary, &style);

            let entries = session.buffer().vocabulary_entries();
            if !entries.is_empty() && !session.is_generating() {
                ui.add_space(8.0);
                ui.collapsing(format!("Word list ({})", entries.len()), |ui| {
                    egui::Grid::new("vocabulary_entries")
                        .striped(true)
                        .num_columns(3)
                        .show(ui, |ui| {
                            ui.strong("Word");
                            ui.strong("Type");
                            ui.strong("Definition");
                            ui.end_row();
                            for entry in entries {
                                ui.label(entry.word.as_str());
                                ui.label(entry.word_type.as_deref().unwrap_or("-"));
                                ui.label(entry.definition.as_str());
                                ui.end_row();
                            }
                        });
                });
            }
        });

    action
}
