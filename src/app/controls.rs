use eframe::egui::{Color32, ComboBox, Ui};

use crate::data::DataRecord;

use super::ChartDemoApp;

/// A pending request from the controls strip, applied after the panel
/// closes so the chart is not mutated mid-draw.
pub(super) enum DataAction {
    Replace(Vec<DataRecord>),
    Classifier(String),
}

impl ChartDemoApp {
    pub(super) fn draw_controls(&mut self, ui: &mut Ui) -> Option<DataAction> {
        let mut action = None;

        ui.horizontal_wrapped(|ui| {
            ui.label("dataset:");
            if ui.button("all").clicked() {
                action = Some(DataAction::Replace(self.all_records.clone()));
            }
            if ui.button("first half").clicked() {
                let half = self.all_records.len() / 2;
                action = Some(DataAction::Replace(self.all_records[..half].to_vec()));
            }
            if ui.button("every other").clicked() {
                let thinned = self
                    .all_records
                    .iter()
                    .step_by(2)
                    .cloned()
                    .collect::<Vec<_>>();
                action = Some(DataAction::Replace(thinned));
            }
            if ui.button("none").clicked() {
                action = Some(DataAction::Replace(Vec::new()));
            }

            ui.separator();

            let current = self.chart.classifier_field().to_string();
            ComboBox::from_label("group by")
                .selected_text(current.clone())
                .show_ui(ui, |ui| {
                    for field in &self.classifier_fields {
                        if ui.selectable_label(*field == current, field).clicked() {
                            action = Some(DataAction::Classifier(field.clone()));
                        }
                    }
                });

            ui.separator();
            ui.label(format!(
                "nodes {}  alpha {:.3}",
                self.chart.nodes().len(),
                self.chart.alpha()
            ));

            if let Some(error) = &self.error {
                ui.separator();
                ui.colored_label(Color32::from_rgb(235, 110, 100), error);
            }
        });

        action
    }
}
