use eframe::egui::{self, Color32, RichText, Ui};

use crate::state::{Status, ViewerState};

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut ViewerState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Export…").clicked() {
                export_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        let chart = &state.chart;
        ui.label(format!(
            "{} runs, epochs {} to {}",
            chart.series_count(),
            chart.global_min_epoch,
            chart.global_max_epoch
        ));

        ui.separator();

        match &state.status {
            Some(Status::Info(msg)) => {
                ui.label(msg);
            }
            Some(Status::Error(msg)) => {
                ui.label(RichText::new(msg).color(Color32::RED));
            }
            None => {}
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn export_file_dialog(state: &mut ViewerState) {
    let file = rfd::FileDialog::new()
        .set_title("Export comparison chart")
        .add_filter("PNG image", &["png"])
        .add_filter("SVG image", &["svg"])
        .set_file_name("map_comparison.png")
        .save_file();

    if let Some(path) = file {
        state.export_to(&path);
    }
}
