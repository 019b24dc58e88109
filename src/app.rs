use eframe::egui;

use map_compare::chart::ComparisonChart;

use crate::state::ViewerState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct ComparisonApp {
    pub state: ViewerState,
}

impl ComparisonApp {
    pub fn new(chart: ComparisonChart, export_size: (u32, u32)) -> Self {
        Self {
            state: ViewerState::new(chart, export_size),
        }
    }
}

impl eframe::App for ComparisonApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Central panel: both metric plots ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::comparison_plots(ui, &self.state);
        });
    }
}
