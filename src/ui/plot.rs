use eframe::egui::{Color32, RichText, Ui};
use egui_plot::{Corner, GridInput, GridMark, Legend, Line, Plot, PlotPoints};

use map_compare::chart::{LegendCorner, MetricPanel};

use crate::state::ViewerState;

const TITLE_HEIGHT: f32 = 22.0;
const MIN_PLOT_HEIGHT: f32 = 120.0;

// ---------------------------------------------------------------------------
// Stacked metric plots (central panel)
// ---------------------------------------------------------------------------

/// Render the mAP50 panel above the mAP50-95 panel, splitting the height evenly.
pub fn comparison_plots(ui: &mut Ui, state: &ViewerState) {
    let spacing = ui.spacing().item_spacing.y;
    let n = state.chart.panels.len() as f32;
    let plot_height =
        ((ui.available_height() - n * (TITLE_HEIGHT + 2.0 * spacing)) / n).max(MIN_PLOT_HEIGHT);

    for panel in &state.chart.panels {
        ui.vertical_centered(|ui: &mut Ui| {
            ui.label(RichText::new(&panel.title).strong().size(15.0));
        });
        metric_plot(ui, panel, plot_height);
    }
}

fn metric_plot(ui: &mut Ui, panel: &MetricPanel, height: f32) {
    let (x_lo, x_hi) = panel.x_range;
    let (y_lo, y_hi) = panel.y_range;
    let x_marks: Vec<f64> = panel.x_ticks.iter().map(|&t| t as f64).collect();

    Plot::new(panel.metric)
        .height(height)
        .legend(Legend::default().position(legend_corner(panel.legend)))
        .x_axis_label(panel.x_label.clone())
        .y_axis_label(panel.y_label.clone())
        .include_x(x_lo as f64)
        .include_x(x_hi as f64)
        .include_y(y_lo)
        .include_y(y_hi)
        .x_grid_spacer(fixed_marks(x_marks, 10.0))
        .y_grid_spacer(fixed_marks(panel.y_ticks.clone(), 0.1))
        .show_grid(true)
        .show(ui, |plot_ui| {
            for line in &panel.lines {
                let [r, g, b] = line.color;
                let points: PlotPoints = line
                    .points
                    .iter()
                    .map(|&(x, y)| [x as f64, y])
                    .collect();

                plot_ui.line(
                    Line::new(points)
                        .name(&line.label)
                        .color(Color32::from_rgb(r, g, b))
                        .width(1.5),
                );
            }
        });
}

/// Grid spacer that always yields the same marks, whatever the zoom level.
fn fixed_marks(values: Vec<f64>, step_size: f64) -> impl Fn(GridInput) -> Vec<GridMark> + 'static {
    move |_input: GridInput| {
        values
            .iter()
            .map(|&value| GridMark { value, step_size })
            .collect()
    }
}

fn legend_corner(corner: LegendCorner) -> Corner {
    match corner {
        LegendCorner::UpperRight => Corner::RightTop,
        LegendCorner::UpperLeft => Corner::LeftTop,
        LegendCorner::LowerLeft => Corner::LeftBottom,
        LegendCorner::LowerRight => Corner::RightBottom,
    }
}
