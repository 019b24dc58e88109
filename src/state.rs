use std::path::Path;

use map_compare::chart::ComparisonChart;
use map_compare::export;

// ---------------------------------------------------------------------------
// Viewer state
// ---------------------------------------------------------------------------

/// Status line shown in the top bar.
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Info(String),
    Error(String),
}

/// The full viewer state, independent of rendering.
pub struct ViewerState {
    /// The figure being shown; built once before the window opens.
    pub chart: ComparisonChart,

    /// Pixel size used when exporting.
    pub export_size: (u32, u32),

    pub status: Option<Status>,
}

impl ViewerState {
    pub fn new(chart: ComparisonChart, export_size: (u32, u32)) -> Self {
        Self {
            chart,
            export_size,
            status: None,
        }
    }

    /// Write the current chart to `path`, reporting the outcome in the status line.
    pub fn export_to(&mut self, path: &Path) {
        match export::write_chart(path, &self.chart, self.export_size) {
            Ok(()) => {
                self.status = Some(Status::Info(format!("Saved {}", path.display())));
            }
            Err(e) => {
                log::error!("Failed to export chart: {e:#}");
                self.status = Some(Status::Error(format!("Error: {e:#}")));
            }
        }
    }
}
