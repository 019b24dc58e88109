use std::path::Path;

use anyhow::{Context, Result, bail};
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::chart::{ComparisonChart, LegendCorner, MetricPanel};

/// 12 x 6 inches at 100 dpi.
pub const DEFAULT_SIZE: (u32, u32) = (1200, 600);

const FONT: &str = "sans-serif";

// ---------------------------------------------------------------------------
// Output format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Svg,
}

impl OutputFormat {
    /// Pick the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "png" => Ok(OutputFormat::Png),
            "svg" => Ok(OutputFormat::Svg),
            "" => bail!("{} has no extension, expected .png or .svg", path.display()),
            other => bail!("Unsupported output extension: .{other}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Draw both panels, stacked, into a PNG or SVG file.
pub fn write_chart(path: &Path, chart: &ComparisonChart, size: (u32, u32)) -> Result<()> {
    let format = OutputFormat::from_path(path)?;
    match format {
        OutputFormat::Png => write_png(path, chart, size),
        OutputFormat::Svg => draw_figure(SVGBackend::new(path, size).into_drawing_area(), chart),
    }
    .with_context(|| format!("writing chart to {}", path.display()))?;

    log::info!(
        "Wrote {}x{} {format:?} chart with {} runs to {}",
        size.0,
        size.1,
        chart.series_count(),
        path.display()
    );
    Ok(())
}

/// Render into an RGB buffer and let `image` do the PNG encoding.
fn write_png(path: &Path, chart: &ComparisonChart, (width, height): (u32, u32)) -> Result<()> {
    let mut pixels = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
        draw_figure(root, chart)?;
    }
    let image = image::RgbImage::from_raw(width, height, pixels)
        .context("pixel buffer does not match the image size")?;
    image
        .save_with_format(path, image::ImageFormat::Png)
        .context("encoding PNG")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Drawing
// ---------------------------------------------------------------------------

fn draw_figure<DB>(root: DrawingArea<DB, Shift>, chart: &ComparisonChart) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    let areas = root.split_evenly((2, 1));
    for (area, panel) in areas.iter().zip(&chart.panels) {
        draw_panel(area, panel)?;
    }
    root.present()?;
    Ok(())
}

fn draw_panel<DB>(area: &DrawingArea<DB, Shift>, panel: &MetricPanel) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (x_lo, x_hi) = panel.x_range;
    let (y_lo, y_hi) = panel.y_range;

    // Label areas sized so ticks, descriptions and the caption never overlap.
    let mut ctx = ChartBuilder::on(area)
        .caption(&panel.title, (FONT, 18))
        .margin(12)
        .x_label_area_size(42)
        .y_label_area_size(64)
        .build_cartesian_2d(
            (x_lo..x_hi).with_key_points(panel.x_ticks.clone()),
            (y_lo..y_hi).with_key_points(panel.y_ticks.clone()),
        )?;

    ctx.configure_mesh()
        .x_desc(panel.x_label.as_str())
        .y_desc(panel.y_label.as_str())
        .axis_desc_style((FONT, 14))
        .x_label_formatter(&|x: &i64| x.to_string())
        .y_label_formatter(&|y: &f64| format!("{y:.2}"))
        .draw()?;

    for line in &panel.lines {
        let [r, g, b] = line.color;
        let color = RGBColor(r, g, b);
        ctx.draw_series(LineSeries::new(
            line.points.iter().copied(),
            color.stroke_width(2),
        ))?
        .label(line.label.as_str())
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }

    ctx.configure_series_labels()
        .position(legend_position(panel.legend))
        .label_font((FONT, 13))
        .background_style(WHITE.mix(0.85))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

fn legend_position(corner: LegendCorner) -> SeriesLabelPosition {
    match corner {
        LegendCorner::UpperRight => SeriesLabelPosition::UpperRight,
        LegendCorner::UpperLeft => SeriesLabelPosition::UpperLeft,
        LegendCorner::LowerLeft => SeriesLabelPosition::LowerLeft,
        LegendCorner::LowerRight => SeriesLabelPosition::LowerRight,
    }
}
