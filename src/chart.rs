//! Backend-independent description of the two-panel comparison figure.
//!
//! [`ComparisonChart::build`] does all the arithmetic (epoch bounds, ticks, labels, legend
//! placement, colours); the window viewer and the image exporter only draw what it holds.

use clap::ValueEnum;
use thiserror::Error;

use crate::color::{Rgb, generate_palette};
use crate::data::model::{
    MAP50_95_COLUMN, MAP50_COLUMN, MetricsTable, REQUIRED_COLUMNS, SchemaError,
};

const X_TICK_STEP: usize = 10;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// A loaded run and the name it is shown under.
#[derive(Debug, Clone)]
pub struct SeriesDescriptor {
    pub model_name: String,
    pub table: MetricsTable,
}

/// The two metrics compared, one panel each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Map50,
    Map50To95,
}

impl Metric {
    pub const ALL: [Metric; 2] = [Metric::Map50, Metric::Map50To95];

    pub fn column(self) -> &'static str {
        match self {
            Metric::Map50 => MAP50_COLUMN,
            Metric::Map50To95 => MAP50_95_COLUMN,
        }
    }

    /// Axis label and title prefix.
    pub fn display_name(self) -> &'static str {
        match self {
            Metric::Map50 => "mAP50(B)",
            Metric::Map50To95 => "mAP95(B)",
        }
    }

    /// Short tag used in legend entries.
    pub fn legend_tag(self) -> &'static str {
        match self {
            Metric::Map50 => "mAP50",
            Metric::Map50To95 => "mAP95",
        }
    }
}

/// Where the integer x ticks start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum XTickStart {
    /// Smallest epoch of the last run listed in the config.
    #[default]
    LastSeries,
    /// Smallest epoch over all runs.
    GlobalMin,
}

// ---------------------------------------------------------------------------
// Output model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegendCorner {
    UpperRight,
    UpperLeft,
    LowerLeft,
    LowerRight,
}

impl LegendCorner {
    /// Candidate order; the first corner wins a tie.
    pub const PREFERENCE: [LegendCorner; 4] = [
        LegendCorner::UpperRight,
        LegendCorner::UpperLeft,
        LegendCorner::LowerLeft,
        LegendCorner::LowerRight,
    ];
}

/// One run drawn in one panel.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotLine {
    pub label: String,
    pub color: Rgb,
    /// `(epoch, value)` in table order.
    pub points: Vec<(i64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricPanel {
    pub metric: Metric,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub lines: Vec<PlotLine>,
    pub x_ticks: Vec<i64>,
    pub y_ticks: Vec<f64>,
    /// Inclusive epoch bounds of the plotting area.
    pub x_range: (i64, i64),
    pub y_range: (f64, f64),
    pub legend: LegendCorner,
}

/// The full figure: the mAP50 panel above the mAP50-95 panel.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonChart {
    pub panels: [MetricPanel; 2],
    pub global_min_epoch: i64,
    pub global_max_epoch: i64,
    pub tick_start: i64,
}

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("no runs to compare")]
    NoSeries,

    #[error("run '{model_name}' cannot be charted")]
    Series {
        model_name: String,
        #[source]
        source: SchemaError,
    },
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Per-run values pulled out of the table once and shared by both panels.
struct PreparedRun<'a> {
    model_name: &'a str,
    epochs: Vec<i64>,
    min_epoch: i64,
    max_epoch: i64,
    values: [Vec<f64>; 2],
}

fn prepare(series: &SeriesDescriptor) -> Result<PreparedRun<'_>, SchemaError> {
    let table = &series.table;
    table.require_columns(&REQUIRED_COLUMNS)?;
    let epochs = table.epochs()?;
    let min_epoch = epochs.iter().copied().min().unwrap_or_default();
    let max_epoch = epochs.iter().copied().max().unwrap_or_default();
    Ok(PreparedRun {
        model_name: &series.model_name,
        epochs,
        min_epoch,
        max_epoch,
        values: [
            table.metric_values(Metric::Map50.column())?,
            table.metric_values(Metric::Map50To95.column())?,
        ],
    })
}

impl ComparisonChart {
    /// Build both panels from runs in config order.
    pub fn build(series: &[SeriesDescriptor], tick_start: XTickStart) -> Result<Self, ChartError> {
        let Some(last) = series.last() else {
            return Err(ChartError::NoSeries);
        };

        let runs = series
            .iter()
            .map(|s| {
                prepare(s).map_err(|source| ChartError::Series {
                    model_name: s.model_name.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        // The running maximum starts at zero, as the axis always did.
        let global_max_epoch = runs.iter().map(|r| r.max_epoch).fold(0, i64::max);
        let global_min_epoch = runs.iter().map(|r| r.min_epoch).min().unwrap_or_default();
        let last_min_epoch = runs.last().map_or(global_min_epoch, |r| r.min_epoch);

        let start = match tick_start {
            XTickStart::LastSeries => last_min_epoch,
            XTickStart::GlobalMin => global_min_epoch,
        };
        log::debug!(
            "epochs {global_min_epoch}..={global_max_epoch}, ticks from {start} ({tick_start:?}, last run '{}')",
            last.model_name
        );

        let x_ticks: Vec<i64> = (start..=global_max_epoch).step_by(X_TICK_STEP).collect();
        let x_lo = start.min(global_min_epoch);
        let x_hi = global_max_epoch.max(x_lo + 1);
        let y_ticks: Vec<f64> = (0..=100).step_by(10).map(|i| i as f64 / 100.0).collect();
        let colors = generate_palette(runs.len());

        let panels = Metric::ALL.map(|metric| {
            let slot = match metric {
                Metric::Map50 => 0,
                Metric::Map50To95 => 1,
            };
            let lines: Vec<PlotLine> = runs
                .iter()
                .zip(&colors)
                .map(|(run, &color)| PlotLine {
                    label: format!(
                        "{} ({}) - {} epochs",
                        run.model_name,
                        metric.legend_tag(),
                        run.max_epoch
                    ),
                    color,
                    points: run
                        .epochs
                        .iter()
                        .zip(&run.values[slot])
                        .filter(|(_, y)| !y.is_nan())
                        .map(|(&x, &y)| (x, y))
                        .collect(),
                })
                .collect();
            let y_range = (0.0, 1.0);
            let legend = best_legend_corner(&lines, (x_lo, x_hi), y_range);
            MetricPanel {
                metric,
                title: format!("{} vs. Epoch", metric.display_name()),
                x_label: "Epoch".to_string(),
                y_label: metric.display_name().to_string(),
                lines,
                x_ticks: x_ticks.clone(),
                y_ticks: y_ticks.clone(),
                x_range: (x_lo, x_hi),
                y_range,
                legend,
            }
        });

        Ok(ComparisonChart {
            panels,
            global_min_epoch,
            global_max_epoch,
            tick_start: start,
        })
    }

    pub fn series_count(&self) -> usize {
        self.panels[0].lines.len()
    }
}

/// Pick the corner whose legend-sized box covers the fewest data points.
pub fn best_legend_corner(
    lines: &[PlotLine],
    x_range: (i64, i64),
    y_range: (f64, f64),
) -> LegendCorner {
    const BOX_WIDTH: f64 = 0.4;
    const BOX_HEIGHT: f64 = 0.3;

    let x_span = (x_range.1 - x_range.0).max(1) as f64;
    let y_span = if y_range.1 > y_range.0 {
        y_range.1 - y_range.0
    } else {
        1.0
    };
    let normalized: Vec<(f64, f64)> = lines
        .iter()
        .flat_map(|l| l.points.iter())
        .map(|&(x, y)| ((x - x_range.0) as f64 / x_span, (y - y_range.0) / y_span))
        .collect();

    let covered = |corner: LegendCorner| {
        normalized
            .iter()
            .filter(|&&(nx, ny)| {
                let in_x = match corner {
                    LegendCorner::UpperLeft | LegendCorner::LowerLeft => nx <= BOX_WIDTH,
                    LegendCorner::UpperRight | LegendCorner::LowerRight => nx >= 1.0 - BOX_WIDTH,
                };
                let in_y = match corner {
                    LegendCorner::UpperLeft | LegendCorner::UpperRight => ny >= 1.0 - BOX_HEIGHT,
                    LegendCorner::LowerLeft | LegendCorner::LowerRight => ny <= BOX_HEIGHT,
                };
                in_x && in_y
            })
            .count()
    };

    LegendCorner::PREFERENCE
        .into_iter()
        .min_by_key(|&corner| covered(corner))
        .unwrap_or(LegendCorner::UpperRight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{CellValue, EPOCH_COLUMN};

    /// A run over `epochs` with mAP50 ramping linearly from `lo` to `hi`
    /// and mAP50-95 at 60% of it.
    fn ramp(model_name: &str, epochs: std::ops::RangeInclusive<i64>, lo: f64, hi: f64) -> SeriesDescriptor {
        let first = *epochs.start();
        let span = (*epochs.end() - first).max(1) as f64;
        let rows = epochs
            .map(|e| {
                let map50 = lo + (hi - lo) * (e - first) as f64 / span;
                vec![
                    CellValue::Integer(e),
                    CellValue::Float(map50),
                    CellValue::Float(map50 * 0.6),
                ]
            })
            .collect();
        SeriesDescriptor {
            model_name: model_name.to_string(),
            table: MetricsTable::from_rows(
                format!("{model_name}.csv"),
                REQUIRED_COLUMNS.iter().map(|s| s.to_string()).collect(),
                rows,
            ),
        }
    }

    #[test]
    fn legend_labels_carry_model_metric_and_epoch_count() {
        let chart = ComparisonChart::build(&[ramp("M1", 1..=20, 0.1, 0.9)], XTickStart::LastSeries)
            .unwrap();
        assert_eq!(chart.panels[0].lines[0].label, "M1 (mAP50) - 20 epochs");
        assert_eq!(chart.panels[1].lines[0].label, "M1 (mAP95) - 20 epochs");
        assert_eq!(chart.panels[0].title, "mAP50(B) vs. Epoch");
        assert_eq!(chart.panels[1].y_label, "mAP95(B)");
        assert_eq!(chart.panels[0].x_label, "Epoch");
    }

    #[test]
    fn plotted_values_equal_the_source_columns() {
        let series = ramp("M1", 1..=20, 0.1, 0.9);
        let chart = ComparisonChart::build(std::slice::from_ref(&series), XTickStart::LastSeries)
            .unwrap();

        let epochs = series.table.epochs().unwrap();
        for (panel, metric) in chart.panels.iter().zip(Metric::ALL) {
            let source = series.table.metric_values(metric.column()).unwrap();
            let expected: Vec<(i64, f64)> =
                epochs.iter().copied().zip(source.iter().copied()).collect();
            assert_eq!(panel.lines[0].points, expected);
        }
    }

    #[test]
    fn global_max_epoch_ignores_series_order() {
        let short = ramp("short", 1..=20, 0.1, 0.8);
        let long = ramp("long", 1..=50, 0.1, 0.9);

        let ab = ComparisonChart::build(&[short.clone(), long.clone()], XTickStart::LastSeries)
            .unwrap();
        let ba = ComparisonChart::build(&[long, short], XTickStart::LastSeries).unwrap();
        assert_eq!(ab.global_max_epoch, 50);
        assert_eq!(ba.global_max_epoch, 50);
        for panel in ab.panels.iter().chain(ba.panels.iter()) {
            assert_eq!(panel.x_range.1, 50);
        }
        // Each label still reports the run's own epoch count.
        assert_eq!(ab.panels[0].lines[0].label, "short (mAP50) - 20 epochs");
    }

    #[test]
    fn x_ticks_start_at_last_series_minimum_by_default() {
        let early = ramp("early", 1..=20, 0.1, 0.8);
        let late = ramp("late", 5..=50, 0.1, 0.9);

        let chart = ComparisonChart::build(&[early.clone(), late.clone()], XTickStart::LastSeries)
            .unwrap();
        assert_eq!(chart.tick_start, 5);
        assert_eq!(chart.panels[0].x_ticks, vec![5, 15, 25, 35, 45]);
        assert_eq!(chart.panels[1].x_ticks, chart.panels[0].x_ticks);
        // The axis still reaches back to epoch 1 so the first run is fully visible.
        assert_eq!(chart.panels[0].x_range, (1, 50));

        let global = ComparisonChart::build(&[early, late], XTickStart::GlobalMin).unwrap();
        assert_eq!(global.panels[0].x_ticks, vec![1, 11, 21, 31, 41]);
    }

    #[test]
    fn x_ticks_include_the_max_epoch_when_on_step() {
        let chart = ComparisonChart::build(&[ramp("M", 0..=30, 0.0, 1.0)], XTickStart::LastSeries)
            .unwrap();
        assert_eq!(chart.panels[0].x_ticks, vec![0, 10, 20, 30]);
    }

    #[test]
    fn y_ticks_are_fixed_tenths() {
        let chart = ComparisonChart::build(&[ramp("M", 1..=3, 0.2, 0.3)], XTickStart::LastSeries)
            .unwrap();
        let expected = vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0];
        assert_eq!(chart.panels[0].y_ticks, expected);
        assert_eq!(chart.panels[0].y_range, (0.0, 1.0));
    }

    #[test]
    fn single_epoch_run_gets_a_non_empty_range() {
        let chart = ComparisonChart::build(&[ramp("M", 7..=7, 0.5, 0.5)], XTickStart::LastSeries)
            .unwrap();
        assert_eq!(chart.panels[0].x_range, (7, 8));
        assert_eq!(chart.panels[0].x_ticks, vec![7]);
    }

    #[test]
    fn runs_share_a_colour_across_panels() {
        let chart = ComparisonChart::build(
            &[ramp("a", 1..=5, 0.1, 0.5), ramp("b", 1..=5, 0.2, 0.6)],
            XTickStart::LastSeries,
        )
        .unwrap();
        assert_eq!(chart.series_count(), 2);
        assert_eq!(chart.panels[0].lines[0].color, chart.panels[1].lines[0].color);
        assert_ne!(chart.panels[0].lines[0].color, chart.panels[0].lines[1].color);
    }

    #[test]
    fn missing_metric_cells_are_skipped() {
        let mut series = ramp("M", 1..=3, 0.1, 0.3);
        series.table.columns[1].values[1] = CellValue::Null;
        let chart = ComparisonChart::build(&[series], XTickStart::LastSeries).unwrap();
        let xs: Vec<i64> = chart.panels[0].lines[0].points.iter().map(|p| p.0).collect();
        assert_eq!(xs, vec![1, 3]);
        assert_eq!(chart.panels[1].lines[0].points.len(), 3);
    }

    #[test]
    fn missing_column_names_the_run() {
        let series = SeriesDescriptor {
            model_name: "broken".into(),
            table: MetricsTable::from_rows(
                "broken.csv",
                vec![EPOCH_COLUMN.to_string(), MAP50_COLUMN.to_string()],
                vec![vec![CellValue::Integer(1), CellValue::Float(0.1)]],
            ),
        };
        match ComparisonChart::build(&[series], XTickStart::LastSeries) {
            Err(ChartError::Series { model_name, source }) => {
                assert_eq!(model_name, "broken");
                assert_eq!(source, SchemaError::MissingColumn(MAP50_95_COLUMN.into()));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn no_series_is_an_error() {
        assert!(matches!(
            ComparisonChart::build(&[], XTickStart::LastSeries),
            Err(ChartError::NoSeries)
        ));
    }

    #[test]
    fn legend_avoids_rising_curves() {
        let chart = ComparisonChart::build(&[ramp("M1", 1..=20, 0.1, 0.9)], XTickStart::LastSeries)
            .unwrap();
        assert_eq!(chart.panels[0].legend, LegendCorner::UpperLeft);
    }

    #[test]
    fn legend_moves_below_flat_high_curves() {
        let line = PlotLine {
            label: "flat".into(),
            color: [0, 0, 0],
            points: (0..=10).map(|e| (e, 0.95)).collect(),
        };
        assert_eq!(
            best_legend_corner(&[line], (0, 10), (0.0, 1.0)),
            LegendCorner::LowerLeft
        );
    }
}
