//! Sea level rise: two least-squares fits over the CSIRO series and their
//! extrapolation to a target year.

use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::analyzers::types::SeaLevelRow;
use crate::chart::frame::{self, draw_legend};
use crate::chart::{Axis, Canvas, Color, LegendMark, LineStyle, PlotArea, Style};
use crate::error::AnalysisError;
use crate::output::save_svg;
use crate::stats::{Regression, linregress, round1};
use crate::table::load_rows;

pub const PLOT_FILE: &str = "sea_level_plot.svg";
pub const DEFAULT_YEAR_THRESHOLD: i32 = 2000;
pub const DEFAULT_YEAR_PREDICT: i32 = 2050;

/// A regression over the years `from_year..=to_year` of the data.
#[derive(Debug, Clone, Serialize)]
pub struct Fit {
    pub from_year: i32,
    pub to_year: i32,
    /// First year the fitted line is drawn from.
    pub line_start: i32,
    pub regression: Regression,
    /// Fitted sea level at the prediction year, one decimal. With a falling
    /// trend this is the lowest point of the drawn line, not the highest.
    pub prediction: f64,
}

impl Fit {
    pub fn message(&self, year_predict: i32) -> String {
        format!(
            "Based on a linear regression from {} to {}, the sea level will rise to {} by {}.",
            self.from_year, self.to_year, self.prediction, year_predict
        )
    }

    pub fn legend_label(&self) -> String {
        format!("Linear Regression from {} to {}", self.from_year, self.to_year)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SeaLevelReport {
    pub year_threshold: i32,
    pub year_predict: i32,
    /// Fit over every year.
    pub all_years: Fit,
    /// Fit over `year_threshold` onwards.
    pub recent: Fit,
}

/// Fits rows with `Year >= since` (every row when `since` is `None`).
pub fn fit_since(rows: &[SeaLevelRow], since: Option<i32>, year_predict: i32) -> Result<Fit, AnalysisError> {
    let selected: Vec<&SeaLevelRow> = rows
        .iter()
        .filter(|r| since.is_none_or(|y| r.year >= y))
        .collect();

    let (Some(first), Some(last)) = (
        selected.iter().map(|r| r.year).min(),
        selected.iter().map(|r| r.year).max(),
    ) else {
        return Err(AnalysisError::EmptyColumn("Year"));
    };

    let x: Vec<f64> = selected.iter().map(|r| r.year as f64).collect();
    let y: Vec<f64> = selected.iter().map(|r| r.csiro_adjusted).collect();
    let regression = linregress(&x, &y)?;

    Ok(Fit {
        from_year: first,
        to_year: last,
        line_start: since.unwrap_or(first),
        regression,
        prediction: round1(regression.predict(year_predict as f64)),
    })
}

/// Both fits and their predictions for `year_predict`.
pub fn predict(rows: &[SeaLevelRow], year_threshold: i32, year_predict: i32) -> Result<SeaLevelReport, AnalysisError> {
    Ok(SeaLevelReport {
        year_threshold,
        year_predict,
        all_years: fit_since(rows, None, year_predict)?,
        recent: fit_since(rows, Some(year_threshold), year_predict)?,
    })
}

/// Scatter of the measurements with both fitted lines extended to the
/// prediction year.
pub fn draw_plot(rows: &[SeaLevelRow], report: &SeaLevelReport) -> Result<String> {
    let mut canvas = Canvas::new(760.0, 480.0);
    let area = PlotArea::new(80.0, 40.0, 640.0, 360.0);

    let fits = [
        (&report.all_years, LineStyle::dashed(Color::BLUE, 1.5)),
        (&report.recent, LineStyle::dash_dot(Color::ORANGE, 1.5)),
    ];
    let end = report.year_predict as f64;
    let segment = |fit: &Fit| {
        let start = fit.line_start as f64;
        [
            (start, fit.regression.predict(start)),
            (end, fit.regression.predict(end)),
        ]
    };

    let xs = rows.iter().map(|r| r.year as f64).chain([end]);
    let ys = rows
        .iter()
        .map(|r| r.csiro_adjusted)
        .chain(fits.iter().flat_map(|&(f, _)| segment(f).map(|p| p.1)));
    let (x_lo, x_hi) = bounds(xs);
    let (y_lo, y_hi) = bounds(ys);
    let x_axis = Axis::linear(x_lo, x_hi, 8);
    let y_axis = Axis::linear(y_lo, y_hi, 7);

    frame::draw_axes(&mut canvas, &area, &x_axis, &y_axis);
    frame::draw_title(&mut canvas, &area, "Rise in Sea Level");
    frame::draw_labels(&mut canvas, &area, "Year", "Sea Level (inches)");

    let dot = Style::filled(Color::BLACK);
    for r in rows {
        let (px, py) = (
            area.x_px(&x_axis, r.year as f64),
            area.y_px(&y_axis, r.csiro_adjusted),
        );
        canvas.circle(px, py, 1.8, &dot);
    }

    let mut legend = vec![(LegendMark::Dot(Color::BLACK), "CSIRO Adjusted Sea Level".to_string())];
    for (fit, style) in &fits {
        let points: Vec<(f64, f64)> = segment(*fit)
            .iter()
            .map(|(x, y)| (area.x_px(&x_axis, *x), area.y_px(&y_axis, *y)))
            .collect();
        canvas.polyline(&points, style);
        legend.push((LegendMark::Line(style.clone()), fit.legend_label()));
    }
    draw_legend(&mut canvas, area.left + 12.0, area.top + 16.0, None, &legend);

    Ok(canvas.finish_svg()?)
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

/// Loads the series, prints both predictions and saves the chart.
#[tracing::instrument(fields(path = %path.display(), out_dir = %out_dir.display()))]
pub fn run(path: &Path, out_dir: &Path, year_threshold: i32, year_predict: i32) -> Result<(SeaLevelReport, PathBuf)> {
    let rows: Vec<SeaLevelRow> = load_rows(path, b',')?;
    let report = predict(&rows, year_threshold, year_predict)?;

    println!("{}", report.all_years.message(year_predict));
    println!("{}", report.recent.message(year_predict));

    let plot = save_svg(out_dir, PLOT_FILE, &draw_plot(&rows, &report)?)?;
    info!(
        slope = report.all_years.regression.slope,
        recent_slope = report.recent.regression.slope,
        "Sea level fitted"
    );
    Ok((report, plot))
}
