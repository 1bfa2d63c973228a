//! Daily forum page views: percentile cleaning, monthly averages and three
//! charts (daily line, monthly bars, year/month box plots).

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::analyzers::types::PageViewRow;
use crate::chart::frame::{self, draw_legend};
use crate::chart::{Axis, Canvas, Color, LegendMark, LineStyle, PlotArea, Style, color};
use crate::error::AnalysisError;
use crate::output::save_svg;
use crate::stats::{mean, quantile};
use crate::table::load_rows;

pub const LINE_PLOT_FILE: &str = "line_plot.svg";
pub const BAR_PLOT_FILE: &str = "bar_plot.svg";
pub const BOX_PLOT_FILE: &str = "box_plot.svg";

const LOWER_Q: f64 = 0.025;
const UPPER_Q: f64 = 0.975;
const WHISKER_IQR: f64 = 1.5;

pub const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];
pub const MONTH_ABBR: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Keeps the days whose page views lie within the 2.5–97.5 percentile band
/// of the whole series.
pub fn clean(rows: &[PageViewRow]) -> Vec<PageViewRow> {
    let values: Vec<f64> = rows.iter().map(|r| r.value).collect();
    let band = quantile(&values, LOWER_Q)..=quantile(&values, UPPER_Q);

    let kept: Vec<PageViewRow> = rows
        .iter()
        .filter(|r| band.contains(&r.value))
        .cloned()
        .collect();
    debug!(before = rows.len(), after = kept.len(), "Page views cleaned");
    kept
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyAverage {
    pub year: i32,
    /// 1 = January.
    pub month: u32,
    pub average: f64,
}

/// Mean daily page views per calendar month, chronological.
pub fn monthly_averages(rows: &[PageViewRow]) -> Vec<MonthlyAverage> {
    let mut groups: BTreeMap<(i32, u32), Vec<f64>> = BTreeMap::new();
    for r in rows {
        groups
            .entry((r.date.year(), r.date.month()))
            .or_default()
            .push(r.value);
    }
    groups
        .into_iter()
        .map(|((year, month), values)| MonthlyAverage {
            year,
            month,
            average: mean(&values),
        })
        .collect()
}

/// Five-number box plot summary with 1.5 IQR whiskers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxSummary {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Most extreme values still within 1.5 IQR of the box.
    pub whisker_lo: f64,
    pub whisker_hi: f64,
    pub outliers: Vec<f64>,
}

/// Box plot summary of `values`, `None` when empty.
pub fn box_summary(values: &[f64]) -> Option<BoxSummary> {
    if values.is_empty() {
        return None;
    }
    let q1 = quantile(values, 0.25);
    let q3 = quantile(values, 0.75);
    let iqr = q3 - q1;
    let (lo_fence, hi_fence) = (q1 - WHISKER_IQR * iqr, q3 + WHISKER_IQR * iqr);

    let inside = values.iter().copied().filter(|v| (lo_fence..=hi_fence).contains(v));
    let whisker_lo = inside.clone().fold(f64::INFINITY, f64::min);
    let whisker_hi = inside.fold(f64::NEG_INFINITY, f64::max);
    let outliers = values
        .iter()
        .copied()
        .filter(|v| !(lo_fence..=hi_fence).contains(v))
        .collect();

    Some(BoxSummary {
        q1,
        median: quantile(values, 0.5),
        q3,
        whisker_lo,
        whisker_hi,
        outliers,
    })
}

/// Page views per year, chronological.
pub fn by_year(rows: &[PageViewRow]) -> Vec<(i32, Vec<f64>)> {
    let mut groups: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    for r in rows {
        groups.entry(r.date.year()).or_default().push(r.value);
    }
    groups.into_iter().collect()
}

/// Page views per calendar month across all years, January first.
pub fn by_month(rows: &[PageViewRow]) -> [Vec<f64>; 12] {
    let mut groups: [Vec<f64>; 12] = Default::default();
    for r in rows {
        groups[r.date.month0() as usize].push(r.value);
    }
    groups
}

fn day_number(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

/// Ticks on January 1st and July 1st inside `[first, last]`.
fn half_year_ticks(first: NaiveDate, last: NaiveDate) -> Vec<(f64, String)> {
    (first.year()..=last.year())
        .flat_map(|y| [1, 7].map(|m| NaiveDate::from_ymd_opt(y, m, 1)))
        .flatten()
        .filter(|d| (first..=last).contains(d))
        .map(|d| (day_number(d), d.format("%Y-%m").to_string()))
        .collect()
}

/// Daily page views as one red line.
pub fn draw_line_plot(rows: &[PageViewRow]) -> Result<String> {
    let (Some(first), Some(last)) = (
        rows.iter().map(|r| r.date).min(),
        rows.iter().map(|r| r.date).max(),
    ) else {
        return Err(AnalysisError::EmptyTable("page views").into());
    };

    let mut canvas = Canvas::new(1000.0, 500.0);
    let area = PlotArea::new(90.0, 40.0, 880.0, 380.0);
    let x = Axis::with_ticks(day_number(first), day_number(last), half_year_ticks(first, last));
    let max_value = rows.iter().map(|r| r.value).fold(0.0, f64::max);
    let y = Axis::linear(0.0, max_value, 7);

    frame::draw_axes(&mut canvas, &area, &x, &y);
    frame::draw_title(&mut canvas, &area, "Daily freeCodeCamp Forum Page Views 5/2016-12/2019");
    frame::draw_labels(&mut canvas, &area, "Date", "Page Views");

    let mut sorted: Vec<&PageViewRow> = rows.iter().collect();
    sorted.sort_by_key(|r| r.date);
    let points: Vec<(f64, f64)> = sorted
        .iter()
        .map(|r| (area.x_px(&x, day_number(r.date)), area.y_px(&y, r.value)))
        .collect();
    canvas.polyline(&points, &LineStyle::solid(Color::RED, 1.0));

    Ok(canvas.finish_svg()?)
}

/// Average daily page views per month, grouped by year.
pub fn draw_bar_plot(monthly: &[MonthlyAverage]) -> Result<String> {
    let years: Vec<i32> = monthly
        .iter()
        .map(|m| m.year)
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .collect();
    if years.is_empty() {
        return Err(AnalysisError::EmptyTable("monthly averages").into());
    }

    let mut canvas = Canvas::new(900.0, 560.0);
    let area = PlotArea::new(90.0, 40.0, 640.0, 440.0);
    let max_avg = monthly.iter().map(|m| m.average).fold(0.0, f64::max);
    let y = Axis::linear(0.0, max_avg, 7);
    let labels: Vec<String> = years.iter().map(i32::to_string).collect();

    frame::draw_category_axes(&mut canvas, &area, &labels, &y);
    frame::draw_labels(&mut canvas, &area, "Years", "Average Page Views");

    for (i, year) in years.iter().enumerate() {
        let (cx, band) = area.band(i, years.len());
        let slot = band * 0.8 / 12.0;
        let start = cx - band * 0.4;
        for m in monthly.iter().filter(|m| m.year == *year) {
            let x = start + (m.month - 1) as f64 * slot;
            let top = area.y_px(&y, m.average);
            canvas.rect(
                x,
                top,
                slot,
                area.bottom() - top,
                &Style::filled(color::rainbow(m.month as usize - 1)),
            );
        }
    }

    let entries: Vec<(LegendMark, String)> = MONTH_NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| (LegendMark::Swatch(color::rainbow(i)), name.to_string()))
        .collect();
    draw_legend(&mut canvas, area.right() + 20.0, area.top + 10.0, Some("Months"), &entries);

    Ok(canvas.finish_svg()?)
}

/// Year-wise and month-wise box plots side by side.
pub fn draw_box_plot(rows: &[PageViewRow]) -> Result<String> {
    let mut canvas = Canvas::new(1200.0, 600.0);
    let max_value = rows.iter().map(|r| r.value).fold(0.0, f64::max);
    let y = Axis::linear(0.0, max_value, 7);

    let years = by_year(rows);
    let year_groups: Vec<(String, &[f64], Color)> = years
        .iter()
        .enumerate()
        .map(|(i, (year, v))| (year.to_string(), v.as_slice(), color::category(i)))
        .collect();
    let left = PlotArea::new(90.0, 40.0, 480.0, 480.0);
    draw_boxes(&mut canvas, &left, &y, &year_groups);
    frame::draw_title(&mut canvas, &left, "Year-wise Box Plot (Trend)");
    frame::draw_labels(&mut canvas, &left, "Year", "Page Views");

    let months = by_month(rows);
    let month_groups: Vec<(String, &[f64], Color)> = months
        .iter()
        .enumerate()
        .map(|(i, v)| (MONTH_ABBR[i].to_string(), v.as_slice(), color::rainbow(i)))
        .collect();
    let right = PlotArea::new(690.0, 40.0, 480.0, 480.0);
    draw_boxes(&mut canvas, &right, &y, &month_groups);
    frame::draw_title(&mut canvas, &right, "Month-wise Box Plot (Seasonality)");
    frame::draw_labels(&mut canvas, &right, "Month", "Page Views");

    Ok(canvas.finish_svg()?)
}

fn draw_boxes(canvas: &mut Canvas, area: &PlotArea, y: &Axis, groups: &[(String, &[f64], Color)]) {
    let labels: Vec<String> = groups.iter().map(|(l, _, _)| l.clone()).collect();
    frame::draw_category_axes(canvas, area, &labels, y);

    let edge = LineStyle::solid(Color::GREY, 1.0);
    let flier = Style::stroked(Color::GREY, 0.8);
    for (i, (_, values, fill)) in groups.iter().enumerate() {
        let Some(b) = box_summary(values) else {
            continue;
        };
        let (cx, band) = area.band(i, groups.len());
        let half = band * 0.35;
        let (top, bottom) = (area.y_px(y, b.q3), area.y_px(y, b.q1));

        canvas.rect(cx - half, top, 2.0 * half, bottom - top, &Style::outlined(*fill, Color::GREY, 1.0));
        let median = area.y_px(y, b.median);
        canvas.line(cx - half, median, cx + half, median, &edge);

        let (hi, lo) = (area.y_px(y, b.whisker_hi), area.y_px(y, b.whisker_lo));
        canvas.line(cx, top, cx, hi, &edge);
        canvas.line(cx, bottom, cx, lo, &edge);
        canvas.line(cx - half / 2.0, hi, cx + half / 2.0, hi, &edge);
        canvas.line(cx - half / 2.0, lo, cx + half / 2.0, lo, &edge);

        for v in &b.outliers {
            canvas.circle(cx, area.y_px(y, *v), 2.0, &flier);
        }
    }
}

/// What a run over the page-view series produced.
#[derive(Debug, Serialize)]
pub struct PageViewSummary {
    pub rows: usize,
    pub kept: usize,
    pub monthly: Vec<MonthlyAverage>,
    pub line_plot: PathBuf,
    pub bar_plot: PathBuf,
    pub box_plot: PathBuf,
}

/// Loads and cleans the series, then draws all three charts into `out_dir`.
#[tracing::instrument(fields(path = %path.display(), out_dir = %out_dir.display()))]
pub fn run(path: &Path, out_dir: &Path) -> Result<PageViewSummary> {
    let rows: Vec<PageViewRow> = load_rows(path, b',')?;
    let cleaned = clean(&rows);
    let monthly = monthly_averages(&cleaned);

    let line_plot = save_svg(out_dir, LINE_PLOT_FILE, &draw_line_plot(&cleaned)?)?;
    let bar_plot = save_svg(out_dir, BAR_PLOT_FILE, &draw_bar_plot(&monthly)?)?;
    let box_plot = save_svg(out_dir, BOX_PLOT_FILE, &draw_box_plot(&cleaned)?)?;

    info!(rows = rows.len(), kept = cleaned.len(), months = monthly.len(), "Page view charts drawn");
    Ok(PageViewSummary {
        rows: rows.len(),
        kept: cleaned.len(),
        monthly,
        line_plot,
        bar_plot,
        box_plot,
    })
}
