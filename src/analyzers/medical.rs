//! Medical examination data: risk-factor counts split by cardiovascular
//! disease, and a correlation heat map over the cleaned examinations.

use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::analyzers::types::MedicalRow;
use crate::chart::frame::{self, draw_legend};
use crate::chart::{Anchor, Axis, Canvas, Color, LegendMark, PlotArea, Style, TextStyle, color};
use crate::error::AnalysisError;
use crate::output::save_svg;
use crate::stats::{pearson, quantile};
use crate::table::load_rows;

pub const CAT_PLOT_FILE: &str = "catplot.svg";
pub const HEAT_MAP_FILE: &str = "heatmap.svg";

const BMI_LIMIT: f64 = 25.0;
const LOWER_Q: f64 = 0.025;
const UPPER_Q: f64 = 0.975;

type Field = fn(&MedicalRow) -> i64;

/// Risk factors counted per cardio group, alphabetical.
const CAT_VARIABLES: [(&str, Field); 6] = [
    ("active", |r| r.active),
    ("alco", |r| r.alco),
    ("cholesterol", |r| r.cholesterol),
    ("gluc", |r| r.gluc),
    ("overweight", |r| r.overweight),
    ("smoke", |r| r.smoke),
];

/// Columns entering the correlation matrix, in file order.
const CORR_COLUMNS: [(&str, fn(&MedicalRow) -> f64); 14] = [
    ("id", |r| r.id as f64),
    ("age", |r| r.age as f64),
    ("sex", |r| r.sex as f64),
    ("height", |r| r.height),
    ("weight", |r| r.weight),
    ("ap_hi", |r| r.ap_hi as f64),
    ("ap_lo", |r| r.ap_lo as f64),
    ("cholesterol", |r| r.cholesterol as f64),
    ("gluc", |r| r.gluc as f64),
    ("smoke", |r| r.smoke as f64),
    ("alco", |r| r.alco as f64),
    ("active", |r| r.active as f64),
    ("cardio", |r| r.cardio as f64),
    ("overweight", |r| r.overweight as f64),
];

/// Columns that [`good_bad`] can normalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Graded {
    Cholesterol,
    Gluc,
}

impl Graded {
    fn field_mut(self, row: &mut MedicalRow) -> &mut i64 {
        match self {
            Graded::Cholesterol => &mut row.cholesterol,
            Graded::Gluc => &mut row.gluc,
        }
    }
}

/// Sets `overweight` to 1 when the body mass index exceeds 25.
pub fn add_overweight(rows: &mut [MedicalRow]) {
    for r in rows {
        let meters = r.height / 100.0;
        r.overweight = i64::from(r.weight / (meters * meters) > BMI_LIMIT);
    }
}

/// Rewrites each selected column to 1 (bad) when above its threshold and 0
/// (good) otherwise.
///
/// A single threshold applies to every column; otherwise thresholds pair
/// with columns by position.
pub fn good_bad(rows: &mut [MedicalRow], columns: &[Graded], thresholds: &[i64]) -> Result<(), AnalysisError> {
    let per_column: Vec<i64> = match thresholds {
        [t] => vec![*t; columns.len()],
        ts if ts.len() == columns.len() => ts.to_vec(),
        ts => {
            return Err(AnalysisError::ThresholdMismatch {
                columns: columns.len(),
                thresholds: ts.len(),
            });
        }
    };

    for r in rows {
        for (col, t) in columns.iter().zip(&per_column) {
            let v = col.field_mut(r);
            *v = i64::from(*v > *t);
        }
    }
    Ok(())
}

/// Adds `overweight` and normalizes cholesterol and glucose to 0/1.
pub fn prepare(rows: &mut [MedicalRow]) -> Result<(), AnalysisError> {
    add_overweight(rows);
    good_bad(rows, &[Graded::Cholesterol, Graded::Gluc], &[1])
}

/// One bar of the categorical plot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub cardio: i64,
    pub variable: &'static str,
    pub value: i64,
    pub total: usize,
}

/// Long-form counts of each risk factor value, grouped by
/// `(cardio, variable, value)` and sorted by those keys.
pub fn categorical_counts(rows: &[MedicalRow]) -> Vec<CategoryCount> {
    let mut groups: BTreeMap<(i64, &'static str, i64), usize> = BTreeMap::new();
    for r in rows {
        for (name, field) in CAT_VARIABLES {
            *groups.entry((r.cardio, name, field(r))).or_default() += 1;
        }
    }
    groups
        .into_iter()
        .map(|((cardio, variable, value), total)| CategoryCount {
            cardio,
            variable,
            value,
            total,
        })
        .collect()
}

/// Drops examinations with diastolic above systolic pressure and those
/// outside the 2.5–97.5 percentile band of height or weight.
pub fn clean_for_heat_map(rows: &[MedicalRow]) -> Vec<MedicalRow> {
    let heights: Vec<f64> = rows.iter().map(|r| r.height).collect();
    let weights: Vec<f64> = rows.iter().map(|r| r.weight).collect();
    let (h_lo, h_hi) = (quantile(&heights, LOWER_Q), quantile(&heights, UPPER_Q));
    let (w_lo, w_hi) = (quantile(&weights, LOWER_Q), quantile(&weights, UPPER_Q));

    let kept: Vec<MedicalRow> = rows
        .iter()
        .filter(|r| {
            r.ap_lo <= r.ap_hi
                && (h_lo..=h_hi).contains(&r.height)
                && (w_lo..=w_hi).contains(&r.weight)
        })
        .cloned()
        .collect();

    debug!(before = rows.len(), after = kept.len(), "Examinations cleaned");
    kept
}

#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<&'static str>,
    /// Row-major, `values[i][j]` correlates `columns[i]` with `columns[j]`.
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| *c == a)?;
        let j = self.columns.iter().position(|c| *c == b)?;
        Some(self.values[i][j])
    }
}

/// Pairwise Pearson correlation over every numeric column.
pub fn correlation_matrix(rows: &[MedicalRow]) -> CorrelationMatrix {
    let series: Vec<Vec<f64>> = CORR_COLUMNS
        .iter()
        .map(|(_, f)| rows.iter().map(f).collect())
        .collect();

    let n = series.len();
    let mut values = vec![vec![f64::NAN; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let r = pearson(&series[i], &series[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix {
        columns: CORR_COLUMNS.iter().map(|(name, _)| *name).collect(),
        values,
    }
}

/// Two panels of grouped bars (`cardio = 0` and `cardio = 1`), one group per
/// risk factor, one bar per value.
pub fn draw_cat_plot(counts: &[CategoryCount]) -> Result<String> {
    let panel_w = 380.0;
    let panel_h = 300.0;
    let mut canvas = Canvas::new(2.0 * panel_w + 220.0, panel_h + 120.0);

    let max_total = counts.iter().map(|c| c.total).max().unwrap_or(0) as f64;
    let y = Axis::linear(0.0, max_total.max(1.0), 6);
    let labels: Vec<String> = CAT_VARIABLES.iter().map(|(n, _)| n.to_string()).collect();
    let bar_colors = [color::category(0), color::category(1)];

    for (panel, cardio) in [0i64, 1].into_iter().enumerate() {
        let area = PlotArea::new(80.0 + panel as f64 * (panel_w + 40.0), 40.0, panel_w, panel_h);
        frame::draw_category_axes(&mut canvas, &area, &labels, &y);
        frame::draw_title(&mut canvas, &area, &format!("cardio = {cardio}"));
        frame::draw_labels(&mut canvas, &area, "variable", if panel == 0 { "total" } else { "" });

        for (i, name) in labels.iter().enumerate() {
            let (cx, band) = area.band(i, labels.len());
            let bar_w = band * 0.4;
            for (k, value) in [0i64, 1].into_iter().enumerate() {
                let total = counts
                    .iter()
                    .find(|c| c.cardio == cardio && c.variable == name.as_str() && c.value == value)
                    .map_or(0, |c| c.total) as f64;
                let top = area.y_px(&y, total);
                let x = cx - bar_w + k as f64 * bar_w;
                canvas.rect(x, top, bar_w, area.bottom() - top, &Style::filled(bar_colors[k]));
            }
        }
    }

    let entries: Vec<(LegendMark, String)> = bar_colors
        .iter()
        .enumerate()
        .map(|(v, c)| (LegendMark::Swatch(*c), v.to_string()))
        .collect();
    draw_legend(&mut canvas, 2.0 * panel_w + 140.0, 60.0, Some("value"), &entries);

    Ok(canvas.finish_svg()?)
}

/// Lower triangle of the correlation matrix, diagonal excluded, each cell
/// annotated with one decimal.
pub fn draw_heat_map(corr: &CorrelationMatrix) -> Result<String> {
    let n = corr.columns.len();
    let cell = 36.0;
    let label_margin = 90.0;
    let grid = cell * n as f64;
    let mut canvas = Canvas::new(label_margin + grid + 110.0, 40.0 + grid + label_margin);
    let (left, top) = (label_margin, 30.0);

    for i in 0..n {
        for j in 0..i {
            let v = corr.values[i][j];
            if v.is_nan() {
                continue;
            }
            let fill = color::diverging(v);
            let (x, y) = (left + j as f64 * cell, top + i as f64 * cell);
            canvas.rect(x, y, cell, cell, &Style::outlined(fill, Color::WHITE, 0.5));

            let text_color = if fill.luminance() < 0.5 { Color::WHITE } else { Color::BLACK };
            let style = TextStyle {
                color: text_color,
                ..TextStyle::sized(10.0, Anchor::Middle)
            };
            canvas.text(x + cell / 2.0, y + cell / 2.0 + 3.5, &format!("{v:.1}"), &style);
        }
    }

    let row_style = TextStyle::sized(10.0, Anchor::End);
    for (i, name) in corr.columns.iter().enumerate() {
        canvas.text(left - 4.0, top + (i as f64 + 0.5) * cell + 3.5, name, &row_style);
        let x = left + (i as f64 + 0.5) * cell;
        canvas.text_rotated(x, top + grid + 6.0, name, &row_style, -90.0);
    }

    // color bar
    let bar_x = left + grid + 30.0;
    let steps = 20;
    let step_h = grid / steps as f64;
    for s in 0..steps {
        let v = 1.0 - 2.0 * (s as f64 + 0.5) / steps as f64;
        canvas.rect(bar_x, top + s as f64 * step_h, 16.0, step_h, &Style::filled(color::diverging(v)));
    }
    let tick_style = TextStyle::sized(10.0, Anchor::Start);
    for (v, label) in [(1.0, "1.0"), (0.0, "0.0"), (-1.0, "-1.0")] {
        let y = top + (1.0 - v) / 2.0 * grid;
        canvas.text(bar_x + 22.0, y + 3.5, label, &tick_style);
    }

    Ok(canvas.finish_svg()?)
}

/// What a run over the medical dataset produced.
#[derive(Debug, Serialize)]
pub struct MedicalSummary {
    pub rows: usize,
    pub cleaned_rows: usize,
    pub counts: Vec<CategoryCount>,
    pub correlation: CorrelationMatrix,
    pub cat_plot: PathBuf,
    pub heat_map: PathBuf,
}

/// Loads the examinations, draws both charts into `out_dir`.
#[tracing::instrument(fields(path = %path.display(), out_dir = %out_dir.display()))]
pub fn run(path: &Path, out_dir: &Path) -> Result<MedicalSummary> {
    let mut rows: Vec<MedicalRow> = load_rows(path, b',')?;
    if rows.is_empty() {
        return Err(AnalysisError::EmptyTable("medical examinations").into());
    }
    prepare(&mut rows)?;

    let counts = categorical_counts(&rows);
    let cat_plot = save_svg(out_dir, CAT_PLOT_FILE, &draw_cat_plot(&counts)?)?;

    let cleaned = clean_for_heat_map(&rows);
    let correlation = correlation_matrix(&cleaned);
    let heat_map = save_svg(out_dir, HEAT_MAP_FILE, &draw_heat_map(&correlation)?)?;

    info!(rows = rows.len(), cleaned = cleaned.len(), "Medical charts drawn");
    Ok(MedicalSummary {
        rows: rows.len(),
        cleaned_rows: cleaned.len(),
        counts,
        correlation,
        cat_plot,
        heat_map,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exam(id: i64, height: f64, weight: f64, ap: (i64, i64), chol: i64, gluc: i64, cardio: i64) -> MedicalRow {
        MedicalRow {
            id,
            age: 18_000 + id * 100,
            sex: 1 + id % 2,
            height,
            weight,
            ap_hi: ap.0,
            ap_lo: ap.1,
            cholesterol: chol,
            gluc,
            smoke: id % 3 % 2,
            alco: 0,
            active: 1,
            cardio,
            overweight: 0,
        }
    }

    #[test]
    fn test_overweight_threshold() {
        // BMI 24.69 and 25.95
        let mut rows = vec![
            exam(0, 180.0, 80.0, (120, 80), 1, 1, 0),
            exam(1, 180.0, 84.1, (120, 80), 1, 1, 0),
        ];
        add_overweight(&mut rows);
        assert_eq!(rows[0].overweight, 0);
        assert_eq!(rows[1].overweight, 1);
    }

    #[test]
    fn test_good_bad_single_threshold() {
        let mut rows = vec![
            exam(0, 170.0, 70.0, (120, 80), 1, 3, 0),
            exam(1, 170.0, 70.0, (120, 80), 2, 1, 0),
        ];
        prepare(&mut rows).unwrap();
        assert_eq!((rows[0].cholesterol, rows[0].gluc), (0, 1));
        assert_eq!((rows[1].cholesterol, rows[1].gluc), (1, 0));
    }

    #[test]
    fn test_good_bad_per_column_thresholds() {
        let mut rows = vec![exam(0, 170.0, 70.0, (120, 80), 2, 2, 0)];
        good_bad(&mut rows, &[Graded::Cholesterol, Graded::Gluc], &[2, 1]).unwrap();
        assert_eq!((rows[0].cholesterol, rows[0].gluc), (0, 1));
    }

    #[test]
    fn test_good_bad_threshold_mismatch() {
        let mut rows = vec![exam(0, 170.0, 70.0, (120, 80), 2, 2, 0)];
        let err = good_bad(&mut rows, &[Graded::Cholesterol, Graded::Gluc], &[1, 2, 3]).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::ThresholdMismatch {
                columns: 2,
                thresholds: 3
            }
        ));
    }

    #[test]
    fn test_categorical_counts_sorted_and_complete() {
        let mut rows = vec![
            exam(0, 170.0, 70.0, (120, 80), 1, 1, 0),
            exam(1, 170.0, 90.0, (120, 80), 3, 1, 1),
            exam(2, 160.0, 90.0, (120, 80), 2, 2, 1),
        ];
        prepare(&mut rows).unwrap();
        let counts = categorical_counts(&rows);

        let total: usize = counts.iter().map(|c| c.total).sum();
        assert_eq!(total, rows.len() * CAT_VARIABLES.len());
        assert_eq!(
            counts[0],
            CategoryCount {
                cardio: 0,
                variable: "active",
                value: 1,
                total: 1
            }
        );
        let overweight_sick = counts
            .iter()
            .find(|c| c.cardio == 1 && c.variable == "overweight" && c.value == 1)
            .unwrap();
        assert_eq!(overweight_sick.total, 2);
        let mut keys: Vec<_> = counts.iter().map(|c| (c.cardio, c.variable, c.value)).collect();
        let sorted = keys.clone();
        keys.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn test_clean_drops_inverted_pressure_and_outliers() {
        let mut rows: Vec<MedicalRow> = (0..40)
            .map(|i| exam(i, 150.0 + i as f64, 50.0 + i as f64, (120, 80), 1, 1, 0))
            .collect();
        rows[10].ap_lo = 130;
        let cleaned = clean_for_heat_map(&rows);

        assert!(cleaned.iter().all(|r| r.ap_lo <= r.ap_hi));
        // extremes fall outside the 2.5% / 97.5% band
        assert!(!cleaned.iter().any(|r| r.id == 0 || r.id == 39));
        assert_eq!(cleaned.len(), 37);
    }

    #[test]
    fn test_correlation_matrix_is_symmetric() {
        let mut rows: Vec<MedicalRow> = (0..10)
            .map(|i| exam(i, 150.0 + 2.0 * i as f64, 60.0 + i as f64, (120 + i, 80), 1 + i % 3, 1, i % 2))
            .collect();
        prepare(&mut rows).unwrap();
        let corr = correlation_matrix(&rows);

        assert_eq!(corr.columns.len(), 14);
        assert!((corr.get("height", "weight").unwrap() - 1.0).abs() < 1e-9);
        assert!((corr.get("id", "id").unwrap() - 1.0).abs() < 1e-9);
        assert_eq!(corr.get("ap_hi", "id"), corr.get("id", "ap_hi"));
        // constant column
        assert!(corr.get("alco", "id").unwrap().is_nan());
        assert!(corr.get("bogus", "id").is_none());
    }

    #[test]
    fn test_heat_map_masks_upper_triangle() {
        let rows: Vec<MedicalRow> = (0..10)
            .map(|i| exam(i, 150.0 + i as f64, 60.0 + (i * i) as f64, (120 + i, 80 - i), 1 + i % 3, 1 + i % 2, i % 2))
            .collect();
        let corr = correlation_matrix(&rows);
        let svg = draw_heat_map(&corr).unwrap();

        let annotated = corr
            .values
            .iter()
            .enumerate()
            .flat_map(|(i, row)| row.iter().take(i))
            .filter(|v| !v.is_nan())
            .count();
        // one cell rect per annotated value + 20 color bar steps + background
        assert_eq!(svg.matches("<rect").count(), annotated + 20 + 1);
    }

    #[test]
    fn test_cat_plot_has_both_panels() {
        let mut rows = vec![
            exam(0, 170.0, 70.0, (120, 80), 1, 1, 0),
            exam(1, 170.0, 90.0, (120, 80), 3, 1, 1),
        ];
        prepare(&mut rows).unwrap();
        let svg = draw_cat_plot(&categorical_counts(&rows)).unwrap();
        assert!(svg.contains("cardio = 0"));
        assert!(svg.contains("cardio = 1"));
        assert!(svg.contains("cholesterol"));
    }
}
