//! Statistics of nine numbers arranged as a 3×3 matrix.

use serde::Serialize;

use crate::error::AnalysisError;
use crate::stats;

const SIDE: usize = 3;

/// `[per-column ×3, per-row ×3, flattened]`, serialized as a JSON array.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisSummary(pub [f64; SIDE], pub [f64; SIDE], pub f64);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixStats {
    pub mean: AxisSummary,
    pub variance: AxisSummary,
    #[serde(rename = "standard deviation")]
    pub standard_deviation: AxisSummary,
    pub max: AxisSummary,
    pub min: AxisSummary,
    pub sum: AxisSummary,
}

/// Lays `values` out row-major as a 3×3 matrix and reduces it along the
/// columns, the rows and the whole matrix.
///
/// # Errors
///
/// [`AnalysisError::InvalidLength`] unless exactly nine numbers are given.
pub fn calculate(values: &[f64]) -> Result<MatrixStats, AnalysisError> {
    if values.len() != SIDE * SIDE {
        return Err(AnalysisError::InvalidLength {
            expected: SIDE * SIDE,
            found: values.len(),
        });
    }

    // non-empty by the length check above
    let min = |v: &[f64]| stats::min(v).unwrap_or(f64::NAN);
    let max = |v: &[f64]| stats::max(v).unwrap_or(f64::NAN);

    Ok(MatrixStats {
        mean: reduce(values, stats::mean),
        variance: reduce(values, stats::variance),
        standard_deviation: reduce(values, stats::std_dev),
        max: reduce(values, max),
        min: reduce(values, min),
        sum: reduce(values, stats::sum),
    })
}

/// Applies `f` to each column, each row and the whole of a row-major 3×3 matrix.
fn reduce<F: Fn(&[f64]) -> f64>(values: &[f64], f: F) -> AxisSummary {
    let column = |c: usize| -> Vec<f64> { values.iter().skip(c).step_by(SIDE).copied().collect() };
    AxisSummary(
        std::array::from_fn(|c| f(&column(c))),
        std::array::from_fn(|r| f(&values[r * SIDE..(r + 1) * SIDE])),
        f(values),
    )
}
