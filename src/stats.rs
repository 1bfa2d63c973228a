//! Descriptive statistics over `f64` slices.
//!
//! All dispersion measures are population statistics (divisor `n`).

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::error::AnalysisError;

pub fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

/// Arithmetic mean. Returns `NaN` for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    sum(values) / values.len() as f64
}

/// Population variance. Returns `NaN` for empty input.
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation. Returns `NaN` for empty input.
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

/// Quantile with linear interpolation between the closest ranks.
///
/// `q` is clamped to `[0, 1]`. Returns `NaN` for empty input.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let pos = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Pearson correlation coefficient.
///
/// Returns `NaN` when the lengths differ, the input is empty, or either side
/// is constant.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.is_empty() {
        return f64::NAN;
    }
    let mx = mean(x);
    let my = mean(y);

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mx;
        let dy = b - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }
    (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
}

/// Result of an ordinary least-squares fit of `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Regression {
    pub slope: f64,
    pub intercept: f64,
    pub r_value: f64,
    /// Two-sided p-value for the null hypothesis `slope == 0`.
    pub p_value: f64,
    /// Standard error of the slope.
    pub stderr: f64,
    pub intercept_stderr: f64,
}

impl Regression {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Ordinary least-squares linear regression of `y` on `x`.
pub fn linregress(x: &[f64], y: &[f64]) -> Result<Regression, AnalysisError> {
    if x.len() != y.len() {
        return Err(AnalysisError::Degenerate(format!(
            "x has {} values but y has {}",
            x.len(),
            y.len()
        )));
    }
    let n = x.len();
    if n < 2 {
        return Err(AnalysisError::Degenerate(format!(
            "regression needs at least two points, got {n}"
        )));
    }

    let xm = mean(x);
    let ym = mean(y);
    let nf = n as f64;

    let mut ssxm = 0.0;
    let mut ssym = 0.0;
    let mut ssxym = 0.0;
    for (a, b) in x.iter().zip(y) {
        ssxm += (a - xm).powi(2);
        ssym += (b - ym).powi(2);
        ssxym += (a - xm) * (b - ym);
    }
    ssxm /= nf;
    ssym /= nf;
    ssxym /= nf;

    if ssxm == 0.0 {
        return Err(AnalysisError::Degenerate(
            "all x values are identical".to_string(),
        ));
    }

    let r_value = if ssym == 0.0 {
        0.0
    } else {
        (ssxym / (ssxm * ssym).sqrt()).clamp(-1.0, 1.0)
    };
    let slope = ssxym / ssxm;
    let intercept = ym - slope * xm;

    if n == 2 {
        let p_value = if y[0] == y[1] { 1.0 } else { 0.0 };
        return Ok(Regression {
            slope,
            intercept,
            r_value,
            p_value,
            stderr: 0.0,
            intercept_stderr: 0.0,
        });
    }

    const TINY: f64 = 1.0e-20;
    let df = nf - 2.0;
    let t = r_value * (df / ((1.0 - r_value + TINY) * (1.0 + r_value + TINY))).sqrt();
    let dist = StudentsT::new(0.0, 1.0, df).map_err(|e| AnalysisError::Degenerate(e.to_string()))?;
    let p_value = 2.0 * dist.sf(t.abs());

    let stderr = ((1.0 - r_value * r_value) * ssym / ssxm / df).sqrt();
    let intercept_stderr = stderr * (ssxm + xm * xm).sqrt();

    Ok(Regression {
        slope,
        intercept,
        r_value,
        p_value,
        stderr,
        intercept_stderr,
    })
}

/// Rounds to one decimal place, half away from zero.
pub fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Percentage of `part` in `total`, 0.0 when `total` is zero.
pub fn pct(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_pct_with_zero_total() {
        assert_eq!(pct(10, 0), 0.0);
    }

    #[test]
    fn test_pct_normal_values() {
        assert_eq!(pct(50, 100), 50.0);
        assert_eq!(pct(1, 4), 25.0);
    }

    #[test]
    fn test_mean_and_population_variance() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&v), 5.0);
        assert_eq!(variance(&v), 4.0);
        assert_eq!(std_dev(&v), 2.0);
    }

    #[test]
    fn test_empty_input() {
        assert!(mean(&[]).is_nan());
        assert!(variance(&[]).is_nan());
        assert_eq!(sum(&[]), 0.0);
        assert_eq!(min(&[]), None);
        assert_eq!(max(&[]), None);
        assert!(quantile(&[], 0.5).is_nan());
    }

    #[test]
    fn test_min_max() {
        let v = [3.0, -1.0, 8.5];
        assert_eq!(min(&v), Some(-1.0));
        assert_eq!(max(&v), Some(8.5));
    }

    #[test]
    fn test_quantile_interpolates() {
        let v = [4.0, 1.0, 3.0, 2.0];
        assert_eq!(quantile(&v, 0.0), 1.0);
        assert_eq!(quantile(&v, 1.0), 4.0);
        assert_eq!(quantile(&v, 0.5), 2.5);
        // pos = 3 * 0.025 = 0.075
        assert!(close(quantile(&v, 0.025), 1.075));
    }

    #[test]
    fn test_pearson() {
        let x = [1.0, 2.0, 3.0, 4.0];
        assert!(close(pearson(&x, &[2.0, 4.0, 6.0, 8.0]), 1.0));
        assert!(close(pearson(&x, &[8.0, 6.0, 4.0, 2.0]), -1.0));
        assert!(pearson(&x, &[1.0, 1.0, 1.0, 1.0]).is_nan());
    }

    #[test]
    fn test_linregress_exact_line() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        let y = [1.0, 3.0, 5.0, 7.0, 9.0];
        let fit = linregress(&x, &y).unwrap();

        assert!(close(fit.slope, 2.0));
        assert!(close(fit.intercept, 1.0));
        assert!(close(fit.r_value, 1.0));
        assert!(fit.p_value < 1e-6);
        assert!(close(fit.predict(10.0), 21.0));
    }

    #[test]
    fn test_linregress_noisy() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 4.0, 5.0, 4.0, 5.0];
        let fit = linregress(&x, &y).unwrap();

        assert!(close(fit.slope, 0.6));
        assert!(close(fit.intercept, 2.2));
        assert!((fit.r_value - 0.774_596_669).abs() < 1e-6);
        assert!(fit.p_value > 0.1 && fit.p_value < 0.15);
        assert!(fit.stderr > 0.0);
    }

    #[test]
    fn test_linregress_two_points() {
        let fit = linregress(&[0.0, 2.0], &[1.0, 5.0]).unwrap();
        assert!(close(fit.slope, 2.0));
        assert_eq!(fit.p_value, 0.0);
        assert_eq!(fit.stderr, 0.0);
    }

    #[test]
    fn test_linregress_degenerate() {
        assert!(linregress(&[1.0], &[1.0]).is_err());
        assert!(linregress(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_err());
        assert!(linregress(&[1.0, 2.0], &[1.0]).is_err());
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(39.433_54), 39.4);
        assert_eq!(round1(0.25), 0.3);
        assert_eq!(round1(-2.26), -2.3);
    }
}
