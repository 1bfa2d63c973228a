/// A numeric axis: visible range plus labelled tick positions.
#[derive(Debug, Clone)]
pub struct Axis {
    pub min: f64,
    pub max: f64,
    pub ticks: Vec<(f64, String)>,
}

impl Axis {
    /// Auto-scale a linear axis with "nice number" ticks covering the data.
    pub fn linear(data_min: f64, data_max: f64, target_ticks: usize) -> Self {
        let (min, max, step) = nice_range(data_min, data_max, target_ticks);
        let mut ticks = Vec::new();
        let mut v = min;
        while v <= max + step * 0.01 {
            ticks.push((v, format_tick(v, step)));
            v += step;
        }
        Self { min, max, ticks }
    }

    /// Axis with caller-supplied ticks, e.g. calendar dates.
    pub fn with_ticks(min: f64, max: f64, ticks: Vec<(f64, String)>) -> Self {
        Self { min, max, ticks }
    }

    /// Position of `v` within the axis range, 0 at `min` and 1 at `max`.
    pub fn fraction(&self, v: f64) -> f64 {
        let span = self.max - self.min;
        if span == 0.0 { 0.5 } else { (v - self.min) / span }
    }
}

/// Returns `(nice_min, nice_max, step)` enclosing `[lo, hi]`.
pub fn nice_range(lo: f64, hi: f64, target_ticks: usize) -> (f64, f64, f64) {
    let (lo, hi) = if hi > lo {
        (lo, hi)
    } else if lo == 0.0 {
        (-1.0, 1.0)
    } else {
        (lo - lo.abs() * 0.1, hi + hi.abs() * 0.1)
    };
    let range = nice_num(hi - lo, false);
    let step = nice_num(range / (target_ticks.max(2) - 1) as f64, true);
    ((lo / step).floor() * step, (hi / step).ceil() * step, step)
}

fn nice_num(x: f64, round: bool) -> f64 {
    let exp = x.log10().floor();
    let f = x / 10f64.powf(exp);
    let nf = if round {
        match f {
            f if f < 1.5 => 1.0,
            f if f < 3.0 => 2.0,
            f if f < 7.0 => 5.0,
            _ => 10.0,
        }
    } else {
        match f {
            f if f <= 1.0 => 1.0,
            f if f <= 2.0 => 2.0,
            f if f <= 5.0 => 5.0,
            _ => 10.0,
        }
    };
    nf * 10f64.powf(exp)
}

fn format_tick(v: f64, step: f64) -> String {
    let decimals = (-step.log10().floor()).max(0.0) as usize;
    // avoid "-0"
    let v = if v.abs() < step * 1e-9 { 0.0 } else { v };
    format!("{v:.decimals$}")
}
