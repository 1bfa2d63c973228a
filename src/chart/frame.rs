//! Plot areas, axes decoration, titles and legends.

use super::axis::Axis;
use super::canvas::{Anchor, Canvas, LineStyle, Style, TextStyle};
use super::color::Color;

const TICK_LEN: f64 = 5.0;
const TICK_FONT: f64 = 10.0;
const LABEL_FONT: f64 = 12.0;
const TITLE_FONT: f64 = 14.0;

/// Rectangle in canvas pixels that data is drawn into.
#[derive(Debug, Clone, Copy)]
pub struct PlotArea {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PlotArea {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn x_px(&self, axis: &Axis, v: f64) -> f64 {
        self.left + axis.fraction(v) * self.width
    }

    pub fn y_px(&self, axis: &Axis, v: f64) -> f64 {
        self.bottom() - axis.fraction(v) * self.height
    }

    /// Center and width of the `i`-th of `n` equal category bands.
    pub fn band(&self, i: usize, n: usize) -> (f64, f64) {
        let w = self.width / n.max(1) as f64;
        (self.left + w * (i as f64 + 0.5), w)
    }
}

/// Frame, numeric x ticks and numeric y ticks.
pub fn draw_axes(canvas: &mut Canvas, area: &PlotArea, x: &Axis, y: &Axis) {
    draw_frame(canvas, area);
    let tick = LineStyle::solid(Color::BLACK, 1.0);
    let below = TextStyle::sized(TICK_FONT, Anchor::Middle);
    for (v, label) in &x.ticks {
        let px = area.x_px(x, *v);
        canvas.line(px, area.bottom(), px, area.bottom() + TICK_LEN, &tick);
        canvas.text(px, area.bottom() + TICK_LEN + TICK_FONT + 2.0, label, &below);
    }
    draw_y_ticks(canvas, area, y);
}

/// Frame, categorical x labels under each band and numeric y ticks.
pub fn draw_category_axes(canvas: &mut Canvas, area: &PlotArea, labels: &[String], y: &Axis) {
    draw_frame(canvas, area);
    let tick = LineStyle::solid(Color::BLACK, 1.0);
    let below = TextStyle::sized(TICK_FONT, Anchor::Middle);
    for (i, label) in labels.iter().enumerate() {
        let (cx, _) = area.band(i, labels.len());
        canvas.line(cx, area.bottom(), cx, area.bottom() + TICK_LEN, &tick);
        canvas.text(cx, area.bottom() + TICK_LEN + TICK_FONT + 2.0, label, &below);
    }
    draw_y_ticks(canvas, area, y);
}

fn draw_frame(canvas: &mut Canvas, area: &PlotArea) {
    canvas.rect(
        area.left,
        area.top,
        area.width,
        area.height,
        &Style::stroked(Color::BLACK, 1.0),
    );
}

fn draw_y_ticks(canvas: &mut Canvas, area: &PlotArea, y: &Axis) {
    let tick = LineStyle::solid(Color::BLACK, 1.0);
    let grid = LineStyle::solid(Color::LIGHT_GREY, 0.5);
    let left = TextStyle::sized(TICK_FONT, Anchor::End);
    for (v, label) in &y.ticks {
        let py = area.y_px(y, *v);
        canvas.line(area.left, py, area.right(), py, &grid);
        canvas.line(area.left - TICK_LEN, py, area.left, py, &tick);
        canvas.text(area.left - TICK_LEN - 2.0, py + TICK_FONT / 3.0, label, &left);
    }
}

/// Axis labels: `x_label` centered under the area, `y_label` rotated on the left.
pub fn draw_labels(canvas: &mut Canvas, area: &PlotArea, x_label: &str, y_label: &str) {
    let style = TextStyle::sized(LABEL_FONT, Anchor::Middle);
    canvas.text(
        area.left + area.width / 2.0,
        area.bottom() + TICK_LEN + TICK_FONT + LABEL_FONT + 10.0,
        x_label,
        &style,
    );
    let yx = area.left - 55.0;
    let yy = area.top + area.height / 2.0;
    canvas.text_rotated(yx, yy, y_label, &style, -90.0);
}

pub fn draw_title(canvas: &mut Canvas, area: &PlotArea, title: &str) {
    let style = TextStyle {
        bold: true,
        ..TextStyle::sized(TITLE_FONT, Anchor::Middle)
    };
    canvas.text(area.left + area.width / 2.0, area.top - 12.0, title, &style);
}

/// What a legend entry shows next to its label.
#[derive(Debug, Clone)]
pub enum LegendMark {
    Swatch(Color),
    Line(LineStyle),
    Dot(Color),
}

/// Stacks `entries` downwards from `(x, y)`, with an optional heading.
pub fn draw_legend(
    canvas: &mut Canvas,
    x: f64,
    y: f64,
    heading: Option<&str>,
    entries: &[(LegendMark, String)],
) {
    let row_h = 16.0;
    let label = TextStyle::sized(TICK_FONT, Anchor::Start);
    let mut cy = y;

    if let Some(heading) = heading {
        let style = TextStyle {
            bold: true,
            ..label.clone()
        };
        canvas.text(x, cy + 4.0, heading, &style);
        cy += row_h;
    }

    for (mark, text) in entries {
        match mark {
            LegendMark::Swatch(c) => canvas.rect(x, cy - 5.0, 12.0, 10.0, &Style::filled(*c)),
            LegendMark::Line(style) => canvas.line(x, cy, x + 20.0, cy, style),
            LegendMark::Dot(c) => canvas.circle(x + 6.0, cy, 2.5, &Style::filled(*c)),
        }
        canvas.text(x + 26.0, cy + 4.0, text, &label);
        cy += row_h;
    }
}
