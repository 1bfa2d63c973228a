use std::fmt::{self, Write};

use super::color::Color;

#[derive(Debug, Clone)]
pub struct Style {
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_width: f64,
}

impl Style {
    pub fn filled(color: Color) -> Self {
        Self {
            fill: Some(color),
            stroke: None,
            stroke_width: 0.0,
        }
    }

    pub fn outlined(fill: Color, stroke: Color, width: f64) -> Self {
        Self {
            fill: Some(fill),
            stroke: Some(stroke),
            stroke_width: width,
        }
    }

    pub fn stroked(stroke: Color, width: f64) -> Self {
        Self {
            fill: None,
            stroke: Some(stroke),
            stroke_width: width,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LineStyle {
    pub color: Color,
    pub width: f64,
    pub dash: Option<&'static str>,
}

impl LineStyle {
    pub fn solid(color: Color, width: f64) -> Self {
        Self {
            color,
            width,
            dash: None,
        }
    }

    pub fn dashed(color: Color, width: f64) -> Self {
        Self {
            color,
            width,
            dash: Some("6,4"),
        }
    }

    pub fn dash_dot(color: Color, width: f64) -> Self {
        Self {
            color,
            width,
            dash: Some("8,3,2,3"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

impl Anchor {
    fn as_str(self) -> &'static str {
        match self {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
            Anchor::End => "end",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextStyle {
    pub size: f64,
    pub color: Color,
    pub anchor: Anchor,
    pub bold: bool,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            size: 11.0,
            color: Color::BLACK,
            anchor: Anchor::Start,
            bold: false,
        }
    }
}

impl TextStyle {
    pub fn sized(size: f64, anchor: Anchor) -> Self {
        Self {
            size,
            anchor,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
enum Element {
    Rect {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        style: Style,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        style: LineStyle,
    },
    Polyline {
        points: Vec<(f64, f64)>,
        style: LineStyle,
    },
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
        style: Style,
    },
    Text {
        x: f64,
        y: f64,
        content: String,
        style: TextStyle,
        rotate: Option<f64>,
    },
}

/// Immediate-mode SVG canvas. Coordinates are pixels from the top-left.
pub struct Canvas {
    pub width: f64,
    pub height: f64,
    elements: Vec<Element>,
}

impl Canvas {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            elements: Vec::new(),
        }
    }

    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, style: &Style) {
        self.elements.push(Element::Rect {
            x,
            y,
            w,
            h,
            style: style.clone(),
        });
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, style: &LineStyle) {
        self.elements.push(Element::Line {
            x1,
            y1,
            x2,
            y2,
            style: style.clone(),
        });
    }

    pub fn polyline(&mut self, points: &[(f64, f64)], style: &LineStyle) {
        if points.len() < 2 {
            return;
        }
        self.elements.push(Element::Polyline {
            points: points.to_vec(),
            style: style.clone(),
        });
    }

    pub fn circle(&mut self, cx: f64, cy: f64, r: f64, style: &Style) {
        self.elements.push(Element::Circle {
            cx,
            cy,
            r,
            style: style.clone(),
        });
    }

    pub fn text(&mut self, x: f64, y: f64, content: &str, style: &TextStyle) {
        self.elements.push(Element::Text {
            x,
            y,
            content: content.to_string(),
            style: style.clone(),
            rotate: None,
        });
    }

    pub fn text_rotated(&mut self, x: f64, y: f64, content: &str, style: &TextStyle, angle: f64) {
        self.elements.push(Element::Text {
            x,
            y,
            content: content.to_string(),
            style: style.clone(),
            rotate: Some(angle),
        });
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn finish_svg(&self) -> Result<String, fmt::Error> {
        let mut out = String::with_capacity(64 * self.elements.len() + 256);
        writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height,
        )?;
        writeln!(
            out,
            r#"<rect width="{}" height="{}" fill="white" />"#,
            self.width, self.height
        )?;

        for elem in &self.elements {
            render_element(&mut out, elem)?;
        }

        out.push_str("</svg>\n");
        Ok(out)
    }
}

fn render_element(out: &mut String, elem: &Element) -> fmt::Result {
    match elem {
        Element::Rect { x, y, w, h, style } => {
            write!(out, r#"<rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}""#)?;
            write_style(out, style)?;
            out.push_str(" />\n");
        }
        Element::Line {
            x1,
            y1,
            x2,
            y2,
            style,
        } => {
            write!(out, r#"<line x1="{x1:.2}" y1="{y1:.2}" x2="{x2:.2}" y2="{y2:.2}""#)?;
            write_line_style(out, style)?;
            out.push_str(" />\n");
        }
        Element::Polyline { points, style } => {
            out.push_str(r#"<polyline points=""#);
            for (i, (x, y)) in points.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                write!(out, "{x:.2},{y:.2}")?;
            }
            out.push_str(r#"" fill="none""#);
            write_line_style(out, style)?;
            out.push_str(" />\n");
        }
        Element::Circle { cx, cy, r, style } => {
            write!(out, r#"<circle cx="{cx:.2}" cy="{cy:.2}" r="{r:.2}""#)?;
            write_style(out, style)?;
            out.push_str(" />\n");
        }
        Element::Text {
            x,
            y,
            content,
            style,
            rotate,
        } => {
            write!(
                out,
                r#"<text x="{x:.2}" y="{y:.2}" font-family="sans-serif" font-size="{:.1}" fill="{}" text-anchor="{}""#,
                style.size,
                style.color,
                style.anchor.as_str()
            )?;
            if style.bold {
                out.push_str(r#" font-weight="bold""#);
            }
            if let Some(angle) = rotate {
                write!(out, r#" transform="rotate({angle:.1},{x:.2},{y:.2})""#)?;
            }
            out.push('>');
            escape_into(out, content);
            out.push_str("</text>\n");
        }
    }
    Ok(())
}

fn write_style(out: &mut String, style: &Style) -> fmt::Result {
    match style.fill {
        Some(c) => write!(out, r#" fill="{c}""#)?,
        None => out.push_str(r#" fill="none""#),
    }
    if let Some(c) = style.stroke {
        write!(out, r#" stroke="{c}" stroke-width="{:.2}""#, style.stroke_width)?;
    }
    Ok(())
}

fn write_line_style(out: &mut String, style: &LineStyle) -> fmt::Result {
    write!(
        out,
        r#" stroke="{}" stroke-width="{:.2}""#,
        style.color, style.width
    )?;
    if let Some(dash) = style.dash {
        write!(out, r#" stroke-dasharray="{dash}""#)?;
    }
    Ok(())
}

fn escape_into(out: &mut String, content: &str) {
    for ch in content.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_canvas_is_valid_svg() {
        let canvas = Canvas::new(100.0, 50.0);
        let svg = canvas.finish_svg().unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains(r#"viewBox="0 0 100 50""#));
    }

    #[test]
    fn test_text_is_escaped() {
        let mut canvas = Canvas::new(10.0, 10.0);
        canvas.text(1.0, 2.0, "<=50K & >50K", &TextStyle::default());
        let svg = canvas.finish_svg().unwrap();
        assert!(svg.contains("&lt;=50K &amp; &gt;50K"));
    }

    #[test]
    fn test_dashed_line_has_dasharray() {
        let mut canvas = Canvas::new(10.0, 10.0);
        canvas.polyline(&[(0.0, 0.0), (5.0, 5.0)], &LineStyle::dashed(Color::BLUE, 1.5));
        let svg = canvas.finish_svg().unwrap();
        assert!(svg.contains("<polyline"));
        assert!(svg.contains(r#"stroke-dasharray="6,4""#));
        assert!(svg.contains(r##"stroke="#0000ff""##));
    }

    #[test]
    fn test_single_point_polyline_is_skipped() {
        let mut canvas = Canvas::new(10.0, 10.0);
        canvas.polyline(&[(1.0, 1.0)], &LineStyle::solid(Color::RED, 1.0));
        assert!(canvas.is_empty());
    }
}
