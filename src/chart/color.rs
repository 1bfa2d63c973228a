use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const GREY: Color = Color::rgb(90, 90, 90);
    pub const LIGHT_GREY: Color = Color::rgb(220, 220, 220);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const ORANGE: Color = Color::rgb(255, 165, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rrggbb` (the `#` is optional). Malformed channels read as 0.
    pub fn hex(s: &str) -> Self {
        let s = s.strip_prefix('#').unwrap_or(s);
        let channel = |i: usize| {
            s.get(i..i + 2)
                .and_then(|c| u8::from_str_radix(c, 16).ok())
                .unwrap_or(0)
        };
        Self::rgb(channel(0), channel(2), channel(4))
    }

    /// Linear interpolation between two colors, `t` clamped to `[0, 1]`.
    pub fn lerp(a: Color, b: Color, t: f64) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |x: u8, y: u8| (x as f64 * (1.0 - t) + y as f64 * t).round() as u8;
        Color::rgb(mix(a.r, b.r), mix(a.g, b.g), mix(a.b, b.b))
    }

    /// Relative luminance in `[0, 1]`, used to pick readable annotation text.
    pub fn luminance(&self) -> f64 {
        (0.299 * self.r as f64 + 0.587 * self.g as f64 + 0.114 * self.b as f64) / 255.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Diverging blue → white → red map for values in `[-1, 1]`.
pub fn diverging(v: f64) -> Color {
    let cold = Color::rgb(33, 102, 172);
    let hot = Color::rgb(178, 24, 43);
    if v < 0.0 {
        Color::lerp(Color::WHITE, cold, -v)
    } else {
        Color::lerp(Color::WHITE, hot, v)
    }
}

/// Twelve-step rainbow, one color per month.
pub const RAINBOW_12: [&str; 12] = [
    "#ff0000", "#ff8000", "#ffff00", "#80ff00", "#00ff00", "#00ff80", "#00ffff", "#0080ff",
    "#0000ff", "#8000ff", "#ff00ff", "#ff0080",
];

/// Categorical series colors.
pub const CATEGORY_10: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

pub fn rainbow(i: usize) -> Color {
    Color::hex(RAINBOW_12[i % RAINBOW_12.len()])
}

pub fn category(i: usize) -> Color {
    Color::hex(CATEGORY_10[i % CATEGORY_10.len()])
}
