//! Minimal SVG charting: a drawing canvas, colors, axes and legends.
//!
//! Charts are assembled directly from primitives by each analyzer and written
//! out with [`crate::output::save_svg`].

pub mod axis;
pub mod canvas;
pub mod color;
pub mod frame;

pub use axis::Axis;
pub use canvas::{Anchor, Canvas, LineStyle, Style, TextStyle};
pub use color::Color;
pub use frame::{LegendMark, PlotArea};
