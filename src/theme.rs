//! UI configuration passed to the presentation layer at construction.
//!
//! The style registry is an explicit value owned by whoever builds the
//! `App`, never process-wide state.

use ratatui::style::Color;

#[derive(Debug, Clone)]
pub struct Theme {
    /// Label prefixed to every rendered amount, e.g. "KSh 1,500.00".
    pub currency_label: &'static str,
    pub primary: Color,
    pub accent: Color,
    pub highlight: Color,
    /// Cycled per chart slice, one color per category.
    pub chart_palette: [Color; 8],
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            currency_label: "KSh",
            primary: Color::Cyan,
            accent: Color::Red,
            highlight: Color::Yellow,
            chart_palette: [
                Color::Blue,
                Color::Red,
                Color::Green,
                Color::Yellow,
                Color::Magenta,
                Color::Cyan,
                Color::Gray,
                Color::LightRed,
            ],
        }
    }
}

impl Theme {
    /// Color for the slice at `index`, wrapping past the palette end.
    pub fn slice_color(&self, index: usize) -> Color {
        self.chart_palette[index % self.chart_palette.len()]
    }
}
