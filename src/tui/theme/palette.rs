//! Monochrome palette tuned for a stage monitor: the sung line is the only
//! bright thing on screen.

use ratatui::style::Color;

#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub bg_primary: Color,
    pub fg_primary: Color,
    pub fg_secondary: Color,
    /// Lines already sung.
    pub fg_dim: Color,
    pub accent: Color,
    pub border: Color,
    pub warning: Color,
}

impl Palette {
    pub const MONO: Self = Self {
        bg_primary: Color::Rgb(0, 0, 0),
        fg_primary: Color::Rgb(255, 255, 255),
        fg_secondary: Color::Rgb(136, 136, 136),
        fg_dim: Color::Rgb(72, 72, 72),
        accent: Color::Rgb(255, 255, 255),
        border: Color::Rgb(64, 64, 64),
        warning: Color::Rgb(230, 190, 90),
    };
}

impl Default for Palette {
    fn default() -> Self {
        Self::MONO
    }
}
