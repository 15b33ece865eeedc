//! Stage theme: monochrome palette, Nerd Font glyphs, rounded borders.

pub mod icons;
pub mod palette;

pub use icons::{Icons, LoadingSpinner};
pub use palette::Palette;

use ratatui::symbols::border;

#[derive(Debug, Clone)]
pub struct Theme {
    pub palette: Palette,
    pub icons: Icons,
    borders: border::Set<'static>,
}

impl Theme {
    pub const STAGE: Self = Self {
        palette: Palette::MONO,
        icons: Icons::nerd(),
        borders: border::ROUNDED,
    };

    pub fn border_set(&self) -> border::Set<'static> {
        self.borders
    }
}

pub fn get_theme() -> Theme {
    Theme::STAGE
}
