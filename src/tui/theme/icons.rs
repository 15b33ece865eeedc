//! Nerd Font glyphs (https://www.nerdfonts.com)

#[derive(Debug, Clone)]
pub struct Icons {
    pub play: &'static str,
    pub pause: &'static str,
    pub stop: &'static str,
    pub search: &'static str,
    pub queue: &'static str,
    pub warning: &'static str,
    pub info: &'static str,
    pub lyrics: &'static str,
    pub lock: &'static str,
    pub selected: &'static str,
    pub unselected: &'static str,
    pub loaded: &'static str,

    pub progress_full: &'static str,
    pub progress_empty: &'static str,
    pub progress_head: &'static str,
}

impl Icons {
    pub const fn nerd() -> Self {
        Self {
            play: "\u{f04b}",       // nf-fa-play
            pause: "\u{f04c}",      // nf-fa-pause
            stop: "\u{f04d}",       // nf-fa-stop
            search: "\u{f002}",     // nf-fa-search
            queue: "\u{f03a}",      // nf-fa-list
            warning: "\u{f071}",    // nf-fa-warning
            info: "\u{f05a}",       // nf-fa-info_circle
            lyrics: "\u{f15c}",     // nf-fa-file_text_o
            lock: "\u{f023}",       // nf-fa-lock
            selected: "\u{f054}",   // nf-fa-chevron_right
            unselected: " ",
            loaded: "\u{f001}",     // nf-fa-music

            progress_full: "━",
            progress_empty: "─",
            progress_head: "●",
        }
    }
}

impl Default for Icons {
    fn default() -> Self {
        Self::nerd()
    }
}

pub struct LoadingSpinner;

impl LoadingSpinner {
    pub const BRAILLE: [&'static str; 8] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧"];

    pub fn frame(tick: u64) -> &'static str {
        let idx = (tick / 4) as usize % Self::BRAILLE.len();
        Self::BRAILLE[idx]
    }
}
