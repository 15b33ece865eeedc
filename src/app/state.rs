use crate::playback::{Teleprompter, TickFrame};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Prompter,
    /// Typing into the setlist filter; shortcut keys are off.
    Filter,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    pub created_at: std::time::Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Warning,
}

impl Toast {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: ToastKind::Info,
            created_at: std::time::Instant::now(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: ToastKind::Warning,
            created_at: std::time::Instant::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > std::time::Duration::from_secs(4)
    }
}

/// The lyric view's scroll position, eased toward the last requested target.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScrollSurface {
    position: f32,
    target: u32,
}

impl ScrollSurface {
    const EASING: f32 = 0.35;

    pub fn position(&self) -> u32 {
        self.position.round().max(0.0) as u32
    }

    pub fn scroll_to(&mut self, target: u32, smooth: bool) {
        self.target = target;
        if !smooth {
            self.position = target as f32;
        }
    }

    /// Snap immediately, e.g. when reverting interference.
    pub fn jump(&mut self, position: u32) {
        self.target = position;
        self.position = position as f32;
    }

    /// Move by a user gesture and stay there.
    pub fn nudge(&mut self, rows: i32, max: u32) {
        let next = (self.position() as i64 + rows as i64).clamp(0, max as i64) as u32;
        self.jump(next);
    }

    /// Advance one frame of the smooth scroll.
    pub fn step(&mut self) {
        let target = self.target as f32;
        let diff = target - self.position;
        if diff.abs() < 0.5 {
            self.position = target;
        } else {
            self.position += diff * Self::EASING;
        }
    }
}

pub struct AppState {
    pub should_quit: bool,

    // Setlist
    pub setlist_name: Option<String>,
    pub songs: Vec<String>,
    pub selected: usize,
    pub loaded_song: Option<usize>,
    pub filter: String,
    pub focus: Focus,

    // Lyrics
    pub prompter: Option<Teleprompter>,
    pub lyrics_loading: bool,
    pub warning: Option<String>,
    pub attempt_summary: Option<String>,
    pub frame: Option<TickFrame>,

    // Lyric view geometry, recorded while drawing.
    pub viewport_width: u16,
    pub viewport_height: u16,
    pub content_rows: u32,
    pub surface: ScrollSurface,

    pub toast: Option<Toast>,
    pub status: String,
    /// Frames drawn so far; drives the loading spinner.
    pub frame_count: u64,
}

impl AppState {
    pub fn new(setlist_name: Option<String>, songs: Vec<String>) -> Self {
        Self {
            should_quit: false,
            setlist_name,
            songs,
            selected: 0,
            loaded_song: None,
            filter: String::new(),
            focus: Focus::default(),
            prompter: None,
            lyrics_loading: false,
            warning: None,
            attempt_summary: None,
            frame: None,
            viewport_width: 0,
            viewport_height: 0,
            content_rows: 0,
            surface: ScrollSurface::default(),
            toast: None,
            status: String::new(),
            frame_count: 0,
        }
    }

    /// Setlist indices matching the filter, in setlist order.
    pub fn visible_songs(&self) -> Vec<usize> {
        let needle = self.filter.trim().to_lowercase();
        self.songs
            .iter()
            .enumerate()
            .filter(|(_, name)| needle.is_empty() || name.to_lowercase().contains(&needle))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn selected_song(&self) -> Option<usize> {
        self.visible_songs().get(self.selected).copied()
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_next(&mut self) {
        let count = self.visible_songs().len();
        if count > 0 {
            self.selected = (self.selected + 1).min(count - 1);
        }
    }

    pub fn max_scroll(&self) -> u32 {
        self.content_rows
            .saturating_sub(self.viewport_height as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        AppState::new(
            None,
            vec![
                "Yesterday - The Beatles".into(),
                "Hey Jude - The Beatles".into(),
                "Jolene - Dolly Parton".into(),
            ],
        )
    }

    #[test]
    fn test_filter_narrows_selection() {
        let mut s = state();
        s.filter = "jude".into();
        assert_eq!(s.visible_songs(), vec![1]);
        assert_eq!(s.selected_song(), Some(1));

        s.filter = "beatles".into();
        s.select_next();
        s.select_next();
        assert_eq!(s.selected_song(), Some(1));
    }

    #[test]
    fn test_surface_eases_to_target() {
        let mut surface = ScrollSurface::default();
        surface.scroll_to(20, true);
        assert_eq!(surface.position(), 0);
        for _ in 0..30 {
            surface.step();
        }
        assert_eq!(surface.position(), 20);
    }

    #[test]
    fn test_surface_nudge_clamps() {
        let mut surface = ScrollSurface::default();
        surface.nudge(-3, 10);
        assert_eq!(surface.position(), 0);
        surface.nudge(25, 10);
        assert_eq!(surface.position(), 10);
        surface.step();
        assert_eq!(surface.position(), 10);
    }
}
