use crate::lyrics::LyricSearchResult;

#[derive(Debug, Clone)]
pub enum Event {
    Input(InputEvent),
    /// One display frame elapsed.
    Tick,
    Lyrics(LyricsEvent),
}

#[derive(Debug, Clone)]
pub enum InputEvent {
    Key(crossterm::event::KeyEvent),
    Mouse(crossterm::event::MouseEvent),
    Resize,
}

#[derive(Debug, Clone)]
pub enum LyricsEvent {
    Loaded {
        ticket: u64,
        song_index: usize,
        result: LyricSearchResult,
    },
    Failed {
        ticket: u64,
        song_index: usize,
        message: String,
    },
}
