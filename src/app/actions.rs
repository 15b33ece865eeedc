use crate::playback::Transport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    Transport(Transport),

    // Setlist navigation
    ListUp,
    ListDown,
    LoadSelected,
    NextSong,
    PrevSong,
    RetrySearch,

    // Filter prompt (text entry)
    OpenFilter,
    CloseFilter,
    FilterChar(char),
    FilterBackspace,

    /// Manual scroll of the lyric view by this many rows.
    ScrollRows(i32),

    Resize,
}
