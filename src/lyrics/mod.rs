//! Lyrics module for fetching and parsing synchronized lyrics
//!
//! This module provides:
//! - LRC format parser and active-line locator
//! - Query variant generation and the fallback search over them
//! - LRCLIB API client used as the lookup provider

pub mod locate;
pub mod lrclib;
pub mod parser;
pub mod search;
pub mod variants;

pub use locate::locate;
pub use lrclib::LrclibClient;
pub use parser::LyricLine;
pub use search::{LyricSearchResult, SearchGeneration, SearchTicket, search_lyrics};
pub use variants::SongIdentity;

/// Interpret local lyric text the same way a provider result would be.
///
/// Timestamped text becomes synced lines; anything else is kept as plain text.
pub fn from_text(text: &str) -> LyricSearchResult {
    let lines = parser::parse(text);
    if !lines.is_empty() {
        return LyricSearchResult {
            lines,
            ..LyricSearchResult::default()
        };
    }

    if text.trim().is_empty() {
        LyricSearchResult {
            warning: Some("Lyrics file is empty".into()),
            ..LyricSearchResult::default()
        }
    } else {
        LyricSearchResult {
            plain_text_fallback: Some(text.trim().to_string()),
            warning: Some("No timestamps found; showing unsynced lyrics".into()),
            ..LyricSearchResult::default()
        }
    }
}
