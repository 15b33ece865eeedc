//! Setlist files
//!
//! A setlist is a TOML file listing the songs of a show in order:
//!
//! ```toml
//! name = "Friday at the Anchor"
//!
//! [[song]]
//! title = "Don't Stop Me Now"
//! artist = "Queen"
//! duration = "3:29"
//! isrc = "GBUM71029604"
//! lrc = "lyrics/dont-stop.lrc"   # optional, skips the online search
//! ```

use crate::lyrics::SongIdentity;
use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Setlist {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "song")]
    pub songs: Vec<SetlistSong>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetlistSong {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub isrc: Option<String>,
    /// "m:ss", "h:mm:ss" or plain seconds
    pub duration: String,
    /// Local LRC file, relative to the setlist file.
    pub lrc: Option<PathBuf>,
}

impl SetlistSong {
    pub fn identity(&self) -> anyhow::Result<SongIdentity> {
        let duration_ms = parse_duration(&self.duration)
            .with_context(|| format!("invalid duration {:?}", self.duration))?;
        Ok(SongIdentity {
            title: self.title.clone(),
            artist: self.artist.clone(),
            album: self.album.clone(),
            isrc: self.isrc.clone(),
            duration_ms,
        })
    }

    pub fn display_name(&self) -> String {
        match (&self.title, &self.artist) {
            (Some(t), Some(a)) => format!("{t} - {a}"),
            (Some(t), None) => t.clone(),
            (None, Some(a)) => format!("(untitled) - {a}"),
            (None, None) => "(untitled)".to_string(),
        }
    }
}

impl Setlist {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let mut setlist = Self::from_toml(&raw).with_context(|| format!("parse {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        for song in &mut setlist.songs {
            if let Some(lrc) = &song.lrc
                && lrc.is_relative()
            {
                song.lrc = Some(base.join(lrc));
            }
        }
        Ok(setlist)
    }

    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let setlist: Self = toml::from_str(raw)?;
        for song in &setlist.songs {
            song.identity()?;
        }
        Ok(setlist)
    }

    /// A one-song setlist, used when a song is given on the command line.
    pub fn single(song: SetlistSong) -> Self {
        Self {
            name: None,
            songs: vec![song],
        }
    }
}

/// Parse "3:45", "1:02:03", "225" or "225.5" into milliseconds.
pub fn parse_duration(s: &str) -> Option<u64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let parts: Vec<&str> = s.split(':').collect();
    let (whole, secs) = match parts.as_slice() {
        [secs] => (0, *secs),
        [m, secs] => (m.parse::<u64>().ok()?.checked_mul(60)?, *secs),
        [h, m, secs] => {
            let h = h.parse::<u64>().ok()?.checked_mul(3600)?;
            let m = m.parse::<u64>().ok()?.checked_mul(60)?;
            (h.checked_add(m)?, *secs)
        }
        _ => return None,
    };
    let secs: f64 = secs.parse().ok()?;
    let frac_ms = (secs * 1000.0).round();
    if !frac_ms.is_finite() || secs < 0.0 || frac_ms >= u64::MAX as f64 {
        return None;
    }
    whole.checked_mul(1000)?.checked_add(frac_ms as u64)
}
