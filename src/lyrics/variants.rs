//! Query variants for the lyrics fallback search.
//!
//! A song's metadata rarely matches the lyrics provider exactly. Titles carry
//! "- Remastered 2011" suffixes, artists carry "feat." credits, and durations
//! drift by a second or two. We derive an ordered list of progressively looser
//! queries from one identity and try them until something matches.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// What the engine knows about a song.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongIdentity {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    /// ISRC recording code
    pub isrc: Option<String>,
    /// Total duration; bounds the playback clock.
    pub duration_ms: u64,
}

impl SongIdentity {
    /// Duration rounded to whole seconds, `None` when unknown.
    pub fn duration_secs(&self) -> Option<u32> {
        if self.duration_ms == 0 {
            return None;
        }
        u32::try_from((self.duration_ms + 500) / 1000).ok()
    }
}

/// Why a variant exists, in generation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantReason {
    RecordingCode,
    FullMetadata,
    WithoutAlbum,
    Sanitized,
    TitleWithoutPunctuation,
    PrimaryArtist,
    WithoutDuration,
    SanitizedWithoutDuration,
}

impl VariantReason {
    pub fn label(self) -> &'static str {
        match self {
            VariantReason::RecordingCode => "recording code",
            VariantReason::FullMetadata => "full metadata",
            VariantReason::WithoutAlbum => "without album",
            VariantReason::Sanitized => "sanitized title/artist",
            VariantReason::TitleWithoutPunctuation => "title without punctuation",
            VariantReason::PrimaryArtist => "primary artist",
            VariantReason::WithoutDuration => "without duration",
            VariantReason::SanitizedWithoutDuration => "sanitized without duration",
        }
    }
}

/// One concrete lookup query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantMeta {
    pub reason: VariantReason,
    pub isrc: Option<String>,
    pub track_name: Option<String>,
    pub artist_name: Option<String>,
    pub album_name: Option<String>,
    pub duration_secs: Option<u32>,
}

impl VariantMeta {
    fn new(reason: VariantReason) -> Self {
        Self {
            reason,
            isrc: None,
            track_name: None,
            artist_name: None,
            album_name: None,
            duration_secs: None,
        }
    }

    /// Two variants are the same query if every field but the reason matches.
    pub fn same_query(&self, other: &Self) -> bool {
        self.isrc == other.isrc
            && self.track_name == other.track_name
            && self.artist_name == other.artist_name
            && self.album_name == other.album_name
            && self.duration_secs == other.duration_secs
    }
}

impl fmt::Display for VariantMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(isrc) = &self.isrc {
            parts.push(format!("isrc={isrc}"));
        }
        if let Some(track) = &self.track_name {
            parts.push(format!("track={track:?}"));
        }
        if let Some(artist) = &self.artist_name {
            parts.push(format!("artist={artist:?}"));
        }
        if let Some(album) = &self.album_name {
            parts.push(format!("album={album:?}"));
        }
        if let Some(d) = self.duration_secs {
            parts.push(format!("duration={d}s"));
        }
        write!(f, "[{}] {}", self.reason.label(), parts.join(" "))
    }
}

/// Trailing descriptors: "- Live", "- Remastered 2011", "- Mono", "- Single Version"
static TRAILING_DESCRIPTOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\s+[-–—]\s+(?:(?:\d{4}\s+)?(?:digital\s+)?remaster(?:ed)?(?:\s+\d{4})?(?:\s+version)?|live(?:\s+(?:at|from|in)\s+.+)?|mono|stereo|(?:single|album|radio|lp|mono|stereo|\d{4})\s+(?:version|edit|mix))\s*$",
    )
    .unwrap()
});

/// Parenthetical variant annotations: "(Radio Edit)", "[Live]", "(feat. X)", "(2009 Remaster)"
static VARIANT_ANNOTATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\s*[\(\[][^\)\]]*\b(?:(?:re)?mix|version|live|remaster(?:ed)?|edit|feat|ft|featuring)\b[^\)\]]*[\)\]]",
    )
    .unwrap()
});

/// Unbracketed featuring suffix: "Song feat. Artist", "Band ft. Someone"
static FEATURING_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+(?:feat\.?|ft\.|featuring)\s+.*$").unwrap());

/// Separators between credited artists.
static ARTIST_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*(?:[,;&]|\s(?:feat\.?|ft\.)\s)\s*").unwrap());

/// Replace typographic quotes with their ASCII forms.
pub fn normalize_quotes(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{00B4}' | '`' => '\'',
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' => '"',
            other => other,
        })
        .collect()
}

pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip version descriptors and featuring credits from a title.
pub fn sanitize_title(title: &str) -> String {
    let base = collapse_whitespace(&normalize_quotes(title));
    let mut out = VARIANT_ANNOTATION.replace_all(&base, "").into_owned();
    out = FEATURING_SUFFIX.replace(&out, "").into_owned();
    // Descriptors can stack: "Song - Live - Remastered"
    loop {
        let next = TRAILING_DESCRIPTOR.replace(&out, "").into_owned();
        if next == out {
            break;
        }
        out = next;
    }
    let out = collapse_whitespace(&out);
    if out.is_empty() { base } else { out }
}

/// Drop featuring credits from an artist string.
pub fn sanitize_artist(artist: &str) -> String {
    let base = collapse_whitespace(&normalize_quotes(artist));
    let out = VARIANT_ANNOTATION.replace_all(&base, "");
    let out = collapse_whitespace(&FEATURING_SUFFIX.replace(&out, ""));
    if out.is_empty() { base } else { out }
}

/// Remove every character that is neither alphanumeric nor whitespace.
pub fn strip_punctuation(s: &str) -> String {
    let kept: String = s
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    collapse_whitespace(&kept)
}

/// First credited artist: "A, B & C feat. D" -> "A".
pub fn primary_artist(artist: &str) -> String {
    ARTIST_SEPARATOR
        .split(artist)
        .next()
        .map(str::trim)
        .unwrap_or_default()
        .to_string()
}

fn query(
    reason: VariantReason,
    track_name: Option<String>,
    artist_name: Option<String>,
    album_name: Option<String>,
    duration_secs: Option<u32>,
) -> VariantMeta {
    VariantMeta {
        track_name,
        artist_name,
        album_name,
        duration_secs,
        ..VariantMeta::new(reason)
    }
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

/// Build the ordered, duplicate-free variant list for one song.
pub fn build_variants(song: &SongIdentity) -> Vec<VariantMeta> {
    let title = non_empty(song.title.as_deref());
    let artist = non_empty(song.artist.as_deref());
    let album = non_empty(song.album.as_deref());
    let isrc = non_empty(song.isrc.as_deref());
    let duration = song.duration_secs();

    let mut out: Vec<VariantMeta> = Vec::new();
    let mut push = |v: VariantMeta| {
        if !out.iter().any(|existing| existing.same_query(&v)) {
            out.push(v);
        }
    };

    if let Some(code) = &isrc {
        push(VariantMeta {
            isrc: Some(code.clone()),
            ..VariantMeta::new(VariantReason::RecordingCode)
        });
    }

    push(query(
        VariantReason::FullMetadata,
        title.clone(),
        artist.clone(),
        album.clone(),
        duration,
    ));

    push(query(
        VariantReason::WithoutAlbum,
        title.clone(),
        artist.clone(),
        None,
        duration,
    ));

    let sanitized_title = title.as_deref().map(sanitize_title);
    let sanitized_artist = artist.as_deref().map(sanitize_artist);
    let sanitized = if sanitized_title != title || sanitized_artist != artist {
        Some((sanitized_title, sanitized_artist))
    } else {
        None
    };

    if let Some((t, a)) = &sanitized {
        push(query(VariantReason::Sanitized, t.clone(), a.clone(), None, duration));
    }

    if let Some(t) = &title {
        let stripped = strip_punctuation(t);
        if !stripped.is_empty() && &stripped != t {
            push(query(
                VariantReason::TitleWithoutPunctuation,
                Some(stripped),
                artist.clone(),
                None,
                duration,
            ));
        }
    }

    if let Some(a) = &artist {
        let primary = primary_artist(a);
        if !primary.is_empty() && &primary != a {
            push(query(
                VariantReason::PrimaryArtist,
                title.clone(),
                Some(primary),
                None,
                duration,
            ));
        }
    }

    push(query(
        VariantReason::WithoutDuration,
        title.clone(),
        artist.clone(),
        album.clone(),
        None,
    ));

    if let Some((t, a)) = sanitized {
        push(query(VariantReason::SanitizedWithoutDuration, t, a, None, None));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(title: &str, artist: &str) -> SongIdentity {
        SongIdentity {
            title: Some(title.into()),
            artist: Some(artist.into()),
            album: Some("Album".into()),
            isrc: None,
            duration_ms: 215_400,
        }
    }

    fn reasons(variants: &[VariantMeta]) -> Vec<VariantReason> {
        variants.iter().map(|v| v.reason).collect()
    }

    #[test]
    fn test_sanitize_title() {
        assert_eq!(sanitize_title("Come Together - Remastered 2009"), "Come Together");
        assert_eq!(sanitize_title("Song (Radio Edit)"), "Song");
        assert_eq!(sanitize_title("Song [Live at Wembley]"), "Song");
        assert_eq!(sanitize_title("Song (feat. Someone)"), "Song");
        assert_eq!(sanitize_title("Song feat. Someone"), "Song");
        assert_eq!(sanitize_title("Song - Mono"), "Song");
        assert_eq!(sanitize_title("Song - Live - 2011 Remaster"), "Song");
        assert_eq!(sanitize_title("Don\u{2019}t   Stop"), "Don't Stop");
        assert_eq!(sanitize_title("Plain Title"), "Plain Title");
    }

    #[test]
    fn test_sanitize_keeps_something() {
        assert_eq!(sanitize_title("(Live)"), "(Live)");
    }

    #[test]
    fn test_sanitize_artist() {
        assert_eq!(sanitize_artist("Artist feat. Other"), "Artist");
        assert_eq!(sanitize_artist("Artist ft. Other"), "Artist");
        assert_eq!(sanitize_artist("Simon & Garfunkel"), "Simon & Garfunkel");
    }

    #[test]
    fn test_primary_artist() {
        assert_eq!(primary_artist("A, B & C"), "A");
        assert_eq!(primary_artist("A & B"), "A");
        assert_eq!(primary_artist("A; B"), "A");
        assert_eq!(primary_artist("A feat. B"), "A");
        assert_eq!(primary_artist("A ft. B"), "A");
        assert_eq!(primary_artist("Solo"), "Solo");
    }

    #[test]
    fn test_strip_punctuation() {
        assert_eq!(strip_punctuation("Don't Stop (Me Now)!"), "Dont Stop Me Now");
        assert_eq!(strip_punctuation("!!!"), "");
    }

    #[test]
    fn test_full_order_with_everything() {
        let mut s = song("Don't Stop - Remastered 2011", "Queen feat. Someone");
        s.isrc = Some("GBUM71029604".into());
        let variants = build_variants(&s);
        assert_eq!(
            reasons(&variants),
            vec![
                VariantReason::RecordingCode,
                VariantReason::FullMetadata,
                VariantReason::WithoutAlbum,
                VariantReason::Sanitized,
                VariantReason::TitleWithoutPunctuation,
                VariantReason::PrimaryArtist,
                VariantReason::WithoutDuration,
                VariantReason::SanitizedWithoutDuration,
            ]
        );
        assert_eq!(variants[0].isrc.as_deref(), Some("GBUM71029604"));
        assert!(variants[0].track_name.is_none());
        assert_eq!(variants[1].album_name.as_deref(), Some("Album"));
        assert_eq!(variants[1].duration_secs, Some(215));
        assert_eq!(variants[3].track_name.as_deref(), Some("Don't Stop"));
        assert_eq!(variants[3].artist_name.as_deref(), Some("Queen"));
        assert_eq!(variants[5].artist_name.as_deref(), Some("Queen"));
        assert!(variants[6].duration_secs.is_none());
    }

    #[test]
    fn test_without_duration_keeps_album() {
        let mut s = song("Yesterday", "The Beatles");
        s.album = Some("Help!".into());
        let variants = build_variants(&s);
        let wd = variants
            .iter()
            .find(|v| v.reason == VariantReason::WithoutDuration)
            .unwrap();
        assert_eq!(wd.track_name.as_deref(), Some("Yesterday"));
        assert_eq!(wd.album_name.as_deref(), Some("Help!"));
        assert!(wd.duration_secs.is_none());
    }

    #[test]
    fn test_clean_metadata_skips_conditional_variants() {
        let variants = build_variants(&song("Yesterday", "The Beatles"));
        assert_eq!(
            reasons(&variants),
            vec![
                VariantReason::FullMetadata,
                VariantReason::WithoutAlbum,
                VariantReason::WithoutDuration,
            ]
        );
    }

    #[test]
    fn test_structural_dedup_without_album_or_duration() {
        let s = SongIdentity {
            title: Some("Yesterday".into()),
            artist: Some("The Beatles".into()),
            ..SongIdentity::default()
        };
        // Full, without album and without duration all collapse into one query.
        let variants = build_variants(&s);
        assert_eq!(reasons(&variants), vec![VariantReason::FullMetadata]);
    }

    #[test]
    fn test_variants_are_unique() {
        let identities = [
            song("A (Live)", "B & C"),
            song("Hey, Jude!", "The Beatles"),
            song("x", "y"),
            SongIdentity::default(),
            SongIdentity {
                isrc: Some("US1234567890".into()),
                duration_ms: 1000,
                ..SongIdentity::default()
            },
        ];
        for id in identities {
            let variants = build_variants(&id);
            assert!(!variants.is_empty());
            for (i, a) in variants.iter().enumerate() {
                for b in &variants[i + 1..] {
                    assert!(!a.same_query(b), "duplicate query {a} / {b}");
                }
            }
        }
    }

    #[test]
    fn test_display_describes_query() {
        let variants = build_variants(&song("Yesterday", "The Beatles"));
        let text = variants[0].to_string();
        assert!(text.contains("full metadata"));
        assert!(text.contains("track=\"Yesterday\""));
        assert!(text.contains("duration=215s"));
    }
}
