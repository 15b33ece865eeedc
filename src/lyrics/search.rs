//! Variant fallback search.
//!
//! Walks the variant list in order, one lookup at a time, and stops at the
//! first variant that yields synchronized lyrics. Plain lyrics found along the
//! way are kept as a fallback. Failed lookups never abort the search.

use super::parser::{self, LyricLine};
use super::variants::{self, SongIdentity, VariantMeta};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// What a provider returned for one query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupResponse {
    pub synced_lyrics: Option<String>,
    pub plain_lyrics: Option<String>,
}

/// A lyric-text provider.
///
/// `Ok(None)` means the provider had nothing for this query; `Err` is a
/// transport failure. Both just move the search on to the next variant.
pub trait LyricsLookup {
    fn lookup(
        &self,
        variant: &VariantMeta,
    ) -> impl Future<Output = anyhow::Result<Option<LookupResponse>>> + Send;
}

/// Diagnostic record of one executed lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricAttempt {
    pub query_description: String,
    pub variant: VariantMeta,
    pub succeeded_transport: bool,
    pub had_synced_result: bool,
    pub had_plain_result: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LyricSearchResult {
    /// Parsed synced lines; empty when only plain text (or nothing) was found.
    pub lines: Vec<LyricLine>,
    pub plain_text_fallback: Option<String>,
    pub attempts: Vec<LyricAttempt>,
    /// Position in the variant list of the variant that produced `lines`.
    pub successful_variant: Option<usize>,
    pub warning: Option<String>,
}

impl LyricSearchResult {
    pub fn is_synced(&self) -> bool {
        !self.lines.is_empty()
    }
}

/// Monotonic search counter. Starting a new search invalidates older tickets.
#[derive(Debug, Clone, Default)]
pub struct SearchGeneration {
    latest: Arc<AtomicU64>,
}

impl SearchGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> SearchTicket {
        let id = self.latest.fetch_add(1, Ordering::SeqCst).wrapping_add(1);
        SearchTicket {
            id,
            latest: Arc::clone(&self.latest),
        }
    }

    /// Invalidate every outstanding ticket without starting a new search.
    pub fn cancel_all(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone)]
pub struct SearchTicket {
    id: u64,
    latest: Arc<AtomicU64>,
}

impl SearchTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_current(&self) -> bool {
        self.latest.load(Ordering::SeqCst) == self.id
    }
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}

/// Search for lyrics, trying at most `max_attempts` variants.
///
/// Returns `None` only when `ticket` was superseded mid-search.
pub async fn search_lyrics<L: LyricsLookup>(
    lookup: &L,
    song: &SongIdentity,
    max_attempts: usize,
    ticket: &SearchTicket,
) -> Option<LyricSearchResult> {
    let variants = variants::build_variants(song);
    let mut attempts = Vec::new();
    let mut plain_fallback: Option<String> = None;

    for (index, variant) in variants.iter().take(max_attempts).enumerate() {
        if !ticket.is_current() {
            tracing::debug!(ticket = ticket.id(), "lyrics search superseded");
            return None;
        }

        let query_description = variant.to_string();
        tracing::debug!(attempt = index, query = %query_description, "lyrics lookup");
        let outcome = lookup.lookup(variant).await;

        if !ticket.is_current() {
            tracing::debug!(ticket = ticket.id(), "lyrics search superseded");
            return None;
        }

        let (succeeded_transport, response) = match outcome {
            Ok(response) => (true, response.unwrap_or_default()),
            Err(e) => {
                tracing::warn!(attempt = index, "lyrics lookup failed: {e:#}");
                (false, LookupResponse::default())
            }
        };

        let synced_lines = non_blank(response.synced_lyrics)
            .map(|text| parser::parse(&text))
            .filter(|lines| !lines.is_empty());
        let plain = non_blank(response.plain_lyrics);

        attempts.push(LyricAttempt {
            query_description,
            variant: variant.clone(),
            succeeded_transport,
            had_synced_result: synced_lines.is_some(),
            had_plain_result: plain.is_some(),
        });

        if let Some(lines) = synced_lines {
            tracing::info!(
                attempt = index,
                reason = variant.reason.label(),
                lines = lines.len(),
                "synced lyrics found"
            );
            return Some(LyricSearchResult {
                lines,
                plain_text_fallback: None,
                attempts,
                successful_variant: Some(index),
                warning: None,
            });
        }

        if plain_fallback.is_none() {
            plain_fallback = plain;
        }
    }

    let tried = attempts.len();
    let warning = if plain_fallback.is_some() {
        tracing::info!(attempts = tried, "only unsynced lyrics found");
        format!("Synced lyrics unavailable after {tried} attempts; showing unsynced lyrics")
    } else {
        tracing::info!(attempts = tried, "no lyrics found");
        format!("No lyrics found after trying {tried} query variants")
    };

    Some(LyricSearchResult {
        lines: Vec::new(),
        plain_text_fallback: plain_fallback,
        attempts,
        successful_variant: None,
        warning: Some(warning),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lyrics::variants::VariantReason;
    use std::collections::HashMap;
    use std::sync::Mutex;

    enum Scripted {
        Synced(&'static str),
        Plain(&'static str),
        Nothing,
        Fail,
    }

    /// Answers per variant reason; anything unscripted returns no result.
    #[derive(Default)]
    struct ScriptedLookup {
        script: HashMap<VariantReason, Scripted>,
        calls: Mutex<Vec<VariantReason>>,
        cancel_after_first: Option<SearchGeneration>,
    }

    impl ScriptedLookup {
        fn with(mut self, reason: VariantReason, answer: Scripted) -> Self {
            self.script.insert(reason, answer);
            self
        }

        fn calls(&self) -> Vec<VariantReason> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl LyricsLookup for ScriptedLookup {
        fn lookup(
            &self,
            variant: &VariantMeta,
        ) -> impl Future<Output = anyhow::Result<Option<LookupResponse>>> + Send {
            self.calls.lock().unwrap().push(variant.reason);
            if let Some(generation) = &self.cancel_after_first {
                generation.cancel_all();
            }
            let result = match self.script.get(&variant.reason) {
                Some(Scripted::Synced(text)) => Ok(Some(LookupResponse {
                    synced_lyrics: Some(text.to_string()),
                    plain_lyrics: Some("plain".into()),
                })),
                Some(Scripted::Plain(text)) => Ok(Some(LookupResponse {
                    synced_lyrics: None,
                    plain_lyrics: Some(text.to_string()),
                })),
                Some(Scripted::Fail) => Err(anyhow::anyhow!("connection reset")),
                Some(Scripted::Nothing) | None => Ok(None),
            };
            std::future::ready(result)
        }
    }

    fn messy_song() -> SongIdentity {
        SongIdentity {
            title: Some("Don't Stop Me Now - Remastered 2011".into()),
            artist: Some("Queen feat. Nobody".into()),
            album: Some("Jazz".into()),
            isrc: Some("GBUM71029604".into()),
            duration_ms: 209_000,
        }
    }

    #[tokio::test]
    async fn test_sanitized_variant_success() {
        let lookup = ScriptedLookup::default()
            .with(VariantReason::FullMetadata, Scripted::Fail)
            .with(VariantReason::Sanitized, Scripted::Synced("[00:01.00] Tonight"));
        let generation = SearchGeneration::new();
        let ticket = generation.begin();

        let result = search_lyrics(&lookup, &messy_song(), 10, &ticket)
            .await
            .unwrap();

        // recording code, full, without album, sanitized
        assert_eq!(result.successful_variant, Some(3));
        assert_eq!(result.warning, None);
        assert_eq!(result.lines, vec![LyricLine::new(1000, "Tonight")]);
        assert_eq!(result.attempts.len(), 4);
        assert!(!result.attempts[1].succeeded_transport);
        assert!(result.attempts[3].had_synced_result);
        assert_eq!(lookup.calls().last(), Some(&VariantReason::Sanitized));
    }

    #[tokio::test]
    async fn test_everything_empty() {
        let lookup = ScriptedLookup::default();
        let ticket = SearchGeneration::new().begin();

        let result = search_lyrics(&lookup, &messy_song(), 20, &ticket)
            .await
            .unwrap();

        assert!(result.lines.is_empty());
        assert_eq!(result.successful_variant, None);
        assert_eq!(result.plain_text_fallback, None);
        assert!(result.warning.as_deref().is_some_and(|w| !w.is_empty()));
        assert!(!result.attempts.is_empty());
        assert_eq!(result.attempts.len(), lookup.calls().len());
    }

    #[tokio::test]
    async fn test_plain_is_fallback_but_search_continues() {
        let lookup = ScriptedLookup::default()
            .with(VariantReason::FullMetadata, Scripted::Plain("first plain"))
            .with(VariantReason::WithoutAlbum, Scripted::Plain("second plain"));
        let ticket = SearchGeneration::new().begin();

        let result = search_lyrics(&lookup, &messy_song(), 20, &ticket)
            .await
            .unwrap();

        assert!(result.lines.is_empty());
        assert_eq!(result.plain_text_fallback.as_deref(), Some("first plain"));
        assert!(result.warning.is_some());
        assert_eq!(lookup.calls().len(), 8);
    }

    #[tokio::test]
    async fn test_synced_after_plain_wins() {
        let lookup = ScriptedLookup::default()
            .with(VariantReason::FullMetadata, Scripted::Plain("plain words"))
            .with(VariantReason::WithoutDuration, Scripted::Synced("[00:02.00] synced"));
        let ticket = SearchGeneration::new().begin();

        let result = search_lyrics(&lookup, &messy_song(), 20, &ticket)
            .await
            .unwrap();

        assert_eq!(result.successful_variant, Some(6));
        assert_eq!(result.plain_text_fallback, None);
        assert_eq!(result.warning, None);
    }

    #[tokio::test]
    async fn test_attempt_cap() {
        let lookup = ScriptedLookup::default()
            .with(VariantReason::WithoutDuration, Scripted::Synced("[00:02.00] late"));
        let ticket = SearchGeneration::new().begin();

        let result = search_lyrics(&lookup, &messy_song(), 2, &ticket)
            .await
            .unwrap();

        assert_eq!(result.attempts.len(), 2);
        assert_eq!(
            lookup.calls(),
            vec![VariantReason::RecordingCode, VariantReason::FullMetadata]
        );
        assert!(result.warning.is_some());
    }

    #[tokio::test]
    async fn test_unparseable_synced_text_is_not_success() {
        let lookup = ScriptedLookup::default()
            .with(VariantReason::RecordingCode, Scripted::Synced("no tags at all"));
        let ticket = SearchGeneration::new().begin();

        let result = search_lyrics(&lookup, &messy_song(), 1, &ticket)
            .await
            .unwrap();

        assert_eq!(result.successful_variant, None);
        assert!(!result.attempts[0].had_synced_result);
        // The scripted response also carries plain text.
        assert_eq!(result.plain_text_fallback.as_deref(), Some("plain"));
    }

    #[tokio::test]
    async fn test_superseded_search_stops() {
        let generation = SearchGeneration::new();
        let lookup = ScriptedLookup {
            cancel_after_first: Some(generation.clone()),
            ..ScriptedLookup::default()
        }
        .with(VariantReason::RecordingCode, Scripted::Synced("[00:01.00] stale"));
        let ticket = generation.begin();

        let result = search_lyrics(&lookup, &messy_song(), 20, &ticket).await;

        assert!(result.is_none());
        assert_eq!(lookup.calls().len(), 1);
    }

    #[test]
    fn test_generation_tickets() {
        let generation = SearchGeneration::new();
        let first = generation.begin();
        assert!(first.is_current());
        let second = generation.begin();
        assert!(!first.is_current());
        assert!(second.is_current());
        generation.cancel_all();
        assert!(!second.is_current());
    }
}
