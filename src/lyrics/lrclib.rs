//! LRCLIB API client
//!
//! LRCLIB is a free lyrics API that provides synchronized (LRC format) lyrics.
//! API Documentation: https://lrclib.net/docs

use super::search::{LookupResponse, LyricsLookup};
use super::variants::VariantMeta;
use crate::config::LrclibConfig;
use anyhow::Context;
use serde::Deserialize;
use std::future::Future;

/// LRCLIB API response
#[derive(Debug, Deserialize, Clone)]
pub struct LrclibResponse {
    #[allow(dead_code)]
    id: i64,
    #[serde(rename = "trackName")]
    pub track_name: Option<String>,
    #[serde(rename = "artistName")]
    pub artist_name: Option<String>,
    #[serde(default)]
    pub instrumental: bool,
    #[serde(rename = "plainLyrics")]
    pub plain_lyrics: Option<String>,
    #[serde(rename = "syncedLyrics")]
    pub synced_lyrics: Option<String>,
}

impl From<LrclibResponse> for LookupResponse {
    fn from(r: LrclibResponse) -> Self {
        Self {
            synced_lyrics: r.synced_lyrics,
            plain_lyrics: r.plain_lyrics,
        }
    }
}

/// LRCLIB API client
#[derive(Debug, Clone)]
pub struct LrclibClient {
    client: reqwest::Client,
    base_url: String,
}

impl LrclibClient {
    pub fn new(cfg: &LrclibConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(cfg.user_agent.as_str())
            .timeout(std::time::Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("build lrclib http client")?;
        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build the `/get` URL for one variant, only carrying the fields it sets.
    pub fn get_url(&self, variant: &VariantMeta) -> String {
        let mut params: Vec<String> = Vec::new();
        if let Some(track) = &variant.track_name {
            params.push(format!("track_name={}", urlencoding::encode(track)));
        }
        if let Some(artist) = &variant.artist_name {
            params.push(format!("artist_name={}", urlencoding::encode(artist)));
        }
        if let Some(album) = &variant.album_name {
            params.push(format!("album_name={}", urlencoding::encode(album)));
        }
        if let Some(duration) = variant.duration_secs {
            params.push(format!("duration={duration}"));
        }
        if let Some(isrc) = &variant.isrc {
            params.push(format!("isrc={}", urlencoding::encode(isrc)));
        }
        format!("{}/get?{}", self.base_url, params.join("&"))
    }

    /// Get lyrics with exact match
    async fn get_exact(&self, variant: &VariantMeta) -> anyhow::Result<Option<LrclibResponse>> {
        let url = self.get_url(variant);
        let response = self.client.get(&url).send().await?;

        if response.status().is_success() {
            let lyrics: LrclibResponse = response.json().await.context("decode lrclib response")?;
            Ok(Some(lyrics))
        } else if response.status() == reqwest::StatusCode::NOT_FOUND {
            Ok(None)
        } else {
            anyhow::bail!("LRCLIB API error: {}", response.status());
        }
    }
}

impl LyricsLookup for LrclibClient {
    fn lookup(
        &self,
        variant: &VariantMeta,
    ) -> impl Future<Output = anyhow::Result<Option<LookupResponse>>> + Send {
        async move {
            let found = self.get_exact(variant).await?;
            Ok(found.map(|r| {
                if r.instrumental {
                    tracing::debug!(track = ?r.track_name, artist = ?r.artist_name, "instrumental track");
                }
                LookupResponse::from(r)
            }))
        }
    }
}
