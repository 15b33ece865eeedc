use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::playback::PrompterSettings;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub lrclib: LrclibConfig,
    pub search: SearchConfig,
    pub prompter: PrompterConfig,
    pub keys: KeysConfig,
    pub input: InputConfig,
    pub paths: PathsConfig,
    pub player: PlayerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LrclibConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Upper bound on lookups per song, whatever the number of variants.
    pub max_attempts: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrompterConfig {
    /// Active line position as a fraction of the viewport height (0.0 = top).
    pub anchor_fraction: f32,
    /// Milliseconds during which scroll reports count as our own scroll.
    pub scroll_guard_ms: u64,
    /// Reject manual scrolling while synced lyrics are shown.
    pub scroll_lock: bool,
    /// Frame interval of the UI loop.
    pub frame_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeysConfig {
    pub enabled: bool,
    /// Start / pause / resume
    pub toggle: String,
    pub restart: String,
    pub next: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub mouse: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// mpv IPC socket to follow instead of the built-in timer
    /// (mpv started with `--input-ipc-server=<path>`).
    pub mpv_socket: Option<PathBuf>,
}

impl Default for LrclibConfig {
    fn default() -> Self {
        Self {
            base_url: "https://lrclib.net/api".to_string(),
            user_agent: concat!("lyricprompt/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 10,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { max_attempts: 8 }
    }
}

impl Default for PrompterConfig {
    fn default() -> Self {
        Self {
            anchor_fraction: 0.3,
            scroll_guard_ms: 350,
            scroll_lock: true,
            frame_ms: 33,
        }
    }
}

impl PrompterConfig {
    pub fn settings(&self) -> PrompterSettings {
        PrompterSettings {
            anchor_fraction: self.anchor_fraction.clamp(0.0, 1.0),
            scroll_lock: self.scroll_lock,
            guard_window: Duration::from_millis(self.scroll_guard_ms),
        }
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_ms.max(1))
    }
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            toggle: "space".to_string(),
            restart: "r".to_string(),
            next: "n".to_string(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self { mouse: true }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let proj = ProjectDirs::from("dev", "lyricprompt", "lyricprompt");
        let data_dir = proj
            .as_ref()
            .map(|p| p.data_dir().to_path_buf())
            .unwrap_or_else(|| std::env::temp_dir().join("lyricprompt"));
        Self { data_dir }
    }
}

pub fn save(cfg: &Config, override_path: Option<&Path>) -> anyhow::Result<()> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create dir {}", parent.display()))?;
    }
    let raw = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&path, raw).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let proj = ProjectDirs::from("dev", "lyricprompt", "lyricprompt")
        .context("ProjectDirs unavailable")?;
    Ok(proj.config_dir().join("config.toml"))
}

pub fn load(override_path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    if !path.exists() {
        let cfg = Config::default();
        save(&cfg, Some(&path)).context("write default config")?;
        return Ok(cfg);
    }

    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let cfg = toml::from_str::<Config>(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}
