//! mpv as an external clock.
//!
//! We either spawn mpv on an audio file or attach to an mpv that is already
//! running with `--input-ipc-server`. Property changes from the IPC stream are
//! published through atomics that the teleprompter polls every frame.

use crate::playback::ExternalClock;
use anyhow::Context;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::UnixStream,
    process::{Child, Command},
};

/// Position and play flag as last reported by mpv.
#[derive(Debug, Clone, Default)]
pub struct MpvClock {
    position_ms: Arc<AtomicU64>,
    playing: Arc<AtomicBool>,
}

impl ExternalClock for MpvClock {
    fn position_ms(&self) -> u64 {
        self.position_ms.load(Ordering::Relaxed)
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum MpvEvent {
    Position { seconds: f64 },
    Paused(bool),
    Ended,
    Error(String),
}

impl MpvClock {
    fn apply(&self, ev: &MpvEvent) {
        match ev {
            MpvEvent::Position { seconds } => {
                let ms = (seconds.max(0.0) * 1000.0).round() as u64;
                self.position_ms.store(ms, Ordering::Relaxed);
            }
            MpvEvent::Paused(paused) => self.playing.store(!paused, Ordering::Relaxed),
            MpvEvent::Ended => self.playing.store(false, Ordering::Relaxed),
            MpvEvent::Error(msg) => tracing::warn!("{msg}"),
        }
    }
}

/// How long mpv gets to create its IPC socket.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub struct MpvHandle {
    child: Option<Child>,
    socket_path: PathBuf,
    writer: tokio::sync::Mutex<tokio::io::WriteHalf<UnixStream>>,
    request_id: AtomicU64,
    clock: MpvClock,
}

impl MpvHandle {
    /// Start mpv on `audio` and follow it.
    pub async fn spawn(audio: &Path, log_file: Option<&Path>) -> anyhow::Result<Self> {
        let socket_path = std::env::temp_dir().join(format!("lyricprompt-mpv-{}.sock", std::process::id()));
        let _ = std::fs::remove_file(&socket_path);

        let mut cmd = Command::new("mpv");
        cmd.args(["--no-video", "--idle=no", "--input-terminal=no", "--really-quiet"]);
        if let Some(p) = log_file {
            cmd.arg(format!("--log-file={}", p.display()));
        }
        let child = cmd
            .arg(format!("--input-ipc-server={}", socket_path.display()))
            .arg(audio)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .context("spawn mpv")?;

        Self::connect(Some(child), socket_path, CONNECT_TIMEOUT).await
    }

    /// Follow an mpv instance someone else started.
    pub async fn attach(socket_path: &Path) -> anyhow::Result<Self> {
        Self::connect(None, socket_path.to_path_buf(), CONNECT_TIMEOUT).await
    }

    async fn connect(
        child: Option<Child>,
        socket_path: PathBuf,
        wait: Duration,
    ) -> anyhow::Result<Self> {
        // mpv creates the socket shortly after starting.
        let stream = match connect_with_retry(&socket_path, wait).await {
            Ok(s) => s,
            Err(e) => {
                // A spawned mpv would keep playing on its own clock.
                if let Some(mut child) = child {
                    if let Err(kill_err) = child.kill().await {
                        tracing::warn!("stop mpv: {kill_err}");
                    }
                    let _ = std::fs::remove_file(&socket_path);
                }
                return Err(e);
            }
        };
        let (reader, writer) = tokio::io::split(stream);

        let clock = MpvClock::default();
        tokio::spawn(read_events_loop(reader, clock.clone()));

        let this = Self {
            child,
            socket_path,
            writer: tokio::sync::Mutex::new(writer),
            request_id: AtomicU64::new(1),
            clock,
        };

        this.command(json!({"command":["request_log_messages", "warn"]}))
            .await?;
        this.command(json!({"command":["observe_property", 1, "time-pos"]}))
            .await?;
        this.command(json!({"command":["observe_property", 2, "pause"]}))
            .await?;
        this.command(json!({"command":["observe_property", 3, "eof-reached"]}))
            .await?;

        Ok(this)
    }

    pub fn clock(&self) -> MpvClock {
        self.clock.clone()
    }

    pub async fn toggle_pause(&self) -> anyhow::Result<()> {
        self.command(json!({"command":["cycle", "pause"]})).await
    }

    async fn command(&self, mut v: serde_json::Value) -> anyhow::Result<()> {
        // Tag requests so we can get structured errors back on the IPC stream.
        if v.get("request_id").is_none() {
            let id = self.request_id.fetch_add(1, Ordering::Relaxed);
            if let serde_json::Value::Object(ref mut o) = v {
                o.insert("request_id".to_string(), serde_json::Value::from(id));
            }
        }
        let mut w = self.writer.lock().await;
        let mut line = serde_json::to_vec(&v).context("encode mpv json")?;
        line.push(b'\n');
        w.write_all(&line).await.context("write mpv ipc")?;
        w.flush().await.context("flush mpv ipc")?;
        Ok(())
    }
}

impl Drop for MpvHandle {
    fn drop(&mut self) {
        // Only tear down what we started.
        if let Some(child) = &mut self.child {
            let _ = child.start_kill();
            let _ = std::fs::remove_file(&self.socket_path);
        }
    }
}

async fn connect_with_retry(path: &Path, wait: Duration) -> anyhow::Result<UnixStream> {
    let deadline = tokio::time::Instant::now() + wait;
    loop {
        match UnixStream::connect(path).await {
            Ok(s) => return Ok(s),
            Err(e) => {
                if tokio::time::Instant::now() > deadline {
                    return Err(e).with_context(|| format!("connect to mpv ipc {}", path.display()));
                }
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        }
    }
}

async fn read_events_loop(reader: tokio::io::ReadHalf<UnixStream>, clock: MpvClock) {
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if let Ok(v) = serde_json::from_str::<serde_json::Value>(&line) {
            if let Some(ev) = map_mpv_event(&v) {
                clock.apply(&ev);
            }
        }
    }
    tracing::debug!("mpv ipc stream closed");
    clock.apply(&MpvEvent::Ended);
}

fn map_mpv_event(v: &serde_json::Value) -> Option<MpvEvent> {
    // mpv command replies: {"request_id":..., "error":"..."}
    if let (Some(_rid), Some(err)) = (v.get("request_id"), v.get("error"))
        && let Some(err_s) = err.as_str()
        && err_s != "success"
    {
        return Some(MpvEvent::Error(format!("mpv ipc error: {err_s}")));
    }

    match v.get("event")?.as_str()? {
        "property-change" => {
            let name = v.get("name")?.as_str()?;
            match name {
                // time-pos is null while nothing is loaded
                "time-pos" => Some(MpvEvent::Position {
                    seconds: v.get("data")?.as_f64()?,
                }),
                "pause" => Some(MpvEvent::Paused(v.get("data")?.as_bool().unwrap_or(false))),
                "eof-reached" => {
                    let eof = v.get("data")?.as_bool().unwrap_or(false);
                    if eof { Some(MpvEvent::Ended) } else { None }
                }
                _ => None,
            }
        }
        "end-file" => {
            let reason = v.get("reason").and_then(|x| x.as_str()).unwrap_or("");
            if reason == "error" {
                let err = v.get("error").and_then(|x| x.as_str()).unwrap_or("unknown");
                tracing::warn!("mpv end-file error: {err}");
            }
            Some(MpvEvent::Ended)
        }
        "log-message" => {
            let level = v.get("level")?.as_str().unwrap_or("info");
            let text = v.get("text")?.as_str().unwrap_or("").trim();
            if (level == "warn" || level == "error") && !text.is_empty() {
                Some(MpvEvent::Error(format!("mpv {level}: {text}")))
            } else {
                None
            }
        }
        _ => None,
    }
}
