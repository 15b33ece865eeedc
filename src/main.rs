mod app;
mod config;
mod input;
mod lyrics;
mod playback;
mod player;
mod setlist;
mod tui;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;

#[derive(Debug, Parser)]
#[command(name = "lyricprompt", version, about = "Synced-lyrics teleprompter for live performance")]
struct Cli {
    /// Override config file path.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the teleprompter for a setlist.
    Play {
        /// Setlist TOML file.
        setlist: Option<PathBuf>,

        /// Play this audio file with mpv and follow its position.
        #[arg(long, conflicts_with = "mpv_socket")]
        audio: Option<PathBuf>,

        /// Follow an mpv started with `--input-ipc-server=<PATH>`.
        #[arg(long)]
        mpv_socket: Option<PathBuf>,

        /// Single song from a local LRC file (instead of a setlist).
        #[arg(long, conflicts_with = "setlist")]
        lrc: Option<PathBuf>,

        /// Song length for `--lrc`, e.g. 3:45.
        #[arg(long, requires = "lrc")]
        duration: Option<String>,
    },

    /// Search LRCLIB for one song and print what was found (headless).
    Fetch {
        #[command(flatten)]
        song: SongArgs,

        /// Stop after this many query variants.
        #[arg(long)]
        max_attempts: Option<usize>,
    },

    /// Parse an LRC file and print the timed lines.
    Parse { file: PathBuf },

    /// Print the query variants that would be tried for a song.
    Variants {
        #[command(flatten)]
        song: SongArgs,
    },
}

#[derive(Debug, Args)]
struct SongArgs {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    artist: Option<String>,
    #[arg(long)]
    album: Option<String>,
    #[arg(long)]
    isrc: Option<String>,
    /// Song length: 3:45, 1:02:03 or seconds.
    #[arg(long)]
    duration: String,
}

impl SongArgs {
    fn identity(&self) -> anyhow::Result<lyrics::SongIdentity> {
        let duration_ms = setlist::parse_duration(&self.duration)
            .with_context(|| format!("invalid duration {:?}", self.duration))?;
        Ok(lyrics::SongIdentity {
            title: self.title.clone(),
            artist: self.artist.clone(),
            album: self.album.clone(),
            isrc: self.isrc.clone(),
            duration_ms,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref()).context("load config")?;
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };

    match cli.command {
        Command::Play {
            setlist: setlist_path,
            audio,
            mpv_socket,
            lrc,
            duration,
        } => {
            init_file_logging(&cfg, level)?;

            let setlist = match (setlist_path, lrc) {
                (Some(path), None) => setlist::Setlist::load(&path)?,
                (None, Some(lrc)) => {
                    let title = lrc
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned());
                    setlist::Setlist::single(setlist::SetlistSong {
                        title,
                        artist: None,
                        album: None,
                        isrc: None,
                        duration: duration.unwrap_or_else(|| "0".to_string()),
                        lrc: Some(lrc),
                    })
                }
                _ => bail!("give a setlist file or --lrc"),
            };
            setlist_sanity(&setlist)?;

            let player = match (audio, mpv_socket.or_else(|| cfg.player.mpv_socket.clone())) {
                (Some(audio), _) => app::PlayerSource::Audio(audio),
                (None, Some(socket)) => app::PlayerSource::Socket(socket),
                (None, None) => app::PlayerSource::Timer,
            };

            let mut app = app::App::new(cfg.clone(), setlist, player)?;
            let mut terminal = tui::TerminalGuard::enter(cfg.input.mouse).context("init terminal")?;
            app.run(terminal.terminal_mut()).await?;
        }
        Command::Fetch { song, max_attempts } => {
            init_stderr_logging(level);
            let identity = song.identity()?;
            let client = lyrics::LrclibClient::new(&cfg.lrclib)?;
            let ticket = lyrics::SearchGeneration::new().begin();
            let max_attempts = max_attempts.unwrap_or(cfg.search.max_attempts);

            let Some(result) = lyrics::search_lyrics(&client, &identity, max_attempts, &ticket).await
            else {
                bail!("search cancelled");
            };
            print_search(&result);
        }
        Command::Parse { file } => {
            init_stderr_logging(level);
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("read {}", file.display()))?;
            let result = lyrics::from_text(&raw);
            if let Some(w) = &result.warning {
                eprintln!("warning: {w}");
            }
            println!("{}", lyrics::parser::to_lrc(&result.lines));
        }
        Command::Variants { song } => {
            init_stderr_logging(level);
            let identity = song.identity()?;
            for (i, v) in lyrics::variants::build_variants(&identity).iter().enumerate() {
                println!("{:>2}. {v}", i + 1);
            }
        }
    }

    Ok(())
}

fn init_stderr_logging(level: Level) {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

/// The TUI owns the terminal, so logs go to a file in the data dir.
fn init_file_logging(cfg: &config::Config, level: Level) -> anyhow::Result<()> {
    let dir = &cfg.paths.data_dir;
    std::fs::create_dir_all(dir).with_context(|| format!("create dir {}", dir.display()))?;
    let path = dir.join("lyricprompt.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(level)
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(file))
        .init();
    Ok(())
}

fn setlist_sanity(setlist: &setlist::Setlist) -> anyhow::Result<()> {
    if setlist.songs.is_empty() {
        bail!("setlist has no songs");
    }
    for song in &setlist.songs {
        if let Some(lrc) = &song.lrc
            && !lrc.exists()
        {
            tracing::warn!(song = %song.display_name(), path = %lrc.display(), "lyrics file missing");
        }
    }
    Ok(())
}

fn print_search(result: &lyrics::LyricSearchResult) {
    for (i, attempt) in result.attempts.iter().enumerate() {
        let outcome = if !attempt.succeeded_transport {
            "error"
        } else if attempt.had_synced_result {
            "synced"
        } else if attempt.had_plain_result {
            "plain"
        } else {
            "none"
        };
        println!("{:>2}. {} -> {outcome}", i + 1, attempt.query_description);
    }
    if let Some(w) = &result.warning {
        println!("warning: {w}");
    }
    println!();

    if result.is_synced() {
        println!("{}", lyrics::parser::to_lrc(&result.lines));
    } else if let Some(text) = &result.plain_text_fallback {
        println!("{text}");
    }
}
