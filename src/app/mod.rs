pub mod actions;
pub mod events;
pub mod state;

use crate::config::Config;
use crate::input::{self, KeyBindings};
use crate::lyrics::{self, LrclibClient, LyricSearchResult, SearchGeneration, SearchTicket};
use crate::playback::{
    InputDisposition, PlaybackClock, PlaybackState, ScrollObservation, Teleprompter, Transport,
};
use crate::player::mpv::MpvHandle;
use crate::setlist::Setlist;
use crate::tui::{self, TuiTerminal, widgets::prompter as lyric_view};
use actions::Action;
use events::{Event, LyricsEvent};
use state::{AppState, Focus, ScrollSurface, Toast};
use std::path::PathBuf;
use std::time::Instant;
use tokio::sync::mpsc;

/// Where the song position comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerSource {
    /// Built-in timer driven by the transport keys.
    Timer,
    /// Spawn mpv on this file and follow it.
    Audio(PathBuf),
    /// Follow an mpv that is already running.
    Socket(PathBuf),
}

pub struct App {
    cfg: Config,
    setlist: Setlist,
    state: AppState,
    bindings: KeyBindings,
    lrclib: LrclibClient,
    generation: SearchGeneration,
    current_ticket: Option<SearchTicket>,
    player: PlayerSource,
    mpv: Option<MpvHandle>,
    /// Viewport the current line heights were computed for.
    layout_key: Option<(u16, u16)>,
}

impl App {
    pub fn new(cfg: Config, setlist: Setlist, player: PlayerSource) -> anyhow::Result<Self> {
        let bindings = KeyBindings::from_config(&cfg.keys)?;
        let lrclib = LrclibClient::new(&cfg.lrclib)?;
        let songs = setlist.songs.iter().map(|s| s.display_name()).collect();
        let state = AppState::new(setlist.name.clone(), songs);

        Ok(Self {
            cfg,
            setlist,
            state,
            bindings,
            lrclib,
            generation: SearchGeneration::new(),
            current_ticket: None,
            player,
            mpv: None,
            layout_key: None,
        })
    }

    pub async fn run(&mut self, terminal: &mut TuiTerminal) -> anyhow::Result<()> {
        let (tx, mut rx) = mpsc::channel::<Event>(256);

        input::spawn_input_task(tx.clone(), self.cfg.input.mouse);
        spawn_ticker(tx.clone(), self.cfg.prompter.frame_interval());

        self.connect_player().await;

        tui::draw(terminal, &self.bindings, &mut self.state)?;

        if !self.setlist.songs.is_empty() {
            self.load_song(0, &tx);
        }

        while let Some(ev) = rx.recv().await {
            match ev {
                Event::Input(input_ev) => {
                    if let Some(action) =
                        input::map_input_to_action(&self.state, &self.bindings, input_ev)
                    {
                        self.handle_action(action, &tx).await;
                    }
                }
                Event::Tick => self.on_tick(Instant::now()),
                Event::Lyrics(le) => self.handle_lyrics(le),
            }

            if self.state.should_quit {
                break;
            }

            tui::draw(terminal, &self.bindings, &mut self.state)?;
        }

        // Late results have nowhere to go.
        self.generation.cancel_all();
        Ok(())
    }

    async fn connect_player(&mut self) {
        let mpv_log = self.cfg.paths.data_dir.join("mpv.log");
        let handle = match &self.player {
            PlayerSource::Timer => return,
            PlayerSource::Audio(path) => MpvHandle::spawn(path, Some(&mpv_log)).await,
            PlayerSource::Socket(path) => MpvHandle::attach(path).await,
        };
        match handle {
            Ok(h) => {
                tracing::info!(source = ?self.player, "following mpv");
                self.mpv = Some(h);
            }
            Err(e) => {
                tracing::warn!("mpv unavailable: {e:#}");
                self.state.toast = Some(Toast::warning(format!(
                    "mpv unavailable, using the built-in timer: {e:#}"
                )));
            }
        }
    }

    async fn handle_action(&mut self, action: Action, tx: &mpsc::Sender<Event>) {
        match action {
            Action::Transport(t) => self.transport(t).await,
            Action::LoadSelected => {
                if let Some(index) = self.state.selected_song() {
                    self.close_filter();
                    self.load_song(index, tx);
                }
            }
            Action::NextSong => {
                let next = self.state.loaded_song.map_or(0, |i| i + 1);
                if next < self.setlist.songs.len() {
                    self.load_song(next, tx);
                    self.select_song(next);
                }
            }
            Action::PrevSong => {
                if let Some(prev) = self.state.loaded_song.and_then(|i| i.checked_sub(1)) {
                    self.load_song(prev, tx);
                    self.select_song(prev);
                }
            }
            Action::RetrySearch => {
                if let Some(index) = self.state.loaded_song {
                    self.load_song(index, tx);
                }
            }
            Action::ScrollRows(rows) => self.manual_scroll(rows),
            other => self.reduce(other),
        }
    }

    fn reduce(&mut self, action: Action) {
        match action {
            Action::Quit => self.state.should_quit = true,
            Action::ListUp => self.state.select_prev(),
            Action::ListDown => self.state.select_next(),
            Action::OpenFilter => self.state.focus = Focus::Filter,
            Action::CloseFilter => self.close_filter(),
            Action::FilterChar(c) => {
                self.state.filter.push(c);
                self.state.selected = 0;
            }
            Action::FilterBackspace => {
                self.state.filter.pop();
                self.state.selected = 0;
            }
            Action::Resize => {
                // Geometry is re-read while drawing.
            }
            Action::Transport(_)
            | Action::LoadSelected
            | Action::NextSong
            | Action::PrevSong
            | Action::RetrySearch
            | Action::ScrollRows(_) => {} // handled in handle_action
        }
    }

    /// Leave text entry, keeping the highlighted song selected in the full list.
    fn close_filter(&mut self) {
        let song = self.state.selected_song();
        self.state.focus = Focus::Prompter;
        self.state.filter.clear();
        if let Some(song) = song {
            self.state.selected = song;
        }
    }

    fn select_song(&mut self, index: usize) {
        if let Some(pos) = self.state.visible_songs().iter().position(|&i| i == index) {
            self.state.selected = pos;
        }
    }

    async fn transport(&mut self, transport: Transport) {
        let now = Instant::now();
        let Some(prompter) = self.state.prompter.as_mut() else {
            return;
        };

        if !prompter.is_delegated() {
            prompter.apply(transport, now);
            return;
        }

        // The position belongs to mpv; only play/pause can be forwarded.
        match (transport, &self.mpv) {
            (Transport::Toggle, Some(mpv)) => {
                if let Err(e) = mpv.toggle_pause().await {
                    tracing::warn!("mpv pause toggle failed: {e:#}");
                    self.state.toast = Some(Toast::warning(format!("mpv: {e:#}")));
                }
            }
            _ => self.state.status = "Playback position is controlled by mpv".to_string(),
        }
    }

    fn manual_scroll(&mut self, rows: i32) {
        let Some(prompter) = &self.state.prompter else {
            return;
        };
        match prompter.intercept_manual_scroll() {
            InputDisposition::Allow => {
                let max = self.state.max_scroll();
                self.state.surface.nudge(rows, max);
            }
            InputDisposition::Prevent => {
                self.state.status = "Scrolling follows the song while synced".to_string();
            }
        }
    }

    fn load_song(&mut self, index: usize, tx: &mpsc::Sender<Event>) {
        let Some(song) = self.setlist.songs.get(index).cloned() else {
            return;
        };
        let identity = match song.identity() {
            Ok(identity) => identity,
            Err(e) => {
                self.state.toast = Some(Toast::warning(format!("{e:#}")));
                return;
            }
        };

        // Supersedes any search still running for the previous song.
        let ticket = self.generation.begin();
        self.current_ticket = Some(ticket.clone());

        self.state.loaded_song = Some(index);
        self.state.prompter = None;
        self.state.frame = None;
        self.state.warning = None;
        self.state.attempt_summary = None;
        self.state.status.clear();
        self.state.lyrics_loading = true;
        self.state.surface = ScrollSurface::default();
        self.state.content_rows = 0;
        self.layout_key = None;

        let tx = tx.clone();
        let name = song.display_name();

        if let Some(path) = song.lrc {
            tracing::info!(song = %name, path = %path.display(), "loading lyrics file");
            tokio::spawn(async move {
                let read = tokio::task::spawn_blocking({
                    let path = path.clone();
                    move || std::fs::read_to_string(path)
                })
                .await;
                let ev = match read {
                    Ok(Ok(text)) => LyricsEvent::Loaded {
                        ticket: ticket.id(),
                        song_index: index,
                        result: lyrics::from_text(&text),
                    },
                    Ok(Err(e)) => LyricsEvent::Failed {
                        ticket: ticket.id(),
                        song_index: index,
                        message: format!("read {}: {e}", path.display()),
                    },
                    Err(e) => LyricsEvent::Failed {
                        ticket: ticket.id(),
                        song_index: index,
                        message: format!("read {}: {e}", path.display()),
                    },
                };
                let _ = tx.send(Event::Lyrics(ev)).await;
            });
            return;
        }

        tracing::info!(song = %name, ticket = ticket.id(), "searching lyrics");
        let lrclib = self.lrclib.clone();
        let max_attempts = self.cfg.search.max_attempts;
        tokio::spawn(async move {
            let Some(result) = lyrics::search_lyrics(&lrclib, &identity, max_attempts, &ticket).await
            else {
                return;
            };
            let _ = tx
                .send(Event::Lyrics(LyricsEvent::Loaded {
                    ticket: ticket.id(),
                    song_index: index,
                    result,
                }))
                .await;
        });
    }

    fn handle_lyrics(&mut self, ev: LyricsEvent) {
        let (ticket, song_index) = match &ev {
            LyricsEvent::Loaded {
                ticket, song_index, ..
            }
            | LyricsEvent::Failed {
                ticket, song_index, ..
            } => (*ticket, *song_index),
        };

        if !is_live_result(
            self.current_ticket.as_ref(),
            self.state.loaded_song,
            ticket,
            song_index,
        ) {
            tracing::debug!(ticket, song_index, "dropping stale lyrics result");
            return;
        }
        self.state.lyrics_loading = false;

        match ev {
            LyricsEvent::Loaded { result, .. } => self.install_lyrics(song_index, result),
            LyricsEvent::Failed { message, .. } => {
                tracing::warn!(song_index, "lyrics unavailable: {message}");
                self.state.warning = Some(message);
                self.install_lyrics(song_index, LyricSearchResult::default());
            }
        }
    }

    fn install_lyrics(&mut self, song_index: usize, result: LyricSearchResult) {
        let duration_ms = self
            .setlist
            .songs
            .get(song_index)
            .and_then(|s| s.identity().ok())
            .map_or(0, |id| id.duration_ms);

        let clock = match &self.mpv {
            Some(mpv) => PlaybackClock::delegated(Box::new(mpv.clock()), duration_ms),
            None => PlaybackClock::self_timed(duration_ms),
        };

        self.state.attempt_summary = attempt_summary(&result);
        if result.warning.is_some() {
            self.state.warning = result.warning.clone();
        }

        let LyricSearchResult {
            lines,
            plain_text_fallback,
            ..
        } = result;
        tracing::info!(
            song_index,
            lines = lines.len(),
            unsynced = plain_text_fallback.is_some(),
            "lyrics ready"
        );

        self.state.prompter = Some(Teleprompter::new(
            lines,
            plain_text_fallback,
            clock,
            self.cfg.prompter.settings(),
        ));
        self.state.surface = ScrollSurface::default();
        self.layout_key = None;
    }

    fn on_tick(&mut self, now: Instant) {
        let Some(prompter) = self.state.prompter.as_mut() else {
            return;
        };

        let key = (self.state.viewport_width, self.state.viewport_height);
        if key.0 > 0 && key.1 > 0 && self.layout_key != Some(key) {
            let width = key.0 as usize;
            if prompter.is_synced() {
                let heights = lyric_view::wrapped_heights(prompter.lines(), width);
                self.state.content_rows = heights.iter().sum();
                prompter.set_layout(&heights, key.1 as u32);
            } else {
                self.state.content_rows = prompter
                    .plain_text()
                    .map_or(0, |t| lyric_view::plain_rows(t, width));
            }
            self.layout_key = Some(key);
        }

        let previous = self.state.frame.map(|f| f.playback_state);
        let frame = prompter.tick(now);

        if let Some(cmd) = frame.scroll {
            self.state.surface.scroll_to(cmd.target, cmd.smooth);
        }
        self.state.surface.step();

        if prompter.is_synced()
            && let ScrollObservation::Revert(target) =
                prompter.observe_scroll(self.state.surface.position(), now)
        {
            self.state.surface.jump(target);
        }

        if frame.playback_state == PlaybackState::Ended && previous != Some(PlaybackState::Ended)
        {
            tracing::info!(song_index = ?self.state.loaded_song, "song ended");
            if self.state.loaded_song.is_some_and(|i| i + 1 < self.setlist.songs.len()) {
                self.state.toast = Some(Toast::info("Song ended, ] loads the next one"));
            }
        }
        self.state.frame = Some(frame);
    }
}

fn spawn_ticker(tx: mpsc::Sender<Event>, every: std::time::Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            if tx.send(Event::Tick).await.is_err() {
                break;
            }
        }
    });
}

/// One-line account of how the lyrics were found.
/// A lyrics result counts only if its search is still the latest one and the
/// song it was started for is still loaded.
fn is_live_result(
    current: Option<&SearchTicket>,
    loaded_song: Option<usize>,
    ticket: u64,
    song_index: usize,
) -> bool {
    current.is_some_and(|t| t.id() == ticket && t.is_current())
        && loaded_song == Some(song_index)
}

fn attempt_summary(result: &LyricSearchResult) -> Option<String> {
    if result.attempts.is_empty() {
        return None;
    }
    let tried = result.attempts.len();
    let queries = if tried == 1 { "query" } else { "queries" };
    let summary = match result
        .successful_variant
        .and_then(|i| result.attempts.get(i))
    {
        Some(hit) => format!("{tried} {queries}, matched {}", hit.variant.reason.label()),
        None => format!("{tried} {queries}, no synced match"),
    };
    Some(summary)
}
