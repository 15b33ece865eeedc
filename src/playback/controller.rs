//! Teleprompter controller: clock + active line + auto-scroll.
//!
//! One instance per displayed song. The caller drives it with `tick` once per
//! frame and forwards transport controls and scroll notifications.

use super::clock::{PlaybackClock, PlaybackState};
use super::scroll::{InputDisposition, ScrollCommand, ScrollGuard, ScrollLayout, ScrollObservation};
use crate::lyrics::{LyricLine, locate};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrompterSettings {
    /// Where the active line sits, as a fraction of viewport height from the top.
    pub anchor_fraction: f32,
    pub scroll_lock: bool,
    /// How long scroll reports are attributed to our own last command.
    pub guard_window: Duration,
}

impl Default for PrompterSettings {
    fn default() -> Self {
        Self {
            anchor_fraction: 0.3,
            scroll_lock: true,
            guard_window: Duration::from_millis(350),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// Start, pause or resume depending on the current state.
    Toggle,
    Start,
    Pause,
    Resume,
    Restart,
    Next,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickFrame {
    pub active_index: Option<usize>,
    pub current_time_ms: u64,
    pub playback_state: PlaybackState,
    pub progress: f64,
    pub scroll: Option<ScrollCommand>,
}

#[derive(Debug)]
pub struct Teleprompter {
    lines: Vec<LyricLine>,
    plain_text: Option<String>,
    clock: PlaybackClock,
    layout: ScrollLayout,
    guard: ScrollGuard,
    anchor_fraction: f32,
    active_index: Option<usize>,
    needs_scroll: bool,
}

impl Teleprompter {
    pub fn new(
        lines: Vec<LyricLine>,
        plain_text: Option<String>,
        clock: PlaybackClock,
        settings: PrompterSettings,
    ) -> Self {
        // Unsynced text has no authoritative position to protect.
        let locked = settings.scroll_lock && !lines.is_empty();
        Self {
            lines,
            plain_text,
            clock,
            layout: ScrollLayout::default(),
            guard: ScrollGuard::new(locked, settings.guard_window),
            anchor_fraction: settings.anchor_fraction,
            active_index: None,
            needs_scroll: true,
        }
    }

    pub fn lines(&self) -> &[LyricLine] {
        &self.lines
    }

    pub fn plain_text(&self) -> Option<&str> {
        self.plain_text.as_deref()
    }

    pub fn is_synced(&self) -> bool {
        !self.lines.is_empty()
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active_index
    }

    pub fn state(&self) -> PlaybackState {
        self.clock.state()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.clock.elapsed_ms()
    }

    pub fn duration_ms(&self) -> u64 {
        self.clock.duration_ms()
    }

    pub fn is_delegated(&self) -> bool {
        self.clock.is_delegated()
    }

    pub fn is_scroll_locked(&self) -> bool {
        self.guard.is_locked()
    }

    /// Provide rendered line heights; the next tick re-anchors the active line.
    pub fn set_layout(&mut self, line_heights: &[u32], viewport_height: u32) {
        let layout = ScrollLayout::new(line_heights, viewport_height);
        if layout != self.layout {
            self.layout = layout;
            self.needs_scroll = true;
        }
    }

    pub fn apply(&mut self, transport: Transport, now: Instant) {
        match transport {
            Transport::Toggle => self.toggle(now),
            Transport::Start => self.clock.start(now),
            Transport::Pause => self.clock.pause(now),
            Transport::Resume => self.clock.resume(now),
            Transport::Restart => self.restart(),
            Transport::Next => self.next(now),
        }
    }

    pub fn toggle(&mut self, now: Instant) {
        match self.clock.state() {
            PlaybackState::Idle => self.clock.start(now),
            PlaybackState::Playing => self.clock.pause(now),
            PlaybackState::Paused => self.clock.resume(now),
            PlaybackState::Ended => {}
        }
    }

    pub fn start(&mut self, now: Instant) {
        self.clock.start(now);
    }

    pub fn pause(&mut self, now: Instant) {
        self.clock.pause(now);
    }

    pub fn resume(&mut self, now: Instant) {
        self.clock.resume(now);
    }

    pub fn restart(&mut self) {
        self.clock.restart();
    }

    /// Skip to the line after the active one, clamped to the last line.
    ///
    /// Seeking needs to own the clock, so this does nothing when the time
    /// comes from an external transport.
    pub fn next(&mut self, now: Instant) {
        if self.clock.is_delegated() || self.lines.is_empty() {
            return;
        }
        if self.clock.state() == PlaybackState::Ended {
            return;
        }
        // Elapsed reflects any seek since the last tick; the cached index may not.
        let current = locate(&self.lines, self.clock.elapsed_ms()).unwrap_or(0);
        let next = (current + 1).min(self.lines.len() - 1);
        self.clock.seek(self.lines[next].time_ms, now);
    }

    pub fn tick(&mut self, now: Instant) -> TickFrame {
        let elapsed = self.clock.tick(now);
        let index = locate(&self.lines, elapsed);

        let mut scroll = None;
        if index != self.active_index || self.needs_scroll {
            self.active_index = index;
            scroll = index
                .and_then(|i| self.layout.target_for(i, self.anchor_fraction))
                .map(|target| self.guard.command(target, now));
            if scroll.is_some() {
                self.needs_scroll = false;
            }
        }

        TickFrame {
            active_index: self.active_index,
            current_time_ms: elapsed,
            playback_state: self.clock.state(),
            progress: self.clock.progress(),
            scroll,
        }
    }

    /// Classify a position reported by the display surface.
    pub fn observe_scroll(&mut self, position: u32, now: Instant) -> ScrollObservation {
        self.guard.observe(position, now)
    }

    /// Decide whether a wheel/drag gesture may reach the surface.
    pub fn intercept_manual_scroll(&self) -> InputDisposition {
        self.guard.intercept_manual()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::clock::ExternalClock;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn lines() -> Vec<LyricLine> {
        (0..20)
            .map(|i| LyricLine::new(1_000 + i * 2_000, format!("line {i}")))
            .collect()
    }

    fn prompter() -> Teleprompter {
        let mut p = Teleprompter::new(
            lines(),
            None,
            PlaybackClock::self_timed(60_000),
            PrompterSettings::default(),
        );
        p.set_layout(&[1; 20], 10);
        p
    }

    struct Stuck;

    impl ExternalClock for Stuck {
        fn position_ms(&self) -> u64 {
            4_000
        }

        fn is_playing(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_first_tick_scrolls_to_first_line() {
        let t0 = Instant::now();
        let mut p = prompter();
        let frame = p.tick(t0);
        assert_eq!(frame.active_index, Some(0));
        assert_eq!(frame.playback_state, PlaybackState::Idle);
        assert_eq!(frame.scroll, Some(ScrollCommand { target: 0, smooth: true }));

        // Nothing changed, nothing to scroll.
        assert_eq!(p.tick(t0 + ms(16)).scroll, None);
    }

    #[test]
    fn test_scrolls_only_on_line_change() {
        let t0 = Instant::now();
        let mut p = prompter();
        p.tick(t0);
        p.toggle(t0);

        let frame = p.tick(t0 + ms(2_000));
        assert_eq!(frame.active_index, Some(0));
        assert_eq!(frame.scroll, None);

        let frame = p.tick(t0 + ms(23_000));
        assert_eq!(frame.active_index, Some(11));
        assert_eq!(frame.scroll.map(|s| s.target), Some(8));
        assert_eq!(frame.current_time_ms, 23_000);
    }

    #[test]
    fn test_toggle_cycles_states() {
        let t0 = Instant::now();
        let mut p = prompter();
        p.apply(Transport::Toggle, t0);
        assert_eq!(p.state(), PlaybackState::Playing);
        p.apply(Transport::Toggle, t0 + ms(500));
        assert_eq!(p.state(), PlaybackState::Paused);
        p.apply(Transport::Toggle, t0 + ms(900));
        assert_eq!(p.state(), PlaybackState::Playing);
        p.apply(Transport::Restart, t0 + ms(1_000));
        assert_eq!(p.state(), PlaybackState::Idle);
        assert_eq!(p.tick(t0 + ms(1_500)).current_time_ms, 0);
    }

    #[test]
    fn test_next_seeks_to_following_line() {
        let t0 = Instant::now();
        let mut p = prompter();
        p.start(t0);
        p.tick(t0 + ms(3_500));
        assert_eq!(p.active_index(), Some(1));

        p.next(t0 + ms(3_500));
        let frame = p.tick(t0 + ms(3_500));
        assert_eq!(frame.active_index, Some(2));
        assert_eq!(frame.current_time_ms, 5_000);
        assert_eq!(frame.playback_state, PlaybackState::Playing);
    }

    #[test]
    fn test_next_keeps_paused_and_clamps() {
        let t0 = Instant::now();
        let mut p = prompter();
        p.start(t0);
        p.pause(t0 + ms(100));
        for _ in 0..30 {
            p.next(t0 + ms(200));
            p.tick(t0 + ms(200));
        }
        assert_eq!(p.state(), PlaybackState::Paused);
        assert_eq!(p.active_index(), Some(19));
        assert_eq!(p.elapsed_ms(), 39_000);
    }

    #[test]
    fn test_external_clock_controls_are_noops() {
        let t0 = Instant::now();
        let mut p = Teleprompter::new(
            lines(),
            None,
            PlaybackClock::delegated(Box::new(Stuck), 60_000),
            PrompterSettings::default(),
        );
        let frame = p.tick(t0);
        assert_eq!(frame.active_index, Some(1));
        assert_eq!(frame.playback_state, PlaybackState::Playing);

        for t in [
            Transport::Toggle,
            Transport::Pause,
            Transport::Restart,
            Transport::Next,
        ] {
            p.apply(t, t0);
        }
        let frame = p.tick(t0 + ms(16));
        assert_eq!(frame.active_index, Some(1));
        assert_eq!(frame.current_time_ms, 4_000);
    }

    #[test]
    fn test_layout_change_reanchors() {
        let t0 = Instant::now();
        let mut p = prompter();
        p.tick(t0);
        p.next(t0);
        p.next(t0);
        p.next(t0);
        p.next(t0);
        p.next(t0);
        assert_eq!(p.tick(t0).scroll.map(|s| s.target), Some(2));

        p.set_layout(&[2; 20], 10);
        let frame = p.tick(t0);
        assert_eq!(frame.scroll.map(|s| s.target), Some(7));
    }

    #[test]
    fn test_locked_reverts_interference() {
        let t0 = Instant::now();
        let mut p = prompter();
        p.start(t0);
        p.tick(t0 + ms(23_000));
        assert_eq!(p.intercept_manual_scroll(), InputDisposition::Prevent);
        assert_eq!(
            p.observe_scroll(2, t0 + ms(23_100)),
            ScrollObservation::Programmatic
        );
        assert_eq!(
            p.observe_scroll(2, t0 + ms(24_000)),
            ScrollObservation::Revert(8)
        );
    }

    #[test]
    fn test_plain_text_is_never_locked() {
        let p = Teleprompter::new(
            Vec::new(),
            Some("just words".into()),
            PlaybackClock::self_timed(60_000),
            PrompterSettings::default(),
        );
        assert!(!p.is_synced());
        assert!(!p.is_scroll_locked());
        assert_eq!(p.intercept_manual_scroll(), InputDisposition::Allow);
    }

    #[test]
    fn test_empty_lines_have_no_active_index() {
        let mut p = Teleprompter::new(
            Vec::new(),
            None,
            PlaybackClock::self_timed(1_000),
            PrompterSettings::default(),
        );
        let frame = p.tick(Instant::now());
        assert_eq!(frame.active_index, None);
        assert_eq!(frame.scroll, None);
    }
}
