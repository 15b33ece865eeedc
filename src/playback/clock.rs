//! Playback clock.
//!
//! Tracks elapsed performance time either from its own timer or by mirroring
//! an external transport. Nothing here plays audio.

use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing,
    Paused,
    Ended,
}

impl PlaybackState {
    pub fn label(self) -> &'static str {
        match self {
            PlaybackState::Idle => "Ready",
            PlaybackState::Playing => "Playing",
            PlaybackState::Paused => "Paused",
            PlaybackState::Ended => "Ended",
        }
    }
}

/// Read-only time source owned by someone else (a media player, a DAW).
pub trait ExternalClock {
    fn position_ms(&self) -> u64;
    fn is_playing(&self) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
struct SelfTimed {
    offset_ms: u64,
    started_at: Option<Instant>,
}

impl SelfTimed {
    fn elapsed(&self, now: Instant) -> u64 {
        let running = self
            .started_at
            .map(|t| now.saturating_duration_since(t).as_millis() as u64)
            .unwrap_or(0);
        self.offset_ms.saturating_add(running)
    }
}

enum ClockSource {
    SelfTimed(SelfTimed),
    Delegated(Box<dyn ExternalClock>),
}

impl std::fmt::Debug for ClockSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClockSource::SelfTimed(s) => f.debug_tuple("SelfTimed").field(s).finish(),
            ClockSource::Delegated(_) => f.write_str("Delegated"),
        }
    }
}

#[derive(Debug)]
pub struct PlaybackClock {
    source: ClockSource,
    state: PlaybackState,
    elapsed_ms: u64,
    duration_ms: u64,
}

impl PlaybackClock {
    pub fn self_timed(duration_ms: u64) -> Self {
        Self::new(ClockSource::SelfTimed(SelfTimed::default()), duration_ms)
    }

    pub fn delegated(clock: Box<dyn ExternalClock>, duration_ms: u64) -> Self {
        Self::new(ClockSource::Delegated(clock), duration_ms)
    }

    fn new(source: ClockSource, duration_ms: u64) -> Self {
        Self {
            source,
            state: PlaybackState::Idle,
            elapsed_ms: 0,
            duration_ms,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn is_delegated(&self) -> bool {
        matches!(self.source, ClockSource::Delegated(_))
    }

    /// Fraction of the song elapsed, in `0.0..=1.0`.
    pub fn progress(&self) -> f64 {
        if self.duration_ms == 0 {
            return 0.0;
        }
        (self.elapsed_ms as f64 / self.duration_ms as f64).clamp(0.0, 1.0)
    }

    pub fn start(&mut self, now: Instant) {
        if self.state != PlaybackState::Idle {
            return;
        }
        if let ClockSource::SelfTimed(timer) = &mut self.source {
            timer.started_at = Some(now);
            self.state = PlaybackState::Playing;
        }
    }

    pub fn pause(&mut self, now: Instant) {
        if self.state != PlaybackState::Playing {
            return;
        }
        if let ClockSource::SelfTimed(timer) = &mut self.source {
            timer.offset_ms = timer.elapsed(now);
            timer.started_at = None;
            self.elapsed_ms = timer.offset_ms;
            self.state = PlaybackState::Paused;
        }
    }

    pub fn resume(&mut self, now: Instant) {
        if self.state != PlaybackState::Paused {
            return;
        }
        if let ClockSource::SelfTimed(timer) = &mut self.source {
            timer.started_at = Some(now);
            self.state = PlaybackState::Playing;
        }
    }

    /// Back to zero and `Idle`. Also leaves `Ended`.
    pub fn restart(&mut self) {
        if let ClockSource::SelfTimed(timer) = &mut self.source {
            *timer = SelfTimed::default();
            self.elapsed_ms = 0;
            self.state = PlaybackState::Idle;
        }
    }

    /// Jump the self-timed clock to `target_ms`, keeping the current state.
    pub fn seek(&mut self, target_ms: u64, now: Instant) {
        if self.state == PlaybackState::Ended {
            return;
        }
        let target_ms = if self.duration_ms > 0 {
            target_ms.min(self.duration_ms)
        } else {
            target_ms
        };
        if let ClockSource::SelfTimed(timer) = &mut self.source {
            timer.offset_ms = target_ms;
            if timer.started_at.is_some() {
                timer.started_at = Some(now);
            }
            self.elapsed_ms = target_ms;
        }
    }

    /// Advance to `now` and return the authoritative elapsed time.
    pub fn tick(&mut self, now: Instant) -> u64 {
        match &mut self.source {
            ClockSource::SelfTimed(timer) => {
                if self.state == PlaybackState::Playing {
                    self.elapsed_ms = timer.elapsed(now);
                    if self.duration_ms > 0 && self.elapsed_ms >= self.duration_ms {
                        self.elapsed_ms = self.duration_ms;
                        timer.offset_ms = self.duration_ms;
                        timer.started_at = None;
                        self.state = PlaybackState::Ended;
                    }
                }
            }
            ClockSource::Delegated(external) => {
                let position = external.position_ms();
                let playing = external.is_playing();
                self.elapsed_ms = if self.duration_ms > 0 {
                    position.min(self.duration_ms)
                } else {
                    position
                };
                self.state = if self.duration_ms > 0 && position >= self.duration_ms {
                    PlaybackState::Ended
                } else if playing {
                    PlaybackState::Playing
                } else {
                    PlaybackState::Paused
                };
            }
        }
        self.elapsed_ms
    }
}
