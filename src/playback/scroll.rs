//! Auto-scroll targets and the scroll lock.
//!
//! The lock is a guarded write: we remember the last position we commanded and
//! when we commanded it. Position reports inside the guard window belong to our
//! own smooth scroll, and so does every report that is closer to the target
//! than the one before it, which keeps a long ease from tripping the lock.
//! Anything else that disagrees with the commanded target is user
//! interference and gets reverted.

use std::time::{Duration, Instant};

/// Vertical layout of the rendered lyric lines, in surface units (rows, px).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrollLayout {
    /// Top offset of every line.
    offsets: Vec<u32>,
    content_height: u32,
    viewport_height: u32,
}

impl ScrollLayout {
    pub fn new(line_heights: &[u32], viewport_height: u32) -> Self {
        let mut offsets = Vec::with_capacity(line_heights.len());
        let mut acc: u32 = 0;
        for h in line_heights {
            offsets.push(acc);
            acc = acc.saturating_add(*h);
        }
        Self {
            offsets,
            content_height: acc,
            viewport_height,
        }
    }

    pub fn max_scroll(&self) -> u32 {
        self.content_height.saturating_sub(self.viewport_height)
    }

    pub fn line_offset(&self, index: usize) -> Option<u32> {
        self.offsets.get(index).copied()
    }

    /// Scroll position that puts line `index` at `anchor` (fraction of the
    /// viewport from the top), clamped to the scrollable range.
    pub fn target_for(&self, index: usize, anchor: f32) -> Option<u32> {
        let offset = self.line_offset(index)?;
        let lead = (self.viewport_height as f32 * anchor.clamp(0.0, 1.0)).round() as u32;
        Some(offset.saturating_sub(lead).min(self.max_scroll()))
    }
}

/// A programmatic scroll request for the display surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollCommand {
    pub target: u32,
    pub smooth: bool,
}

/// How the controller classifies a reported scroll position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollObservation {
    /// Caused by our own command (in flight or settled).
    Programmatic,
    /// Someone else moved the view and the lock is off; leave it.
    UserScrolled(u32),
    /// Someone else moved the view and the lock is on; snap back here.
    Revert(u32),
}

/// Answer to a wheel or drag gesture before it reaches the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputDisposition {
    Allow,
    Prevent,
}

#[derive(Debug, Clone)]
pub struct ScrollGuard {
    locked: bool,
    guard_window: Duration,
    last_target: Option<u32>,
    commanded_at: Option<Instant>,
    last_seen: Option<u32>,
}

impl ScrollGuard {
    pub fn new(locked: bool, guard_window: Duration) -> Self {
        Self {
            locked,
            guard_window,
            last_target: None,
            commanded_at: None,
            last_seen: None,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Record a programmatic scroll and hand back the command to issue.
    pub fn command(&mut self, target: u32, now: Instant) -> ScrollCommand {
        self.last_target = Some(target);
        self.commanded_at = Some(now);
        ScrollCommand {
            target,
            smooth: true,
        }
    }

    fn in_guard_window(&self, now: Instant) -> bool {
        self.commanded_at
            .is_some_and(|at| now.saturating_duration_since(at) < self.guard_window)
    }

    pub fn observe(&mut self, position: u32, now: Instant) -> ScrollObservation {
        let previous = self.last_seen.replace(position);
        let Some(target) = self.last_target else {
            return if self.locked {
                ScrollObservation::Revert(0)
            } else {
                ScrollObservation::UserScrolled(position)
            };
        };
        let converging =
            previous.is_some_and(|p| position.abs_diff(target) < p.abs_diff(target));
        if converging {
            self.commanded_at = Some(now);
        }
        if position == target || converging || self.in_guard_window(now) {
            ScrollObservation::Programmatic
        } else if self.locked {
            ScrollObservation::Revert(target)
        } else {
            ScrollObservation::UserScrolled(position)
        }
    }

    pub fn intercept_manual(&self) -> InputDisposition {
        if self.locked {
            InputDisposition::Prevent
        } else {
            InputDisposition::Allow
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_offsets() {
        let layout = ScrollLayout::new(&[1, 2, 1, 3], 4);
        assert_eq!(layout.line_offset(0), Some(0));
        assert_eq!(layout.line_offset(1), Some(1));
        assert_eq!(layout.line_offset(3), Some(4));
        assert_eq!(layout.line_offset(4), None);
        assert_eq!(layout.max_scroll(), 3);
    }

    #[test]
    fn test_target_anchored_and_clamped() {
        let heights = vec![1; 40];
        let layout = ScrollLayout::new(&heights, 10);
        // 30% of 10 rows leaves the active line 3 rows from the top.
        assert_eq!(layout.target_for(0, 0.3), Some(0));
        assert_eq!(layout.target_for(2, 0.3), Some(0));
        assert_eq!(layout.target_for(20, 0.3), Some(17));
        assert_eq!(layout.target_for(39, 0.3), Some(30));
        assert_eq!(layout.target_for(40, 0.3), None);
    }

    #[test]
    fn test_short_content_never_scrolls() {
        let layout = ScrollLayout::new(&[1, 1, 1], 10);
        assert_eq!(layout.target_for(2, 0.3), Some(0));
    }

    #[test]
    fn test_guard_window_suppresses_own_scroll() {
        let t0 = Instant::now();
        let mut guard = ScrollGuard::new(true, Duration::from_millis(300));
        guard.command(12, t0);

        assert_eq!(
            guard.observe(7, t0 + Duration::from_millis(100)),
            ScrollObservation::Programmatic
        );
        assert_eq!(
            guard.observe(12, t0 + Duration::from_secs(5)),
            ScrollObservation::Programmatic
        );
        assert_eq!(
            guard.observe(3, t0 + Duration::from_millis(400)),
            ScrollObservation::Revert(12)
        );
    }

    #[test]
    fn test_long_ease_outlives_guard_window() {
        let t0 = Instant::now();
        let frame = Duration::from_millis(33);
        let mut guard = ScrollGuard::new(true, Duration::from_millis(350));
        guard.command(100, t0);

        // Same easing as the lyric view: 35% of the remaining distance per frame.
        let mut position = 0.0f32;
        let mut now = t0;
        while position.round() as u32 != 100 {
            position += (100.0 - position) * 0.35;
            now += frame;
            assert_eq!(
                guard.observe(position.round() as u32, now),
                ScrollObservation::Programmatic
            );
        }
        assert!(now.duration_since(t0) > Duration::from_millis(350));
    }

    #[test]
    fn test_stalled_ease_is_reverted() {
        let t0 = Instant::now();
        let mut guard = ScrollGuard::new(true, Duration::from_millis(300));
        guard.command(50, t0);
        guard.observe(20, t0 + Duration::from_millis(100));
        assert_eq!(
            guard.observe(30, t0 + Duration::from_millis(200)),
            ScrollObservation::Programmatic
        );
        // Moving away or standing still after the window is interference.
        assert_eq!(
            guard.observe(25, t0 + Duration::from_millis(600)),
            ScrollObservation::Revert(50)
        );
        assert_eq!(
            guard.observe(25, t0 + Duration::from_millis(700)),
            ScrollObservation::Revert(50)
        );
    }

    #[test]
    fn test_unlocked_accepts_user_scroll() {
        let t0 = Instant::now();
        let mut guard = ScrollGuard::new(false, Duration::from_millis(300));
        guard.command(12, t0);
        assert_eq!(
            guard.observe(3, t0 + Duration::from_millis(400)),
            ScrollObservation::UserScrolled(3)
        );
        assert_eq!(guard.intercept_manual(), InputDisposition::Allow);
    }

    #[test]
    fn test_locked_prevents_manual_input() {
        let mut guard = ScrollGuard::new(true, Duration::from_millis(300));
        assert_eq!(guard.intercept_manual(), InputDisposition::Prevent);
        assert_eq!(guard.observe(5, Instant::now()), ScrollObservation::Revert(0));
    }
}
