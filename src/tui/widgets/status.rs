//! Transport strip under the lyric view: progress, clock, state and messages.

use crate::app::state::{AppState, ToastKind};
use crate::playback::PlaybackState;
use crate::tui::theme::{Icons, get_theme};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

pub fn render(frame: &mut Frame, state: &AppState, area: Rect) {
    let theme = get_theme();
    let icons = &theme.icons;

    let title = state
        .loaded_song
        .and_then(|i| state.songs.get(i))
        .map(|s| format!(" {} {} ", icons.loaded, s))
        .unwrap_or_else(|| " Not loaded ".to_string());

    let block = Block::default()
        .borders(Borders::ALL)
        .border_set(theme.border_set())
        .border_style(Style::default().fg(theme.palette.border))
        .title(title)
        .title_style(
            Style::default()
                .fg(theme.palette.accent)
                .add_modifier(Modifier::BOLD),
        );
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let padded = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(inner)[1];

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Progress bar
            Constraint::Length(1), // Time + state
            Constraint::Min(0),    // Message
        ])
        .split(padded);

    let content_width = padded.width as usize;

    let (elapsed, duration, playback, progress) = match (&state.prompter, &state.frame) {
        (Some(p), Some(f)) => (f.current_time_ms, p.duration_ms(), f.playback_state, f.progress),
        (Some(p), None) => (p.elapsed_ms(), p.duration_ms(), p.state(), 0.0),
        _ => (0, 0, PlaybackState::Idle, 0.0),
    };

    let bar = render_progress_bar(rows[0].width as usize, progress, icons);
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            bar,
            Style::default().fg(theme.palette.accent),
        ))),
        rows[0],
    );

    let state_icon = match playback {
        PlaybackState::Playing => icons.play,
        PlaybackState::Paused => icons.pause,
        PlaybackState::Idle | PlaybackState::Ended => icons.stop,
    };
    let mut spans = vec![
        Span::styled(
            format!("{}/{}", format_clock(elapsed), format_clock(duration)),
            Style::default().fg(theme.palette.fg_secondary),
        ),
        Span::raw("  "),
        Span::styled(state_icon, Style::default().fg(theme.palette.fg_primary)),
        Span::raw(" "),
        Span::styled(
            playback.label(),
            Style::default().fg(theme.palette.fg_primary),
        ),
    ];
    if state.prompter.as_ref().is_some_and(|p| p.is_delegated()) {
        spans.push(Span::styled(
            "  (following mpv)",
            Style::default().fg(theme.palette.fg_secondary),
        ));
    }
    if let Some(summary) = &state.attempt_summary {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            summary.clone(),
            Style::default().fg(theme.palette.fg_dim),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), rows[1]);

    // Toast first, then the sticky lyric warning, then the status line.
    let message = if let Some(toast) = state.toast.as_ref().filter(|t| !t.is_expired()) {
        let (icon, color) = match toast.kind {
            ToastKind::Info => (icons.info, theme.palette.fg_primary),
            ToastKind::Warning => (icons.warning, theme.palette.warning),
        };
        Some((icon, toast.message.as_str(), color))
    } else if let Some(w) = &state.warning {
        Some((icons.warning, w.as_str(), theme.palette.warning))
    } else if !state.status.is_empty() {
        Some((icons.info, state.status.as_str(), theme.palette.fg_secondary))
    } else {
        None
    };
    if let Some((icon, text, color)) = message {
        let line = Line::from(vec![
            Span::styled(format!("{icon} "), Style::default().fg(color)),
            Span::styled(
                truncate_str(text, content_width.saturating_sub(3)),
                Style::default().fg(color),
            ),
        ]);
        frame.render_widget(Paragraph::new(line), rows[2]);
    }
}

fn render_progress_bar(width: usize, ratio: f64, icons: &Icons) -> String {
    if width < 3 {
        return String::new();
    }
    let ratio = ratio.clamp(0.0, 1.0);
    let filled = ((width - 1) as f64 * ratio).round() as usize;
    let empty = width.saturating_sub(filled + 1);

    let mut bar = String::with_capacity(width * 3);
    for _ in 0..filled {
        bar.push_str(icons.progress_full);
    }
    bar.push_str(icons.progress_head);
    for _ in 0..empty {
        bar.push_str(icons.progress_empty);
    }
    bar
}

/// `m:ss`, or `h:mm:ss` past the hour.
pub fn format_clock(ms: u64) -> String {
    let total = ms / 1000;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

pub fn truncate_str(s: &str, max_len: usize) -> String {
    if max_len == 0 {
        return String::new();
    }
    let char_count = s.chars().count();
    if char_count <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{truncated}...")
    } else {
        s.chars().take(max_len).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(225_999), "3:45");
        assert_eq!(format_clock(3_723_000), "1:02:03");
    }

    #[test]
    fn test_progress_bar_width() {
        let icons = Icons::nerd();
        let bar = render_progress_bar(10, 0.5, &icons);
        assert_eq!(bar.chars().count(), 10);
        assert_eq!(render_progress_bar(2, 0.5, &icons), "");
        assert!(render_progress_bar(5, 1.0, &icons).ends_with(icons.progress_head));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate_str("short", 10), "short");
        assert_eq!(truncate_str("a long message", 8), "a lon...");
        assert_eq!(truncate_str("abc", 2), "ab");
    }
}
