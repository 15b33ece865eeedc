//! Lyric view: the scrolling teleprompter column.
//!
//! Lines are wrapped here rather than by `Paragraph`'s own wrapping so the
//! row count of every lyric line is known before drawing. The controller
//! needs those heights to put the active line at the anchor.

use crate::app::state::AppState;
use crate::lyrics::LyricLine;
use crate::tui::theme::{LoadingSpinner, get_theme};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use std::cmp::Ordering;

const BREAK_MARK: &str = "♪";

/// Greedy word wrap to `width` columns; words longer than a row are split.
/// Always yields at least one row.
pub fn wrap_line(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        loop {
            let needed = if current_len == 0 {
                word.len()
            } else {
                current_len + 1 + word.len()
            };
            if needed <= width {
                if current_len > 0 {
                    current.push(' ');
                    current_len += 1;
                }
                current.extend(word.iter());
                current_len += word.len();
                break;
            }
            if current_len > 0 {
                rows.push(std::mem::take(&mut current));
                current_len = 0;
                continue;
            }
            // Word alone is too long for a row.
            let rest = word.split_off(width);
            rows.push(word.into_iter().collect());
            word = rest;
            if word.is_empty() {
                break;
            }
        }
    }

    if current_len > 0 || rows.is_empty() {
        rows.push(current);
    }
    rows
}

pub fn wrapped_heights(lines: &[LyricLine], width: usize) -> Vec<u32> {
    lines
        .iter()
        .map(|l| wrap_line(&l.text, width).len() as u32)
        .collect()
}

/// Total rows of unsynced text at `width`.
pub fn plain_rows(text: &str, width: usize) -> u32 {
    text.lines().map(|l| wrap_line(l, width).len() as u32).sum()
}

pub fn render(frame: &mut Frame, state: &mut AppState, area: Rect) {
    let theme = get_theme();
    let icons = &theme.icons;

    let locked = state
        .prompter
        .as_ref()
        .is_some_and(|p| p.is_scroll_locked());
    let title = if locked {
        format!(" {} Lyrics {} ", icons.lyrics, icons.lock)
    } else {
        format!(" {} Lyrics ", icons.lyrics)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_set(theme.border_set())
        .border_style(Style::default().fg(theme.palette.border))
        .title(title)
        .title_style(Style::default().fg(theme.palette.accent));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let padded = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(inner)[1];

    state.viewport_width = padded.width;
    state.viewport_height = padded.height;

    let Some(prompter) = &state.prompter else {
        let text = if state.lyrics_loading {
            format!("{} Searching lyrics...", LoadingSpinner::frame(state.frame_count))
        } else if state.songs.is_empty() {
            "Setlist is empty".to_string()
        } else {
            "Press Enter to load a song".to_string()
        };
        let placeholder = Paragraph::new(Line::from(Span::styled(
            text,
            Style::default().fg(theme.palette.fg_secondary),
        )))
        .alignment(Alignment::Center);
        frame.render_widget(placeholder, vertical_center(padded));
        return;
    };

    let width = padded.width as usize;
    let mut rows: Vec<Line> = Vec::new();

    if prompter.is_synced() {
        let active = state.frame.and_then(|f| f.active_index);
        for (i, line) in prompter.lines().iter().enumerate() {
            let style = match active.map(|a| i.cmp(&a)) {
                Some(Ordering::Equal) => Style::default()
                    .fg(theme.palette.accent)
                    .add_modifier(Modifier::BOLD),
                Some(Ordering::Less) => Style::default().fg(theme.palette.fg_dim),
                _ => Style::default().fg(theme.palette.fg_secondary),
            };
            if line.text.trim().is_empty() {
                rows.push(Line::from(Span::styled(BREAK_MARK, style)));
                continue;
            }
            for row in wrap_line(&line.text, width) {
                rows.push(Line::from(Span::styled(row, style)));
            }
        }
    } else if let Some(text) = prompter.plain_text() {
        let style = Style::default().fg(theme.palette.fg_primary);
        for line in text.lines() {
            for row in wrap_line(line, width) {
                rows.push(Line::from(Span::styled(row, style)));
            }
        }
    }

    if rows.is_empty() {
        let placeholder = Paragraph::new(Line::from(Span::styled(
            "No lyrics for this song",
            Style::default().fg(theme.palette.fg_secondary),
        )))
        .alignment(Alignment::Center);
        frame.render_widget(placeholder, vertical_center(padded));
        return;
    }

    let scroll = state.surface.position().min(u16::MAX as u32) as u16;
    let paragraph = Paragraph::new(rows)
        .alignment(Alignment::Center)
        .scroll((scroll, 0));
    frame.render_widget(paragraph, padded);
}

fn vertical_center(area: Rect) -> Rect {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area)[1]
}
