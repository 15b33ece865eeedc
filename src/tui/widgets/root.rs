//! Root layout
//!
//! ```text
//! ┌ Setlist ──────┬ Lyrics ─────────────────────────────┐
//! │  1. Song A    │                                      │
//! │ >2. Song B    │        the line being sung           │
//! │  3. Song C    │        the next line                 │
//! │               │                                      │
//! ├───────────────┴──────────────────────────────────────┤
//! │ ━━━━━━━━━━━━━━━●───────────────────────────────────── │
//! │ 1:02/3:45  ▶ Playing                                 │
//! └──────────────────────────────────────────────────────┘
//!  space start/pause  r restart  n next line  ...
//! ```

use crate::app::state::{AppState, Focus};
use crate::input::KeyBindings;
use crate::tui::theme::get_theme;
use crossterm::event::KeyCode;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};

use super::{prompter, setlist, status};

pub fn render(frame: &mut Frame, bindings: &KeyBindings, state: &mut AppState) {
    let root = frame.area();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(6),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(root);

    let top_cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(32), Constraint::Min(20)])
        .split(rows[0]);

    setlist::render(frame, state, top_cols[0]);
    prompter::render(frame, state, top_cols[1]);
    status::render(frame, state, rows[1]);
    render_hints(frame, bindings, state, rows[2]);
}

fn render_hints(frame: &mut Frame, bindings: &KeyBindings, state: &AppState, area: ratatui::layout::Rect) {
    let theme = get_theme();
    let key_style = Style::default().fg(theme.palette.fg_primary);
    let text_style = Style::default().fg(theme.palette.fg_secondary);

    let mut pairs: Vec<(String, &str)> = Vec::new();
    match state.focus {
        Focus::Filter => {
            pairs.push(("enter".into(), "load"));
            pairs.push(("esc".into(), "close filter"));
        }
        Focus::Prompter => {
            if bindings.enabled {
                pairs.push((key_label(bindings.toggle), "start/pause"));
                pairs.push((key_label(bindings.restart), "restart"));
                pairs.push((key_label(bindings.next), "next line"));
            }
            pairs.push(("enter".into(), "load"));
            pairs.push(("[ ]".into(), "song"));
            pairs.push(("/".into(), "filter"));
            pairs.push(("q".into(), "quit"));
        }
    }

    let mut spans = vec![Span::raw(" ")];
    for (key, label) in pairs {
        spans.push(Span::styled(key, key_style));
        spans.push(Span::styled(format!(" {label}  "), text_style));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn key_label(code: KeyCode) -> String {
    match code {
        KeyCode::Char(' ') => "space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::F(n) => format!("f{n}"),
        other => format!("{other:?}").to_lowercase(),
    }
}
