use crate::app::state::{AppState, Focus};
use crate::tui::theme::get_theme;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

pub fn render(frame: &mut Frame, state: &AppState, area: Rect) {
    let theme = get_theme();
    let icons = &theme.icons;

    let title = match &state.setlist_name {
        Some(name) => format!(" {} {} ", icons.queue, name),
        None => format!(" {} Setlist ", icons.queue),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_set(theme.border_set())
        .border_style(Style::default().fg(theme.palette.border))
        .title(title)
        .title_style(Style::default().fg(theme.palette.accent));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let show_filter = state.focus == Focus::Filter || !state.filter.is_empty();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(if show_filter { 1 } else { 0 }),
        ])
        .split(inner);

    let visible = state.visible_songs();
    let items: Vec<ListItem> = visible
        .iter()
        .enumerate()
        .map(|(pos, &song)| {
            let is_selected = pos == state.selected;
            let is_loaded = state.loaded_song == Some(song);

            let style = if is_loaded {
                Style::default()
                    .fg(theme.palette.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.palette.fg_primary)
            };
            let marker = if is_loaded {
                icons.loaded
            } else if is_selected {
                icons.selected
            } else {
                icons.unselected
            };

            ListItem::new(Line::from(vec![
                Span::styled(marker, Style::default().fg(theme.palette.fg_secondary)),
                Span::raw(" "),
                Span::styled(format!("{:>2}. ", song + 1), Style::default().fg(theme.palette.fg_secondary)),
                Span::styled(state.songs[song].clone(), style),
            ]))
        })
        .collect();

    let mut list_state = ListState::default();
    if !visible.is_empty() {
        list_state.select(Some(state.selected.min(visible.len() - 1)));
    }

    let list = List::new(items)
        .highlight_style(
            Style::default()
                .fg(theme.palette.bg_primary)
                .bg(theme.palette.accent)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("");
    frame.render_stateful_widget(list, rows[0], &mut list_state);

    if show_filter {
        let cursor = if state.focus == Focus::Filter { "_" } else { "" };
        let line = Line::from(vec![
            Span::styled(format!("{} ", icons.search), Style::default().fg(theme.palette.accent)),
            Span::styled(
                format!("{}{}", state.filter, cursor),
                Style::default().fg(theme.palette.fg_primary),
            ),
        ]);
        frame.render_widget(Paragraph::new(line), rows[1]);
    }
}
