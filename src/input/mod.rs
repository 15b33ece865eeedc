use crate::app::actions::Action;
use crate::app::events::{Event, InputEvent};
use crate::app::state::{AppState, Focus};
use crate::config::KeysConfig;
use crate::playback::Transport;
use anyhow::Context;
use crossterm::event::{
    self, Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind,
};
use tokio::sync::mpsc;

pub fn spawn_input_task(tx: mpsc::Sender<Event>, mouse_enabled: bool) {
    tokio::task::spawn_blocking(move || {
        loop {
            if event::poll(std::time::Duration::from_millis(250)).unwrap_or(false) {
                match event::read() {
                    Ok(CtEvent::Key(k)) => {
                        if k.kind == KeyEventKind::Press
                            && tx.blocking_send(Event::Input(InputEvent::Key(k))).is_err()
                        {
                            break;
                        }
                    }
                    Ok(CtEvent::Mouse(m)) if mouse_enabled => {
                        if tx.blocking_send(Event::Input(InputEvent::Mouse(m))).is_err() {
                            break;
                        }
                    }
                    Ok(CtEvent::Resize(_, _)) => {
                        if tx
                            .blocking_send(Event::Input(InputEvent::Resize))
                            .is_err()
                        {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(_) => {}
                }
            } else if tx.is_closed() {
                break;
            }
        }
    });
}

/// Teleprompter shortcut keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBindings {
    pub enabled: bool,
    pub toggle: KeyCode,
    pub restart: KeyCode,
    pub next: KeyCode,
}

impl KeyBindings {
    pub fn from_config(cfg: &KeysConfig) -> anyhow::Result<Self> {
        let key = |name: &str| parse_key(name).with_context(|| format!("unknown key name {name:?}"));
        Ok(Self {
            enabled: cfg.enabled,
            toggle: key(&cfg.toggle)?,
            restart: key(&cfg.restart)?,
            next: key(&cfg.next)?,
        })
    }

    fn transport_for(&self, k: &KeyEvent) -> Option<Transport> {
        if !self.enabled {
            return None;
        }
        if k.code == self.toggle {
            Some(Transport::Toggle)
        } else if k.code == self.restart {
            Some(Transport::Restart)
        } else if k.code == self.next {
            Some(Transport::Next)
        } else {
            None
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            enabled: true,
            toggle: KeyCode::Char(' '),
            restart: KeyCode::Char('r'),
            next: KeyCode::Char('n'),
        }
    }
}

/// Key names as written in the config: "space", "enter", "f5", "right", "r".
pub fn parse_key(name: &str) -> Option<KeyCode> {
    let lower = name.trim().to_lowercase();
    let code = match lower.as_str() {
        "space" => KeyCode::Char(' '),
        "enter" | "return" => KeyCode::Enter,
        "tab" => KeyCode::Tab,
        "backspace" => KeyCode::Backspace,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "pageup" => KeyCode::PageUp,
        "pagedown" => KeyCode::PageDown,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        f if f.len() > 1 && f.starts_with('f') => KeyCode::F(f[1..].parse().ok()?),
        _ => {
            // Single characters keep their case: "N" and "n" are different keys.
            let mut chars = name.trim().chars();
            let c = chars.next()?;
            if chars.next().is_some() {
                return None;
            }
            KeyCode::Char(c)
        }
    };
    Some(code)
}

pub fn map_input_to_action(
    state: &AppState,
    bindings: &KeyBindings,
    ev: InputEvent,
) -> Option<Action> {
    match ev {
        InputEvent::Resize => Some(Action::Resize),
        InputEvent::Mouse(m) => match m.kind {
            MouseEventKind::ScrollUp => Some(Action::ScrollRows(-1)),
            MouseEventKind::ScrollDown => Some(Action::ScrollRows(1)),
            _ => None,
        },
        InputEvent::Key(k) => match state.focus {
            Focus::Filter => handle_filter(k),
            Focus::Prompter => handle_prompter(bindings, k),
        },
    }
}

/// Text entry: every printable key is input, never a shortcut.
fn handle_filter(k: KeyEvent) -> Option<Action> {
    match k.code {
        KeyCode::Esc => Some(Action::CloseFilter),
        KeyCode::Enter => Some(Action::LoadSelected),
        KeyCode::Backspace => Some(Action::FilterBackspace),
        KeyCode::Up => Some(Action::ListUp),
        KeyCode::Down => Some(Action::ListDown),
        KeyCode::Char(c) if !k.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::FilterChar(c))
        }
        _ => None,
    }
}

fn handle_prompter(bindings: &KeyBindings, k: KeyEvent) -> Option<Action> {
    if let Some(t) = bindings.transport_for(&k) {
        return Some(Action::Transport(t));
    }

    match k.code {
        // Quit
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char('c') if k.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::Quit),

        // Setlist
        KeyCode::Up | KeyCode::Char('k') => Some(Action::ListUp),
        KeyCode::Down | KeyCode::Char('j') => Some(Action::ListDown),
        KeyCode::Enter => Some(Action::LoadSelected),
        KeyCode::Char(']') | KeyCode::Tab => Some(Action::NextSong),
        KeyCode::Char('[') | KeyCode::BackTab => Some(Action::PrevSong),
        KeyCode::Char('/') => Some(Action::OpenFilter),
        KeyCode::Esc => Some(Action::CloseFilter),

        // Lyric view
        KeyCode::PageUp => Some(Action::ScrollRows(-5)),
        KeyCode::PageDown => Some(Action::ScrollRows(5)),
        KeyCode::Char('l') if k.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::RetrySearch)
        }
        KeyCode::F(5) => Some(Action::RetrySearch),

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> InputEvent {
        InputEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn state() -> AppState {
        AppState::new(None, vec!["Song - Band".into()])
    }

    #[test]
    fn test_parse_key_names() {
        assert_eq!(parse_key("space"), Some(KeyCode::Char(' ')));
        assert_eq!(parse_key("Enter"), Some(KeyCode::Enter));
        assert_eq!(parse_key("f5"), Some(KeyCode::F(5)));
        assert_eq!(parse_key("N"), Some(KeyCode::Char('N')));
        assert_eq!(parse_key("right"), Some(KeyCode::Right));
        assert_eq!(parse_key("fx"), None);
        assert_eq!(parse_key("nope"), None);
        assert_eq!(parse_key(""), None);
    }

    #[test]
    fn test_bindings_from_config() {
        let cfg = KeysConfig {
            next: "right".into(),
            ..KeysConfig::default()
        };
        let bindings = KeyBindings::from_config(&cfg).unwrap();
        assert_eq!(bindings.next, KeyCode::Right);
        assert_eq!(bindings.toggle, KeyCode::Char(' '));

        let bad = KeysConfig {
            toggle: "banana".into(),
            ..KeysConfig::default()
        };
        assert!(KeyBindings::from_config(&bad).is_err());
    }

    #[test]
    fn test_transport_keys() {
        let s = state();
        let b = KeyBindings::default();
        assert_eq!(
            map_input_to_action(&s, &b, key(KeyCode::Char(' '))),
            Some(Action::Transport(Transport::Toggle))
        );
        assert_eq!(
            map_input_to_action(&s, &b, key(KeyCode::Char('r'))),
            Some(Action::Transport(Transport::Restart))
        );
        assert_eq!(
            map_input_to_action(&s, &b, key(KeyCode::Char('n'))),
            Some(Action::Transport(Transport::Next))
        );
    }

    #[test]
    fn test_text_entry_suppresses_shortcuts() {
        let mut s = state();
        s.focus = Focus::Filter;
        let b = KeyBindings::default();
        assert_eq!(
            map_input_to_action(&s, &b, key(KeyCode::Char(' '))),
            Some(Action::FilterChar(' '))
        );
        assert_eq!(
            map_input_to_action(&s, &b, key(KeyCode::Char('n'))),
            Some(Action::FilterChar('n'))
        );
        assert_eq!(
            map_input_to_action(&s, &b, key(KeyCode::Char('q'))),
            Some(Action::FilterChar('q'))
        );
    }

    #[test]
    fn test_disabled_keyboard() {
        let s = state();
        let b = KeyBindings {
            enabled: false,
            ..KeyBindings::default()
        };
        assert_eq!(map_input_to_action(&s, &b, key(KeyCode::Char(' '))), None);
        assert_eq!(
            map_input_to_action(&s, &b, key(KeyCode::Char('q'))),
            Some(Action::Quit)
        );
    }
}
