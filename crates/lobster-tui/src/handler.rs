use std::time::Instant;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::{App, InputMode, Screen};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick(Instant::now()),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }
    if key.code == KeyCode::Tab {
        app.switch_screen();
        return;
    }

    match app.input_mode {
        InputMode::Normal => match app.screen {
            Screen::Oracle => handle_oracle_normal(app, key),
            Screen::Vibe => handle_vibe_normal(app, key),
        },
        InputMode::Editing => handle_editing(app, key),
    }
}

fn handle_oracle_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Char('i') | KeyCode::Enter => start_editing(app),

        KeyCode::Char('j') | KeyCode::Down => app.scroll_chat_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_chat_up(1),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_chat_down(app.chat_height / 2);
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_chat_up(app.chat_height / 2);
        }
        KeyCode::Char('g') => app.scroll_chat_to_top(),
        KeyCode::Char('G') => app.scroll_chat_to_bottom(),

        _ => {}
    }
}

fn handle_vibe_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Char('i') | KeyCode::Enter => start_editing(app),

        // Document actions
        KeyCode::Char('v') => {
            app.vibe.toggle_view();
            app.document_scroll = 0;
        }
        KeyCode::Char('c') => app.copy_document(),
        KeyCode::Char('o') => app.open_preview(),

        KeyCode::Char('j') | KeyCode::Down => app.scroll_document_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_document_up(1),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_document_down(app.document_height / 2);
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_document_up(app.document_height / 2);
        }
        KeyCode::Char('g') => app.document_scroll = 0,
        KeyCode::Char('G') => {
            app.document_scroll = app.document_lines.saturating_sub(app.document_height);
        }

        _ => {}
    }
}

fn start_editing(app: &mut App) {
    app.input_mode = InputMode::Editing;
    // Cursor at end of existing text
    let (text, cursor) = app.active_input();
    *cursor = text.chars().count();
}

fn handle_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => match app.screen {
            Screen::Oracle => app.send_oracle(),
            Screen::Vibe => {
                app.send_vibe();
                app.input_mode = InputMode::Normal;
            }
        },
        code => {
            let (text, cursor) = app.active_input();
            edit_line(text, cursor, code);
        }
    }
}

/// Apply a cursor or character key to a single-line input.
fn edit_line(text: &mut String, cursor: &mut usize, code: KeyCode) {
    let char_count = text.chars().count();
    *cursor = (*cursor).min(char_count);

    match code {
        KeyCode::Backspace => {
            if *cursor > 0 {
                *cursor -= 1;
                let byte_pos = char_to_byte_index(text, *cursor);
                text.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            if *cursor < char_count {
                let byte_pos = char_to_byte_index(text, *cursor);
                text.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            *cursor = cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            *cursor = (*cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            *cursor = 0;
        }
        KeyCode::End => {
            *cursor = char_count;
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(text, *cursor);
            text.insert(byte_pos, c);
            *cursor += 1;
        }
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    let in_chat = app.chat_area.is_some_and(|r| point_in_rect(x, y, r));
    let in_document = app.document_area.is_some_and(|r| point_in_rect(x, y, r));

    match (mouse.kind, app.screen) {
        (MouseEventKind::ScrollDown, Screen::Oracle) if in_chat => app.scroll_chat_down(3),
        (MouseEventKind::ScrollUp, Screen::Oracle) if in_chat => app.scroll_chat_up(3),
        (MouseEventKind::ScrollDown, Screen::Vibe) if in_document => app.scroll_document_down(3),
        (MouseEventKind::ScrollUp, Screen::Vibe) if in_document => app.scroll_document_up(3),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lobster_core::{Config, ViewMode};

    fn press(app: &mut App, code: KeyCode) {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_char_to_byte_index_multibyte() {
        let s = "ñu🦞x";
        assert_eq!(char_to_byte_index(s, 0), 0);
        assert_eq!(char_to_byte_index(s, 1), 2);
        assert_eq!(char_to_byte_index(s, 2), 3);
        assert_eq!(char_to_byte_index(s, 3), 7);
        assert_eq!(char_to_byte_index(s, 9), s.len());
    }

    #[test]
    fn test_edit_line_inserts_and_deletes_at_cursor() {
        let mut text = String::from("lobter");
        let mut cursor = 3;

        edit_line(&mut text, &mut cursor, KeyCode::Char('s'));
        assert_eq!(text, "lobster");
        assert_eq!(cursor, 4);

        edit_line(&mut text, &mut cursor, KeyCode::End);
        edit_line(&mut text, &mut cursor, KeyCode::Backspace);
        assert_eq!(text, "lobste");

        edit_line(&mut text, &mut cursor, KeyCode::Home);
        edit_line(&mut text, &mut cursor, KeyCode::Delete);
        assert_eq!(text, "obste");
        assert_eq!(cursor, 0);

        edit_line(&mut text, &mut cursor, KeyCode::Left);
        assert_eq!(cursor, 0);
    }

    #[test]
    fn test_edit_line_clamps_stale_cursor() {
        let mut text = String::from("ab");
        let mut cursor = 10;
        edit_line(&mut text, &mut cursor, KeyCode::Char('c'));
        assert_eq!(text, "abc");
        assert_eq!(cursor, 3);
    }

    #[test]
    fn test_typing_goes_to_active_screen() {
        let mut app = App::new(Config::default(), None);
        type_str(&mut app, "hi");
        assert_eq!(app.oracle.input, "hi");

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.screen, Screen::Vibe);
        type_str(&mut app, "game");
        assert_eq!(app.vibe.prompt, "game");
        assert_eq!(app.oracle.input, "hi");
    }

    #[test]
    fn test_normal_mode_keys() {
        let mut app = App::new(Config::default(), None);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.input_mode, InputMode::Normal);

        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char('v'));
        assert_eq!(app.vibe.view_mode, ViewMode::Source);

        // Nothing to copy before a generation
        press(&mut app, KeyCode::Char('c'));
        assert!(!app.vibe.copied.is_copied());
        assert!(app.status.is_some());

        press(&mut app, KeyCode::Char('i'));
        assert_eq!(app.input_mode, InputMode::Editing);
        press(&mut app, KeyCode::Esc);

        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn test_ctrl_c_quits_while_editing() {
        let mut app = App::new(Config::default(), None);
        assert_eq!(app.input_mode, InputMode::Editing);
        handle_key(&mut app, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
        assert!(app.oracle.input.is_empty());
    }

    #[test]
    fn test_point_in_rect_edges() {
        let rect = Rect::new(2, 3, 4, 5);
        assert!(point_in_rect(2, 3, rect));
        assert!(point_in_rect(5, 7, rect));
        assert!(!point_in_rect(6, 3, rect));
        assert!(!point_in_rect(2, 8, rect));
    }
}
