use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, AppMode, DialogKind};
use crate::editor::TextBuffer;

/// Handle a key event.
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && key.code == KeyCode::Char('c') {
        app.quit();
        return;
    }

    match app.mode.clone() {
        AppMode::Normal => handle_normal_mode(app, key),
        AppMode::Scratch => handle_scratch_mode(app, key),
        AppMode::Dialog(DialogKind::AddPath) => handle_add_dialog(app, key),
        AppMode::Dialog(DialogKind::EditContent { .. }) => handle_edit_dialog(app, key),
        AppMode::Dialog(DialogKind::DeleteConfirm { .. }) => handle_delete_confirm(app, key),
    }
}

/// Handle bracketed paste.
pub fn handle_paste(app: &mut App, text: &str) {
    match app.mode {
        AppMode::Normal => {}
        AppMode::Scratch => app.edit_scratch(|buf| buf.insert_str(text)),
        AppMode::Dialog(DialogKind::AddPath) => app.dialog_input_str(text),
        AppMode::Dialog(DialogKind::EditContent { .. }) => app.editor.insert_str(text),
        AppMode::Dialog(DialogKind::DeleteConfirm { .. }) => {}
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_previous(),
        KeyCode::Char('g') | KeyCode::Home => app.select_first(),
        KeyCode::Char('G') | KeyCode::End => app.select_last(),
        KeyCode::Enter | KeyCode::Char(' ') => app.toggle_selected(),
        KeyCode::Char('l') | KeyCode::Right => app.expand_selected(),
        KeyCode::Char('h') | KeyCode::Left => app.collapse_selected(),
        KeyCode::Char('a') => app.open_add_dialog(),
        KeyCode::Char('e') => app.open_edit_dialog(),
        KeyCode::Char('d') | KeyCode::Delete => app.request_delete(),
        KeyCode::Char('y') => app.copy_tree(),
        KeyCode::Char('Y') => app.copy_selected_file(),
        KeyCode::Tab => app.focus_scratch(),
        _ => {}
    }
}

fn handle_scratch_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Tab => app.focus_tree(),
        _ => app.edit_scratch(|buf| {
            handle_buffer_key(buf, key, None);
        }),
    }
}

fn handle_add_dialog(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.close_dialog(),
        KeyCode::Enter => app.submit_add(),
        KeyCode::Backspace => app.dialog_delete_char(),
        KeyCode::Left => app.dialog_move_cursor_left(),
        KeyCode::Right => app.dialog_move_cursor_right(),
        KeyCode::Home => app.dialog_cursor_home(),
        KeyCode::End => app.dialog_cursor_end(),
        KeyCode::Char(c) if !has_command_modifier(key) => app.dialog_input_char(c),
        _ => {}
    }
}

fn handle_edit_dialog(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => app.close_dialog(),
        KeyCode::Char('s') if ctrl => app.save_edit(),
        KeyCode::Char('y') if ctrl => app.copy_edit(),
        _ => {
            let tab_width = app.tab_width;
            handle_buffer_key(&mut app.editor, key, Some(tab_width));
        }
    }
}

fn handle_delete_confirm(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Enter => app.confirm_delete_dialog(),
        KeyCode::Char('n') | KeyCode::Esc => app.close_dialog(),
        _ => {}
    }
}

/// Apply an editing or movement key to `buf`. `tab_width` of `None` leaves
/// Tab unhandled. Returns whether the key was consumed.
fn handle_buffer_key(buf: &mut TextBuffer, key: KeyEvent, tab_width: Option<usize>) -> bool {
    match key.code {
        KeyCode::Char(c) if !has_command_modifier(key) => buf.insert_char(c),
        KeyCode::Enter => buf.insert_newline(),
        KeyCode::Tab => match tab_width {
            Some(width) => buf.insert_tab(width),
            None => return false,
        },
        KeyCode::Backspace => buf.delete_char_before(),
        KeyCode::Delete => buf.delete_char_at(),
        KeyCode::Up => buf.move_up(),
        KeyCode::Down => buf.move_down(),
        KeyCode::Left => buf.move_left(),
        KeyCode::Right => buf.move_right(),
        KeyCode::Home if key.modifiers.contains(KeyModifiers::CONTROL) => buf.move_to_top(),
        KeyCode::End if key.modifiers.contains(KeyModifiers::CONTROL) => buf.move_to_bottom(),
        KeyCode::Home => buf.move_home(),
        KeyCode::End => buf.move_end(),
        KeyCode::PageUp => buf.page_up(),
        KeyCode::PageDown => buf.page_down(),
        _ => return false,
    }
    true
}

/// Ctrl or Alt chords are commands, never text.
fn has_command_modifier(key: KeyEvent) -> bool {
    key.modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
}
