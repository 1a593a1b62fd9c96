use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::{Block, Borders},
    Frame,
};

use crate::app::{App, AppMode, DialogKind};
use crate::components::dialog::DialogWidget;
use crate::components::editor::{EditorWidget, Highlighter};
use crate::components::status_bar::{StatusBarWidget, SCRATCH_HINTS, TREE_HINTS};
use crate::components::tree::TreeWidget;
use crate::tree::Node;

/// Render the application UI.
pub fn render(app: &mut App, highlighter: &Highlighter, frame: &mut Frame) {
    let area = frame.area();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);
    let panels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(rows[0]);

    let tree_focused = app.mode != AppMode::Scratch;
    render_tree_panel(app, frame, panels[0], tree_focused);
    render_scratch_panel(app, highlighter, frame, panels[1], !tree_focused);
    render_status_bar(app, frame, rows[1]);

    if let AppMode::Dialog(kind) = &app.mode {
        if matches!(kind, DialogKind::EditContent { .. }) {
            app.editor.visible_height = DialogWidget::edit_text_height(area);
            app.editor.ensure_cursor_visible();
        }
        let dialog = DialogWidget::new(&app.mode, &app.dialog_state, &app.theme)
            .editor(&app.editor, highlighter)
            .tab_width(app.tab_width);
        frame.render_widget(dialog, area);
    }
}

fn panel_block<'a>(app: &App, title: &'a str, focused: bool) -> Block<'a> {
    let border = if focused {
        app.theme.border_focused_fg
    } else {
        app.theme.border_fg
    };
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
}

fn render_tree_panel(app: &mut App, frame: &mut Frame, area: Rect, focused: bool) {
    // Keep the selected row visible inside the borders.
    app.view.update_scroll(area.height.saturating_sub(2) as usize);

    let block = panel_block(app, " Tree ", focused);
    let widget = TreeWidget::new(&app.view, &app.theme, app.use_icons)
        .focused(focused)
        .block(block);
    frame.render_widget(widget, area);
}

fn render_scratch_panel(
    app: &mut App,
    highlighter: &Highlighter,
    frame: &mut Frame,
    area: Rect,
    focused: bool,
) {
    app.scratch.visible_height = area.height.saturating_sub(2) as usize;
    app.scratch.ensure_cursor_visible();

    let block = panel_block(app, " Notes ", focused);
    let widget = EditorWidget::new(&app.scratch, &app.theme, highlighter)
        .show_cursor(focused)
        .tab_width(app.tab_width)
        .block(block);
    frame.render_widget(widget, area);
}

/// One-line description of a node for the status bar.
fn node_info(node: &Node, child_count: usize) -> String {
    if node.is_file {
        match node.text().lines().count() {
            0 => "file | empty".to_string(),
            1 => "file | 1 line".to_string(),
            n => format!("file | {n} lines"),
        }
    } else {
        match child_count {
            1 => "folder | 1 item".to_string(),
            n => format!("folder | {n} items"),
        }
    }
}

fn render_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let (path, info) = match app.selected_node() {
        Some(node) => {
            let children = app.store.snapshot().children_of(node.id).len();
            (node.path.clone(), node_info(node, children))
        }
        None => (String::new(), String::new()),
    };

    let hints = if app.mode == AppMode::Scratch {
        SCRATCH_HINTS
    } else {
        TREE_HINTS
    };
    let mut widget = StatusBarWidget::new(&path, &info, &app.theme).hints(hints);
    if let Some((msg, _)) = &app.status_message {
        widget = widget.status_message(msg, app.status_is_error);
    }
    frame.render_widget(widget, area);
}
