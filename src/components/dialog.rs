use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Padding, Widget},
};

use crate::app::{AppMode, DialogKind, DialogState};
use crate::components::editor::{EditorWidget, Highlighter};
use crate::config::DEFAULT_TAB_WIDTH;
use crate::editor::TextBuffer;
use crate::theme::ThemeColors;

/// Dialog widget that renders a centered modal overlay.
pub struct DialogWidget<'a> {
    mode: &'a AppMode,
    dialog_state: &'a DialogState,
    theme: &'a ThemeColors,
    editor: Option<(&'a TextBuffer, &'a Highlighter)>,
    tab_width: usize,
}

impl<'a> DialogWidget<'a> {
    pub fn new(mode: &'a AppMode, dialog_state: &'a DialogState, theme: &'a ThemeColors) -> Self {
        Self {
            mode,
            dialog_state,
            theme,
            editor: None,
            tab_width: DEFAULT_TAB_WIDTH,
        }
    }

    /// Buffer and highlighter shown by the edit dialog.
    pub fn editor(mut self, buffer: &'a TextBuffer, highlighter: &'a Highlighter) -> Self {
        self.editor = Some((buffer, highlighter));
        self
    }

    pub fn tab_width(mut self, width: usize) -> Self {
        self.tab_width = width;
        self
    }

    /// Calculate a centered rectangle within the given area.
    pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
        let w = width.min(area.width);
        let h = height.min(area.height);
        let x = area.x + (area.width - w) / 2;
        let y = area.y + (area.height - h) / 2;
        Rect::new(x, y, w, h)
    }

    /// Outer rectangle of the edit dialog.
    pub fn edit_dialog_rect(area: Rect) -> Rect {
        let width = (area.width as u32 * 4 / 5) as u16;
        let height = (area.height as u32 * 4 / 5) as u16;
        Self::centered_rect(width.max(30), height.max(8), area)
    }

    /// Number of text rows inside the edit dialog: borders and the hint
    /// line are taken off.
    pub fn edit_text_height(area: Rect) -> usize {
        Self::edit_dialog_rect(area).height.saturating_sub(3) as usize
    }

    fn hint_line(&self, hint: &'a str) -> Line<'a> {
        Line::from(Span::styled(
            hint,
            Style::default()
                .fg(self.theme.dim_fg)
                .add_modifier(Modifier::DIM),
        ))
    }
}

impl<'a> Widget for DialogWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let kind = match &self.mode {
            AppMode::Dialog(kind) => kind,
            _ => return,
        };

        match kind {
            DialogKind::AddPath => self.render_input_dialog("Add Path", area, buf),
            DialogKind::EditContent { name, .. } => self.render_edit_dialog(name, area, buf),
            DialogKind::DeleteConfirm { name, .. } => self.render_confirm_dialog(name, area, buf),
        }
    }
}

impl<'a> DialogWidget<'a> {
    fn render_input_dialog(&self, title: &str, area: Rect, buf: &mut Buffer) {
        let dialog_width = 60.min(area.width.saturating_sub(4));
        let rect = Self::centered_rect(dialog_width, 5, area);

        Clear.render(rect, buf);

        let block = Block::default()
            .title(format!(" {} ", title))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.dialog_border_fg))
            .padding(Padding::horizontal(1));

        let inner = block.inner(rect);
        block.render(rect, buf);

        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let input = &self.dialog_state.input;
        let cursor_pos = self.dialog_state.cursor_position.min(input.len());
        let before = &input[..cursor_pos];
        let mut rest = input[cursor_pos..].chars();
        let cursor_char = rest.next().map(String::from).unwrap_or_else(|| " ".into());
        let after = rest.as_str();

        // Keep the cursor in view by dropping characters from the left.
        let max_before = (inner.width as usize).saturating_sub(2);
        let before_len = before.chars().count();
        let before_display: String = before
            .chars()
            .skip(before_len.saturating_sub(max_before))
            .collect();

        let input_style = Style::default().fg(self.theme.tree_fg);
        let cursor_style = Style::default()
            .bg(self.theme.editor_cursor_bg)
            .fg(self.theme.editor_cursor_fg)
            .add_modifier(Modifier::BOLD);

        let line = Line::from(vec![
            Span::styled(before_display, input_style),
            Span::styled(cursor_char, cursor_style),
            Span::styled(after, input_style),
        ]);
        buf.set_line(inner.x, inner.y + inner.height / 2, &line, inner.width);

        if inner.height > 1 {
            let hint = self.hint_line("[Enter] Create  [Esc] Cancel");
            buf.set_line(inner.x, inner.y + inner.height - 1, &hint, inner.width);
        }
    }

    fn render_edit_dialog(&self, name: &str, area: Rect, buf: &mut Buffer) {
        let rect = Self::edit_dialog_rect(area);
        Clear.render(rect, buf);

        let modified = self.editor.is_some_and(|(buffer, _)| buffer.modified);
        let title = if modified {
            format!(" {} [+] ", name)
        } else {
            format!(" {} ", name)
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.dialog_border_fg));

        let inner = block.inner(rect);
        block.render(rect, buf);

        if inner.height < 2 || inner.width == 0 {
            return;
        }

        let text_area = Rect::new(inner.x, inner.y, inner.width, inner.height - 1);
        if let Some((buffer, highlighter)) = self.editor {
            EditorWidget::new(buffer, self.theme, highlighter)
                .file_name(name)
                .tab_width(self.tab_width)
                .render(text_area, buf);
        }

        let hint = self.hint_line("[Ctrl+S] Save  [Ctrl+Y] Copy  [Esc] Cancel");
        buf.set_line(inner.x, inner.y + inner.height - 1, &hint, inner.width);
    }

    fn render_confirm_dialog(&self, name: &str, area: Rect, buf: &mut Buffer) {
        let dialog_width = (name.chars().count() as u16 + 10)
            .max(40)
            .min(area.width.saturating_sub(4));
        let rect = Self::centered_rect(dialog_width, 6, area);

        Clear.render(rect, buf);

        let block = Block::default()
            .title(" Delete Confirmation ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.error_fg))
            .padding(Padding::horizontal(1));

        let inner = block.inner(rect);
        block.render(rect, buf);

        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let header = Line::from(Span::styled(
            "Delete this node and everything under it?",
            Style::default()
                .fg(self.theme.warning_fg)
                .add_modifier(Modifier::BOLD),
        ));
        buf.set_line(inner.x, inner.y, &header, inner.width);

        if inner.height > 2 {
            let target = Line::from(Span::styled(
                format!("  • {}", name),
                Style::default().fg(self.theme.tree_fg),
            ));
            buf.set_line(inner.x, inner.y + 1, &target, inner.width);
        }

        let hint = self.hint_line("[y] Yes  [n/Esc] Cancel");
        buf.set_line(inner.x, inner.y + inner.height - 1, &hint, inner.width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_SYNTAX_THEME;
    use crate::theme;
    use crate::tree::NodeId;

    fn render(widget: DialogWidget<'_>, area: Rect) -> String {
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
        buffer_to_string(&buf, area)
    }

    #[test]
    fn test_input_dialog_renders() {
        let tc = theme::dark_theme();
        let mode = AppMode::Dialog(DialogKind::AddPath);
        let state = DialogState {
            input: "app/src/main.rs".to_string(),
            cursor_position: 15,
        };
        let content = render(DialogWidget::new(&mode, &state, &tc), Rect::new(0, 0, 80, 24));
        assert!(content.contains("Add Path"));
        assert!(content.contains("app/src/main.rs"));
    }

    #[test]
    fn test_input_cursor_on_multibyte_char() {
        let tc = theme::dark_theme();
        let mode = AppMode::Dialog(DialogKind::AddPath);
        let state = DialogState {
            input: "añb".to_string(),
            cursor_position: 1,
        };
        let content = render(DialogWidget::new(&mode, &state, &tc), Rect::new(0, 0, 80, 24));
        assert!(content.contains("añb"));
    }

    #[test]
    fn test_long_input_keeps_cursor_visible() {
        let tc = theme::dark_theme();
        let mode = AppMode::Dialog(DialogKind::AddPath);
        let input = format!("{}END", "x".repeat(100));
        let state = DialogState {
            cursor_position: input.len(),
            input,
        };
        let content = render(DialogWidget::new(&mode, &state, &tc), Rect::new(0, 0, 40, 10));
        assert!(content.contains("END"));
    }

    #[test]
    fn test_edit_dialog_renders_buffer() {
        let tc = theme::dark_theme();
        let highlighter = Highlighter::new(DEFAULT_SYNTAX_THEME);
        let mode = AppMode::Dialog(DialogKind::EditContent {
            id: NodeId(3),
            name: "main.rs".into(),
        });
        let state = DialogState::default();
        let mut buffer = TextBuffer::new("fn main() {}");
        buffer.insert_char('x');
        let content = render(
            DialogWidget::new(&mode, &state, &tc).editor(&buffer, &highlighter),
            Rect::new(0, 0, 80, 24),
        );
        assert!(content.contains("main.rs [+]"));
        assert!(content.contains("xfn main() {}"));
        assert!(content.contains("[Ctrl+S] Save"));
    }

    #[test]
    fn test_confirm_dialog_renders() {
        let tc = theme::dark_theme();
        let mode = AppMode::Dialog(DialogKind::DeleteConfirm {
            id: NodeId(1),
            name: "src".into(),
        });
        let state = DialogState::default();
        let content = render(DialogWidget::new(&mode, &state, &tc), Rect::new(0, 0, 80, 24));
        assert!(content.contains("Delete Confirmation"));
        assert!(content.contains("• src"));
    }

    #[test]
    fn test_no_dialog_mode_noop() {
        let tc = theme::dark_theme();
        let mode = AppMode::Normal;
        let state = DialogState::default();
        let content = render(DialogWidget::new(&mode, &state, &tc), Rect::new(0, 0, 80, 24));
        assert!(content.trim().is_empty());
    }

    #[test]
    fn test_edit_text_height() {
        let area = Rect::new(0, 0, 100, 50);
        assert_eq!(DialogWidget::edit_dialog_rect(area), Rect::new(10, 5, 80, 40));
        assert_eq!(DialogWidget::edit_text_height(area), 37);
    }

    fn buffer_to_string(buf: &Buffer, area: Rect) -> String {
        let mut s = String::new();
        for y in area.y..area.y + area.height {
            for x in area.x..area.x + area.width {
                s.push_str(buf.cell((x, y)).unwrap().symbol());
            }
            s.push('\n');
        }
        s
    }
}
