use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::theme::ThemeColors;

/// Key hints shown while the tree has focus.
pub const TREE_HINTS: &str = " a:add  e:edit  d:del  y:copy  Tab:notes  q:quit ";
/// Key hints shown while the scratch pad has focus.
pub const SCRATCH_HINTS: &str = " Esc/Tab:tree ";

/// Status bar widget that displays the selected path, node info, key hints,
/// or a status message.
pub struct StatusBarWidget<'a> {
    path_str: &'a str,
    info: &'a str,
    hints: &'a str,
    theme: &'a ThemeColors,
    status_message: Option<&'a str>,
    is_error: bool,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(path_str: &'a str, info: &'a str, theme: &'a ThemeColors) -> Self {
        Self {
            path_str,
            info,
            hints: TREE_HINTS,
            theme,
            status_message: None,
            is_error: false,
        }
    }

    pub fn hints(mut self, hints: &'a str) -> Self {
        self.hints = hints;
        self
    }

    pub fn status_message(mut self, msg: &'a str, is_error: bool) -> Self {
        self.status_message = Some(msg);
        self.is_error = is_error;
        self
    }
}

/// Keep the last `max` characters, marking the cut with `...`.
fn truncate_left(text: &str, max: usize) -> String {
    let len = text.chars().count();
    if len <= max {
        return text.to_string();
    }
    if max <= 3 {
        return text.chars().take(max).collect();
    }
    let tail: String = text.chars().skip(len - (max - 3)).collect();
    format!("...{tail}")
}

impl<'a> Widget for StatusBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let width = area.width as usize;

        if let Some(msg) = self.status_message {
            let style = if self.is_error {
                Style::default()
                    .bg(self.theme.error_fg)
                    .fg(self.theme.status_fg)
            } else {
                Style::default().fg(self.theme.success_fg)
            };

            let display: String = msg.chars().take(width).collect();
            let display = format!("{:<width$}", display, width = width);

            let line = Line::from(Span::styled(display, style));
            buf.set_line(area.x, area.y, &line, area.width);
            return;
        }

        // Normal bar: [path] [info] [key_hints]
        let hints_len = self.hints.chars().count();
        let remaining = width.saturating_sub(hints_len);

        let info_len = self.info.chars().count().min(remaining);
        let path_budget = remaining.saturating_sub(info_len).saturating_sub(1);
        let path_display = truncate_left(self.path_str, path_budget);
        let info_display: String = self.info.chars().take(info_len).collect();

        let gap = remaining
            .saturating_sub(path_display.chars().count())
            .saturating_sub(info_display.chars().count());

        let path_style = Style::default().fg(self.theme.status_fg);
        let info_style = Style::default().fg(self.theme.info_fg);
        let hints_style = Style::default()
            .fg(self.theme.dim_fg)
            .add_modifier(Modifier::DIM);

        let line = Line::from(vec![
            Span::styled(path_display, path_style),
            Span::raw(" ".repeat(gap)),
            Span::styled(info_display, info_style),
            Span::styled(self.hints, hints_style),
        ]);
        buf.set_line(area.x, area.y, &line, area.width);
    }
}
