use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Widget},
};
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use tracing::warn;

use crate::config::{DEFAULT_SYNTAX_THEME, DEFAULT_TAB_WIDTH};
use crate::editor::TextBuffer;
use crate::theme::ThemeColors;

/// Syntax definitions and the color theme used to highlight editor text.
pub struct Highlighter {
    pub syntax_set: SyntaxSet,
    pub theme: Theme,
}

impl Highlighter {
    /// Load the bundled syntaxes and the named theme, falling back to the
    /// default theme when the name is unknown.
    pub fn new(theme_name: &str) -> Self {
        let syntax_set = SyntaxSet::load_defaults_nonewlines();
        let mut themes = ThemeSet::load_defaults().themes;
        let theme = match themes.remove(theme_name) {
            Some(theme) => theme,
            None => {
                warn!(theme = theme_name, "unknown syntax theme, using {DEFAULT_SYNTAX_THEME}");
                themes.remove(DEFAULT_SYNTAX_THEME).unwrap_or_default()
            }
        };
        Self { syntax_set, theme }
    }

    /// Syntax for a file name, by extension. Plain text when unknown.
    pub fn syntax_for(&self, file_name: Option<&str>) -> &SyntaxReference {
        file_name
            .and_then(|name| name.rsplit_once('.'))
            .and_then(|(_, ext)| self.syntax_set.find_syntax_by_extension(ext))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text())
    }
}

/// Widget for rendering a text buffer with line numbers, syntax highlighting, and cursor.
pub struct EditorWidget<'a> {
    buffer: &'a TextBuffer,
    theme: &'a ThemeColors,
    highlighter: &'a Highlighter,
    file_name: Option<&'a str>,
    show_cursor: bool,
    tab_width: usize,
    block: Option<Block<'a>>,
}

/// Display column of char index `col` in `line`, with tabs expanded to the
/// next multiple of `tab_width`.
fn display_col(line: &str, col: usize, tab_width: usize) -> usize {
    line.chars()
        .take(col)
        .fold(0, |vcol, ch| vcol + cell_width(ch, vcol, tab_width))
}

/// Cells taken by `ch` when it starts at display column `vcol`.
fn cell_width(ch: char, vcol: usize, tab_width: usize) -> usize {
    if ch == '\t' {
        tab_width - vcol % tab_width
    } else {
        1
    }
}

impl<'a> EditorWidget<'a> {
    pub fn new(buffer: &'a TextBuffer, theme: &'a ThemeColors, highlighter: &'a Highlighter) -> Self {
        Self {
            buffer,
            theme,
            highlighter,
            file_name: None,
            show_cursor: true,
            tab_width: DEFAULT_TAB_WIDTH,
            block: None,
        }
    }

    /// Name whose extension picks the syntax.
    pub fn file_name(mut self, name: &'a str) -> Self {
        self.file_name = Some(name);
        self
    }

    pub fn show_cursor(mut self, show: bool) -> Self {
        self.show_cursor = show;
        self
    }

    /// Tab stop width used when drawing tab characters.
    pub fn tab_width(mut self, width: usize) -> Self {
        self.tab_width = width.max(1);
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    /// First display column shown, chosen so the cursor stays in view.
    fn h_offset(&self, code_width: usize) -> usize {
        let line = self
            .buffer
            .lines
            .get(self.buffer.cursor_line)
            .map(String::as_str)
            .unwrap_or("");
        let cursor = display_col(line, self.buffer.cursor_col, self.tab_width);
        cursor.saturating_sub(code_width.saturating_sub(1))
    }

    /// Calculate the width needed for the line number gutter.
    fn gutter_width(&self) -> u16 {
        let digits = self.buffer.line_count().max(1).to_string().len() as u16;
        digits + 2 // digits + space + separator
    }
}

impl<'a> Widget for EditorWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };

        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let gutter_w = self.gutter_width();
        let code_width = inner.width.saturating_sub(gutter_w);
        if code_width == 0 {
            return;
        }

        let code_width = code_width as usize;
        let h_offset = self.h_offset(code_width);
        let lines = &self.buffer.lines;
        let scroll = self.buffer.scroll_offset;
        let syntax_set = &self.highlighter.syntax_set;
        let syntax = self.highlighter.syntax_for(self.file_name);
        let mut highlight_state = HighlightLines::new(syntax, &self.highlighter.theme);

        // Lines above the viewport still feed the parser state.
        for line in lines.iter().take(scroll) {
            let _ = highlight_state.highlight_line(line, syntax_set);
        }

        let cursor_style = Style::default()
            .fg(self.theme.editor_cursor_fg)
            .bg(self.theme.editor_cursor_bg);

        for row in 0..inner.height as usize {
            let line_idx = scroll + row;
            let y = inner.y + row as u16;

            let Some(line_content) = lines.get(line_idx) else {
                buf.set_string(inner.x, y, "~", Style::default().fg(self.theme.dim_fg));
                continue;
            };

            let is_current_line = self.show_cursor && line_idx == self.buffer.cursor_line;

            // Line number gutter
            let num_str = format!("{:>width$} ", line_idx + 1, width = (gutter_w - 2) as usize);
            let gutter_style = if is_current_line {
                Style::default()
                    .fg(self.theme.editor_line_nr_current)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.editor_line_nr)
            };
            buf.set_span(inner.x, y, &Span::styled(num_str, gutter_style), gutter_w);
            buf.set_string(
                inner.x + gutter_w - 1,
                y,
                "│",
                Style::default().fg(self.theme.editor_gutter_sep),
            );

            let code_x = inner.x + gutter_w;
            if is_current_line {
                buf.set_style(
                    Rect::new(code_x, y, code_width as u16, 1),
                    Style::default().bg(self.theme.editor_current_line_bg),
                );
            }

            let highlighted = highlight_state
                .highlight_line(line_content, syntax_set)
                .unwrap_or_default();

            let fill_style = if is_current_line {
                Style::default().bg(self.theme.editor_current_line_bg)
            } else {
                Style::default()
            };

            // Walk display columns, drawing the ones inside the viewport.
            let mut vcol = 0usize;
            let mut cursor_drawn = false;
            let chars = highlighted
                .iter()
                .flat_map(|(style, text)| text.chars().map(move |ch| (*style, ch)));
            for (char_idx, (style, ch)) in chars.enumerate() {
                if vcol >= h_offset + code_width {
                    break;
                }
                let width = cell_width(ch, vcol, self.tab_width);
                let on_cursor = is_current_line && char_idx == self.buffer.cursor_col;
                cursor_drawn |= on_cursor;
                let fg = Color::Rgb(style.foreground.r, style.foreground.g, style.foreground.b);
                let cell_style = if on_cursor {
                    cursor_style
                } else {
                    fill_style.fg(fg)
                };
                // A tab becomes blanks; only its first cell carries the cursor.
                let symbol = if ch == '\t' { ' ' } else { ch };
                for cell in vcol..vcol + width {
                    if cell < h_offset || cell >= h_offset + code_width {
                        continue;
                    }
                    let style = if cell == vcol { cell_style } else { fill_style };
                    let x = code_x + (cell - h_offset) as u16;
                    buf.set_string(x, y, symbol.to_string(), style);
                }
                vcol += width;
            }

            // Cursor past the last character
            if is_current_line && !cursor_drawn {
                let cursor = display_col(line_content, self.buffer.cursor_col, self.tab_width);
                if cursor >= h_offset && cursor < h_offset + code_width {
                    buf.set_string(code_x + (cursor - h_offset) as u16, y, " ", cursor_style);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_theme() -> ThemeColors {
        crate::theme::dark_theme()
    }

    fn render(buffer: &TextBuffer, highlighter: &Highlighter, width: u16, height: u16) -> Buffer {
        let theme = test_theme();
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        EditorWidget::new(buffer, &theme, highlighter)
            .file_name("main.rs")
            .render(area, &mut buf);
        buf
    }

    fn row(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf.cell((x, y)).unwrap().symbol().to_string())
            .collect()
    }

    #[test]
    fn renders_numbered_lines_and_tildes() {
        let highlighter = Highlighter::new(DEFAULT_SYNTAX_THEME);
        let buffer = TextBuffer::new("fn main() {\n}");
        let buf = render(&buffer, &highlighter, 30, 4);
        assert!(row(&buf, 0).starts_with("1 │fn main() {"));
        assert!(row(&buf, 1).starts_with("2 │}"));
        assert!(row(&buf, 2).starts_with('~'));
    }

    #[test]
    fn cursor_cell_is_highlighted() {
        let highlighter = Highlighter::new(DEFAULT_SYNTAX_THEME);
        let theme = test_theme();
        let mut buffer = TextBuffer::new("abc");
        buffer.move_right();
        let buf = render(&buffer, &highlighter, 20, 2);
        // gutter is 3 wide, cursor on 'b'
        assert_eq!(buf.cell((4, 0)).unwrap().bg, theme.editor_cursor_bg);
        assert_eq!(buf.cell((4, 0)).unwrap().symbol(), "b");
    }

    #[test]
    fn scrolled_view_starts_at_offset() {
        let highlighter = Highlighter::new(DEFAULT_SYNTAX_THEME);
        let content: Vec<String> = (1..=20).map(|i| format!("line{i}")).collect();
        let mut buffer = TextBuffer::new(&content.join("\n"));
        buffer.scroll_offset = 10;
        let buf = render(&buffer, &highlighter, 30, 3);
        assert!(row(&buf, 0).starts_with("11 │line11"));
    }

    #[test]
    fn long_line_scrolls_to_keep_cursor_visible() {
        let highlighter = Highlighter::new(DEFAULT_SYNTAX_THEME);
        let theme = test_theme();
        let mut buffer = TextBuffer::new(&format!("{}END", "x".repeat(40)));
        buffer.move_end();
        let buf = render(&buffer, &highlighter, 20, 2);
        let first = row(&buf, 0);
        assert!(first.starts_with("1 │xxx"));
        assert!(first.contains("END"));
        // code area is 17 wide, the cursor sits in its last column
        assert_eq!(buf.cell((19, 0)).unwrap().bg, theme.editor_cursor_bg);
    }

    #[test]
    fn short_line_is_not_scrolled() {
        let highlighter = Highlighter::new(DEFAULT_SYNTAX_THEME);
        let mut buffer = TextBuffer::new(&format!("start{}", "y".repeat(40)));
        buffer.move_home();
        let buf = render(&buffer, &highlighter, 20, 2);
        assert!(row(&buf, 0).starts_with("1 │start"));
    }

    #[test]
    fn tabs_expand_to_tab_stops() {
        let highlighter = Highlighter::new(DEFAULT_SYNTAX_THEME);
        let buffer = TextBuffer::new("\tb\na\tc");
        let buf = render(&buffer, &highlighter, 20, 2);
        assert!(row(&buf, 0).starts_with("1 │    b"));
        assert!(row(&buf, 1).starts_with("2 │a   c"));
    }

    #[test]
    fn display_col_counts_tab_cells() {
        assert_eq!(display_col("a\tb", 2, 4), 4);
        assert_eq!(display_col("\t\t", 2, 4), 8);
        assert_eq!(display_col("ab\t", 3, 2), 4);
        assert_eq!(display_col("ab", 5, 4), 2);
    }

    #[test]
    fn gutter_grows_with_line_count() {
        let highlighter = Highlighter::new(DEFAULT_SYNTAX_THEME);
        let theme = test_theme();
        let short = TextBuffer::new("a");
        assert_eq!(EditorWidget::new(&short, &theme, &highlighter).gutter_width(), 3);

        let many: Vec<String> = (0..100).map(|i| i.to_string()).collect();
        let long = TextBuffer::new(&many.join("\n"));
        assert_eq!(EditorWidget::new(&long, &theme, &highlighter).gutter_width(), 5);
    }

    #[test]
    fn syntax_follows_extension() {
        let highlighter = Highlighter::new("no-such-theme");
        assert_eq!(highlighter.syntax_for(Some("lib.rs")).name, "Rust");
        assert_eq!(highlighter.syntax_for(Some("README")).name, "Plain Text");
        assert_eq!(highlighter.syntax_for(None).name, "Plain Text");
    }
}
