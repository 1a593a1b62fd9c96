/// Multi-line text buffer with a cursor, used for file content and the
/// scratch note.
///
/// The cursor column counts characters, not bytes.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    /// Lines of text; never empty.
    pub lines: Vec<String>,
    pub cursor_line: usize,
    pub cursor_col: usize,
    /// Vertical scroll offset (index of the topmost visible line).
    pub scroll_offset: usize,
    /// Whether the buffer changed since it was loaded or last marked saved.
    pub modified: bool,
    /// Visible height of the text area (set during render).
    pub visible_height: usize,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new("")
    }
}

impl TextBuffer {
    /// Create a buffer holding `content`. Splitting on `\n` keeps a
    /// trailing newline as a final empty line, so `text()` returns the input
    /// unchanged.
    pub fn new(content: &str) -> Self {
        Self {
            lines: content.split('\n').map(String::from).collect(),
            cursor_line: 0,
            cursor_col: 0,
            scroll_offset: 0,
            modified: false,
            visible_height: 10,
        }
    }

    /// The whole buffer as one string.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    /// Length of the current line in characters.
    pub fn current_line_len(&self) -> usize {
        self.lines[self.cursor_line].chars().count()
    }

    /// Byte offset of the cursor within the current line.
    fn cursor_byte(&self) -> usize {
        let line = &self.lines[self.cursor_line];
        line.char_indices()
            .nth(self.cursor_col)
            .map(|(i, _)| i)
            .unwrap_or(line.len())
    }

    fn clamp_cursor(&mut self) {
        self.cursor_line = self.cursor_line.min(self.lines.len() - 1);
        self.cursor_col = self.cursor_col.min(self.current_line_len());
    }

    /// Adjust the scroll offset so the cursor line is visible.
    pub fn ensure_cursor_visible(&mut self) {
        let height = self.visible_height.max(1);
        if self.cursor_line < self.scroll_offset {
            self.scroll_offset = self.cursor_line;
        } else if self.cursor_line >= self.scroll_offset + height {
            self.scroll_offset = self.cursor_line + 1 - height;
        }
    }

    // ── Editing ─────────────────────────────────────────────────────────────

    pub fn insert_char(&mut self, ch: char) {
        let at = self.cursor_byte();
        self.lines[self.cursor_line].insert(at, ch);
        self.cursor_col += 1;
        self.modified = true;
    }

    /// Insert text that may span several lines (paste).
    pub fn insert_str(&mut self, text: &str) {
        for (i, part) in text.split('\n').enumerate() {
            if i > 0 {
                self.insert_newline();
            }
            for ch in part.chars().filter(|c| *c != '\r') {
                self.insert_char(ch);
            }
        }
    }

    /// Split the current line at the cursor.
    pub fn insert_newline(&mut self) {
        let at = self.cursor_byte();
        let rest = self.lines[self.cursor_line].split_off(at);
        self.lines.insert(self.cursor_line + 1, rest);
        self.cursor_line += 1;
        self.cursor_col = 0;
        self.modified = true;
        self.ensure_cursor_visible();
    }

    /// Insert spaces up to the next multiple of `width`.
    pub fn insert_tab(&mut self, width: usize) {
        let width = width.max(1);
        let spaces = width - (self.cursor_col % width);
        for _ in 0..spaces {
            self.insert_char(' ');
        }
    }

    /// Backspace: delete the character before the cursor, joining with the
    /// previous line at column zero.
    pub fn delete_char_before(&mut self) {
        if self.cursor_col > 0 {
            self.cursor_col -= 1;
            let at = self.cursor_byte();
            self.lines[self.cursor_line].remove(at);
            self.modified = true;
        } else if self.cursor_line > 0 {
            let line = self.lines.remove(self.cursor_line);
            self.cursor_line -= 1;
            self.cursor_col = self.current_line_len();
            self.lines[self.cursor_line].push_str(&line);
            self.modified = true;
            self.ensure_cursor_visible();
        }
    }

    /// Delete: remove the character under the cursor, joining the next line
    /// at end of line.
    pub fn delete_char_at(&mut self) {
        if self.cursor_col < self.current_line_len() {
            let at = self.cursor_byte();
            self.lines[self.cursor_line].remove(at);
            self.modified = true;
        } else if self.cursor_line + 1 < self.lines.len() {
            let next = self.lines.remove(self.cursor_line + 1);
            self.lines[self.cursor_line].push_str(&next);
            self.modified = true;
        }
    }

    // ── Movement ────────────────────────────────────────────────────────────

    pub fn move_up(&mut self) {
        if self.cursor_line > 0 {
            self.cursor_line -= 1;
            self.clamp_cursor();
            self.ensure_cursor_visible();
        }
    }

    pub fn move_down(&mut self) {
        if self.cursor_line + 1 < self.lines.len() {
            self.cursor_line += 1;
            self.clamp_cursor();
            self.ensure_cursor_visible();
        }
    }

    pub fn move_left(&mut self) {
        if self.cursor_col > 0 {
            self.cursor_col -= 1;
        } else if self.cursor_line > 0 {
            self.cursor_line -= 1;
            self.cursor_col = self.current_line_len();
            self.ensure_cursor_visible();
        }
    }

    pub fn move_right(&mut self) {
        if self.cursor_col < self.current_line_len() {
            self.cursor_col += 1;
        } else if self.cursor_line + 1 < self.lines.len() {
            self.cursor_line += 1;
            self.cursor_col = 0;
            self.ensure_cursor_visible();
        }
    }

    pub fn move_home(&mut self) {
        self.cursor_col = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor_col = self.current_line_len();
    }

    pub fn move_to_top(&mut self) {
        self.cursor_line = 0;
        self.cursor_col = 0;
        self.ensure_cursor_visible();
    }

    pub fn move_to_bottom(&mut self) {
        self.cursor_line = self.lines.len() - 1;
        self.cursor_col = self.current_line_len();
        self.ensure_cursor_visible();
    }

    pub fn page_up(&mut self) {
        let step = self.visible_height.max(1);
        self.cursor_line = self.cursor_line.saturating_sub(step);
        self.clamp_cursor();
        self.ensure_cursor_visible();
    }

    pub fn page_down(&mut self) {
        let step = self.visible_height.max(1);
        self.cursor_line = (self.cursor_line + step).min(self.lines.len() - 1);
        self.clamp_cursor();
        self.ensure_cursor_visible();
    }
}
