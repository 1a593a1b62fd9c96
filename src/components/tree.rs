use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::theme::ThemeColors;
use crate::tree::{FlatItem, TreeView};

/// Tree widget that renders the virtual tree with box-drawing characters.
pub struct TreeWidget<'a> {
    view: &'a TreeView,
    theme: &'a ThemeColors,
    use_icons: bool,
    focused: bool,
    block: Option<Block<'a>>,
}

impl<'a> TreeWidget<'a> {
    pub fn new(view: &'a TreeView, theme: &'a ThemeColors, use_icons: bool) -> Self {
        Self {
            view,
            theme,
            use_icons,
            focused: true,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = block.into();
        self
    }

    /// Unfocused trees draw the selection without highlight colors.
    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    /// Build the prefix string for tree indentation using box-drawing characters.
    ///
    /// Continuation lines depend on whether each ancestor is a last sibling.
    fn build_prefix(item: &FlatItem, items: &[FlatItem], item_index: usize) -> String {
        if item.depth == 0 {
            return String::new();
        }

        let mut prefix = String::new();

        for d in 1..item.depth {
            // Nearest row above at depth d is this item's ancestor.
            let ancestor_is_last = items[..item_index]
                .iter()
                .rev()
                .take_while(|row| row.depth >= d)
                .find(|row| row.depth == d)
                .is_some_and(|row| row.is_last_sibling);
            prefix.push_str(if ancestor_is_last { "   " } else { "│  " });
        }

        prefix.push_str(if item.is_last_sibling { "└──" } else { "├──" });
        prefix
    }

    /// Get the folder/file indicator.
    fn item_indicator(&self, item: &FlatItem) -> &'static str {
        match (self.use_icons, item.is_file, item.is_open) {
            (true, false, true) => "\u{f07c} ",
            (true, false, false) => "\u{f07b} ",
            (true, true, _) => Self::file_icon_by_ext(&item.name),
            (false, false, true) => "▾ ",
            (false, false, false) => "▸ ",
            (false, true, _) => "  ",
        }
    }

    /// Get a Nerd Font icon for a file based on its extension.
    fn file_icon_by_ext(name: &str) -> &'static str {
        let ext = name.rsplit('.').next().unwrap_or("").to_lowercase();
        match ext.as_str() {
            "rs" => "\u{e7a8} ",
            "py" => "\u{e73c} ",
            "js" | "jsx" => "\u{e74e} ",
            "ts" | "tsx" => "\u{e628} ",
            "html" | "htm" => "\u{e736} ",
            "css" | "scss" | "sass" => "\u{e749} ",
            "json" => "\u{e60b} ",
            "toml" | "yaml" | "yml" | "ini" | "cfg" => "\u{e615} ",
            "md" | "markdown" | "rst" | "txt" => "\u{f48a} ",
            "sh" | "bash" | "zsh" | "fish" => "\u{f489} ",
            "go" => "\u{e626} ",
            "java" => "\u{e738} ",
            "c" | "h" => "\u{e61e} ",
            "cpp" | "cxx" | "cc" | "hpp" => "\u{e61d} ",
            "rb" => "\u{e739} ",
            "php" => "\u{e73d} ",
            "lua" => "\u{e620} ",
            "swift" => "\u{e755} ",
            "kt" | "kts" => "\u{e634} ",
            "ex" | "exs" => "\u{e62d} ",
            "lock" => "\u{f023} ",
            "sql" => "\u{f1c0} ",
            _ => "\u{f15b} ",
        }
    }
}

impl<'a> Widget for TreeWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };

        let items = &self.view.flat_items;
        let selected = self.view.selected_index;
        let visible_height = inner_area.height as usize;

        if items.is_empty() || visible_height == 0 {
            return;
        }

        let scroll = self.view.scroll_offset;
        let visible_items = items.iter().enumerate().skip(scroll).take(visible_height);

        for (i, (idx, item)) in visible_items.enumerate() {
            let y = inner_area.y + i as u16;

            let prefix = Self::build_prefix(item, items, idx);
            let indicator = self.item_indicator(item);

            let style = if idx == selected && self.focused {
                Style::default()
                    .bg(self.theme.tree_selected_bg)
                    .fg(self.theme.tree_selected_fg)
                    .add_modifier(Modifier::BOLD)
            } else if idx == selected {
                Style::default()
                    .fg(self.theme.tree_fg)
                    .add_modifier(Modifier::UNDERLINED)
            } else if item.is_file {
                Style::default().fg(self.theme.tree_file_fg)
            } else {
                Style::default()
                    .fg(self.theme.tree_dir_fg)
                    .add_modifier(Modifier::BOLD)
            };

            let mut spans = vec![
                Span::styled(prefix, Style::default().fg(self.theme.dim_fg)),
                Span::styled(format!("{}{}", indicator, item.name), style),
            ];
            // Files with content get a marker so empty stubs stand out.
            if item.has_content {
                spans.push(Span::styled(" •", Style::default().fg(self.theme.accent_fg)));
            }

            let line = Line::from(spans);
            buf.set_line(inner_area.x, y, &line, inner_area.width);
        }
    }
}
