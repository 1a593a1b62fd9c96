use super::node::{Node, NodeId, Snapshot};

/// A flattened representation of a tree node for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatItem {
    pub id: NodeId,
    pub name: String,
    pub is_file: bool,
    pub depth: usize,
    pub is_open: bool,
    pub is_last_sibling: bool,
    /// File has non-empty content.
    pub has_content: bool,
}

/// Visible rows of the tree plus selection and scroll position.
#[derive(Debug, Default)]
pub struct TreeView {
    pub flat_items: Vec<FlatItem>,
    pub selected_index: usize,
    pub scroll_offset: usize,
}

impl TreeView {
    pub fn new(snapshot: &Snapshot) -> Self {
        let mut view = Self::default();
        view.rebuild(snapshot);
        view
    }

    /// Rebuild the rows from `snapshot`, keeping the selected node selected
    /// when it still exists.
    pub fn rebuild(&mut self, snapshot: &Snapshot) {
        let selected = self.selected_id();
        self.flat_items.clear();
        if let Some(root) = snapshot.root() {
            Self::flatten_node(snapshot, root, 0, true, &mut self.flat_items);
        }

        match selected.and_then(|id| self.find_index(id)) {
            Some(idx) => self.selected_index = idx,
            None => self.clamp_selection(),
        }
    }

    fn flatten_node(
        snapshot: &Snapshot,
        node: &Node,
        depth: usize,
        is_last: bool,
        items: &mut Vec<FlatItem>,
    ) {
        items.push(FlatItem {
            id: node.id,
            name: node.name.clone(),
            is_file: node.is_file,
            depth,
            is_open: node.is_open,
            is_last_sibling: is_last,
            has_content: !node.text().is_empty(),
        });

        if node.is_file || !node.is_open {
            return;
        }

        let children = snapshot.children_of(node.id);
        let count = children.len();
        for (i, child) in children.into_iter().enumerate() {
            Self::flatten_node(snapshot, child, depth + 1, i + 1 == count, items);
        }
    }

    fn clamp_selection(&mut self) {
        if self.flat_items.is_empty() {
            self.selected_index = 0;
        } else if self.selected_index >= self.flat_items.len() {
            self.selected_index = self.flat_items.len() - 1;
        }
    }

    pub fn selected(&self) -> Option<&FlatItem> {
        self.flat_items.get(self.selected_index)
    }

    pub fn selected_id(&self) -> Option<NodeId> {
        self.selected().map(|item| item.id)
    }

    pub fn find_index(&self, id: NodeId) -> Option<usize> {
        self.flat_items.iter().position(|item| item.id == id)
    }

    /// Select the row showing `id`. Returns false if it is not visible.
    pub fn select_id(&mut self, id: NodeId) -> bool {
        match self.find_index(id) {
            Some(idx) => {
                self.selected_index = idx;
                true
            }
            None => false,
        }
    }

    pub fn select_next(&mut self) {
        let len = self.flat_items.len();
        if len > 0 && self.selected_index < len - 1 {
            self.selected_index += 1;
        }
    }

    pub fn select_previous(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
        }
    }

    pub fn select_first(&mut self) {
        self.selected_index = 0;
    }

    pub fn select_last(&mut self) {
        self.selected_index = self.flat_items.len().saturating_sub(1);
    }

    /// Move the selection to the parent row of the selected item.
    pub fn select_parent(&mut self) {
        let Some(item) = self.selected() else {
            return;
        };
        let depth = item.depth;
        if depth == 0 {
            return;
        }
        if let Some(idx) = self.flat_items[..self.selected_index]
            .iter()
            .rposition(|candidate| candidate.depth + 1 == depth)
        {
            self.selected_index = idx;
        }
    }

    /// Update the scroll offset to ensure the selected item is visible.
    pub fn update_scroll(&mut self, visible_height: usize) {
        if visible_height == 0 {
            return;
        }
        if self.selected_index < self.scroll_offset {
            self.scroll_offset = self.selected_index;
        } else if self.selected_index >= self.scroll_offset + visible_height {
            self.scroll_offset = self.selected_index - visible_height + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::store::TreeStore;

    fn sample_store() -> TreeStore {
        let mut store = TreeStore::default();
        store.add_path("src/main.rs");
        store.add_path("src/util/mod.rs");
        store.add_path("readme.md");
        store
    }

    fn names(view: &TreeView) -> Vec<&str> {
        view.flat_items.iter().map(|i| i.name.as_str()).collect()
    }

    #[test]
    fn flatten_orders_rows_and_marks_depth() {
        let store = sample_store();
        let view = TreeView::new(store.snapshot());
        assert_eq!(
            names(&view),
            vec!["app", "src", "util", "mod.rs", "main.rs", "readme.md"]
        );
        let depths: Vec<usize> = view.flat_items.iter().map(|i| i.depth).collect();
        assert_eq!(depths, vec![0, 1, 2, 3, 2, 1]);
    }

    #[test]
    fn last_sibling_flags() {
        let store = sample_store();
        let view = TreeView::new(store.snapshot());
        let last: Vec<bool> = view.flat_items.iter().map(|i| i.is_last_sibling).collect();
        assert_eq!(last, vec![true, false, false, true, true, true]);
    }

    #[test]
    fn closed_folders_hide_children() {
        let mut store = sample_store();
        let src = store.snapshot().find_by_path("app/src").unwrap().id;
        store.toggle_open(src);
        let view = TreeView::new(store.snapshot());
        assert_eq!(names(&view), vec!["app", "src", "readme.md"]);
    }

    #[test]
    fn rebuild_keeps_selected_node() {
        let mut store = sample_store();
        let mut view = TreeView::new(store.snapshot());
        let readme = store.snapshot().find_by_path("app/readme.md").unwrap().id;
        assert!(view.select_id(readme));

        store.add_path("assets");
        view.rebuild(store.snapshot());
        assert_eq!(view.selected_id(), Some(readme));
    }

    #[test]
    fn rebuild_clamps_when_selection_disappears() {
        let mut store = sample_store();
        let mut view = TreeView::new(store.snapshot());
        view.select_last();
        let readme = view.selected_id().unwrap();
        store.delete_subtree(readme);
        view.rebuild(store.snapshot());
        assert_eq!(view.selected_index, view.flat_items.len() - 1);
    }

    #[test]
    fn navigation_clamps_at_bounds() {
        let store = sample_store();
        let mut view = TreeView::new(store.snapshot());
        view.select_previous();
        assert_eq!(view.selected_index, 0);
        view.select_last();
        view.select_next();
        assert_eq!(view.selected_index, view.flat_items.len() - 1);
        view.select_first();
        assert_eq!(view.selected_index, 0);
    }

    #[test]
    fn select_parent_jumps_to_enclosing_folder() {
        let store = sample_store();
        let mut view = TreeView::new(store.snapshot());
        view.selected_index = 3; // mod.rs
        view.select_parent();
        assert_eq!(view.selected().unwrap().name, "util");
        view.select_parent();
        assert_eq!(view.selected().unwrap().name, "src");
        view.select_parent();
        view.select_parent();
        assert_eq!(view.selected_index, 0);
    }

    #[test]
    fn update_scroll_follows_selection() {
        let store = sample_store();
        let mut view = TreeView::new(store.snapshot());
        view.select_last();
        view.update_scroll(3);
        assert_eq!(view.scroll_offset, 3);
        view.select_first();
        view.update_scroll(3);
        assert_eq!(view.scroll_offset, 0);
    }
}
