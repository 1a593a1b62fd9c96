use std::collections::HashSet;

use tracing::debug;

use super::builder::{build_chain, BlockedByFile};
use super::node::{IdGenerator, Node, NodeId, Snapshot};
use super::resolve::{deepest_folder, remaining_suffix};

/// What `add_path` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// Input was empty or whitespace.
    Blank,
    /// Every segment already existed.
    Unchanged,
    /// New nodes, in creation order (parents before children).
    Created(Vec<NodeId>),
    /// An existing file occupies a segment that must be a folder.
    BlockedByFile(String),
}

/// Owner of the live tree snapshot.
///
/// Each mutation builds a complete new [`Snapshot`] and swaps it in; snapshots
/// handed out earlier stay untouched.
#[derive(Debug, Clone)]
pub struct TreeStore {
    snapshot: Snapshot,
    ids: IdGenerator,
}

impl Default for TreeStore {
    fn default() -> Self {
        Self::new(Snapshot::default())
    }
}

impl TreeStore {
    pub fn new(snapshot: Snapshot) -> Self {
        let ids = IdGenerator::after(&snapshot);
        Self { snapshot, ids }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Create every missing node named by the slash-delimited `input`.
    pub fn add_path(&mut self, input: &str) -> AddOutcome {
        let input = input.trim();
        if input.is_empty() {
            return AddOutcome::Blank;
        }

        let anchor = deepest_folder(input, &self.snapshot);
        let suffix = remaining_suffix(input, anchor);

        let created = match build_chain(suffix, anchor, &self.snapshot, &mut self.ids) {
            Ok(created) => created,
            Err(BlockedByFile { path }) => {
                debug!(input, %path, "add_path blocked by file");
                return AddOutcome::BlockedByFile(path);
            }
        };
        if created.is_empty() {
            debug!(input, "add_path found nothing to create");
            return AddOutcome::Unchanged;
        }

        let ids: Vec<NodeId> = created.iter().map(|n| n.id).collect();
        debug!(input, created = ids.len(), "add_path");

        let mut nodes = self.snapshot.nodes().to_vec();
        nodes.extend(created);
        self.snapshot = Snapshot::from_trusted(nodes);
        AddOutcome::Created(ids)
    }

    /// Replace the content of the file `id`. Returns false when `id` is
    /// absent or names a folder.
    pub fn edit_content(&mut self, id: NodeId, content: &str) -> bool {
        if !self.snapshot.get(id).is_some_and(|n| n.is_file) {
            return false;
        }
        debug!(%id, len = content.len(), "edit_content");
        self.replace_node(id, |node| node.content = Some(content.to_string()));
        true
    }

    /// Remove `id` and all of its descendants. Returns how many nodes were
    /// removed. The root itself is kept: deleting it empties the tree.
    pub fn delete_subtree(&mut self, id: NodeId) -> usize {
        if !self.snapshot.contains(id) {
            return 0;
        }

        let mut doomed = self.descendants(id);
        if id != NodeId::ROOT {
            doomed.insert(id);
        }
        if doomed.is_empty() {
            return 0;
        }

        let nodes: Vec<Node> = self
            .snapshot
            .iter()
            .filter(|n| !doomed.contains(&n.id))
            .cloned()
            .collect();
        debug!(%id, removed = doomed.len(), "delete_subtree");
        self.snapshot = Snapshot::from_trusted(nodes);
        doomed.len()
    }

    /// Flip `is_open` on the folder `id`. Returns false for files and
    /// missing ids.
    pub fn toggle_open(&mut self, id: NodeId) -> bool {
        if !self.snapshot.get(id).is_some_and(|n| n.is_folder()) {
            return false;
        }
        self.replace_node(id, |node| node.is_open = !node.is_open);
        true
    }

    /// Set `is_open` on the folder `id`. Returns true only if it changed.
    pub fn set_open(&mut self, id: NodeId, open: bool) -> bool {
        match self.snapshot.get(id) {
            Some(node) if node.is_folder() && node.is_open != open => self.toggle_open(id),
            _ => false,
        }
    }

    /// All transitive children of `id`, excluding `id`.
    fn descendants(&self, id: NodeId) -> HashSet<NodeId> {
        let mut found = HashSet::new();
        let mut stack = vec![id];
        while let Some(parent) = stack.pop() {
            for node in self.snapshot.iter() {
                if node.parent_id == Some(parent) && found.insert(node.id) {
                    stack.push(node.id);
                }
            }
        }
        found
    }

    fn replace_node(&mut self, id: NodeId, change: impl FnOnce(&mut Node)) {
        let mut nodes = self.snapshot.nodes().to_vec();
        if let Some(node) = nodes.iter_mut().find(|n| n.id == id) {
            change(node);
        }
        self.snapshot = Snapshot::from_trusted(nodes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(store: &TreeStore) -> Vec<String> {
        let mut paths: Vec<String> = store.snapshot().iter().map(|n| n.path.clone()).collect();
        paths.sort();
        paths
    }

    fn id_of(store: &TreeStore, path: &str) -> NodeId {
        store.snapshot().find_by_path(path).unwrap().id
    }

    #[test]
    fn add_file_under_new_folder() {
        let mut store = TreeStore::default();
        let outcome = store.add_path("a/b.txt");
        let AddOutcome::Created(ids) = outcome else {
            panic!("expected nodes to be created");
        };
        assert_eq!(ids.len(), 2);

        let a = store.snapshot().get(ids[0]).unwrap();
        assert_eq!(a.name, "a");
        assert_eq!(a.path, "app/a");
        assert!(a.is_folder());

        let b = store.snapshot().get(ids[1]).unwrap();
        assert_eq!(b.path, "app/a/b.txt");
        assert!(b.is_file);
        assert_eq!(b.content.as_deref(), Some(""));
        assert_eq!(b.parent_id, Some(a.id));
    }

    #[test]
    fn unanchored_folder_lands_under_root() {
        let mut store = TreeStore::default();
        store.add_path("x/y");
        let x = store.snapshot().iter().find(|n| n.name == "x").unwrap();
        assert_eq!(x.path, "app/x");
        assert_eq!(x.parent_id, Some(NodeId::ROOT));
    }

    #[test]
    fn add_path_is_idempotent() {
        let mut store = TreeStore::default();
        store.add_path("app/src/lib.rs");
        let once = store.snapshot().clone();
        assert_eq!(store.add_path("app/src/lib.rs"), AddOutcome::Unchanged);
        assert_eq!(store.add_path("src/lib.rs"), AddOutcome::Unchanged);
        assert_eq!(store.snapshot(), &once);
    }

    #[test]
    fn blank_input_is_ignored() {
        let mut store = TreeStore::default();
        assert_eq!(store.add_path("   "), AddOutcome::Blank);
        assert_eq!(store.add_path(""), AddOutcome::Blank);
        assert_eq!(store.snapshot().len(), 1);
    }

    #[test]
    fn input_is_trimmed() {
        let mut store = TreeStore::default();
        store.add_path("  docs/guide.md  ");
        assert!(store.snapshot().find_by_path("app/docs/guide.md").is_some());
    }

    #[test]
    fn deep_suffix_below_resolved_folder_keeps_paths_consistent() {
        let mut store = TreeStore::default();
        store.add_path("app/x");
        store.add_path("app/x/y/z.rs");
        for node in store.snapshot().iter() {
            if let Some(parent_id) = node.parent_id {
                let parent = store.snapshot().get(parent_id).unwrap();
                assert_eq!(node.path, format!("{}/{}", parent.path, node.name));
            }
        }
        assert_eq!(paths(&store), vec!["app", "app/x", "app/x/y", "app/x/y/z.rs"]);
    }

    #[test]
    fn every_new_node_extends_its_parent_path() {
        let mut store = TreeStore::default();
        for input in ["a/b/c.txt", "app/a/d", "a/b/e/f.md", "q.txt", "app/a/b/g"] {
            store.add_path(input);
        }
        for node in store.snapshot().iter().filter(|n| !n.is_root()) {
            let parent = store.snapshot().get(node.parent_id.unwrap()).unwrap();
            assert_eq!(node.path, format!("{}/{}", parent.path, node.name));
        }
    }

    #[test]
    fn path_through_file_is_blocked() {
        let mut store = TreeStore::default();
        store.add_path("notes.txt");
        let before = store.snapshot().clone();
        assert_eq!(
            store.add_path("notes.txt/deeper"),
            AddOutcome::BlockedByFile("app/notes.txt".into())
        );
        assert_eq!(store.snapshot(), &before);
    }

    #[test]
    fn delete_subtree_removes_descendants_only() {
        let mut store = TreeStore::default();
        store.add_path("a/b.txt");
        store.add_path("c.txt");
        let a = id_of(&store, "app/a");
        assert_eq!(store.delete_subtree(a), 2);
        assert_eq!(paths(&store), vec!["app", "app/c.txt"]);
    }

    #[test]
    fn delete_subtree_reaches_deep_descendants() {
        let mut store = TreeStore::default();
        store.add_path("a/b/c/d/e.txt");
        store.add_path("a/z");
        store.add_path("keep/me.md");
        let b = id_of(&store, "app/a/b");
        assert_eq!(store.delete_subtree(b), 4);
        assert_eq!(
            paths(&store),
            vec!["app", "app/a", "app/a/z", "app/keep", "app/keep/me.md"]
        );
    }

    #[test]
    fn delete_missing_id_is_noop() {
        let mut store = TreeStore::default();
        store.add_path("a");
        let before = store.snapshot().clone();
        assert_eq!(store.delete_subtree(NodeId(999)), 0);
        assert_eq!(store.snapshot(), &before);
    }

    #[test]
    fn delete_root_keeps_root() {
        let mut store = TreeStore::default();
        store.add_path("a/b.txt");
        store.add_path("c");
        assert_eq!(store.delete_subtree(NodeId::ROOT), 3);
        assert_eq!(paths(&store), vec!["app"]);
        assert_eq!(store.delete_subtree(NodeId::ROOT), 0);
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let mut store = TreeStore::default();
        store.add_path("a");
        let a = id_of(&store, "app/a");
        store.delete_subtree(a);
        store.add_path("a");
        assert_ne!(id_of(&store, "app/a"), a);
    }

    #[test]
    fn edit_content_replaces_file_content() {
        let mut store = TreeStore::default();
        store.add_path("main.rs");
        let id = id_of(&store, "app/main.rs");
        assert!(store.edit_content(id, "fn main() {}"));
        assert_eq!(store.snapshot().get(id).unwrap().text(), "fn main() {}");
    }

    #[test]
    fn edit_content_on_missing_or_folder_is_noop() {
        let mut store = TreeStore::default();
        store.add_path("dir/file.txt");
        let before = store.snapshot().clone();
        assert!(!store.edit_content(NodeId(42), "x"));
        assert!(!store.edit_content(id_of(&store, "app/dir"), "x"));
        assert_eq!(store.snapshot(), &before);
    }

    #[test]
    fn toggle_open_changes_only_target() {
        let mut store = TreeStore::default();
        store.add_path("a/b/c.txt");
        store.add_path("d");
        let before = store.snapshot().clone();
        let b = id_of(&store, "app/a/b");
        assert!(store.toggle_open(b));

        for (old, new) in before.iter().zip(store.snapshot().iter()) {
            if old.id == b {
                assert_eq!(new.is_open, !old.is_open);
                let mut reverted = new.clone();
                reverted.is_open = old.is_open;
                assert_eq!(&reverted, old);
            } else {
                assert_eq!(old, new);
            }
        }
    }

    #[test]
    fn toggle_open_ignores_files_and_missing_ids() {
        let mut store = TreeStore::default();
        store.add_path("f.txt");
        let before = store.snapshot().clone();
        assert!(!store.toggle_open(id_of(&store, "app/f.txt")));
        assert!(!store.toggle_open(NodeId(77)));
        assert_eq!(store.snapshot(), &before);
    }

    #[test]
    fn set_open_reports_change() {
        let mut store = TreeStore::default();
        assert!(!store.set_open(NodeId::ROOT, true));
        assert!(store.set_open(NodeId::ROOT, false));
        assert!(!store.snapshot().root().unwrap().is_open);
    }

    #[test]
    fn earlier_snapshots_are_not_affected() {
        let mut store = TreeStore::default();
        store.add_path("a.txt");
        let held = store.snapshot().clone();
        let id = id_of(&store, "app/a.txt");
        store.edit_content(id, "new");
        assert_eq!(held.get(id).unwrap().text(), "");
    }
}
