use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Name and path of the single root node.
pub const ROOT_NAME: &str = "app";

/// Opaque node identifier. Assigned once by [`IdGenerator`] and never reused
/// within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Sentinel id of the root node.
    pub const ROOT: NodeId = NodeId(0);
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A folder or file in the virtual tree.
///
/// Field names serialize in camelCase so a persisted snapshot is a flat array
/// of `{ id, name, isFile, parentId, path, content?, isOpen }` records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub is_file: bool,
    pub parent_id: Option<NodeId>,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub is_open: bool,
}

impl Node {
    /// The canonical root node.
    pub fn root() -> Self {
        Self {
            id: NodeId::ROOT,
            name: ROOT_NAME.to_string(),
            is_file: false,
            parent_id: None,
            path: ROOT_NAME.to_string(),
            content: None,
            is_open: true,
        }
    }

    /// Create a child of `parent`. Files start with empty content, folders
    /// start expanded.
    #[cfg(test)]
    pub fn child_of(parent: &Node, id: NodeId, name: &str, is_file: bool) -> Self {
        Self::with_parent(parent.id, &parent.path, id, name, is_file)
    }

    pub(crate) fn with_parent(
        parent_id: NodeId,
        parent_path: &str,
        id: NodeId,
        name: &str,
        is_file: bool,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            is_file,
            parent_id: Some(parent_id),
            path: format!("{}/{}", parent_path, name),
            content: if is_file { Some(String::new()) } else { None },
            is_open: !is_file,
        }
    }

    pub fn is_folder(&self) -> bool {
        !self.is_file
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// File content, or the empty string for folders.
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

/// Counter-based id source. Starts one past the largest id it has seen.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    pub fn after(snapshot: &Snapshot) -> Self {
        let max = snapshot.iter().map(|n| n.id.0).max().unwrap_or(0);
        Self { next: max + 1 }
    }

    pub fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }
}

/// An immutable view of the whole tree at one instant.
///
/// Cloning is cheap; a held snapshot never observes later mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    nodes: Arc<[Node]>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::from_trusted(vec![Node::root()])
    }
}

impl Snapshot {
    /// Wrap a node list that is already known to satisfy the tree invariants.
    pub(crate) fn from_trusted(nodes: Vec<Node>) -> Self {
        Self {
            nodes: nodes.into(),
        }
    }

    /// Build a snapshot from persisted records, repairing what cannot be
    /// trusted.
    ///
    /// The root is always the canonical [`Node::root`]; only its `isOpen` flag
    /// is taken from the records. Every other node is kept only if it hangs
    /// below a kept folder, its path is the parent's path plus its own name,
    /// and its id and path have not been seen before. Anything else (orphans,
    /// cycles, children of files, stray roots) is dropped.
    pub fn from_records(records: Vec<Node>) -> Self {
        let mut root = Node::root();
        let mut candidates = Vec::with_capacity(records.len());
        let mut found_root = false;

        for node in records {
            if node.id == NodeId::ROOT {
                if !found_root && node.is_root() {
                    found_root = true;
                    if node.name != ROOT_NAME || node.path != ROOT_NAME || node.is_file {
                        warn!(name = %node.name, path = %node.path, "replacing malformed root");
                    }
                    root.is_open = node.is_open;
                } else {
                    warn!(path = %node.path, "dropping node that reuses the root id");
                }
            } else if node.is_root() {
                warn!(id = %node.id, "dropping extra root node");
            } else {
                candidates.push(node);
            }
        }
        if !found_root {
            warn!("persisted tree has no root node, inserting one");
        }

        let mut children: HashMap<NodeId, Vec<usize>> = HashMap::new();
        for (index, node) in candidates.iter().enumerate() {
            if let Some(parent) = node.parent_id {
                children.entry(parent).or_default().push(index);
            }
        }

        let mut seen_ids = HashSet::from([root.id]);
        let mut seen_paths = HashSet::from([root.path.clone()]);
        let mut keep = vec![false; candidates.len()];
        // (folder id, folder path) pairs still to expand.
        let mut pending = vec![(root.id, root.path.clone())];

        while let Some((parent_id, parent_path)) = pending.pop() {
            for &index in children.get(&parent_id).into_iter().flatten() {
                let node = &candidates[index];
                let valid_name = !node.name.is_empty() && !node.name.contains('/');
                if !valid_name || node.path != format!("{}/{}", parent_path, node.name) {
                    warn!(id = %node.id, path = %node.path, "dropping node with inconsistent path");
                    continue;
                }
                if !seen_ids.insert(node.id) || !seen_paths.insert(node.path.clone()) {
                    warn!(id = %node.id, path = %node.path, "dropping duplicate node");
                    continue;
                }
                keep[index] = true;
                if node.is_folder() {
                    pending.push((node.id, node.path.clone()));
                }
            }
        }

        let dropped = keep.iter().filter(|kept| !**kept).count();
        if dropped > 0 {
            warn!(dropped, "dropped unreachable or invalid nodes");
        }

        let mut nodes = Vec::with_capacity(candidates.len() - dropped + 1);
        nodes.push(root);
        nodes.extend(
            candidates
                .into_iter()
                .zip(keep)
                .filter_map(|(node, kept)| kept.then_some(node)),
        );
        Self::from_trusted(nodes)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.nodes.iter()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn root(&self) -> Option<&Node> {
        self.get(NodeId::ROOT)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn find_by_path(&self, path: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.path == path)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Children of `parent`, ordered folders first and then by name.
    pub fn children_of(&self, parent: NodeId) -> Vec<&Node> {
        let mut children: Vec<&Node> = self
            .nodes
            .iter()
            .filter(|n| n.parent_id == Some(parent))
            .collect();
        children.sort_by(|a, b| sibling_order(a, b));
        children
    }
}

/// Sibling order: folders before files, then byte-wise by name.
pub fn sibling_order(a: &Node, b: &Node) -> std::cmp::Ordering {
    a.is_file.cmp(&b.is_file).then_with(|| a.name.cmp(&b.name))
}
