use super::node::{IdGenerator, Node, NodeId, Snapshot, ROOT_NAME};

/// An existing file sits where the path still needs a folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockedByFile {
    pub path: String,
}

/// A segment names a file only when it is the last one and has an extension.
pub fn is_file_segment(segment: &str, is_last: bool) -> bool {
    is_last && segment.contains('.')
}

/// Synthesize the chain of nodes missing for `suffix` below `anchor`.
///
/// With no anchor the chain hangs off the root: a leading `app` segment names
/// the root itself, anything else is nested under it. Segments that already
/// exist at their cumulative path are reused as the next parent. Empty
/// segments are ignored.
pub fn build_chain(
    suffix: &str,
    anchor: Option<&Node>,
    snapshot: &Snapshot,
    ids: &mut IdGenerator,
) -> Result<Vec<Node>, BlockedByFile> {
    let mut segments: Vec<&str> = suffix.split('/').filter(|s| !s.is_empty()).collect();

    let (mut parent_id, mut parent_path) = match anchor {
        Some(folder) => (folder.id, folder.path.clone()),
        None => {
            if segments.first() == Some(&ROOT_NAME) {
                segments.remove(0);
            }
            (NodeId::ROOT, ROOT_NAME.to_string())
        }
    };

    let mut created = Vec::new();
    let last = segments.len().saturating_sub(1);

    for (i, segment) in segments.iter().enumerate() {
        let is_last = i == last;
        let path = format!("{}/{}", parent_path, segment);

        if let Some(existing) = snapshot.find_by_path(&path) {
            if existing.is_file && !is_last {
                return Err(BlockedByFile { path });
            }
            parent_id = existing.id;
            parent_path = path;
            continue;
        }

        let node = Node::with_parent(
            parent_id,
            &parent_path,
            ids.next_id(),
            segment,
            is_file_segment(segment, is_last),
        );
        parent_id = node.id;
        parent_path = node.path.clone();
        created.push(node);
    }

    Ok(created)
}
