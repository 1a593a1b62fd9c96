use super::node::{Node, NodeId, Snapshot};

const INDENT: &str = "  ";

/// Render the tree as indented plain text.
///
/// The root line itself is omitted; its children start at column zero. Every
/// level adds two spaces. A file with content gets one extra line holding
/// the content verbatim, one level deeper than the file name. Line breaks
/// inside content are copied as-is, so continuation lines are not indented.
pub fn to_structured_text(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    // (node, depth) pairs; children are pushed in reverse so they pop in order.
    let mut stack: Vec<(&Node, usize)> = snapshot
        .children_of(NodeId::ROOT)
        .into_iter()
        .rev()
        .map(|n| (n, 0))
        .collect();

    while let Some((node, depth)) = stack.pop() {
        out.push_str(&INDENT.repeat(depth));
        out.push_str(&node.name);
        out.push('\n');

        if node.is_file {
            if let Some(content) = node.content.as_deref().filter(|c| !c.is_empty()) {
                out.push_str(&INDENT.repeat(depth + 1));
                out.push_str(content);
                out.push('\n');
            }
            continue;
        }

        stack.extend(
            snapshot
                .children_of(node.id)
                .into_iter()
                .rev()
                .map(|child| (child, depth + 1)),
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::store::TreeStore;

    #[test]
    fn empty_tree_exports_nothing() {
        assert_eq!(to_structured_text(&Snapshot::default()), "");
    }

    #[test]
    fn folders_precede_files_at_each_level() {
        let mut store = TreeStore::default();
        store.add_path("readme.md");
        store.add_path("src/main.rs");
        store.add_path("src/bin/tool.rs");
        store.add_path("assets");

        let expected = "\
assets
src
  bin
    tool.rs
  main.rs
readme.md
";
        assert_eq!(to_structured_text(store.snapshot()), expected);
    }

    #[test]
    fn file_content_is_emitted_one_level_deeper() {
        let mut store = TreeStore::default();
        store.add_path("src/lib.rs");
        let id = store.snapshot().find_by_path("app/src/lib.rs").unwrap().id;
        store.edit_content(id, "pub mod tree;");
        assert_eq!(
            to_structured_text(store.snapshot()),
            "src\n  lib.rs\n    pub mod tree;\n"
        );
    }

    #[test]
    fn multi_line_content_is_not_reindented() {
        let mut store = TreeStore::default();
        store.add_path("a/b.txt");
        let id = store.snapshot().find_by_path("app/a/b.txt").unwrap().id;
        store.edit_content(id, "first\nsecond");
        assert_eq!(
            to_structured_text(store.snapshot()),
            "a\n  b.txt\n    first\nsecond\n"
        );
    }

    #[test]
    fn collapsed_folders_are_still_exported() {
        let mut store = TreeStore::default();
        store.add_path("a/b.txt");
        let a = store.snapshot().find_by_path("app/a").unwrap().id;
        store.toggle_open(a);
        assert_eq!(to_structured_text(store.snapshot()), "a\n  b.txt\n");
    }

    #[test]
    fn output_is_independent_of_insertion_order() {
        let inputs = ["z/y.txt", "a.md", "m/n/o", "b", "z/a", "m/c.rs"];

        let mut forward = TreeStore::default();
        for input in inputs {
            forward.add_path(input);
        }
        let mut backward = TreeStore::default();
        for input in inputs.iter().rev() {
            backward.add_path(input);
        }

        let reversed_records: Vec<_> = forward.snapshot().iter().rev().cloned().collect();
        let permuted = Snapshot::from_records(reversed_records);

        let text = to_structured_text(forward.snapshot());
        assert_eq!(text, to_structured_text(backward.snapshot()));
        assert_eq!(text, to_structured_text(&permuted));
        assert_eq!(text, "b\nm\n  n\n    o\n  c.rs\nz\n  a\n  y.txt\na.md\n");
    }
}
