use super::node::{Node, Snapshot};

/// Find the deepest existing folder whose path is a prefix of `input`.
///
/// Segments are accumulated left to right. The walk stops at the first
/// prefix that is not an existing folder, which includes a prefix naming a
/// file: resolution never descends into or past a file.
pub fn deepest_folder<'a>(input: &str, snapshot: &'a Snapshot) -> Option<&'a Node> {
    let mut prefix = String::new();
    let mut deepest = None;

    for segment in input.split('/') {
        if !prefix.is_empty() {
            prefix.push('/');
        }
        prefix.push_str(segment);

        match snapshot
            .iter()
            .find(|n| n.path == prefix && n.is_folder())
        {
            Some(folder) => deepest = Some(folder),
            None => break,
        }
    }

    deepest
}

/// The part of `input` left over once `folder`'s path prefix is removed.
pub fn remaining_suffix<'a>(input: &'a str, folder: Option<&Node>) -> &'a str {
    match folder {
        Some(folder) => input
            .strip_prefix(folder.path.as_str())
            .map(|rest| rest.strip_prefix('/').unwrap_or(rest))
            .unwrap_or(input),
        None => input,
    }
}
