use async_imap::Session;
use futures::TryStreamExt;
use tracing::debug;

use super::connection::ImapStream;
use crate::error::SweepError;
use crate::types::FolderNode;

/// LIST the full hierarchy and normalize it into the canonical tree.
///
/// Servers return a flat list of delimited paths, not always including the
/// parent entries; this rebuilds the hierarchy once, at the protocol
/// boundary, so the walker never deals with protocol-level representation.
pub(super) async fn list_folders<T: ImapStream>(
    session: &mut Session<T>,
) -> Result<Vec<FolderNode>, SweepError> {
    let names: Vec<_> = session
        .list(Some(""), Some("*"))
        .await
        .map_err(|e| SweepError::Protocol(format!("LIST failed: {}", e)))?
        .try_collect()
        .await
        .map_err(|e| SweepError::Protocol(format!("Failed to collect folder list: {}", e)))?;

    let entries: Vec<(String, Option<String>)> = names
        .iter()
        .map(|n| (n.name().to_string(), n.delimiter().map(|d| d.to_string())))
        .collect();

    let tree = build_tree(entries);
    debug!(roots = tree.len(), "Listed IMAP folders");
    Ok(tree)
}

/// Build the canonical tree from `(path, delimiter)` LIST entries.
///
/// Paths are split on the server delimiter; intermediate nodes missing from
/// the listing are created on the way down, so "INBOX/Work" without an
/// "INBOX" entry still hangs off an INBOX root.
pub(crate) fn build_tree(entries: Vec<(String, Option<String>)>) -> Vec<FolderNode> {
    let mut roots: Vec<FolderNode> = Vec::new();

    for (path, delimiter) in entries {
        let segments: Vec<&str> = match delimiter.as_deref() {
            Some(delim) if !delim.is_empty() => path.split(delim).collect(),
            _ => vec![path.as_str()],
        };
        insert_path(&mut roots, &segments, delimiter.as_deref());
    }

    roots
}

fn insert_path(roots: &mut Vec<FolderNode>, segments: &[&str], delimiter: Option<&str>) {
    let mut children = roots;
    let mut path = String::new();

    for segment in segments {
        if !path.is_empty() {
            path.push_str(delimiter.unwrap_or("/"));
        }
        path.push_str(segment);

        let index = match children.iter().position(|c| c.name == *segment) {
            Some(i) => i,
            None => {
                children.push(FolderNode {
                    name: segment.to_string(),
                    path: path.clone(),
                    delimiter: delimiter.map(str::to_string),
                    children: Vec::new(),
                });
                children.len() - 1
            }
        };
        children = &mut children[index].children;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str, delim: &str) -> (String, Option<String>) {
        (path.to_string(), Some(delim.to_string()))
    }

    #[test]
    fn test_flat_names_become_roots() {
        let tree = build_tree(vec![entry("INBOX", "/"), entry("Archive", "/")]);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].name, "INBOX");
        assert_eq!(tree[1].path, "Archive");
        assert!(tree[0].children.is_empty());
    }

    #[test]
    fn test_children_attach_to_parents() {
        let tree = build_tree(vec![
            entry("INBOX", "/"),
            entry("INBOX/Work", "/"),
            entry("INBOX/Work/2024", "/"),
        ]);
        assert_eq!(tree.len(), 1);
        let work = &tree[0].children[0];
        assert_eq!(work.name, "Work");
        assert_eq!(work.path, "INBOX/Work");
        assert_eq!(work.children[0].path, "INBOX/Work/2024");
    }

    #[test]
    fn test_missing_parent_is_synthesized() {
        let tree = build_tree(vec![entry("INBOX.Sent", ".")]);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].name, "INBOX");
        assert_eq!(tree[0].path, "INBOX");
        assert_eq!(tree[0].children[0].path, "INBOX.Sent");
    }

    #[test]
    fn test_no_delimiter_keeps_whole_name() {
        let tree = build_tree(vec![("a/b".to_string(), None)]);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].name, "a/b");
    }
}
