use tracing::{debug, warn};

use crate::adapters::imap::MailboxSession;
use crate::error::SweepError;
use crate::types::{FolderDescriptor, FolderNode};

/// Placeholder some listings carry for nodes with no real name. Almost
/// certainly no-content system artifacts, so they are excluded.
const UNKNOWN_SENTINEL: &str = "unknown";

/// Conventional folders probed when a listing yields nothing usable.
/// Server folder listings are noisy or incomplete across providers; the
/// probe guarantees at least INBOX is discoverable.
const FALLBACK_FOLDERS: &[&str] = &[
    "INBOX",
    "INBOX.Sent",
    "INBOX.Drafts",
    "INBOX.Trash",
    "INBOX.Junk",
    "INBOX.Spam",
];

/// Flatten the canonical folder tree into an ordered list of addressable
/// folders: depth-first, parent before children.
///
/// Nodes whose name is empty or the "unknown" placeholder are excluded
/// from the result, but their subtrees are still traversed so legitimate
/// children stay addressable.
pub fn flatten(tree: &[FolderNode]) -> Vec<FolderDescriptor> {
    let mut out = Vec::new();
    for node in tree {
        flatten_into(node, &mut out);
    }
    out
}

fn flatten_into(node: &FolderNode, out: &mut Vec<FolderDescriptor>) {
    let name = node.name.trim();
    if !name.is_empty() && name != UNKNOWN_SENTINEL {
        out.push(FolderDescriptor {
            name: node.name.clone(),
            path: node.path.clone(),
            email_count: 0,
        });
    }

    for child in &node.children {
        flatten_into(child, out);
    }
}

/// Enumerate the scannable folders of a connected session.
///
/// Strict traversal first; if exclusion empties the listing, fall back to
/// probing the conventional names and keep those holding messages.
pub async fn discover_folders(
    session: &mut MailboxSession,
) -> Result<Vec<FolderDescriptor>, SweepError> {
    let tree = session.list_folders().await?;
    let mut folders = flatten(&tree);

    if folders.is_empty() {
        warn!("Folder listing yielded no usable folders, probing conventional names");
        for path in FALLBACK_FOLDERS {
            let count = session.count_messages(path).await;
            if count > 0 {
                folders.push(FolderDescriptor {
                    name: leaf_name(path),
                    path: path.to_string(),
                    email_count: count,
                });
            }
        }
    }

    debug!(folders = folders.len(), "Folder discovery complete");
    Ok(folders)
}

fn leaf_name(path: &str) -> String {
    path.rsplit('.').next().unwrap_or(path).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str, path: &str, children: Vec<FolderNode>) -> FolderNode {
        FolderNode {
            name: name.to_string(),
            path: path.to_string(),
            delimiter: Some("/".to_string()),
            children,
        }
    }

    #[test]
    fn test_depth_first_parent_before_children() {
        let tree = vec![
            node(
                "INBOX",
                "INBOX",
                vec![
                    node("Work", "INBOX/Work", vec![node("2024", "INBOX/Work/2024", vec![])]),
                    node("Personal", "INBOX/Personal", vec![]),
                ],
            ),
            node("Archive", "Archive", vec![]),
        ];

        let paths: Vec<String> = flatten(&tree).into_iter().map(|f| f.path).collect();
        assert_eq!(
            paths,
            vec!["INBOX", "INBOX/Work", "INBOX/Work/2024", "INBOX/Personal", "Archive"]
        );
    }

    #[test]
    fn test_excludes_empty_and_unknown_names() {
        let tree = vec![
            node("INBOX", "INBOX", vec![]),
            node("", "", vec![]),
            node("unknown", "unknown", vec![]),
        ];

        let folders = flatten(&tree);
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].path, "INBOX");
    }

    #[test]
    fn test_children_of_excluded_nodes_survive() {
        let tree = vec![node(
            "unknown",
            "unknown",
            vec![node("Kept", "unknown/Kept", vec![])],
        )];

        let folders = flatten(&tree);
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].path, "unknown/Kept");
    }

    #[test]
    fn test_exclusion_can_empty_the_result() {
        let tree = vec![node("", "", vec![]), node("unknown", "unknown", vec![])];
        assert!(flatten(&tree).is_empty());
        // discover_folders falls back to the probe list in this case;
        // exercised against a live session, not mockable here.
    }

    #[test]
    fn test_leaf_name_uses_dot_convention() {
        assert_eq!(leaf_name("INBOX.Sent"), "Sent");
        assert_eq!(leaf_name("INBOX"), "INBOX");
    }
}
