use super::sort::compare_names;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderTreeNode {
    pub id: String,
    pub name: String,
    pub children: Vec<FolderTreeNode>,
}

impl FolderTreeNode {
    /// Number of nodes in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(FolderTreeNode::count).sum::<usize>()
    }
}

/// Flat folder as returned by the gateway. Only the first parent matters.
#[derive(Debug, Clone)]
pub struct FolderRecord {
    pub id: String,
    pub name: String,
    pub parent_id: Option<String>,
}

/// Rebuilds the hierarchy below `root_id` from a flat folder list.
///
/// Builds a parent -> children index once, so the whole pass is linear in the
/// folder count. Folders whose parent chain never reaches `root_id` are left
/// out. A folder is emitted at most once even if the input contains a cycle.
pub fn build_folder_tree(folders: &[FolderRecord], root_id: &str) -> Vec<FolderTreeNode> {
    let mut children_of: HashMap<&str, Vec<&FolderRecord>> = HashMap::new();
    for folder in folders {
        if let Some(parent) = folder.parent_id.as_deref() {
            children_of.entry(parent).or_default().push(folder);
        }
    }
    for siblings in children_of.values_mut() {
        siblings.sort_by(|a, b| compare_names(&a.name, &b.name));
    }

    let mut visited = HashSet::from([root_id]);
    attach_children(root_id, &children_of, &mut visited)
}

fn attach_children<'a>(
    parent_id: &str,
    children_of: &HashMap<&str, Vec<&'a FolderRecord>>,
    visited: &mut HashSet<&'a str>,
) -> Vec<FolderTreeNode> {
    let Some(children) = children_of.get(parent_id) else {
        return Vec::new();
    };

    let mut nodes = Vec::with_capacity(children.len());
    for &child in children {
        if !visited.insert(child.id.as_str()) {
            continue;
        }
        nodes.push(FolderTreeNode {
            id: child.id.clone(),
            name: child.name.clone(),
            children: attach_children(&child.id, children_of, visited),
        });
    }
    nodes
}
