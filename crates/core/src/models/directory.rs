use serde::{Deserialize, Serialize};

/// One folder of the data tree.
///
/// A node only exists in a scanned tree if it, or one of its descendants,
/// holds at least one data file. Trees are rebuilt wholesale on every scan
/// and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryNode {
    /// Last path segment (e.g., "2024-q1")
    pub name: String,

    /// Slash-joined path relative to the data root (e.g., "signals/2024-q1")
    pub path: String,

    /// Data-file names directly inside this folder, sorted
    pub files: Vec<String>,

    /// Child folders, sorted by name
    pub subdirectories: Vec<DirectoryNode>,
}

impl DirectoryNode {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            files: Vec::new(),
            subdirectories: Vec::new(),
        }
    }

    /// True if the node carries files or subfolders (used for the expand arrow).
    pub fn has_content(&self) -> bool {
        !self.files.is_empty() || !self.subdirectories.is_empty()
    }

    /// Total number of data files in this node and all descendants.
    pub fn total_files(&self) -> usize {
        self.files.len()
            + self
                .subdirectories
                .iter()
                .map(DirectoryNode::total_files)
                .sum::<usize>()
    }
}

/// Pre-order depth-first search for the first node named `name`.
///
/// Each node is checked before its subdirectories, and siblings are visited
/// in order, so the shallowest-leftmost match wins.
pub fn find_directory<'a>(nodes: &'a [DirectoryNode], name: &str) -> Option<&'a DirectoryNode> {
    for node in nodes {
        if node.name == name {
            return Some(node);
        }
        if let Some(found) = find_directory(&node.subdirectories, name) {
            return Some(found);
        }
    }
    None
}

/// Wire payload of the directory listing endpoint: `{"directories": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryListing {
    pub directories: Vec<DirectoryNode>,
}

/// The directory chosen as the "All Data" source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterSource {
    pub path: String,
    pub files: Vec<String>,
}

impl MasterSource {
    /// Build from the master node, or `None` if it has no files of its own.
    pub fn from_node(node: &DirectoryNode) -> Option<Self> {
        if node.files.is_empty() {
            return None;
        }
        Some(Self {
            path: node.path.clone(),
            files: node.files.clone(),
        })
    }
}
