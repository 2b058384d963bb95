//! Arena-backed persistent file-system tree.
//!
//! Nodes live in a slot vector addressed by [`NodeId`]. Each slot holds an
//! `Arc`, so cloning a snapshot copies pointers, not subtrees. A mutation
//! clones the snapshot, replaces only the touched slots (`Arc::make_mut`)
//! and returns the new snapshot; older snapshots keep observing the
//! pre-mutation tree.

use super::node::{FileSystemNode, NodeKind, names_match, validate_name};
use super::path::VfsPath;
use crate::error::{DesktopError, Result};
use serde::Serialize;
use std::sync::Arc;

/// Stable arena index of a node. Indices are never reused within a tree.
pub type NodeId = usize;

#[derive(Debug, Clone)]
pub(crate) enum NodeBody {
    File { content: String },
    Folder { children: Vec<NodeId> },
}

#[derive(Debug, Clone)]
pub(crate) struct NodeEntry {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) body: NodeBody,
}

impl NodeEntry {
    fn kind(&self) -> NodeKind {
        match self.body {
            NodeBody::File { .. } => NodeKind::File,
            NodeBody::Folder { .. } => NodeKind::Folder,
        }
    }
}

/// One start-menu search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Display path starting at the volume, e.g. `C:/Users/Durgas`.
    pub path: String,
    /// Path below the volume, suitable for an explorer `initialPath`.
    pub location: VfsPath,
}

/// Immutable view of the whole tree at one revision.
#[derive(Debug, Clone)]
pub struct FsSnapshot {
    slots: Vec<Option<Arc<NodeEntry>>>,
    root: NodeId,
    revision: u64,
}

impl FsSnapshot {
    /// Build a snapshot from a materialized tree. The root must be a folder.
    pub fn from_root(root: &FileSystemNode) -> Result<Self> {
        if !root.is_folder() {
            return Err(DesktopError::InvalidInput(
                "file-system root must be a folder".to_owned(),
            ));
        }
        let mut snapshot = Self {
            slots: Vec::new(),
            root: 0,
            revision: 0,
        };
        snapshot.root = snapshot.insert_subtree(root, None)?;
        Ok(snapshot)
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    /// Incremented on every committed mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of live nodes (including the root).
    pub fn node_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn root_name(&self) -> &str {
        self.entry(self.root).map_or("", |e| e.name.as_str())
    }

    pub(crate) fn entry(&self, id: NodeId) -> Option<&NodeEntry> {
        self.slots.get(id).and_then(|s| s.as_deref())
    }

    pub fn name_of(&self, id: NodeId) -> Option<&str> {
        self.entry(id).map(|e| e.name.as_str())
    }

    pub fn kind_of(&self, id: NodeId) -> Option<NodeKind> {
        self.entry(id).map(NodeEntry::kind)
    }

    /// Content of a file node.
    pub fn content_of(&self, id: NodeId) -> Option<&str> {
        match &self.entry(id)?.body {
            NodeBody::File { content } => Some(content.as_str()),
            NodeBody::Folder { .. } => None,
        }
    }

    /// Ordered children of a folder; empty for files and unknown ids.
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        match self.entry(id).map(|e| &e.body) {
            Some(NodeBody::Folder { children }) => children,
            _ => &[],
        }
    }

    /// Case-insensitive lookup of a direct child.
    pub fn find_child(&self, folder: NodeId, name: &str) -> Option<NodeId> {
        self.children_of(folder)
            .iter()
            .copied()
            .find(|&child| self.name_of(child).is_some_and(|n| names_match(n, name)))
    }

    /// Walk `path` from the root. Intermediate segments must be folders; the
    /// final segment may name a file.
    pub fn resolve_id(&self, path: &VfsPath) -> Result<NodeId> {
        let mut current = self.root;
        for (depth, segment) in path.segments().iter().enumerate() {
            if self.kind_of(current) != Some(NodeKind::Folder) {
                return Err(not_found(path, depth));
            }
            current = self
                .find_child(current, segment)
                .ok_or_else(|| not_found(path, depth + 1))?;
        }
        Ok(current)
    }

    /// Like [`resolve_id`](Self::resolve_id) but the target must be a folder.
    pub fn resolve_folder(&self, path: &VfsPath) -> Result<NodeId> {
        let id = self.resolve_id(path)?;
        if self.kind_of(id) == Some(NodeKind::Folder) {
            Ok(id)
        } else {
            Err(DesktopError::PathNotFound(format!("{path} is not a folder")))
        }
    }

    /// Copy a subtree out of the arena.
    pub fn materialize(&self, id: NodeId) -> Option<FileSystemNode> {
        let entry = self.entry(id)?;
        let (children, content) = match &entry.body {
            NodeBody::File { content } => (Vec::new(), Some(content.clone())),
            NodeBody::Folder { children } => (
                children
                    .iter()
                    .filter_map(|&child| self.materialize(child))
                    .collect(),
                None,
            ),
        };
        Some(FileSystemNode {
            id: entry.id.clone(),
            name: entry.name.clone(),
            kind: entry.kind(),
            children,
            content,
        })
    }

    /// Whole tree, root included.
    pub fn to_tree(&self) -> FileSystemNode {
        self.materialize(self.root).unwrap_or_else(|| FileSystemNode {
            id: "root".to_owned(),
            name: String::new(),
            kind: NodeKind::Folder,
            children: Vec::new(),
            content: None,
        })
    }

    /// Path from the root to `id` (the root itself is the empty path).
    pub fn path_of(&self, id: NodeId) -> Option<VfsPath> {
        let mut segments = Vec::new();
        let mut current = self.entry(id)?;
        while let Some(parent) = current.parent {
            segments.push(current.name.clone());
            current = self.entry(parent)?;
        }
        segments.reverse();
        Some(VfsPath::from_segments(segments))
    }

    /// New snapshot with `node` appended to the folder at `path`.
    pub fn with_created(&self, path: &VfsPath, node: &FileSystemNode) -> Result<Self> {
        let name = validate_name(&node.name)?;
        let folder = self.resolve_folder(path)?;
        if self.find_child(folder, name).is_some() {
            return Err(DesktopError::NameCollision(format!(
                "'{name}' already exists in {path}"
            )));
        }
        let mut next = self.clone();
        let child = next.insert_subtree(node, Some(folder))?;
        next.folder_children_mut(folder)?.push(child);
        next.revision += 1;
        Ok(next)
    }

    /// New snapshot with the child `old_name` of `path` renamed to `new_name`.
    pub fn with_renamed(&self, path: &VfsPath, old_name: &str, new_name: &str) -> Result<Self> {
        let new_name = validate_name(new_name)?;
        let folder = self.resolve_folder(path)?;
        let target = self.find_child(folder, old_name).ok_or_else(|| {
            DesktopError::PathNotFound(format!("'{old_name}' not found in {path}"))
        })?;
        let collides = self.children_of(folder).iter().any(|&sibling| {
            sibling != target && self.name_of(sibling).is_some_and(|n| names_match(n, new_name))
        });
        if collides {
            return Err(DesktopError::NameCollision(format!(
                "'{new_name}' already exists in {path}"
            )));
        }
        let mut next = self.clone();
        next.entry_mut(target)?.name = new_name.to_owned();
        next.revision += 1;
        Ok(next)
    }

    /// New snapshot without the child `name` of `path`, or `None` if there is
    /// no such child.
    pub fn with_deleted(&self, path: &VfsPath, name: &str) -> Result<Option<Self>> {
        let folder = self.resolve_folder(path)?;
        let Some(target) = self.find_child(folder, name) else {
            return Ok(None);
        };
        let mut next = self.clone();
        next.folder_children_mut(folder)?.retain(|&c| c != target);
        next.release_subtree(target);
        next.revision += 1;
        Ok(Some(next))
    }

    /// Depth-first search of node names containing `query` (case-insensitive).
    /// An empty query matches nothing.
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        let needle = query.trim().to_lowercase();
        let mut hits = Vec::new();
        if !needle.is_empty() {
            self.search_from(self.root, &needle, &mut hits);
        }
        hits
    }

    fn search_from(&self, id: NodeId, needle: &str, hits: &mut Vec<SearchHit>) {
        let Some(entry) = self.entry(id) else {
            return;
        };
        if entry.name.to_lowercase().contains(needle) {
            let location = self.path_of(id).unwrap_or_default();
            let mut path = self.root_name().to_owned();
            for segment in location.segments() {
                path.push('/');
                path.push_str(segment);
            }
            hits.push(SearchHit {
                id: entry.id.clone(),
                name: entry.name.clone(),
                kind: entry.kind(),
                path,
                location,
            });
        }
        for &child in self.children_of(id) {
            self.search_from(child, needle, hits);
        }
    }

    fn insert_subtree(&mut self, node: &FileSystemNode, parent: Option<NodeId>) -> Result<NodeId> {
        node.validate_shape()?;
        let id = self.slots.len();
        let body = match node.kind {
            NodeKind::File => NodeBody::File {
                content: node.content.clone().unwrap_or_default(),
            },
            NodeKind::Folder => NodeBody::Folder {
                children: Vec::with_capacity(node.children.len()),
            },
        };
        self.slots.push(Some(Arc::new(NodeEntry {
            id: node.id.clone(),
            name: node.name.trim().to_owned(),
            parent,
            body,
        })));
        for child in &node.children {
            if self.find_child(id, child.name.trim()).is_some() {
                return Err(DesktopError::NameCollision(format!(
                    "duplicate sibling '{}' under '{}'",
                    child.name, node.name
                )));
            }
            let child_id = self.insert_subtree(child, Some(id))?;
            self.folder_children_mut(id)?.push(child_id);
        }
        Ok(id)
    }

    fn release_subtree(&mut self, id: NodeId) {
        let children = self.children_of(id).to_vec();
        for child in children {
            self.release_subtree(child);
        }
        if let Some(slot) = self.slots.get_mut(id) {
            *slot = None;
        }
    }

    fn entry_mut(&mut self, id: NodeId) -> Result<&mut NodeEntry> {
        self.slots
            .get_mut(id)
            .and_then(Option::as_mut)
            .map(Arc::make_mut)
            .ok_or_else(|| DesktopError::PathNotFound(format!("node #{id} is gone")))
    }

    fn folder_children_mut(&mut self, id: NodeId) -> Result<&mut Vec<NodeId>> {
        match &mut self.entry_mut(id)?.body {
            NodeBody::Folder { children } => Ok(children),
            NodeBody::File { .. } => Err(DesktopError::InvalidInput(format!(
                "node #{id} is not a folder"
            ))),
        }
    }
}

fn not_found(path: &VfsPath, depth: usize) -> DesktopError {
    let prefix = VfsPath::from_segments(path.segments()[..depth.min(path.len())].iter().cloned());
    DesktopError::PathNotFound(format!("{prefix} (while resolving {path})"))
}
