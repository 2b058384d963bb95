//! Materialized file-system node, the shape exchanged with callers.

use crate::error::{DesktopError, Result};
use serde::{Deserialize, Serialize};

/// Node type: a file with opaque content or a folder with ordered children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NodeKind {
    File,
    Folder,
}

/// A node of the virtual file system together with its whole subtree.
///
/// This is a value type: the live tree is stored in an arena
/// ([`FsSnapshot`](super::FsSnapshot)) and materialized into this form on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSystemNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Ordered children. Always empty for files.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FileSystemNode>,
    /// Opaque payload (text or base64 bytes). Always `None` for folders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl FileSystemNode {
    /// New empty folder with a generated id.
    pub fn folder(name: impl Into<String>) -> Self {
        Self {
            id: format!("folder-{}", uuid::Uuid::new_v4().simple()),
            name: name.into(),
            kind: NodeKind::Folder,
            children: Vec::new(),
            content: None,
        }
    }

    /// New file with a generated id.
    pub fn file(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: format!("file-{}", uuid::Uuid::new_v4().simple()),
            name: name.into(),
            kind: NodeKind::File,
            children: Vec::new(),
            content: Some(content.into()),
        }
    }

    /// Replace the generated id (used for seed data with well-known ids).
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Append a child (builder style, folders only).
    pub fn with_child(mut self, child: FileSystemNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }

    /// Only folders carry children and only files carry content.
    pub(crate) fn validate_shape(&self) -> Result<()> {
        match self.kind {
            NodeKind::File if !self.children.is_empty() => Err(DesktopError::InvalidInput(
                format!("file '{}' cannot have children", self.name),
            )),
            NodeKind::Folder if self.content.is_some() => Err(DesktopError::InvalidInput(
                format!("folder '{}' cannot have content", self.name),
            )),
            _ => Ok(()),
        }
    }
}

/// Validate a node name for create/rename and return it normalized.
///
/// Surrounding whitespace is dropped, so the returned slice is the name that
/// gets stored and compared against siblings. It must be non-blank, must not
/// contain a path separator and must not be a relative path component.
pub fn validate_name(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DesktopError::InvalidInput("name cannot be empty".to_owned()));
    }
    if trimmed.contains(['/', '\\']) {
        return Err(DesktopError::InvalidInput(format!(
            "name '{trimmed}' cannot contain path separators"
        )));
    }
    if trimmed == "." || trimmed == ".." {
        return Err(DesktopError::InvalidInput(format!(
            "'{trimmed}' is a reserved name"
        )));
    }
    Ok(trimmed)
}

/// Sibling names compare case-insensitively.
pub fn names_match(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}
