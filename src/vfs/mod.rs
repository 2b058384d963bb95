//! In-memory virtual file system.
//!
//! The live tree is an `Arc<FsSnapshot>` swapped wholesale on every mutation,
//! so a reader holding a snapshot never observes a partial update.

mod node;
mod path;
mod seed;
mod tree;

pub use node::{FileSystemNode, NodeKind, names_match, validate_name};
pub use path::VfsPath;
pub use seed::{HOME_PATH, default_tree};
pub use tree::{FsSnapshot, NodeId, SearchHit};

use crate::config::FileSystemConfig;
use crate::error::Result;
use crate::runtime::DesktopEvent;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Shared handle to the file-system tree.
pub struct VirtualFileSystem {
    current: RwLock<Arc<FsSnapshot>>,
    events: Option<broadcast::Sender<DesktopEvent>>,
}

impl VirtualFileSystem {
    /// Start from an explicit tree.
    pub fn new(root: &FileSystemNode) -> Result<Self> {
        Ok(Self {
            current: RwLock::new(Arc::new(FsSnapshot::from_root(root)?)),
            events: None,
        })
    }

    /// Start from the configured default tree.
    pub fn from_config(config: &FileSystemConfig) -> Result<Self> {
        Self::new(&default_tree(config))
    }

    /// Publish [`DesktopEvent::FileSystemChanged`] on every commit.
    #[must_use]
    pub fn with_events(mut self, events: broadcast::Sender<DesktopEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// The current tree. Cheap; later mutations do not affect it.
    pub fn snapshot(&self) -> Arc<FsSnapshot> {
        Arc::clone(&self.current.read().unwrap_or_else(|e| e.into_inner()))
    }

    /// Node at `path` with its subtree.
    pub fn resolve(&self, path: &VfsPath) -> Result<FileSystemNode> {
        let snapshot = self.snapshot();
        let id = snapshot.resolve_id(path)?;
        Ok(snapshot
            .materialize(id)
            .unwrap_or_else(|| snapshot.to_tree()))
    }

    /// Folder at `path`, or the root when it no longer exists.
    ///
    /// Returns the path actually used so callers can reset their location.
    pub fn resolve_or_root(&self, path: &VfsPath) -> (VfsPath, FileSystemNode) {
        let snapshot = self.snapshot();
        match snapshot.resolve_folder(path) {
            Ok(id) => (
                path.clone(),
                snapshot.materialize(id).unwrap_or_else(|| snapshot.to_tree()),
            ),
            Err(e) => {
                warn!(path = %path, error = %e, "folder vanished, falling back to root");
                (VfsPath::root(), snapshot.to_tree())
            }
        }
    }

    /// Append `node` to the folder at `path`.
    ///
    /// Fails with `NameCollision` when a sibling has the same name
    /// (case-insensitive); the tree is left unchanged.
    pub fn create(&self, path: &VfsPath, node: FileSystemNode) -> Result<()> {
        let name = node.name.clone();
        self.commit(|fs| fs.with_created(path, &node))
            .inspect(|_| info!(path = %path, name = %name, "node created"))
            .inspect_err(|e| warn!(path = %path, name = %name, error = %e, "create rejected"))
    }

    /// Create an empty folder and return it.
    pub fn create_folder(&self, path: &VfsPath, name: &str) -> Result<FileSystemNode> {
        let name = validate_name(name)?;
        let folder = FileSystemNode::folder(name);
        self.create(path, folder.clone())?;
        Ok(folder)
    }

    /// Rename the child `old_name` of `path`.
    pub fn rename(&self, path: &VfsPath, old_name: &str, new_name: &str) -> Result<()> {
        self.commit(|fs| fs.with_renamed(path, old_name, new_name))
            .inspect(|_| info!(path = %path, from = old_name, to = new_name, "node renamed"))
            .inspect_err(|e| warn!(path = %path, from = old_name, error = %e, "rename rejected"))
    }

    /// Remove the child `name` of `path` with its subtree.
    ///
    /// Returns `false` when there was nothing to delete.
    pub fn delete(&self, path: &VfsPath, name: &str) -> Result<bool> {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        match guard.with_deleted(path, name)? {
            Some(next) => {
                let revision = next.revision();
                *guard = Arc::new(next);
                drop(guard);
                info!(path = %path, name, "node deleted");
                self.publish(revision);
                Ok(true)
            }
            None => {
                debug!(path = %path, name, "delete target missing, nothing to do");
                Ok(false)
            }
        }
    }

    /// Case-insensitive name search over the whole tree.
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        self.snapshot().search(query)
    }

    fn commit(&self, mutate: impl FnOnce(&FsSnapshot) -> Result<FsSnapshot>) -> Result<()> {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        let next = mutate(&guard)?;
        let revision = next.revision();
        *guard = Arc::new(next);
        drop(guard);
        self.publish(revision);
        Ok(())
    }

    fn publish(&self, revision: u64) {
        if let Some(events) = &self.events {
            // No subscribers is fine.
            let _ = events.send(DesktopEvent::FileSystemChanged { revision });
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    fn vfs() -> VirtualFileSystem {
        VirtualFileSystem::from_config(&FileSystemConfig::default()).expect("seed tree")
    }

    fn home() -> VfsPath {
        VfsPath::from_segments(HOME_PATH)
    }

    #[test]
    fn create_then_resolve_returns_same_node() {
        let fs = vfs();
        let node = FileSystemNode::file("todo.txt", "milk");
        fs.create(&home(), node.clone()).unwrap();
        assert_eq!(fs.resolve(&home().join("todo.txt")).unwrap(), node);
    }

    #[test]
    fn second_create_fails_and_leaves_tree() {
        let fs = vfs();
        fs.create_folder(&home(), "Projects").unwrap();
        let before = fs.snapshot();
        let err = fs.create_folder(&home(), "projects").unwrap_err();
        assert_eq!(err.code(), "NAME_COLLISION");
        assert!(Arc::ptr_eq(&before, &fs.snapshot()));
    }

    fn home_names(fs: &VirtualFileSystem) -> Vec<String> {
        fs.resolve(&home())
            .unwrap()
            .children
            .into_iter()
            .map(|c| c.name)
            .collect()
    }

    #[test]
    fn padded_names_collide_with_their_trimmed_sibling() {
        let fs = vfs();
        let err = fs.rename(&home(), "Desktop", "Documents ").unwrap_err();
        assert_eq!(err.code(), "NAME_COLLISION");
        let err = fs.create(&home(), FileSystemNode::folder(" Pictures")).unwrap_err();
        assert_eq!(err.code(), "NAME_COLLISION");
        let err = fs.create_folder(&home(), "Pictures ").unwrap_err();
        assert_eq!(err.code(), "NAME_COLLISION");
        assert_eq!(home_names(&fs), ["Desktop", "Documents", "Pictures", "Videos"]);
    }

    #[test]
    fn stored_names_are_trimmed_and_reachable() {
        let fs = vfs();
        fs.create(&home(), FileSystemNode::folder("  Music ")).unwrap();
        fs.rename(&home(), "Desktop", " Work ").unwrap();
        assert!(fs.resolve(&VfsPath::parse("Users/Durgas/Music")).is_ok());
        assert!(fs.resolve(&VfsPath::parse("Users/Durgas/Work")).is_ok());
        assert!(home_names(&fs).iter().all(|n| n.trim() == n));
    }

    #[test]
    fn old_snapshot_survives_mutation() {
        let fs = vfs();
        let before = fs.snapshot();
        fs.rename(&home(), "Documents", "Docs").unwrap();
        assert!(before.resolve_id(&home().join("Documents")).is_ok());
        assert!(fs.resolve(&home().join("Documents")).is_err());
        assert!(fs.resolve(&home().join("Docs")).is_ok());
    }

    #[test]
    fn delete_reports_whether_anything_was_removed() {
        let fs = vfs();
        assert!(fs.delete(&home(), "Videos").unwrap());
        assert!(!fs.delete(&home(), "Videos").unwrap());
        assert!(fs.resolve(&home().join("Videos")).is_err());
    }

    #[test]
    fn resolve_or_root_falls_back() {
        let fs = vfs();
        let (path, node) = fs.resolve_or_root(&VfsPath::parse("Nope/Gone"));
        assert!(path.is_root());
        assert_eq!(node.id, "root");

        let (path, node) = fs.resolve_or_root(&home());
        assert_eq!(path, home());
        assert_eq!(node.id, "durgas");
    }

    #[tokio::test]
    async fn commits_publish_revision_events() {
        let (tx, mut rx) = broadcast::channel(8);
        let fs = vfs().with_events(tx);
        fs.create_folder(&home(), "A").unwrap();
        let _ = fs.create_folder(&home(), "a");
        fs.delete(&home(), "A").unwrap();

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert!(matches!(first, DesktopEvent::FileSystemChanged { revision: 1 }));
        assert!(matches!(second, DesktopEvent::FileSystemChanged { revision: 2 }));
        assert!(rx.try_recv().is_err());
    }
}
