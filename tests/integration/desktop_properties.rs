//! Property tests for window ordering and file-system laws.

use durgas::config::{FileSystemConfig, WindowConfig};
use durgas::vfs::{FileSystemNode, HOME_PATH, VfsPath, VirtualFileSystem};
use durgas::window::{WindowData, WindowManager, catalog};
use proptest::prelude::*;
use std::collections::HashSet;

fn app_ids() -> Vec<&'static str> {
    catalog::APPS
        .iter()
        .map(|a| a.id)
        .filter(|id| *id != catalog::FILE_EXPLORER)
        .collect()
}

fn home() -> VfsPath {
    VfsPath::from_segments(HOME_PATH)
}

fn file_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,7}\\.txt"
}

proptest! {
    #[test]
    fn singleton_apps_never_duplicate(picks in prop::collection::vec(0usize..10, 1..30)) {
        let ids = app_ids();
        let wm = WindowManager::new(WindowConfig::default());
        let mut distinct = HashSet::new();
        for pick in picks {
            let id = ids[pick % ids.len()];
            distinct.insert(id);
            wm.open_app(id, WindowData::new());
        }
        prop_assert_eq!(wm.windows().len(), distinct.len());
    }

    #[test]
    fn z_indices_strictly_increase(ops in prop::collection::vec((0usize..10, any::<bool>()), 1..40)) {
        let ids = app_ids();
        let wm = WindowManager::new(WindowConfig::default());
        let mut last = 0;
        for (pick, focus_first) in ops {
            let id = ids[pick % ids.len()];
            let target = if focus_first {
                wm.windows().first().map(|w| w.id.clone())
            } else {
                None
            };
            let raised = match target {
                Some(window) => {
                    prop_assert!(wm.focus(&window));
                    prop_assert_eq!(wm.active_window_id(), Some(window.clone()));
                    window
                }
                None => wm.open_app(id, WindowData::new()).unwrap(),
            };
            let z = wm.get(&raised).unwrap().z_index;
            prop_assert!(z > last, "z {} did not exceed {}", z, last);
            last = z;
            prop_assert!(!wm.get(&raised).unwrap().is_minimized);
        }
    }

    #[test]
    fn create_rename_delete_laws(name in file_name(), new_name in file_name()) {
        prop_assume!(!name.eq_ignore_ascii_case(&new_name));
        let fs = VirtualFileSystem::from_config(&FileSystemConfig::default()).unwrap();
        let node = FileSystemNode::file(name.clone(), "x");

        fs.create(&home(), node.clone()).unwrap();
        prop_assert_eq!(fs.resolve(&home().join(&name)).unwrap(), node.clone());

        let before = fs.snapshot();
        prop_assert!(fs.create(&home(), node).is_err());
        prop_assert!(std::sync::Arc::ptr_eq(&before, &fs.snapshot()));

        fs.rename(&home(), &name, &new_name).unwrap();
        prop_assert!(fs.resolve(&home().join(&new_name)).is_ok());
        prop_assert!(fs.resolve(&home().join(&name)).is_err());

        prop_assert!(fs.delete(&home(), &new_name).unwrap());
        prop_assert!(fs.resolve(&home().join(&new_name)).is_err());
    }
}
