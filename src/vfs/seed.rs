//! Default tree created at startup.

use super::node::FileSystemNode;
use crate::config::FileSystemConfig;

const README_TEXT: &str = "Welcome to DurgasOS! This is a simple text file.";

// 1x1 transparent PNG.
const LOGO_PNG_B64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

// `ftyp` box of an empty MP4 container.
const COUNTDOWN_MP4_B64: &str = "AAAAGGZ0eXBNNFYgAAACAGlzb21hdmMxbXA0Mg==";

/// The root volume, optionally populated with the default user folders.
pub fn default_tree(config: &FileSystemConfig) -> FileSystemNode {
    let root = FileSystemNode::folder(config.root_label.clone()).with_id("root");
    if !config.seed_user_folders {
        return root;
    }

    let home = FileSystemNode::folder("Durgas")
        .with_id("durgas")
        .with_child(FileSystemNode::folder("Desktop").with_id("desktop"))
        .with_child(
            FileSystemNode::folder("Documents")
                .with_id("documents")
                .with_child(FileSystemNode::file("readme.txt", README_TEXT).with_id("readme")),
        )
        .with_child(
            FileSystemNode::folder("Pictures")
                .with_id("pictures")
                .with_child(FileSystemNode::file("gemini.png", LOGO_PNG_B64).with_id("gemini-logo")),
        )
        .with_child(
            FileSystemNode::folder("Videos").with_id("videos").with_child(
                FileSystemNode::file("countdown.mp4", COUNTDOWN_MP4_B64).with_id("countdown-video"),
            ),
        );

    root.with_child(FileSystemNode::folder("Users").with_id("users").with_child(home))
}

/// Path of the user's home folder in the seeded tree.
pub const HOME_PATH: [&str; 2] = ["Users", "Durgas"];
