//! `createFolder`: make a new folder under the user's home.

use super::{Tool, ToolContext, ToolResult, parse_args};
use crate::error::{DesktopError, Result};
use crate::vfs::{FsSnapshot, HOME_PATH, VfsPath};
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateFolderArgs {
    folder_name: String,
    #[serde(default)]
    location: Option<String>,
}

pub struct CreateFolderTool;

impl CreateFolderTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CreateFolderTool {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve a spoken location to an existing folder.
///
/// `"documents"` is looked up under the home folder first; a full path such
/// as `C:\Users\Durgas\Pictures` is then tried from the root.
fn resolve_location(fs: &FsSnapshot, location: &str) -> Option<VfsPath> {
    let relative = VfsPath::parse(location);
    let home = VfsPath::from_segments(HOME_PATH);
    let under_home = relative
        .segments()
        .iter()
        .fold(home, |path, segment| path.join(segment));
    [under_home, relative]
        .into_iter()
        .find(|candidate| fs.resolve_folder(candidate).is_ok())
        // Use the stored casing so events and messages read naturally.
        .and_then(|found| {
            let id = fs.resolve_folder(&found).ok()?;
            fs.path_of(id)
        })
}

#[async_trait]
impl Tool for CreateFolderTool {
    fn name(&self) -> &str {
        "createFolder"
    }

    fn description(&self) -> &str {
        "Creates a new folder in the file system."
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "folderName": {
                    "type": "string",
                    "description": "The name of the new folder."
                },
                "location": {
                    "type": "string",
                    "description": "The location to create the folder in, e.g., 'Desktop' or 'Documents'. Defaults to 'Desktop'."
                }
            },
            "required": ["folderName"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, args: serde_json::Value) -> Result<ToolResult> {
        let args: CreateFolderArgs = parse_args(self.name(), args)?;
        let default_location = &ctx.desktop.config().assistant.default_folder_location;
        let location = args
            .location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(default_location);

        let fs = ctx.desktop.fs();
        let Some(parent) = resolve_location(&fs.snapshot(), location) else {
            return Ok(ToolResult::failure(format!(
                "I couldn't find a folder called '{location}'."
            )));
        };
        let place = parent.last().unwrap_or(location).to_owned();

        match fs.create_folder(&parent, &args.folder_name) {
            Ok(folder) => Ok(ToolResult::success(format!(
                "Created the folder '{}' in {place}.",
                folder.name
            ))),
            Err(DesktopError::NameCollision(_)) => Ok(ToolResult::failure(format!(
                "A folder named '{}' already exists in {place}.",
                args.folder_name.trim()
            ))),
            Err(DesktopError::InvalidInput(reason)) => Ok(ToolResult::failure(format!(
                "'{}' is not a valid folder name: {reason}.",
                args.folder_name
            ))),
            Err(e) => Err(e),
        }
    }
}
