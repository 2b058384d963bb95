//! Terminal command interpreter over a file-system snapshot.
//!
//! The interpreter is read-only: it walks an [`FsSnapshot`] and keeps its own
//! working directory. Lookups are case-insensitive.
//!
//! | Input | Command |
//! |-------|---------|
//! | `help` | `Help` |
//! | `clear` | `Clear` |
//! | `pwd` | `Pwd` |
//! | `echo ...` | `Echo` |
//! | `ls` | `List` |
//! | `cd <dir>` | `ChangeDir` |
//! | `cat <file>` | `Cat` |

use crate::vfs::{FsSnapshot, NodeKind, VfsPath};

const HELP_LINES: [&str; 8] = [
    "Available commands:",
    "  help     - Show this help message",
    "  clear    - Clear the terminal screen",
    "  ls       - List directory contents",
    "  cd <dir> - Change directory",
    "  pwd      - Print working directory",
    "  echo ... - Print arguments",
    "  cat <file> - Display file content",
];

/// Banner shown when a terminal window opens.
pub const WELCOME_LINES: [&str; 2] = [
    "Welcome to DurgasOS Terminal.",
    "Type \"help\" for a list of commands.",
];

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Empty,
    Help,
    Clear,
    Pwd,
    Echo(String),
    List,
    /// `None` means "go to the root".
    ChangeDir(Option<String>),
    Cat(Option<String>),
    Unknown(String),
}

impl ShellCommand {
    /// Split on whitespace; the command word is case-insensitive.
    pub fn parse(line: &str) -> Self {
        let mut words = line.split_whitespace();
        let Some(cmd) = words.next() else {
            return Self::Empty;
        };
        match cmd.to_lowercase().as_str() {
            "help" => Self::Help,
            "clear" => Self::Clear,
            "pwd" => Self::Pwd,
            "echo" => Self::Echo(words.collect::<Vec<_>>().join(" ")),
            "ls" => Self::List,
            "cd" => Self::ChangeDir(words.next().map(str::to_owned)),
            "cat" => Self::Cat(words.next().map(str::to_owned)),
            _ => Self::Unknown(cmd.to_owned()),
        }
    }
}

/// Result of one command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellOutput {
    pub lines: Vec<String>,
    /// The screen should be wiped (`clear`).
    pub clear: bool,
}

/// One terminal window's state: working directory and scrollback.
#[derive(Debug, Clone)]
pub struct ShellSession {
    volume: String,
    cwd: VfsPath,
    history: Vec<String>,
}

impl ShellSession {
    pub fn new(volume: impl Into<String>) -> Self {
        Self {
            volume: volume.into(),
            cwd: VfsPath::root(),
            history: WELCOME_LINES.iter().map(|s| (*s).to_owned()).collect(),
        }
    }

    pub fn cwd(&self) -> &VfsPath {
        &self.cwd
    }

    /// Scrollback, including echoed command lines.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Prompt such as `C:\Users\Durgas>`.
    pub fn prompt(&self) -> String {
        format!("{}>", self.cwd.display_with_volume(&self.volume))
    }

    /// Run one command line against `fs` and append it to the scrollback.
    pub fn execute(&mut self, fs: &FsSnapshot, line: &str) -> ShellOutput {
        let prompt = self.prompt();
        let command = ShellCommand::parse(line);
        let lines = match &command {
            ShellCommand::Empty => {
                self.history.push(prompt);
                return ShellOutput::default();
            }
            ShellCommand::Clear => {
                self.history.clear();
                return ShellOutput {
                    lines: Vec::new(),
                    clear: true,
                };
            }
            ShellCommand::Help => HELP_LINES.iter().map(|s| (*s).to_owned()).collect(),
            ShellCommand::Pwd => vec![self.cwd.display_with_volume(&self.volume)],
            ShellCommand::Echo(text) => vec![text.clone()],
            ShellCommand::List => self.list(fs),
            ShellCommand::ChangeDir(target) => self.change_dir(fs, target.as_deref()),
            ShellCommand::Cat(file) => self.cat(fs, file.as_deref()),
            ShellCommand::Unknown(cmd) => vec![format!(
                "Command not found: {cmd}. Type 'help' for a list of commands."
            )],
        };
        self.history.push(format!("{prompt} {line}"));
        self.history.extend(lines.iter().cloned());
        ShellOutput {
            lines,
            clear: false,
        }
    }

    fn list(&self, fs: &FsSnapshot) -> Vec<String> {
        let Ok(dir) = fs.resolve_folder(&self.cwd) else {
            return vec!["Error: Current directory not found.".to_owned()];
        };
        let children = fs.children_of(dir);
        if children.is_empty() {
            return vec!["Directory is empty.".to_owned()];
        }
        children
            .iter()
            .filter_map(|&child| {
                let tag = match fs.kind_of(child)? {
                    NodeKind::Folder => "<FOLDER>",
                    NodeKind::File => "<FILE>",
                };
                Some(format!("{tag:<10}{}", fs.name_of(child)?))
            })
            .collect()
    }

    fn change_dir(&mut self, fs: &FsSnapshot, target: Option<&str>) -> Vec<String> {
        match target {
            Some("..") => {
                self.cwd = self.cwd.parent().unwrap_or_default();
                Vec::new()
            }
            None | Some("/") | Some("\\") => {
                self.cwd = VfsPath::root();
                Vec::new()
            }
            Some(name) => {
                let found = fs
                    .resolve_folder(&self.cwd)
                    .ok()
                    .and_then(|dir| fs.find_child(dir, name))
                    .filter(|&child| fs.kind_of(child) == Some(NodeKind::Folder))
                    .and_then(|child| fs.name_of(child));
                match found {
                    // Keep the stored casing, not what was typed.
                    Some(actual) => {
                        self.cwd = self.cwd.join(actual);
                        Vec::new()
                    }
                    None => vec![format!("cd: no such directory: {name}")],
                }
            }
        }
    }

    fn cat(&self, fs: &FsSnapshot, file: Option<&str>) -> Vec<String> {
        let Some(name) = file else {
            return vec!["cat: missing file operand".to_owned()];
        };
        let node = fs
            .resolve_folder(&self.cwd)
            .ok()
            .and_then(|dir| fs.find_child(dir, name));
        match node.and_then(|id| fs.kind_of(id).map(|kind| (id, kind))) {
            Some((id, NodeKind::File)) => fs
                .content_of(id)
                .unwrap_or_default()
                .split('\n')
                .map(str::to_owned)
                .collect(),
            Some((_, NodeKind::Folder)) => vec![format!("cat: {name}: Is a directory")],
            None => vec![format!("cat: {name}: No such file or directory")],
        }
    }
}
