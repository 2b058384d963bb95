//! Folder paths: ordered sequences of names starting below the root volume.

use serde::{Deserialize, Serialize};

/// A path from the root volume, as a list of folder names. Empty = root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VfsPath(Vec<String>);

impl VfsPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Parse `Users/Durgas`, `C:\Users\Durgas` or `/Users/Durgas/`.
    ///
    /// Both separators are accepted, empty segments are dropped and a leading
    /// volume label (a segment ending in `:`) is stripped.
    pub fn parse(raw: &str) -> Self {
        let mut segments: Vec<String> = raw
            .split(['/', '\\'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect();
        if segments.first().is_some_and(|s| s.ends_with(':')) {
            segments.remove(0);
        }
        Self(segments)
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A new path with `name` appended.
    #[must_use]
    pub fn join(&self, name: &str) -> Self {
        let mut next = self.0.clone();
        next.push(name.to_owned());
        Self(next)
    }

    /// The containing folder, or `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Windows-style rendering used by prompts and the explorer address bar.
    pub fn display_with_volume(&self, volume: &str) -> String {
        format!("{volume}\\{}", self.0.join("\\"))
    }

    /// Slash-separated form used for `initialPath` window data.
    pub fn to_slash_string(&self) -> String {
        self.0.join("/")
    }
}

impl std::fmt::Display for VfsPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{}", self.0.join("/"))
    }
}
