use std::fs;
use std::time::Instant;

use camino::Utf8PathBuf;

use crate::error::WorkspaceError;

/// Manages the directory collecting generated artifacts.
///
/// The workspace owns exactly one directory. [`Workspace::clean`] touches
/// only files of the managed extension directly inside it, nothing else.
#[derive(Debug, Clone)]
pub struct Workspace {
    /// The build directory.
    pub root: Utf8PathBuf,
    /// Extension of the artifacts this workspace manages.
    pub extension: String,
}

impl Workspace {
    /// Creates a workspace managing `svg` artifacts under `root`.
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: String::from("svg"),
        }
    }

    /// Sets the managed artifact extension.
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Creates the build directory and any missing parents. A directory
    /// that already exists is fine.
    pub fn ensure(&self) -> Result<(), WorkspaceError> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    /// Deletes every generated artifact of the managed extension.
    ///
    /// The directory is created first so the purge is total, and stays in
    /// place afterwards. Returns the number of files removed.
    pub fn clean(&self) -> Result<usize, WorkspaceError> {
        let s = Instant::now();

        self.ensure()?;

        // Metacharacters in the root must match literally, not as a pattern.
        let pattern = format!(
            "{}/*.{}",
            glob::Pattern::escape(self.root.as_str()),
            glob::Pattern::escape(&self.extension)
        );
        let mut removed = 0;

        for entry in glob::glob(&pattern)? {
            let path = entry?;
            if path.is_file() {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }

        tracing::info!(
            "Cleaned {} artifacts from {} {}",
            removed,
            self.root,
            crate::utils::as_overhead(s)
        );

        Ok(removed)
    }
}
