//! On-disk layout of the contents root.
//!
//! ```text
//! <root>/<ID:016X>/<descriptor_file>
//! <root>/<ID:016X>/<flag_dir>/<flag_file>
//! ```
//!
//! Paths are built fresh on every call.

use std::path::{Path, PathBuf};

use crate::id::ProgramId;

/// Path builder for module directories, descriptors and flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentsLayout {
    root: PathBuf,
    descriptor_file: String,
    flag_dir: String,
    flag_file: String,
}

impl ContentsLayout {
    /// Create a layout rooted at `root`.
    pub fn new(
        root: impl Into<PathBuf>,
        descriptor_file: impl Into<String>,
        flag_dir: impl Into<String>,
        flag_file: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            descriptor_file: descriptor_file.into(),
            flag_dir: flag_dir.into(),
            flag_file: flag_file.into(),
        }
    }

    /// Layout with the stock file names (`toolbox.json`, `flags/boot2.flag`).
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self::new(root, "toolbox.json", "flags", "boot2.flag")
    }

    /// The contents root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of a module.
    pub fn module_dir(&self, id: ProgramId) -> PathBuf {
        self.root.join(id.to_string())
    }

    /// Descriptor inside an enumerated module directory.
    pub fn descriptor_in(&self, module_dir: &Path) -> PathBuf {
        module_dir.join(&self.descriptor_file)
    }

    /// Directory holding a module's flags.
    pub fn flag_dir(&self, id: ProgramId) -> PathBuf {
        self.module_dir(id).join(&self.flag_dir)
    }

    /// Auto-start marker of a module.
    pub fn flag_path(&self, id: ProgramId) -> PathBuf {
        self.flag_dir(id).join(&self.flag_file)
    }
}
