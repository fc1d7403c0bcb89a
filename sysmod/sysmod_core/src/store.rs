//! Auto-start flag store.
//!
//! A module is flagged for auto-start when its marker file exists. The
//! marker's contents are never read.

use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;

use tracing::debug;

use crate::error::FlagError;
use crate::id::ProgramId;
use crate::layout::ContentsLayout;

/// Persistence of the per-module auto-start flag.
pub trait FlagStore {
    /// Whether the flag is set. Never fails; any I/O error reads as `false`.
    fn has_auto_start(&self, id: ProgramId) -> bool;

    /// Set or clear the flag. Both directions are idempotent.
    fn set_auto_start(&self, id: ProgramId, enabled: bool) -> Result<(), FlagError>;
}

/// Flag store backed by marker files under the contents root.
#[derive(Debug, Clone)]
pub struct FsFlagStore {
    layout: ContentsLayout,
}

impl FsFlagStore {
    /// Create a flag store over the given layout.
    pub fn new(layout: ContentsLayout) -> Self {
        Self { layout }
    }

    fn create(&self, id: ProgramId) -> Result<(), FlagError> {
        let dir = self.layout.flag_dir(id);
        fs::create_dir_all(&dir).map_err(|source| FlagError::CreateDir {
            path: dir.clone(),
            source,
        })?;

        let path = self.layout.flag_path(id);
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| FlagError::Create {
                path: path.clone(),
                source,
            })?;

        debug!("Created auto-start flag {}", path.display());
        Ok(())
    }

    fn remove(&self, id: ProgramId) -> Result<(), FlagError> {
        let path = self.layout.flag_path(id);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed auto-start flag {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(FlagError::Remove { path, source }),
        }
    }
}

impl FlagStore for FsFlagStore {
    fn has_auto_start(&self, id: ProgramId) -> bool {
        File::open(self.layout.flag_path(id))
            .and_then(|file| file.metadata())
            .is_ok_and(|meta| meta.is_file())
    }

    fn set_auto_start(&self, id: ProgramId, enabled: bool) -> Result<(), FlagError> {
        if enabled {
            self.create(id)
        } else {
            self.remove(id)
        }
    }
}
