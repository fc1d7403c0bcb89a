//! Module Registry
//!
//! Discovers manageable modules from the descriptors under the contents
//! root. The registry is built once and never rescanned.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{DescriptorError, DiscoveryError};
use crate::id::ProgramId;
use crate::layout::ContentsLayout;

/// A manageable background module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemModule {
    /// Program id, the key for process and flag operations
    pub program_id: ProgramId,

    /// Display name
    pub name: String,

    /// Whether the module only takes effect after a reboot
    pub requires_reboot: bool,
}

/// Descriptor schema. Unknown fields are ignored; missing or mistyped ones
/// reject the descriptor.
#[derive(Debug, Deserialize)]
struct Descriptor {
    tid: String,
    name: String,
    requires_reboot: bool,
}

impl Descriptor {
    fn parse(path: &Path, data: &str) -> Result<Self, DescriptorError> {
        serde_json::from_str(data).map_err(|source| DescriptorError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// The set of modules found at startup, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    modules: Vec<SystemModule>,
}

impl ModuleRegistry {
    /// Build a registry from already-known modules.
    ///
    /// The reserved id and repeated ids are dropped, keeping the first
    /// occurrence.
    pub fn from_modules(
        modules: impl IntoIterator<Item = SystemModule>,
        reserved: ProgramId,
    ) -> Self {
        let mut seen = HashSet::new();
        let modules = modules
            .into_iter()
            .filter(|m| m.program_id != reserved && seen.insert(m.program_id))
            .collect();
        Self { modules }
    }

    /// Scan the contents root for module descriptors.
    ///
    /// Every directory under the root is a candidate. A candidate whose
    /// descriptor is missing or invalid, names `reserved`, or repeats an id
    /// already found is skipped. Only failure to enumerate the root itself is
    /// an error.
    pub fn discover(
        layout: &ContentsLayout,
        reserved: ProgramId,
    ) -> Result<Self, DiscoveryError> {
        let root = layout.root();
        info!("Discovering modules in {}", root.display());

        let entries = fs::read_dir(root).map_err(|source| DiscoveryError::ScanFailed {
            path: root.to_path_buf(),
            source,
        })?;

        let mut modules: Vec<SystemModule> = Vec::new();
        let mut seen = HashSet::new();

        for entry in entries.filter_map(|e| e.ok()) {
            let dir = entry.path();
            if !dir.is_dir() {
                continue;
            }

            let module = match load_descriptor(layout, &dir) {
                Ok(module) => module,
                Err(e @ DescriptorError::Read { .. }) => {
                    debug!("Skipping {}: {}", dir.display(), e);
                    continue;
                }
                Err(e) => {
                    warn!("Skipping {}: {}", dir.display(), e);
                    continue;
                }
            };

            if module.program_id == reserved {
                debug!("Skipping {}: {}", dir.display(), DescriptorError::Reserved(reserved));
                continue;
            }

            if !seen.insert(module.program_id) {
                warn!(
                    "Skipping {}: {}",
                    dir.display(),
                    DescriptorError::Duplicate(module.program_id)
                );
                continue;
            }

            debug!("Found module {} ({})", module.name, module.program_id);
            modules.push(module);
        }

        info!("Discovered {} modules", modules.len());

        Ok(Self { modules })
    }

    /// All modules in discovery order.
    pub fn modules(&self) -> &[SystemModule] {
        &self.modules
    }

    /// Look a module up by id.
    pub fn get(&self, id: ProgramId) -> Option<&SystemModule> {
        self.modules.iter().find(|m| m.program_id == id)
    }

    /// Number of modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether no module was found.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Modules that can be started and stopped live.
    pub fn dynamic(&self) -> impl Iterator<Item = &SystemModule> {
        self.modules.iter().filter(|m| !m.requires_reboot)
    }

    /// Modules that only take effect after a reboot.
    pub fn static_modules(&self) -> impl Iterator<Item = &SystemModule> {
        self.modules.iter().filter(|m| m.requires_reboot)
    }
}

fn load_descriptor(layout: &ContentsLayout, dir: &Path) -> Result<SystemModule, DescriptorError> {
    let path = layout.descriptor_in(dir);

    let data = fs::read_to_string(&path).map_err(|source| DescriptorError::Read {
        path: path.clone(),
        source,
    })?;

    let descriptor = Descriptor::parse(&path, &data)?;

    let program_id = descriptor
        .tid
        .parse::<ProgramId>()
        .map_err(|source| DescriptorError::InvalidId {
            path: path.clone(),
            source,
        })?;

    Ok(SystemModule {
        program_id,
        name: descriptor.name,
        requires_reboot: descriptor.requires_reboot,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::RESERVED_PROGRAM_ID;

    fn write_descriptor(root: &Path, dir: &str, body: &str) {
        let dir = root.join(dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("toolbox.json"), body).unwrap();
    }

    fn descriptor(tid: &str, name: &str, requires_reboot: bool) -> String {
        format!(
            r#"{{"name": "{}", "tid": "{}", "requires_reboot": {}}}"#,
            name, tid, requires_reboot
        )
    }

    #[test]
    fn test_discover_reads_descriptors() {
        let root = tempfile::tempdir().unwrap();
        write_descriptor(
            root.path(),
            "0100000000000001",
            &descriptor("0100000000000001", "Foo", false),
        );
        write_descriptor(
            root.path(),
            "0100000000000002",
            &descriptor("0100000000000002", "Bar", true),
        );

        let registry =
            ModuleRegistry::discover(&ContentsLayout::with_root(root.path()), RESERVED_PROGRAM_ID)
                .unwrap();

        assert_eq!(registry.len(), 2);

        let foo = registry.get(ProgramId::new(0x0100_0000_0000_0001)).unwrap();
        assert_eq!(foo.name, "Foo");
        assert!(!foo.requires_reboot);

        let bar = registry.get(ProgramId::new(0x0100_0000_0000_0002)).unwrap();
        assert_eq!(bar.name, "Bar");
        assert!(bar.requires_reboot);

        assert_eq!(registry.dynamic().count(), 1);
        assert_eq!(registry.static_modules().count(), 1);
    }

    #[test]
    fn test_reserved_id_is_excluded() {
        let root = tempfile::tempdir().unwrap();
        write_descriptor(
            root.path(),
            "420000000007E51A",
            &descriptor("420000000007e51a", "Overlay host", false),
        );
        write_descriptor(
            root.path(),
            "0100000000000001",
            &descriptor("0100000000000001", "Foo", false),
        );

        let registry =
            ModuleRegistry::discover(&ContentsLayout::with_root(root.path()), RESERVED_PROGRAM_ID)
                .unwrap();

        assert_eq!(registry.len(), 1);
        assert!(registry.get(RESERVED_PROGRAM_ID).is_none());
    }

    #[test]
    fn test_bad_descriptors_are_skipped() {
        let root = tempfile::tempdir().unwrap();
        write_descriptor(root.path(), "A", "not json");
        write_descriptor(root.path(), "B", r#"{"tid": "0100000000000003", "name": "NoFlag"}"#);
        write_descriptor(
            root.path(),
            "C",
            r#"{"tid": "0100000000000004", "name": "Typed", "requires_reboot": "yes"}"#,
        );
        write_descriptor(root.path(), "D", &descriptor("zz", "BadId", false));
        write_descriptor(root.path(), "E", r#"{"tid": 5, "name": "NumId", "requires_reboot": false}"#);
        fs::create_dir_all(root.path().join("F")).unwrap();
        fs::write(root.path().join("stray.json"), "{}").unwrap();
        write_descriptor(
            root.path(),
            "G",
            r#"{"tid": "0100000000000007", "name": "Good", "requires_reboot": false, "extra": 1}"#,
        );

        let registry =
            ModuleRegistry::discover(&ContentsLayout::with_root(root.path()), RESERVED_PROGRAM_ID)
                .unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.modules()[0].name, "Good");
    }

    #[test]
    fn test_duplicate_ids_keep_one_module() {
        let root = tempfile::tempdir().unwrap();
        write_descriptor(root.path(), "one", &descriptor("0100000000000001", "First", false));
        write_descriptor(root.path(), "two", &descriptor("0x0100000000000001", "Second", false));

        let registry =
            ModuleRegistry::discover(&ContentsLayout::with_root(root.path()), RESERVED_PROGRAM_ID)
                .unwrap();

        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_empty_root_is_not_a_failure() {
        let root = tempfile::tempdir().unwrap();

        let registry =
            ModuleRegistry::discover(&ContentsLayout::with_root(root.path()), RESERVED_PROGRAM_ID)
                .unwrap();

        assert!(registry.is_empty());
    }

    #[test]
    fn test_missing_root_is_a_scan_failure() {
        let root = tempfile::tempdir().unwrap();
        let layout = ContentsLayout::with_root(root.path().join("missing"));

        assert!(matches!(
            ModuleRegistry::discover(&layout, RESERVED_PROGRAM_ID),
            Err(DiscoveryError::ScanFailed { .. })
        ));
    }

    #[test]
    fn test_from_modules_filters_reserved_and_duplicates() {
        let module = |raw: u64, name: &str| SystemModule {
            program_id: ProgramId::new(raw),
            name: name.to_string(),
            requires_reboot: false,
        };

        let registry = ModuleRegistry::from_modules(
            vec![
                module(2, "b"),
                module(RESERVED_PROGRAM_ID.as_u64(), "host"),
                module(1, "a"),
                module(2, "b again"),
            ],
            RESERVED_PROGRAM_ID,
        );

        let names: Vec<_> = registry.modules().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
