// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Loadable modules: compiled-in ones and manifest-described plugin modules.

use std::fmt;
use std::path::{Path, PathBuf};

use lumen_core::LumenError;

use crate::manifest::{ModuleManifest, TypeDescriptor, parse_module_manifest};

/// Suffix that marks a plugin module manifest on disk.
pub const MODULE_MANIFEST_SUFFIX: &str = ".plugin.toml";

/// Where a module came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleOrigin {
    Builtin,
    File(PathBuf),
}

/// Result of reading a module from its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    Failed { reason: String },
}

/// A unit of loadable code contributing types to the catalog.
pub trait Module: Send + Sync {
    fn name(&self) -> &str;

    fn origin(&self) -> &ModuleOrigin;

    /// Raw version string as declared by the module.
    fn version(&self) -> &str;

    /// Declared identity, if the module carries one.
    fn id(&self) -> Option<&str> {
        None
    }

    fn load_outcome(&self) -> LoadOutcome {
        LoadOutcome::Loaded
    }

    /// Enumerates exported types. May fail for corrupt or incompatible modules.
    fn exported_types(&self) -> Result<Vec<TypeDescriptor>, LumenError>;

    /// Base name used for the plugin data directory.
    fn base_name(&self) -> String {
        match self.origin() {
            ModuleOrigin::File(path) => manifest_base_name(path),
            ModuleOrigin::Builtin => self.name().to_string(),
        }
    }
}

impl fmt::Debug for dyn Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name())
            .field("origin", self.origin())
            .field("version", &self.version())
            .finish()
    }
}

/// `/plugins/trakt/Trakt.plugin.toml` gives `Trakt`.
pub fn manifest_base_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match file_name.strip_suffix(MODULE_MANIFEST_SUFFIX) {
        Some(stem) => stem.to_string(),
        None => path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or(file_name),
    }
}

/// A module compiled into the host binary.
#[derive(Debug, Clone)]
pub struct BuiltinModule {
    name: String,
    version: String,
    exports: Vec<TypeDescriptor>,
    origin: ModuleOrigin,
}

impl BuiltinModule {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            exports: Vec::new(),
            origin: ModuleOrigin::Builtin,
        }
    }

    pub fn export(mut self, descriptor: TypeDescriptor) -> Self {
        self.exports.push(descriptor);
        self
    }
}

impl Module for BuiltinModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn origin(&self) -> &ModuleOrigin {
        &self.origin
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn exported_types(&self) -> Result<Vec<TypeDescriptor>, LumenError> {
        Ok(self.exports.clone())
    }
}

/// A plugin module described by a `*.plugin.toml` file.
///
/// Reading never fails: an unreadable or malformed manifest produces a module
/// whose [`Module::exported_types`] returns the error, so the catalog can log
/// and skip it.
#[derive(Debug)]
pub struct ManifestModule {
    origin: ModuleOrigin,
    fallback_name: String,
    manifest: Result<ModuleManifest, String>,
}

impl ManifestModule {
    pub fn read(path: &Path) -> Self {
        let manifest = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read manifest: {e}"))
            .and_then(|content| parse_module_manifest(&content).map_err(|e| e.to_string()));
        Self {
            origin: ModuleOrigin::File(path.to_path_buf()),
            fallback_name: manifest_base_name(path),
            manifest,
        }
    }

    pub fn manifest(&self) -> Option<&ModuleManifest> {
        self.manifest.as_ref().ok()
    }

    pub fn path(&self) -> &Path {
        match &self.origin {
            ModuleOrigin::File(path) => path,
            ModuleOrigin::Builtin => Path::new(""),
        }
    }
}

impl Module for ManifestModule {
    fn name(&self) -> &str {
        match &self.manifest {
            Ok(manifest) => &manifest.name,
            Err(_) => &self.fallback_name,
        }
    }

    fn origin(&self) -> &ModuleOrigin {
        &self.origin
    }

    fn version(&self) -> &str {
        match &self.manifest {
            Ok(manifest) => &manifest.version,
            Err(_) => "",
        }
    }

    fn id(&self) -> Option<&str> {
        self.manifest.as_ref().ok().and_then(|m| m.id.as_deref())
    }

    fn load_outcome(&self) -> LoadOutcome {
        match &self.manifest {
            Ok(_) => LoadOutcome::Loaded,
            Err(reason) => LoadOutcome::Failed {
                reason: reason.clone(),
            },
        }
    }

    fn exported_types(&self) -> Result<Vec<TypeDescriptor>, LumenError> {
        match &self.manifest {
            Ok(manifest) => Ok(manifest.exports.clone()),
            Err(reason) => Err(LumenError::Discovery {
                module: self.path().display().to_string(),
                reason: reason.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::Capability;

    #[test]
    fn base_name_strips_manifest_suffix() {
        assert_eq!(
            manifest_base_name(Path::new("/p/trakt/Trakt.plugin.toml")),
            "Trakt"
        );
        assert_eq!(manifest_base_name(Path::new("/p/other.toml")), "other");
    }

    #[test]
    fn builtin_module_exports_declared_types() {
        let module = BuiltinModule::new("Lumen.Server", "1.0.0")
            .export(TypeDescriptor::class("Warmup").with_capability(Capability::EntryPoint));
        assert_eq!(module.origin(), &ModuleOrigin::Builtin);
        assert_eq!(module.exported_types().unwrap().len(), 1);
        assert_eq!(module.base_name(), "Lumen.Server");
    }

    #[test]
    fn unreadable_manifest_fails_enumeration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Ghost.plugin.toml");
        let module = ManifestModule::read(&path);
        assert_eq!(module.name(), "Ghost");
        assert!(matches!(module.load_outcome(), LoadOutcome::Failed { .. }));
        assert!(matches!(
            module.exported_types(),
            Err(LumenError::Discovery { .. })
        ));
    }

    #[test]
    fn readable_manifest_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Trakt.plugin.toml");
        std::fs::write(
            &path,
            "[module]\nname = \"Trakt\"\nversion = \"1.0.0\"\nid = \"8abc6789-fde2-4705-8592-4028806fa343\"\n",
        )
        .unwrap();
        let module = ManifestModule::read(&path);
        assert_eq!(module.load_outcome(), LoadOutcome::Loaded);
        assert_eq!(module.version(), "1.0.0");
        assert!(module.id().is_some());
        assert_eq!(module.base_name(), "Trakt");
    }
}
