// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin identity assignment and the live plugin set.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lumen_core::{LumenError, Plugin};
use parking_lot::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::catalog::ConcreteType;
use crate::module::ModuleOrigin;

/// Whether a loaded plugin participates in the running host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginStatus {
    Active,
    /// Disabled by configuration. Kept for listing; its entry points do not run.
    Disabled,
}

impl fmt::Display for PluginStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginStatus::Active => write!(f, "active"),
            PluginStatus::Disabled => write!(f, "disabled"),
        }
    }
}

/// A constructed plugin instance awaiting identity assignment.
pub struct PluginCandidate {
    pub concrete: ConcreteType,
    pub instance: Arc<dyn Plugin>,
}

/// A plugin decorated with identity, version, and its private data directory.
#[derive(Clone)]
pub struct LoadedPlugin {
    pub instance: Arc<dyn Plugin>,
    pub name: String,
    pub id: Uuid,
    pub version: semver::Version,
    /// Manifest path for file modules. `None` for built-in plugins.
    pub assembly_path: Option<PathBuf>,
    pub data_folder_path: PathBuf,
    /// Name of the module that exported the plugin type.
    pub module_name: String,
    pub status: PluginStatus,
}

impl fmt::Debug for LoadedPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedPlugin")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("version", &self.version.to_string())
            .field("assembly_path", &self.assembly_path)
            .field("data_folder_path", &self.data_folder_path)
            .field("status", &self.status)
            .finish()
    }
}

/// Parses a module version, accepting two- and four-part forms.
///
/// `1.2` becomes `1.2.0`; `1.2.3.4` becomes `1.2.3+4`.
pub fn parse_plugin_version(raw: &str) -> Result<semver::Version, LumenError> {
    let raw = raw.trim();
    if let Ok(version) = semver::Version::parse(raw) {
        return Ok(version);
    }

    let parts: Vec<&str> = raw.split('.').collect();
    let normalized = match parts.as_slice() {
        [major] => format!("{major}.0.0"),
        [major, minor] => format!("{major}.{minor}.0"),
        [major, minor, patch, revision] => format!("{major}.{minor}.{patch}+{revision}"),
        _ => raw.to_string(),
    };
    semver::Version::parse(&normalized).map_err(|e| LumenError::Plugin {
        message: format!("unreadable version `{raw}`"),
        source: Some(Box::new(e)),
    })
}

/// Assigns identity, version, and data directory to a constructed plugin.
///
/// Any failure is logged and yields `None`; it never affects other plugins.
/// An unreadable id is logged and replaced with a generated one.
pub fn load_plugin(candidate: &PluginCandidate, plugins_dir: &Path) -> Option<LoadedPlugin> {
    let module = candidate.concrete.module();
    let name = candidate.instance.name().to_string();

    let assembly_path = match module.origin() {
        ModuleOrigin::File(path) => Some(path.clone()),
        ModuleOrigin::Builtin => None,
    };
    let data_folder_path = plugins_dir.join(module.base_name());

    let version = match parse_plugin_version(module.version()) {
        Ok(version) => version,
        Err(e) => {
            warn!(plugin = %name, module = module.name(), error = %e, "failed to load plugin");
            return None;
        }
    };

    let declared_id = module.id().or_else(|| candidate.instance.id());
    let id = match declared_id.map(Uuid::parse_str) {
        Some(Ok(id)) => id,
        Some(Err(e)) => {
            warn!(plugin = %name, error = %e, "plugin id is not a valid GUID, generating one");
            Uuid::new_v4()
        }
        None => {
            warn!(plugin = %name, "plugin declares no id, generating one");
            Uuid::new_v4()
        }
    };

    if candidate.instance.has_configuration()
        && let Err(e) = std::fs::create_dir_all(&data_folder_path)
    {
        warn!(
            plugin = %name,
            path = %data_folder_path.display(),
            error = %e,
            "failed to create plugin data directory"
        );
        return None;
    }

    info!(plugin = %name, %version, %id, "loaded plugin");
    Some(LoadedPlugin {
        instance: candidate.instance.clone(),
        name,
        id,
        version,
        assembly_path,
        data_folder_path,
        module_name: module.name().to_string(),
        status: PluginStatus::Active,
    })
}

/// The live plugin set, shared between startup and hot-install.
#[derive(Default)]
pub struct PluginSet {
    plugins: RwLock<Vec<LoadedPlugin>>,
}

impl PluginSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends every plugin under one write lock; readers see all or none.
    pub fn extend(&self, plugins: Vec<LoadedPlugin>) {
        self.plugins.write().extend(plugins);
    }

    pub fn remove(&self, id: Uuid) -> Option<LoadedPlugin> {
        let mut plugins = self.plugins.write();
        let index = plugins.iter().position(|p| p.id == id)?;
        Some(plugins.remove(index))
    }

    pub fn get(&self, id: Uuid) -> Option<LoadedPlugin> {
        self.plugins.read().iter().find(|p| p.id == id).cloned()
    }

    pub fn get_by_name(&self, name: &str) -> Option<LoadedPlugin> {
        self.plugins
            .read()
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .cloned()
    }

    /// Snapshot sorted by name.
    pub fn list(&self) -> Vec<LoadedPlugin> {
        let mut plugins = self.plugins.read().clone();
        plugins.sort_by(|a, b| a.name.cmp(&b.name));
        plugins
    }

    /// Module names whose plugin is disabled.
    pub fn disabled_modules(&self) -> Vec<String> {
        self.plugins
            .read()
            .iter()
            .filter(|p| p.status == PluginStatus::Disabled)
            .map(|p| p.module_name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.read().is_empty()
    }
}

impl fmt::Debug for PluginSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.plugins.read().iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use lumen_core::Capability;

    use super::*;
    use crate::catalog::Catalog;
    use crate::manifest::TypeDescriptor;
    use crate::module::{BuiltinModule, Module};

    struct Trakt {
        configurable: bool,
    }

    impl Plugin for Trakt {
        fn name(&self) -> &str {
            "Trakt"
        }

        fn has_configuration(&self) -> bool {
            self.configurable
        }
    }

    fn candidate(version: &str, configurable: bool) -> PluginCandidate {
        let module: Arc<dyn Module> = Arc::new(
            BuiltinModule::new("Trakt", version)
                .export(TypeDescriptor::class("TraktPlugin").with_capability(Capability::Plugin)),
        );
        let catalog = Catalog::discover(&[module]);
        PluginCandidate {
            concrete: catalog.concrete_types()[0].clone(),
            instance: Arc::new(Trakt { configurable }),
        }
    }

    #[test]
    fn version_forms() {
        assert_eq!(parse_plugin_version("1.2").unwrap().to_string(), "1.2.0");
        assert_eq!(parse_plugin_version("4").unwrap().to_string(), "4.0.0");
        assert_eq!(
            parse_plugin_version("1.2.3.4").unwrap().to_string(),
            "1.2.3+4"
        );
        assert!(parse_plugin_version("banana").is_err());
    }

    #[test]
    fn load_assigns_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_plugin(&candidate("2.1.0", false), dir.path()).unwrap();

        assert_eq!(loaded.name, "Trakt");
        assert_eq!(loaded.version, semver::Version::new(2, 1, 0));
        assert_eq!(loaded.data_folder_path, dir.path().join("Trakt"));
        assert!(loaded.assembly_path.is_none());
        assert_eq!(loaded.status, PluginStatus::Active);
        // Only configurable plugins get their directory created.
        assert!(!loaded.data_folder_path.exists());
    }

    #[test]
    fn configurable_plugin_gets_data_directory() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_plugin(&candidate("2.1.0", true), dir.path()).unwrap();
        assert!(loaded.data_folder_path.is_dir());
    }

    #[test]
    #[tracing_test::traced_test]
    fn unreadable_version_excludes_plugin() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_plugin(&candidate("not.a.version.at.all", false), dir.path()).is_none());
        assert!(logs_contain("failed to load plugin"));
    }

    #[test]
    fn plugin_set_operations() {
        let dir = tempfile::tempdir().unwrap();
        let set = PluginSet::new();
        let a = load_plugin(&candidate("1.0.0", false), dir.path()).unwrap();
        let mut b = a.clone();
        b.id = Uuid::new_v4();
        b.name = "Anime".into();
        b.status = PluginStatus::Disabled;

        set.extend(vec![a.clone(), b.clone()]);
        assert_eq!(set.len(), 2);

        let names: Vec<_> = set.list().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Anime", "Trakt"]);
        assert_eq!(set.disabled_modules(), vec!["Trakt".to_string()]);
        assert!(set.get_by_name("trakt").is_some());

        assert!(set.remove(b.id).is_some());
        assert!(set.get(b.id).is_none());
        assert!(set.get(a.id).is_some());
        assert!(set.remove(b.id).is_none());
    }
}
