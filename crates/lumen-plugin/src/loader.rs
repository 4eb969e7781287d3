// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recursive plugin directory scanning.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::module::{LoadOutcome, MODULE_MANIFEST_SUFFIX, ManifestModule, Module};

/// Whether `path` names a module manifest.
pub fn is_module_manifest(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.len() > MODULE_MANIFEST_SUFFIX.len() && n.ends_with(MODULE_MANIFEST_SUFFIX))
}

/// Finds every module manifest under `dir`, sorted by path.
///
/// A missing directory yields no modules. Manifests that fail to parse are
/// still returned so the catalog can report and skip them.
pub fn scan_plugin_directory(dir: &Path) -> Vec<Arc<dyn Module>> {
    if !dir.exists() {
        debug!(path = %dir.display(), "plugin directory does not exist");
        return Vec::new();
    }

    let mut paths: Vec<_> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "skipping unreadable plugin directory entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_module_manifest(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    paths.sort();

    paths
        .iter()
        .map(|path| {
            let module = ManifestModule::read(path);
            if let LoadOutcome::Failed { reason } = module.load_outcome() {
                warn!(path = %path.display(), %reason, "plugin module failed to load");
            }
            Arc::new(module) as Arc<dyn Module>
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_manifest(dir: &Path, file: &str, name: &str) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(
            dir.join(file),
            format!("[module]\nname = \"{name}\"\nversion = \"1.0.0\"\n"),
        )
        .unwrap();
    }

    #[test]
    fn scans_nested_directories() {
        let root = tempfile::tempdir().unwrap();
        write_manifest(&root.path().join("trakt"), "Trakt.plugin.toml", "Trakt");
        write_manifest(&root.path().join("a/b"), "Deep.plugin.toml", "Deep");
        std::fs::write(root.path().join("readme.txt"), "not a module").unwrap();

        let modules = scan_plugin_directory(root.path());
        let mut names: Vec<_> = modules.iter().map(|m| m.name().to_string()).collect();
        names.sort();
        assert_eq!(names, vec!["Deep", "Trakt"]);
    }

    #[test]
    fn broken_manifests_are_returned_as_failed_modules() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("Bad.plugin.toml"), "not = [valid").unwrap();

        let modules = scan_plugin_directory(root.path());
        assert_eq!(modules.len(), 1);
        assert!(matches!(
            modules[0].load_outcome(),
            LoadOutcome::Failed { .. }
        ));
    }

    #[test]
    fn missing_directory_is_empty() {
        let root = tempfile::tempdir().unwrap();
        assert!(scan_plugin_directory(&root.path().join("nope")).is_empty());
    }

    #[test]
    fn manifest_suffix_detection() {
        assert!(is_module_manifest(Path::new("/x/Trakt.plugin.toml")));
        assert!(!is_module_manifest(Path::new("/x/.plugin.toml")));
        assert!(!is_module_manifest(Path::new("/x/Trakt.toml")));
    }
}
