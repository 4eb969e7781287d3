// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `lumen plugins list` command implementation.

use std::path::PathBuf;

use lumen_config::LumenConfig;
use lumen_plugin::{LoadOutcome, ModuleOrigin, scan_plugin_directory};

/// One module found in the plugin directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleListing {
    pub name: String,
    pub version: String,
    pub path: PathBuf,
    pub exports: usize,
    pub enabled: bool,
    /// Why the module cannot be loaded, if it cannot.
    pub error: Option<String>,
}

/// Modules in the configured plugin directory, sorted by path.
pub fn list_modules(config: &LumenConfig) -> Vec<ModuleListing> {
    scan_plugin_directory(&config.paths.plugins_dir())
        .into_iter()
        .map(|module| {
            let path = match module.origin() {
                ModuleOrigin::File(path) => path.clone(),
                ModuleOrigin::Builtin => PathBuf::new(),
            };
            let (exports, error) = match (module.load_outcome(), module.exported_types()) {
                (LoadOutcome::Failed { reason }, _) => (0, Some(reason)),
                (LoadOutcome::Loaded, Ok(types)) => (types.len(), None),
                (LoadOutcome::Loaded, Err(e)) => (0, Some(e.to_string())),
            };
            ModuleListing {
                name: module.name().to_string(),
                version: module.version().to_string(),
                enabled: config.plugin_enabled(module.name()),
                path,
                exports,
                error,
            }
        })
        .collect()
}

/// Runs `lumen plugins list`.
pub fn run_list(config: &LumenConfig) {
    let modules = list_modules(config);
    let dir = config.paths.plugins_dir();
    if modules.is_empty() {
        println!("no modules in {}", dir.display());
        return;
    }

    println!("modules in {}:", dir.display());
    for module in &modules {
        let state = match (&module.error, module.enabled) {
            (Some(_), _) => "failed",
            (None, true) => "enabled",
            (None, false) => "disabled",
        };
        println!(
            "  {:<24} {:<10} {:<9} {} export(s)",
            module.name, module.version, state, module.exports
        );
        if let Some(error) = &module.error {
            println!("      {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &std::path::Path) -> LumenConfig {
        let mut config = LumenConfig::default();
        config.paths.program_data_path = dir.display().to_string();
        config
    }

    #[test]
    fn missing_directory_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_modules(&config_in(dir.path())).is_empty());
    }

    #[test]
    fn lists_valid_disabled_and_broken_modules() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.plugins.insert("Trakt".into(), false);

        let plugins = config.paths.plugins_dir();
        std::fs::create_dir_all(plugins.join("trakt")).unwrap();
        std::fs::write(
            plugins.join("trakt/Trakt.plugin.toml"),
            "[module]\nname = \"Trakt\"\nversion = \"2.1\"\n\n[[exports]]\ntype = \"TraktPlugin\"\ncapabilities = [\"Plugin\"]\nconstructor = \"trakt.plugin\"\n",
        )
        .unwrap();
        std::fs::create_dir_all(plugins.join("broken")).unwrap();
        std::fs::write(plugins.join("broken/Broken.plugin.toml"), "not toml [").unwrap();

        let modules = list_modules(&config);
        assert_eq!(modules.len(), 2);

        let broken = &modules[0];
        assert!(broken.error.is_some());
        assert_eq!(broken.exports, 0);

        let trakt = &modules[1];
        assert_eq!(trakt.name, "Trakt");
        assert_eq!(trakt.version, "2.1");
        assert_eq!(trakt.exports, 1);
        assert!(!trakt.enabled);
        assert!(trakt.error.is_none());
    }
}
