// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Module manifest parsing from `*.plugin.toml` files.
//!
//! A manifest declares the types a module exports, their kind, and the
//! capabilities each implements. It stands in for runtime type inspection:
//! the catalog reads exports from here instead of from the binary.

use std::str::FromStr;

use lumen_core::{Capability, LumenError};
use serde::Deserialize;
use strum::{Display, EnumString};

/// Kind of an exported type. Only [`TypeKind::Class`] is instantiable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum TypeKind {
    Class,
    Abstract,
    Interface,
    Generic,
}

/// One type exported by a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub name: String,
    pub kind: TypeKind,
    pub capabilities: Vec<Capability>,
    /// Factory symbol. Defaults to the type name.
    pub constructor: String,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        let name = name.into();
        Self {
            constructor: name.clone(),
            name,
            kind,
            capabilities: Vec::new(),
        }
    }

    /// A concrete class exporting no capabilities yet.
    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Class)
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capabilities.push(capability);
        self
    }

    pub fn with_constructor(mut self, symbol: impl Into<String>) -> Self {
        self.constructor = symbol.into();
        self
    }

    pub fn is_instantiable(&self) -> bool {
        self.kind == TypeKind::Class
    }

    pub fn implements(&self, capability: &Capability) -> bool {
        self.capabilities.contains(capability)
    }
}

/// Parsed module manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleManifest {
    pub name: String,
    /// Raw version string; parsed when a plugin is loaded.
    pub version: String,
    pub id: Option<String>,
    pub description: Option<String>,
    pub exports: Vec<TypeDescriptor>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestFile {
    module: ModuleSection,
    #[serde(default)]
    exports: Vec<ExportSection>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ModuleSection {
    name: String,
    version: String,
    id: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ExportSection {
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default = "default_kind")]
    kind: String,
    #[serde(default)]
    capabilities: Vec<String>,
    constructor: Option<String>,
}

fn default_kind() -> String {
    "class".to_string()
}

/// Parses a module manifest from TOML content.
pub fn parse_module_manifest(toml_content: &str) -> Result<ModuleManifest, LumenError> {
    let file: ManifestFile = toml::from_str(toml_content)
        .map_err(|e| LumenError::Config(format!("invalid module manifest: {e}")))?;

    let module = file.module;
    if module.name.trim().is_empty() {
        return Err(LumenError::Config(
            "module manifest: name must not be empty".to_string(),
        ));
    }

    let exports = file
        .exports
        .into_iter()
        .map(|export| {
            if export.type_name.trim().is_empty() {
                return Err(LumenError::Config(format!(
                    "module manifest `{}`: export type must not be empty",
                    module.name
                )));
            }
            let kind = TypeKind::from_str(&export.kind).map_err(|_| {
                LumenError::Config(format!(
                    "module manifest `{}`: invalid kind '{}' for {}. Expected one of: class, abstract, interface, generic",
                    module.name, export.kind, export.type_name
                ))
            })?;
            let mut descriptor = TypeDescriptor::new(export.type_name, kind);
            descriptor.capabilities = export
                .capabilities
                .iter()
                .filter_map(|c| Capability::from_str(c).ok())
                .collect();
            if let Some(symbol) = export.constructor {
                descriptor.constructor = symbol;
            }
            Ok(descriptor)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ModuleManifest {
        name: module.name,
        version: module.version,
        id: module.id,
        description: module.description,
        exports,
    })
}
