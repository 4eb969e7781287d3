// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Module discovery and the plugin pipeline.
//!
//! Modules are either compiled in ([`BuiltinModule`]) or described on disk by
//! a `*.plugin.toml` manifest ([`ManifestModule`]). The [`Catalog`] collects
//! their concrete exported types, the [`FactoryTable`] turns a type's
//! constructor symbol into an instance, and [`load_plugin`] decorates plugin
//! instances with identity before they join the live [`PluginSet`].

pub mod catalog;
pub mod factory;
pub mod loader;
pub mod manifest;
pub mod module;
pub mod registry;

pub use catalog::{Catalog, ConcreteType};
pub use factory::{Factory, FactoryTable};
pub use loader::{is_module_manifest, scan_plugin_directory};
pub use manifest::{ModuleManifest, TypeDescriptor, TypeKind, parse_module_manifest};
pub use module::{BuiltinModule, LoadOutcome, ManifestModule, Module, ModuleOrigin};
pub use registry::{
    LoadedPlugin, PluginCandidate, PluginSet, PluginStatus, load_plugin, parse_plugin_version,
};
