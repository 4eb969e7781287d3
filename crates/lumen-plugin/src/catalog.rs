// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The capability catalog: concrete types exported by every loaded module.

use std::fmt;
use std::sync::Arc;

use lumen_core::Capability;
use tracing::{debug, warn};

use crate::manifest::TypeDescriptor;
use crate::module::Module;

/// An instantiable type together with the module that declared it.
#[derive(Clone)]
pub struct ConcreteType {
    module: Arc<dyn Module>,
    descriptor: TypeDescriptor,
}

impl ConcreteType {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn constructor(&self) -> &str {
        &self.descriptor.constructor
    }

    pub fn capabilities(&self) -> &[Capability] {
        &self.descriptor.capabilities
    }

    pub fn implements(&self, capability: &Capability) -> bool {
        self.descriptor.implements(capability)
    }

    pub fn module(&self) -> &Arc<dyn Module> {
        &self.module
    }
}

impl fmt::Debug for ConcreteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcreteType")
            .field("name", &self.descriptor.name)
            .field("module", &self.module.name())
            .field("capabilities", &self.descriptor.capabilities)
            .finish()
    }
}

/// Immutable result of one or more discovery passes.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    types: Vec<ConcreteType>,
}

impl Catalog {
    /// Runs one discovery pass over `modules`, in order.
    ///
    /// A module that fails to enumerate is logged and skipped; the rest of the
    /// scan continues.
    pub fn discover(modules: &[Arc<dyn Module>]) -> Self {
        let mut catalog = Self::default();
        catalog.extend(modules);
        catalog
    }

    /// Appends a discovery pass and returns only the newly added types.
    pub fn extend(&mut self, modules: &[Arc<dyn Module>]) -> Vec<ConcreteType> {
        let mut added = Vec::new();
        for module in modules {
            let exports = match module.exported_types() {
                Ok(exports) => exports,
                Err(e) => {
                    warn!(module = module.name(), error = %e, "failed to enumerate module exports, skipping");
                    continue;
                }
            };

            let before = added.len();
            added.extend(
                exports
                    .into_iter()
                    .filter(TypeDescriptor::is_instantiable)
                    .map(|descriptor| ConcreteType {
                        module: module.clone(),
                        descriptor,
                    }),
            );
            debug!(
                module = module.name(),
                types = added.len() - before,
                "module exports discovered"
            );
        }
        self.types.extend(added.iter().cloned());
        added
    }

    /// Every concrete type implementing `capability`.
    pub fn get_exports_of(&self, capability: &Capability) -> Vec<ConcreteType> {
        self.types
            .iter()
            .filter(|t| t.implements(capability))
            .cloned()
            .collect()
    }

    pub fn concrete_types(&self) -> &[ConcreteType] {
        &self.types
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use lumen_core::LumenError;

    use super::*;
    use crate::manifest::TypeKind;
    use crate::module::{BuiltinModule, ModuleOrigin};

    static BUILTIN: ModuleOrigin = ModuleOrigin::Builtin;

    struct CorruptModule;

    impl Module for CorruptModule {
        fn name(&self) -> &str {
            "corrupt"
        }

        fn origin(&self) -> &ModuleOrigin {
            &BUILTIN
        }

        fn version(&self) -> &str {
            "0.0.0"
        }

        fn exported_types(&self) -> Result<Vec<TypeDescriptor>, LumenError> {
            Err(LumenError::Discovery {
                module: "corrupt".into(),
                reason: "bad header".into(),
            })
        }
    }

    fn server_module() -> Arc<dyn Module> {
        Arc::new(
            BuiltinModule::new("server", "1.0.0")
                .export(TypeDescriptor::class("Warmup").with_capability(Capability::EntryPoint))
                .export(
                    TypeDescriptor::new("BaseTask", TypeKind::Abstract)
                        .with_capability(Capability::ScheduledTask),
                )
                .export(
                    TypeDescriptor::new("IProvider", TypeKind::Interface)
                        .with_capability(Capability::ImageProvider),
                )
                .export(TypeDescriptor::new("Cache<T>", TypeKind::Generic)),
        )
    }

    #[test]
    fn only_classes_are_cataloged() {
        let catalog = Catalog::discover(&[server_module()]);
        let names: Vec<_> = catalog.concrete_types().iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["Warmup"]);
    }

    #[test]
    #[tracing_test::traced_test]
    fn failing_module_does_not_hide_others() {
        let modules: Vec<Arc<dyn Module>> = vec![Arc::new(CorruptModule), server_module()];
        let catalog = Catalog::discover(&modules);
        assert_eq!(catalog.len(), 1);
        assert!(logs_contain("failed to enumerate module exports"));
    }

    #[test]
    fn get_exports_filters_by_capability() {
        let plugin_module: Arc<dyn Module> = Arc::new(
            BuiltinModule::new("plugin", "2.0.0")
                .export(TypeDescriptor::class("Trakt").with_capability(Capability::Plugin))
                .export(
                    TypeDescriptor::class("Sync")
                        .with_capability(Capability::EntryPoint)
                        .with_capability(Capability::ScheduledTask),
                ),
        );
        let catalog = Catalog::discover(&[server_module(), plugin_module]);

        assert_eq!(catalog.get_exports_of(&Capability::EntryPoint).len(), 2);
        assert_eq!(catalog.get_exports_of(&Capability::Plugin).len(), 1);
        assert_eq!(catalog.get_exports_of(&Capability::ScheduledTask).len(), 1);
        assert!(catalog.get_exports_of(&Capability::ImageProvider).is_empty());
    }

    #[test]
    fn extend_returns_only_new_types() {
        let mut catalog = Catalog::discover(&[server_module()]);
        let added = catalog.extend(&[Arc::new(
            BuiltinModule::new("late", "1.0.0")
                .export(TypeDescriptor::class("LateHook").with_capability(Capability::EntryPoint)),
        ) as Arc<dyn Module>]);

        assert_eq!(added.len(), 1);
        assert_eq!(added[0].name(), "LateHook");
        assert_eq!(added[0].module().name(), "late");
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn empty_module_list_yields_empty_catalog() {
        assert!(Catalog::discover(&[]).is_empty());
    }
}
