// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::any::Any;
use std::sync::Arc;

use super::{Disposable, EntryPoint, Plugin, WebSocketListener};
use crate::types::Capability;

/// Any instance produced by a module factory.
///
/// The `as_*` accessors default to `None`. A type overrides the ones matching
/// the capabilities it declares in its module manifest:
///
/// ```ignore
/// impl Component for StartupScan {
///     fn as_entry_point(self: Arc<Self>) -> Option<Arc<dyn EntryPoint>> {
///         Some(self)
///     }
///     fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
///         self
///     }
/// }
/// ```
pub trait Component: Send + Sync + 'static {
    fn as_plugin(self: Arc<Self>) -> Option<Arc<dyn Plugin>> {
        None
    }

    fn as_entry_point(self: Arc<Self>) -> Option<Arc<dyn EntryPoint>> {
        None
    }

    fn as_disposable(self: Arc<Self>) -> Option<Arc<dyn Disposable>> {
        None
    }

    fn as_websocket_listener(self: Arc<Self>) -> Option<Arc<dyn WebSocketListener>> {
        None
    }

    /// Escape hatch for business contracts the core does not model.
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// A contract that can be queried from the catalog with `get_exports`.
pub trait Export: Send + Sync + 'static {
    /// Capability the catalog is filtered by.
    fn capability() -> Capability;

    /// Narrows a constructed component to this contract.
    fn from_component(component: Arc<dyn Component>) -> Option<Arc<Self>>;
}

impl Export for dyn Plugin {
    fn capability() -> Capability {
        Capability::Plugin
    }

    fn from_component(component: Arc<dyn Component>) -> Option<Arc<Self>> {
        component.as_plugin()
    }
}

impl Export for dyn EntryPoint {
    fn capability() -> Capability {
        Capability::EntryPoint
    }

    fn from_component(component: Arc<dyn Component>) -> Option<Arc<Self>> {
        component.as_entry_point()
    }
}

impl Export for dyn WebSocketListener {
    fn capability() -> Capability {
        Capability::WebSocketListener
    }

    fn from_component(component: Arc<dyn Component>) -> Option<Arc<Self>> {
        component.as_websocket_listener()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::error::LumenError;

    struct Warmup;

    #[async_trait]
    impl EntryPoint for Warmup {
        fn name(&self) -> &str {
            "warmup"
        }

        async fn run(&self) -> Result<(), LumenError> {
            Ok(())
        }
    }

    impl Component for Warmup {
        fn as_entry_point(self: Arc<Self>) -> Option<Arc<dyn EntryPoint>> {
            Some(self)
        }

        fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
            self
        }
    }

    #[test]
    fn export_narrows_only_declared_contracts() {
        let component: Arc<dyn Component> = Arc::new(Warmup);
        let entry = <dyn EntryPoint as Export>::from_component(component.clone());
        assert_eq!(entry.map(|e| e.name().to_string()).as_deref(), Some("warmup"));
        assert!(<dyn Plugin as Export>::from_component(component).is_none());
    }

    #[test]
    fn as_any_downcasts_to_concrete_type() {
        let component: Arc<dyn Component> = Arc::new(Warmup);
        assert!(component.as_any().downcast::<Warmup>().is_ok());
    }
}
