// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Constructor symbols resolved to factory closures.
//!
//! A factory receives the service resolver and pulls its own dependencies from
//! it, which is how exported types get constructor injection.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use lumen_core::{Component, LumenError, ServiceResolver};
use parking_lot::RwLock;

pub type Factory =
    Arc<dyn Fn(&ServiceResolver) -> Result<Arc<dyn Component>, LumenError> + Send + Sync>;

/// Symbol to factory lookup shared by built-in and plugin modules.
#[derive(Default)]
pub struct FactoryTable {
    factories: RwLock<HashMap<String, Factory>>,
}

impl FactoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` under `symbol`, replacing any earlier entry.
    pub fn register<F>(&self, symbol: impl Into<String>, factory: F)
    where
        F: Fn(&ServiceResolver) -> Result<Arc<dyn Component>, LumenError> + Send + Sync + 'static,
    {
        let symbol = symbol.into();
        if self
            .factories
            .write()
            .insert(symbol.clone(), Arc::new(factory))
            .is_some()
        {
            tracing::debug!(symbol = %symbol, "factory replaced");
        }
    }

    pub fn get(&self, symbol: &str) -> Option<Factory> {
        self.factories.read().get(symbol).cloned()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.factories.read().contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.factories.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.read().is_empty()
    }
}

impl fmt::Debug for FactoryTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut symbols: Vec<String> = self.factories.read().keys().cloned().collect();
        symbols.sort();
        f.debug_struct("FactoryTable")
            .field("symbols", &symbols)
            .finish()
    }
}
