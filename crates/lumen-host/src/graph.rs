// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Declarative registration of the core services.
//!
//! Entries are tagged with a [`Stage`] and evaluated in stage order, stable
//! within a stage. Later stages may resolve anything registered earlier.

use std::fmt;

use lumen_core::{LumenError, ServiceResolver};
use tracing::debug;

/// Registration stages, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Configuration, paths, system id.
    Primitives,
    /// HTTP client, probe client, network locator.
    Network,
    /// Storage-backed repositories. Initialized synchronously on registration.
    Repositories,
    /// Domain managers.
    Managers,
    /// The front door. Always last.
    Transport,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Primitives => "primitives",
            Stage::Network => "network",
            Stage::Repositories => "repositories",
            Stage::Managers => "managers",
            Stage::Transport => "transport",
        };
        f.write_str(name)
    }
}

type Registration = Box<dyn FnOnce(&ServiceResolver) -> Result<(), LumenError> + Send>;

struct Entry {
    stage: Stage,
    name: &'static str,
    register: Registration,
}

/// A registration table evaluated exactly once.
#[derive(Default)]
pub struct ServiceGraph {
    entries: Vec<Entry>,
    evaluated: bool,
}

impl ServiceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<F>(&mut self, stage: Stage, name: &'static str, register: F) -> &mut Self
    where
        F: FnOnce(&ServiceResolver) -> Result<(), LumenError> + Send + 'static,
    {
        self.entries.push(Entry {
            stage,
            name,
            register: Box::new(register),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Runs every registration in stage order.
    ///
    /// Stops at the first failing entry. Returns the `(stage, name)` sequence
    /// that was evaluated.
    pub fn evaluate(
        &mut self,
        resolver: &ServiceResolver,
    ) -> Result<Vec<(Stage, &'static str)>, LumenError> {
        if self.evaluated {
            return Err(LumenError::Internal(
                "service graph has already been evaluated".into(),
            ));
        }
        self.evaluated = true;

        let mut entries = std::mem::take(&mut self.entries);
        entries.sort_by_key(|e| e.stage);

        let mut order = Vec::with_capacity(entries.len());
        for entry in entries {
            debug!(stage = %entry.stage, service = entry.name, "registering");
            (entry.register)(resolver).map_err(|e| {
                tracing::error!(stage = %entry.stage, service = entry.name, error = %e, "registration failed");
                e
            })?;
            order.push((entry.stage, entry.name));
        }
        Ok(order)
    }
}

impl fmt::Debug for ServiceGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.entries.iter().map(|e| (e.stage, e.name)).collect();
        f.debug_struct("ServiceGraph")
            .field("entries", &names)
            .field("evaluated", &self.evaluated)
            .finish()
    }
}
