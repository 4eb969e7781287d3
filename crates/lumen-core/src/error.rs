// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Lumen host.

use std::path::PathBuf;

use thiserror::Error;

/// The primary error type used across the composition root, plugin pipeline,
/// and network location services.
#[derive(Debug, Error)]
pub enum LumenError {
    /// Configuration errors (invalid values, unreadable files).
    #[error("configuration error: {0}")]
    Config(String),

    /// A module could not be read from disk.
    #[error("failed to load module {path}: {reason}")]
    ModuleLoad { path: PathBuf, reason: String },

    /// A module was readable but enumerating its exported types failed.
    #[error("type discovery failed for module {module}: {reason}")]
    Discovery { module: String, reason: String },

    /// `resolve` was called for a contract that nothing registered.
    #[error("service not registered: {type_name}")]
    NotRegistered { type_name: &'static str },

    /// A second registration was attempted for a singleton contract.
    #[error("service already registered: {type_name}")]
    AlreadyRegistered { type_name: &'static str },

    /// An extension type failed to instantiate.
    #[error("failed to construct {type_name}: {message}")]
    Construction { type_name: String, message: String },

    /// Plugin identity or metadata could not be assigned.
    #[error("plugin error: {message}")]
    Plugin {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Network I/O failures (connect, request, unexpected response).
    #[error("network error: {message}")]
    Network {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The remote end answered with a temporary placeholder (HTTP 503).
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// The caller cancelled the operation.
    #[error("operation cancelled")]
    Cancelled,

    /// Certificate lookup or parsing failures.
    #[error("certificate error: {0}")]
    Certificate(String),

    /// Repository initialization or disk errors.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A restart was requested on a host that cannot restart itself.
    #[error("restart not supported: {0}")]
    RestartUnsupported(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LumenError {
    /// Shorthand for a [`LumenError::Network`] without an underlying source.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            source: None,
        }
    }

    /// Whether this error is a cancellation that must reach the caller.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<std::io::Error> for LumenError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage {
            source: Box::new(err),
        }
    }
}
