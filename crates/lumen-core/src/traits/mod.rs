// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contracts implemented by exported types.
//!
//! Every instance the composition root constructs is a [`Component`]. A
//! component exposes the capability contracts it implements through the
//! `as_*` accessors, which lets the host query exports by capability without
//! runtime reflection.

pub mod component;
pub mod disposable;
pub mod entry_point;
pub mod plugin;
pub mod transport;
pub mod websocket;

pub use component::{Component, Export};
pub use disposable::Disposable;
pub use entry_point::EntryPoint;
pub use plugin::Plugin;
pub use transport::BoundTransport;
pub use websocket::{WebSocketListener, WebSocketMessage};
