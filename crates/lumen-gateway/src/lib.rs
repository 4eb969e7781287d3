// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transport front door for the Lumen host.
//!
//! One TCP listener carries both plain HTTP request/response traffic and
//! WebSocket connections. A single fallback handler classifies each request,
//! holds request/response traffic behind the readiness gate until the
//! pre-startup phase completes, and dispatches WebSocket frames to every
//! registered listener.

pub mod front_door;
pub mod handlers;
pub mod server;
pub mod ws;

pub use front_door::{
    FrontDoorState, LOADING_MESSAGE, ListenerSource, RequestContext, is_websocket_upgrade,
};
pub use handlers::{ApiState, SystemInfoSource, api_router};
pub use server::{GatewayTransport, ServerConfig, bind, build_router, serve};
