//! WebSocket layer: upgrade handler, connection loop, wire events.
//!
//! The WebSocket endpoint at `/ws` streams `notification` events to the
//! client and accepts `join-room` / `leave-room` commands.

pub mod connection;
pub mod handler;
pub mod messages;
