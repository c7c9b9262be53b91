//! # notify-gateway
//!
//! In-process notification broker with bounded history and a WebSocket
//! gateway that fans notifications out to connected clients, optionally
//! scoped to named rooms.
//!
//! Domain services publish through [`service::NotificationBroker`]
//! (`push`, `broadcast`) and read back through `history`. The
//! [`gateway::TransportGateway`] subscribes once to the broker and routes
//! every notification through a [`transport::Transport`] to clients.
//!
//! ## Architecture
//!
//! ```text
//! Producers (domain services, REST api/)
//!     │
//!     ├── NotificationBroker (service/)
//!     │       ├── NotificationStore → MemoryHistory (store/)
//!     │       └── subscribers (fan-out, isolated)
//!     │
//!     ├── TransportGateway (gateway)
//!     │       └── WebSocketTransport: connections + RoomRegistry (transport/)
//!     │
//!     └── WS connection loops (ws/)
//!             │
//! Clients (WebSocket)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod server;
pub mod service;
pub mod store;
pub mod transport;
pub mod ws;
