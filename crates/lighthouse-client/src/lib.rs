//! # lighthouse-client
//!
//! Client for a 14x28 pixel display reachable over a persistent WebSocket.
//! The library owns the whole connection lifecycle so callers only deal with
//! frames and input events:
//!
//! - [`DisplayRegistry`] hands out one live [`Connection`] per destination
//!   and starts the asynchronous connect.
//! - [`Connection::send_frame`] validates and transmits 1176-byte frames,
//!   fire-and-forget past validation.
//! - A per-connection keep-alive task resends the last frame every two
//!   seconds of caller silence so the display does not blank out.
//! - [`Connection::enable_key_inputs`] subscribes to the hardware input
//!   stream; decoded events fan out to registered [`InputListener`]s.
//!
//! # Lifecycle
//!
//! Connection establishment is asynchronous: `acquire` returns immediately
//! while the handshake is in flight. There is no blocking wait primitive;
//! callers poll [`Connection::is_connected`] or simply rely on the deferred
//! semantics (an input subscription requested early is sent on connect, a
//! frame sent early is stored). A closed or dropped connection never
//! reconnects; acquire the destination again for a fresh one.
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use lighthouse_client::{ConnectOptions, DisplayRegistry};
//! use lighthouse_core::Frame;
//!
//! # async fn example() -> Result<(), lighthouse_client::ClientError> {
//! let registry = DisplayRegistry::new();
//! let connection = registry.acquire("wss://display.example/websocket", ConnectOptions::default());
//! connection.set_username("alice")?;
//! connection.set_token("API-TOK-...")?;
//!
//! while !connection.is_connected() {
//!     tokio::time::sleep(Duration::from_millis(50)).await;
//! }
//! connection.send_frame(Frame::filled((255, 64, 0)).as_bytes()).await?;
//! connection.close().await;
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod error;
pub mod hub;
mod keepalive;
pub mod registry;

pub use connection::{ConnectOptions, Connection};
pub use error::ClientError;
pub use hub::InputListener;
pub use registry::{DisplayRegistry, DEFAULT_DESTINATION};
