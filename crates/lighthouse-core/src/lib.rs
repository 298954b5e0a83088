//! # lighthouse-core
//!
//! Shared library for the lighthouse display client containing the wire
//! protocol envelopes, the MessagePack codec, frame geometry, and the input
//! event vocabulary.
//!
//! This crate has zero dependencies on sockets, async runtimes, or UI
//! frameworks. Everything in here is pure data plus (de)serialization, which
//! keeps it testable without a network and reusable from any transport.
//!
//! The display itself is a 14x28 grid of windows. Each window shows one RGB
//! color, so a full frame is `14 * 28 * 3 = 1176` bytes. The service speaks
//! map-structured MessagePack over a persistent WebSocket: requests carry the
//! keys `REID`/`VERB`/`PATH`/`AUTH`/`META`/`PAYL`, responses carry `RNUM`
//! plus either `REID`+`PAYL` (success) or `RESPONSE` (error text).
//!
//! - **`protocol`** - envelope types and the encode/decode functions.
//! - **`domain`** - frame geometry and decoded input events.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `lighthouse_core::Frame` instead of the full module path.
pub use domain::frame::{Frame, FrameError, COLUMNS, FRAME_LEN, ROWS};
pub use domain::input::{InputEvent, InputEventError, InputKind};
pub use protocol::codec::{
    decode_request, decode_response, encode_request, encode_response, ProtocolError,
};
pub use protocol::envelope::{
    Auth, Request, Response, Verb, FRAME_WRITE_REQUEST_ID, INPUT_STREAM_REQUEST_ID, STATUS_OK,
};
