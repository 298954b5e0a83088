//! Typed request and response envelopes for the display API.
//!
//! Every message on the wire is one MessagePack map. Requests always carry
//! the same six keys; field order is not significant, only presence and type:
//!
//! ```text
//! {
//!   "REID": int,                       // request id
//!   "VERB": "GET" | "PUT" | "STREAM",
//!   "PATH": ["user", <username>, "model"],
//!   "AUTH": {"USER": string, "TOKEN": string},
//!   "META": {},                        // reserved, always empty
//!   "PAYL": bin | nil
//! }
//! ```
//!
//! Responses carry `RNUM` plus either `REID` and `PAYL` on success or a
//! human-readable `RESPONSE` string on error.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_bytes::ByteBuf;

// ── Protocol constants ────────────────────────────────────────────────────────

/// Request id used for every frame write.
pub const FRAME_WRITE_REQUEST_ID: i64 = 0;

/// Request id reserved exclusively for the input-event subscription stream.
/// Responses tagged with it carry decoded hardware input, never frame acks.
pub const INPUT_STREAM_REQUEST_ID: i64 = -1;

/// `RNUM` value of a successful response.
pub const STATUS_OK: i64 = 200;

// ── Request side ──────────────────────────────────────────────────────────────

/// Request verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    Get,
    Put,
    Stream,
}

/// The `AUTH` sub-map carried by every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auth {
    #[serde(rename = "USER")]
    pub user: String,
    #[serde(rename = "TOKEN")]
    pub token: String,
}

/// One outbound request envelope.
///
/// Construct with [`Request::frame_write`] or [`Request::input_stream`]; the
/// field-level constructors exist so tests and future verbs can build
/// envelopes directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(rename = "REID")]
    pub request_id: i64,
    #[serde(rename = "VERB")]
    pub verb: Verb,
    /// Always the fixed 3-element form `["user", <username>, "model"]`.
    #[serde(rename = "PATH")]
    pub path: [String; 3],
    #[serde(rename = "AUTH")]
    pub auth: Auth,
    /// Reserved by the service for future use; always empty today.
    #[serde(rename = "META")]
    pub meta: BTreeMap<String, rmpv::Value>,
    /// Binary payload, or `None` which encodes as MessagePack nil.
    #[serde(rename = "PAYL")]
    pub payload: Option<ByteBuf>,
}

impl Request {
    /// Builds a frame-write request (`REID = 0`, `VERB = PUT`) carrying the
    /// raw frame bytes as a binary payload.
    ///
    /// Length validation of `frame` is the caller's job; the envelope layer
    /// transports whatever it is given.
    pub fn frame_write(username: &str, token: &str, frame: &[u8]) -> Self {
        Self {
            request_id: FRAME_WRITE_REQUEST_ID,
            verb: Verb::Put,
            path: Self::model_path(username),
            auth: Auth {
                user: username.to_owned(),
                token: token.to_owned(),
            },
            meta: BTreeMap::new(),
            payload: Some(ByteBuf::from(frame.to_vec())),
        }
    }

    /// Builds the input-stream subscription request (`REID = -1`,
    /// `VERB = STREAM`, nil payload).
    pub fn input_stream(username: &str, token: &str) -> Self {
        Self {
            request_id: INPUT_STREAM_REQUEST_ID,
            verb: Verb::Stream,
            path: Self::model_path(username),
            auth: Auth {
                user: username.to_owned(),
                token: token.to_owned(),
            },
            meta: BTreeMap::new(),
            payload: None,
        }
    }

    fn model_path(username: &str) -> [String; 3] {
        ["user".to_owned(), username.to_owned(), "model".to_owned()]
    }
}

// ── Response side ─────────────────────────────────────────────────────────────

/// One inbound response envelope, already discriminated by status.
///
/// The service either acknowledges a request (`RNUM = 200`) or reports an
/// error with a message string. Input events arrive as [`Response::Ack`]
/// values tagged with [`INPUT_STREAM_REQUEST_ID`]; their payload is the
/// dynamically-typed event entry (or array of entries).
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Ack {
        request_id: i64,
        payload: rmpv::Value,
    },
    Error {
        status: i64,
        message: String,
    },
}

impl Response {
    /// The `RNUM` value this response was (or would be) tagged with.
    pub fn status(&self) -> i64 {
        match self {
            Response::Ack { .. } => STATUS_OK,
            Response::Error { status, .. } => *status,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_write_request_uses_put_and_reid_zero() {
        let req = Request::frame_write("alice", "API-TOK", &[7u8; 4]);
        assert_eq!(req.request_id, FRAME_WRITE_REQUEST_ID);
        assert_eq!(req.verb, Verb::Put);
        assert_eq!(req.payload.as_ref().map(|b| &b[..]), Some(&[7u8; 4][..]));
    }

    #[test]
    fn test_input_stream_request_uses_stream_and_reid_minus_one() {
        let req = Request::input_stream("alice", "API-TOK");
        assert_eq!(req.request_id, INPUT_STREAM_REQUEST_ID);
        assert_eq!(req.verb, Verb::Stream);
        assert!(req.payload.is_none());
    }

    #[test]
    fn test_path_is_user_username_model() {
        let req = Request::input_stream("bob", "t");
        assert_eq!(req.path, ["user".to_owned(), "bob".to_owned(), "model".to_owned()]);
    }

    #[test]
    fn test_auth_carries_both_credentials() {
        let req = Request::frame_write("bob", "secret", &[]);
        assert_eq!(req.auth.user, "bob");
        assert_eq!(req.auth.token, "secret");
    }

    #[test]
    fn test_meta_starts_empty() {
        let req = Request::frame_write("bob", "secret", &[]);
        assert!(req.meta.is_empty());
    }

    #[test]
    fn test_response_status_of_ack_is_ok() {
        let resp = Response::Ack {
            request_id: 0,
            payload: rmpv::Value::from(1),
        };
        assert_eq!(resp.status(), STATUS_OK);
    }

    #[test]
    fn test_response_status_of_error_is_preserved() {
        let resp = Response::Error {
            status: 401,
            message: "bad token".to_owned(),
        };
        assert_eq!(resp.status(), 401);
    }
}
