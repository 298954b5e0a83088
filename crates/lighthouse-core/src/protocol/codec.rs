//! MessagePack codec for the display envelopes.
//!
//! Requests serialize straight from [`Request`] with named keys
//! (`rmp_serde::to_vec_named`), so the map on the wire carries the literal
//! `REID`/`VERB`/... strings the service expects. Responses decode through an
//! intermediate raw struct first because the envelope shape is discriminated
//! by `RNUM`: a success carries `REID` and `PAYL`, an error carries
//! `RESPONSE`.
//!
//! Every decode failure is a [`ProtocolError`]. Callers on a live connection
//! must treat it as "drop this one message": the offending bytes are
//! discarded and the connection stays up.

use rmpv::Value;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::envelope::{Request, Response, STATUS_OK};

/// Errors that can occur while encoding or decoding an envelope.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The bytes are not a MessagePack map of the expected shape, or a
    /// present key has the wrong type.
    #[error("malformed envelope: {0}")]
    Malformed(#[from] rmp_serde::decode::Error),

    /// A key required for this envelope kind is absent.
    #[error("envelope is missing required key {0}")]
    MissingKey(&'static str),

    /// Serialization failed. Does not happen for envelopes built through the
    /// [`Request`] constructors; kept so encode surfaces a typed error.
    #[error("envelope encoding failed: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes a request envelope into MessagePack bytes.
///
/// # Errors
///
/// Returns [`ProtocolError::Encode`] if serialization fails.
pub fn encode_request(request: &Request) -> Result<Vec<u8>, ProtocolError> {
    Ok(rmp_serde::to_vec_named(request)?)
}

/// Decodes a request envelope from MessagePack bytes.
///
/// Used by tests and server-side harnesses; the client itself only ever
/// encodes requests.
///
/// # Errors
///
/// Returns [`ProtocolError::Malformed`] if any of the six request keys is
/// missing or has the wrong type.
pub fn decode_request(bytes: &[u8]) -> Result<Request, ProtocolError> {
    Ok(rmp_serde::from_slice(bytes)?)
}

/// Encodes a response envelope into MessagePack bytes.
///
/// # Errors
///
/// Returns [`ProtocolError::Encode`] if serialization fails.
pub fn encode_response(response: &Response) -> Result<Vec<u8>, ProtocolError> {
    Ok(rmp_serde::to_vec_named(&RawResponse::from(response))?)
}

/// Decodes a response envelope from MessagePack bytes.
///
/// A success (`RNUM = 200`) must carry `REID` and `PAYL`; an error must carry
/// `RESPONSE`. A `RESPONSE` value that is present but not a string degrades
/// to an empty message instead of failing the decode.
///
/// # Errors
///
/// Returns [`ProtocolError`] if `RNUM` is absent, a present key has the wrong
/// type, or a key required for the discriminated kind is missing.
pub fn decode_response(bytes: &[u8]) -> Result<Response, ProtocolError> {
    let raw: RawResponse = rmp_serde::from_slice(bytes)?;
    if raw.status == STATUS_OK {
        let request_id = raw.request_id.ok_or(ProtocolError::MissingKey("REID"))?;
        let payload = raw.payload.ok_or(ProtocolError::MissingKey("PAYL"))?;
        Ok(Response::Ack {
            request_id,
            payload,
        })
    } else {
        let message = match raw.message {
            Some(Value::String(text)) => text.into_str().unwrap_or_default(),
            Some(_) => String::new(),
            None => return Err(ProtocolError::MissingKey("RESPONSE")),
        };
        Ok(Response::Error {
            status: raw.status,
            message,
        })
    }
}

// ── Raw wire form ─────────────────────────────────────────────────────────────

/// Undiscriminated response map as it appears on the wire.
#[derive(Debug, Serialize, Deserialize)]
struct RawResponse {
    #[serde(rename = "RNUM")]
    status: i64,
    #[serde(rename = "REID", default, skip_serializing_if = "Option::is_none")]
    request_id: Option<i64>,
    #[serde(rename = "PAYL", default, skip_serializing_if = "Option::is_none")]
    payload: Option<Value>,
    #[serde(rename = "RESPONSE", default, skip_serializing_if = "Option::is_none")]
    message: Option<Value>,
}

impl From<&Response> for RawResponse {
    fn from(response: &Response) -> Self {
        match response {
            Response::Ack {
                request_id,
                payload,
            } => RawResponse {
                status: STATUS_OK,
                request_id: Some(*request_id),
                payload: Some(payload.clone()),
                message: None,
            },
            Response::Error { status, message } => RawResponse {
                status: *status,
                request_id: None,
                payload: None,
                message: Some(Value::from(message.as_str())),
            },
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
