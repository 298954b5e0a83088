//! Protocol module containing the envelope types and the MessagePack codec.

pub mod codec;
pub mod envelope;

pub use codec::{decode_request, decode_response, encode_request, encode_response, ProtocolError};
pub use envelope::*;
