//! Integration tests for the lighthouse-core protocol codec.
//!
//! These tests verify complete round-trip encoding and decoding of both
//! envelope kinds through the public API, exercising the envelope types, the
//! codec, and the input-event decoding together the way the client does.

use lighthouse_core::{
    decode_request, decode_response, encode_request, encode_response, Frame, InputEvent,
    InputKind, Request, Response, Verb, FRAME_LEN, INPUT_STREAM_REQUEST_ID,
};
use rmpv::Value;

/// Encodes a request and decodes it back, asserting equality.
fn roundtrip_request(request: Request) -> Request {
    let bytes = encode_request(&request).expect("encode must succeed");
    decode_request(&bytes).expect("decode must succeed")
}

/// Encodes a response and decodes it back, asserting equality.
fn roundtrip_response(response: Response) -> Response {
    let bytes = encode_response(&response).expect("encode must succeed");
    decode_response(&bytes).expect("decode must succeed")
}

#[test]
fn test_roundtrip_full_frame_write() {
    let mut frame = Frame::new();
    frame.set_window(0, 0, (255, 0, 0)).unwrap();
    frame.set_window(13, 27, (0, 0, 255)).unwrap();

    let original = Request::frame_write("integration-user", "integration-token", frame.as_bytes());
    let decoded = roundtrip_request(original.clone());

    assert_eq!(original, decoded);
    assert_eq!(decoded.verb, Verb::Put);
    assert_eq!(decoded.payload.as_ref().map(|p| p.len()), Some(FRAME_LEN));
}

#[test]
fn test_roundtrip_input_stream_subscription() {
    let original = Request::input_stream("integration-user", "integration-token");
    let decoded = roundtrip_request(original.clone());

    assert_eq!(original, decoded);
    assert_eq!(decoded.request_id, INPUT_STREAM_REQUEST_ID);
    assert!(decoded.payload.is_none());
}

#[test]
fn test_roundtrip_ack_with_event_array_payload() {
    let original = Response::Ack {
        request_id: INPUT_STREAM_REQUEST_ID,
        payload: Value::Array(vec![
            Value::Map(vec![
                (Value::from("src"), Value::from(1)),
                (Value::from("btn"), Value::from(5)),
                (Value::from("dwn"), Value::from(true)),
            ]),
            Value::Map(vec![
                (Value::from("src"), Value::from(2)),
                (Value::from("key"), Value::from(9)),
                (Value::from("dwn"), Value::from(false)),
            ]),
        ]),
    };

    assert_eq!(original, roundtrip_response(original.clone()));
}

#[test]
fn test_roundtrip_error_response() {
    let original = Response::Error {
        status: 403,
        message: "user is not allowed to stream".to_owned(),
    };

    assert_eq!(original, roundtrip_response(original.clone()));
}

#[test]
fn test_decoded_event_payload_parses_into_input_events() {
    // The full inbound path: wire bytes -> response -> event entries.
    let bytes = encode_response(&Response::Ack {
        request_id: INPUT_STREAM_REQUEST_ID,
        payload: Value::Array(vec![Value::Map(vec![
            (Value::from("src"), Value::from(4)),
            (Value::from("key"), Value::from(37)),
            (Value::from("dwn"), Value::from(true)),
        ])]),
    })
    .unwrap();

    let Response::Ack { payload, .. } = decode_response(&bytes).unwrap() else {
        panic!("expected an ack");
    };
    let entries = payload.as_array().expect("payload must be an array");
    let events: Vec<_> = entries
        .iter()
        .map(|e| InputEvent::from_entry(e).unwrap())
        .collect();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, InputKind::Keyboard);
    assert_eq!((events[0].source, events[0].button, events[0].pressed), (4, 37, true));
}

#[test]
fn test_request_bytes_are_not_valid_response_bytes() {
    // A request map has no RNUM key, so the response decoder must reject it
    // rather than fabricate an envelope.
    let bytes = encode_request(&Request::input_stream("user", "token")).unwrap();
    assert!(decode_response(&bytes).is_err());
}
