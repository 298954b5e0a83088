//! Input event hub: listener registration and dispatch.
//!
//! The read loop hands every input-stream payload to the hub. One payload is
//! either an array of event entries or a single entry; each entry becomes one
//! [`InputEvent`] delivered to every registered listener.
//!
//! Dispatch runs synchronously on the connection's delivery task, so listener
//! callbacks must not block for long - a slow listener delays every
//! subsequent inbound message on that connection.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use lighthouse_core::{InputEvent, InputKind};
use rmpv::Value;
use tracing::{error, warn};

/// Receiver of decoded hardware input events.
///
/// Implementations must be `Send + Sync`; callbacks run on the connection's
/// delivery task. A panicking callback is caught and logged without
/// preventing delivery to the remaining listeners.
pub trait InputListener: Send + Sync {
    fn on_keyboard_event(&self, source: i64, button: i64, pressed: bool);
    fn on_controller_event(&self, source: i64, button: i64, pressed: bool);
}

/// The per-connection listener set.
#[derive(Default)]
pub(crate) struct InputHub {
    listeners: Mutex<Vec<Arc<dyn InputListener>>>,
}

impl InputHub {
    pub(crate) fn add(&self, listener: Arc<dyn InputListener>) {
        self.listeners.lock().unwrap().push(listener);
    }

    /// Removes a listener by `Arc` identity.
    pub(crate) fn remove(&self, listener: &Arc<dyn InputListener>) {
        self.listeners
            .lock()
            .unwrap()
            .retain(|registered| !Arc::ptr_eq(registered, listener));
    }

    /// Decodes and delivers one input-stream payload.
    ///
    /// A malformed entry drops the remainder of the payload with a warning;
    /// the connection stays alive either way.
    pub(crate) fn dispatch_payload(&self, payload: &Value) {
        let entries: &[Value] = match payload {
            Value::Array(items) => items,
            single => std::slice::from_ref(single),
        };
        // Dispatch over a snapshot so a callback may add or remove listeners
        // without invalidating the iteration.
        let listeners = self.listeners.lock().unwrap().clone();
        for entry in entries {
            let event = match InputEvent::from_entry(entry) {
                Ok(event) => event,
                Err(e) => {
                    warn!("dropping input message: {e}");
                    return;
                }
            };
            for listener in &listeners {
                deliver(listener.as_ref(), &event);
            }
        }
    }
}

fn deliver(listener: &dyn InputListener, event: &InputEvent) {
    let call = || match event.kind {
        InputKind::Keyboard => {
            listener.on_keyboard_event(event.source, event.button, event.pressed)
        }
        InputKind::Controller => {
            listener.on_controller_event(event.source, event.button, event.pressed)
        }
    };
    if catch_unwind(AssertUnwindSafe(call)).is_err() {
        error!("input listener panicked; continuing with the remaining listeners");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingListener {
        keyboard: Mutex<Vec<(i64, i64, bool)>>,
        controller: Mutex<Vec<(i64, i64, bool)>>,
    }

    impl RecordingListener {
        fn keyboard_events(&self) -> Vec<(i64, i64, bool)> {
            self.keyboard.lock().unwrap().clone()
        }

        fn controller_events(&self) -> Vec<(i64, i64, bool)> {
            self.controller.lock().unwrap().clone()
        }
    }

    impl InputListener for RecordingListener {
        fn on_keyboard_event(&self, source: i64, button: i64, pressed: bool) {
            self.keyboard.lock().unwrap().push((source, button, pressed));
        }

        fn on_controller_event(&self, source: i64, button: i64, pressed: bool) {
            self.controller.lock().unwrap().push((source, button, pressed));
        }
    }

    struct PanickingListener;

    impl InputListener for PanickingListener {
        fn on_keyboard_event(&self, _: i64, _: i64, _: bool) {
            panic!("listener failure");
        }

        fn on_controller_event(&self, _: i64, _: i64, _: bool) {
            panic!("listener failure");
        }
    }

    fn controller_entry(src: i64, btn: i64, dwn: bool) -> Value {
        Value::Map(vec![
            (Value::from("src"), Value::from(src)),
            (Value::from("btn"), Value::from(btn)),
            (Value::from("dwn"), Value::from(dwn)),
        ])
    }

    fn keyboard_entry(src: i64, key: i64, dwn: bool) -> Value {
        Value::Map(vec![
            (Value::from("src"), Value::from(src)),
            (Value::from("key"), Value::from(key)),
            (Value::from("dwn"), Value::from(dwn)),
        ])
    }

    #[test]
    fn test_array_payload_dispatches_one_controller_event() {
        let hub = InputHub::default();
        let recorder = Arc::new(RecordingListener::default());
        hub.add(recorder.clone());

        hub.dispatch_payload(&Value::Array(vec![controller_entry(1, 5, true)]));

        assert_eq!(recorder.controller_events(), vec![(1, 5, true)]);
        assert!(recorder.keyboard_events().is_empty());
    }

    #[test]
    fn test_single_map_payload_dispatches_one_keyboard_event() {
        let hub = InputHub::default();
        let recorder = Arc::new(RecordingListener::default());
        hub.add(recorder.clone());

        hub.dispatch_payload(&keyboard_entry(2, 9, false));

        assert_eq!(recorder.keyboard_events(), vec![(2, 9, false)]);
        assert!(recorder.controller_events().is_empty());
    }

    #[test]
    fn test_every_listener_receives_every_event() {
        let hub = InputHub::default();
        let first = Arc::new(RecordingListener::default());
        let second = Arc::new(RecordingListener::default());
        hub.add(first.clone());
        hub.add(second.clone());

        hub.dispatch_payload(&Value::Array(vec![
            controller_entry(1, 2, true),
            controller_entry(1, 2, false),
        ]));

        assert_eq!(first.controller_events(), vec![(1, 2, true), (1, 2, false)]);
        assert_eq!(second.controller_events(), vec![(1, 2, true), (1, 2, false)]);
    }

    #[test]
    fn test_panicking_listener_does_not_block_the_others() {
        let hub = InputHub::default();
        let recorder = Arc::new(RecordingListener::default());
        // Registered first so the panic happens before the recorder's turn.
        hub.add(Arc::new(PanickingListener));
        hub.add(recorder.clone());

        hub.dispatch_payload(&controller_entry(3, 1, true));

        assert_eq!(recorder.controller_events(), vec![(3, 1, true)]);
    }

    #[test]
    fn test_removed_listener_receives_nothing() {
        let hub = InputHub::default();
        let recorder = Arc::new(RecordingListener::default());
        let listener: Arc<dyn InputListener> = recorder.clone();
        hub.add(listener.clone());
        hub.remove(&listener);

        hub.dispatch_payload(&controller_entry(1, 1, true));

        assert!(recorder.controller_events().is_empty());
    }

    #[test]
    fn test_malformed_entry_drops_the_rest_of_the_message() {
        let hub = InputHub::default();
        let recorder = Arc::new(RecordingListener::default());
        hub.add(recorder.clone());

        hub.dispatch_payload(&Value::Array(vec![
            controller_entry(1, 1, true),
            Value::from("not an event"),
            controller_entry(2, 2, true),
        ]));

        // The entry before the malformed one was already delivered.
        assert_eq!(recorder.controller_events(), vec![(1, 1, true)]);
    }

    #[test]
    fn test_non_map_payload_dispatches_nothing() {
        let hub = InputHub::default();
        let recorder = Arc::new(RecordingListener::default());
        hub.add(recorder.clone());

        hub.dispatch_payload(&Value::from(7));

        assert!(recorder.controller_events().is_empty());
        assert!(recorder.keyboard_events().is_empty());
    }
}
