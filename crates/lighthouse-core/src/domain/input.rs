//! Decoded hardware input events from the display site.
//!
//! The service streams input from the physical controllers and keyboards
//! attached to the installation. Each event arrives as one MessagePack map
//! entry inside a response tagged with the input-stream request id:
//!
//! ```text
//! {"src": int, "dwn": bool, "key": int}   keyboard
//! {"src": int, "dwn": bool, "btn": int}   controller
//! ```
//!
//! The two kinds are distinguished purely by which button key is present; a
//! `key` field wins when both appear.

use rmpv::Value;
use thiserror::Error;

/// Which class of physical device produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Keyboard,
    Controller,
}

/// One decoded button or key transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputEvent {
    /// Identifies the physical device the event came from.
    pub source: i64,
    /// Key code (keyboard) or button number (controller).
    pub button: i64,
    /// True on press, false on release.
    pub pressed: bool,
    pub kind: InputKind,
}

/// Errors produced while mapping a payload entry to an [`InputEvent`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputEventError {
    #[error("input event entry is not a map")]
    NotAMap,
    #[error("input event entry is missing key {0:?}")]
    MissingKey(&'static str),
    #[error("input event entry has a non-{expected} value for key {key:?}")]
    WrongType {
        key: &'static str,
        expected: &'static str,
    },
}

impl InputEvent {
    /// Decodes one payload entry.
    ///
    /// # Errors
    ///
    /// Returns [`InputEventError`] when the entry is not a map, lacks
    /// `src`/`dwn`, lacks both `key` and `btn`, or carries a wrong-typed
    /// value for any of them. Callers drop the message and keep the
    /// connection alive.
    pub fn from_entry(entry: &Value) -> Result<Self, InputEventError> {
        let map = entry.as_map().ok_or(InputEventError::NotAMap)?;

        let source = int_value(map, "src")?;
        let pressed = bool_value(map, "dwn")?;

        if let Some(value) = lookup(map, "key") {
            return Ok(Self {
                source,
                button: as_int(value, "key")?,
                pressed,
                kind: InputKind::Keyboard,
            });
        }
        let button = match lookup(map, "btn") {
            Some(value) => as_int(value, "btn")?,
            None => return Err(InputEventError::MissingKey("btn")),
        };
        Ok(Self {
            source,
            button,
            pressed,
            kind: InputKind::Controller,
        })
    }
}

// ── Map helpers ───────────────────────────────────────────────────────────────

fn lookup<'a>(map: &'a [(Value, Value)], key: &str) -> Option<&'a Value> {
    map.iter()
        .find(|(k, _)| k.as_str() == Some(key))
        .map(|(_, v)| v)
}

fn int_value(map: &[(Value, Value)], key: &'static str) -> Result<i64, InputEventError> {
    let value = lookup(map, key).ok_or(InputEventError::MissingKey(key))?;
    as_int(value, key)
}

fn as_int(value: &Value, key: &'static str) -> Result<i64, InputEventError> {
    value.as_i64().ok_or(InputEventError::WrongType {
        key,
        expected: "integer",
    })
}

fn bool_value(map: &[(Value, Value)], key: &'static str) -> Result<bool, InputEventError> {
    let value = lookup(map, key).ok_or(InputEventError::MissingKey(key))?;
    value.as_bool().ok_or(InputEventError::WrongType {
        key,
        expected: "boolean",
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
