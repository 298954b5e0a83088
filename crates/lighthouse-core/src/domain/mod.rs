//! Domain types with no I/O dependencies: frame geometry and decoded input
//! events.

pub mod frame;
pub mod input;

pub use frame::{Frame, FrameError, COLUMNS, FRAME_LEN, ROWS};
pub use input::{InputEvent, InputEventError, InputKind};
