//! Frame geometry for the display.
//!
//! The display is a grid of 14 rows by 28 columns. Every window shows one
//! RGB color, three bytes per window, row-major from the top-left corner:
//!
//! ```text
//! offset of red byte, 2x2 example:
//! 0 3
//! 6 9
//! ```
//!
//! A full frame is therefore exactly 1176 bytes. The connection layer rejects
//! any other length before touching the transport.

use std::fmt;

use thiserror::Error;

/// Number of window rows on the display.
pub const ROWS: usize = 14;

/// Number of windows per row.
pub const COLUMNS: usize = 28;

/// Bytes per window (R, G, B).
pub const CHANNELS: usize = 3;

/// Exact byte length of one full frame: `14 * 28 * 3 = 1176`.
pub const FRAME_LEN: usize = ROWS * COLUMNS * CHANNELS;

/// Errors produced by [`Frame`] constructors and accessors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame data must be exactly {FRAME_LEN} bytes, got {0}")]
    BadLength(usize),
    #[error("window ({row}, {column}) is outside the {ROWS}x{COLUMNS} grid")]
    OutOfBounds { row: usize, column: usize },
}

/// One full frame worth of pixel data.
///
/// The raw-byte API on the connection accepts any `&[u8]` of the right
/// length; `Frame` is the typed way to build such a buffer window by window.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
}

impl Frame {
    /// Creates an all-black frame.
    pub fn new() -> Self {
        Self {
            data: vec![0; FRAME_LEN],
        }
    }

    /// Creates a frame with every window set to the same color.
    pub fn filled(rgb: (u8, u8, u8)) -> Self {
        let mut frame = Self::new();
        frame.fill(rgb);
        frame
    }

    /// Adopts an existing byte buffer as a frame.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::BadLength`] if `bytes` is not exactly
    /// [`FRAME_LEN`] bytes long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() != FRAME_LEN {
            return Err(FrameError::BadLength(bytes.len()));
        }
        Ok(Self {
            data: bytes.to_vec(),
        })
    }

    /// Sets every window to the same color.
    pub fn fill(&mut self, (r, g, b): (u8, u8, u8)) {
        for window in self.data.chunks_exact_mut(CHANNELS) {
            window[0] = r;
            window[1] = g;
            window[2] = b;
        }
    }

    /// Sets the color of a single window.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::OutOfBounds`] if the coordinates are off-grid.
    pub fn set_window(
        &mut self,
        row: usize,
        column: usize,
        (r, g, b): (u8, u8, u8),
    ) -> Result<(), FrameError> {
        let offset = Self::offset(row, column)?;
        self.data[offset] = r;
        self.data[offset + 1] = g;
        self.data[offset + 2] = b;
        Ok(())
    }

    /// Reads the color of a single window.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::OutOfBounds`] if the coordinates are off-grid.
    pub fn window(&self, row: usize, column: usize) -> Result<(u8, u8, u8), FrameError> {
        let offset = Self::offset(row, column)?;
        Ok((
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
        ))
    }

    /// The frame as raw wire bytes; always exactly [`FRAME_LEN`] long.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the frame, yielding the raw byte buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    fn offset(row: usize, column: usize) -> Result<usize, FrameError> {
        if row >= ROWS || column >= COLUMNS {
            return Err(FrameError::OutOfBounds { row, column });
        }
        Ok((row * COLUMNS + column) * CHANNELS)
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 1176 raw bytes are not useful in test output; show the shape only.
        write!(f, "Frame({ROWS}x{COLUMNS} windows, {FRAME_LEN} bytes)")
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
