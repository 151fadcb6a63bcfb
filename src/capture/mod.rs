//! # Keyboard Capture
//!
//! The crossterm-specific layer. Claims the terminal in raw mode, turns key
//! events into [`KeyPress`] values and drives the counting loop.
//!
//! The loop itself only talks to the [`KeySource`] trait, so it can be fed a
//! scripted sequence of keys in tests.
//!
//! ```text
//! KeySource::next_key() ──► ESC?     ──► LoopExit::ExitKey
//!                       ├─► CTRL+C?  ──► LoopExit::Interrupted
//!                       ├─► no id?   ──► skip
//!                       └─► Tally::increment ──► Saver::after_increment
//! ```

mod event;

pub use event::key_press;

use log::{debug, info};
use std::fmt;
use std::io;

use crossterm::terminal;

use crate::core::key::KeyPress;
use crate::core::saver::Saver;

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum CaptureError {
    /// The terminal could not be put into raw mode.
    Open(io::Error),
    /// Reading the next event failed.
    Read(io::Error),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::Open(e) => write!(f, "failed to open keyboard capture: {e}"),
            CaptureError::Read(e) => write!(f, "failed to read key event: {e}"),
        }
    }
}

impl std::error::Error for CaptureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CaptureError::Open(e) | CaptureError::Read(e) => Some(e),
        }
    }
}

impl From<CaptureError> for io::Error {
    fn from(e: CaptureError) -> Self {
        match e {
            CaptureError::Open(inner) | CaptureError::Read(inner) => inner,
        }
    }
}

// ============================================================================
// Key Source
// ============================================================================

/// Anything that can block until the next key press.
pub trait KeySource {
    fn next_key(&mut self) -> Result<KeyPress, CaptureError>;
}

/// A raw-mode terminal session. Restores the terminal when dropped.
pub struct CaptureSession {
    _private: (),
}

impl CaptureSession {
    pub fn open() -> Result<Self, CaptureError> {
        terminal::enable_raw_mode().map_err(CaptureError::Open)?;
        info!("Keyboard capture opened (raw mode)");
        Ok(Self { _private: () })
    }

    /// Explicit close. Dropping the session does the same.
    pub fn close(self) {}
}

impl KeySource for CaptureSession {
    fn next_key(&mut self) -> Result<KeyPress, CaptureError> {
        loop {
            let event = crossterm::event::read().map_err(CaptureError::Read)?;
            if let Some(key) = key_press(event) {
                return Ok(key);
            }
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        restore_terminal();
        info!("Keyboard capture closed");
    }
}

/// Leaves raw mode. Safe to call when raw mode isn't active.
///
/// The signal path exits the process while the capture thread is still
/// blocked in `read()`, so it can't rely on `CaptureSession`'s drop.
pub fn restore_terminal() {
    let _ = terminal::disable_raw_mode();
}

// ============================================================================
// Capture Loop
// ============================================================================

/// Why the capture loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The exit key (ESC) was pressed.
    ExitKey,
    /// Ctrl+C arrived as a key press.
    Interrupted,
}

/// Counts key presses from `source` until the exit key, an interrupt, or a
/// read error. The exit key itself is never counted or saved.
pub fn run_capture_loop<S: KeySource>(
    source: &mut S,
    saver: &Saver,
    fold_case: bool,
) -> Result<LoopExit, CaptureError> {
    loop {
        let key = source.next_key()?;
        if key.is_exit() {
            debug!("Exit key pressed");
            return Ok(LoopExit::ExitKey);
        }
        if key.is_interrupt() {
            debug!("Interrupt key pressed");
            return Ok(LoopExit::Interrupted);
        }

        let identifier = if fold_case {
            key.folded_identifier()
        } else {
            key.identifier()
        };
        let Some(identifier) = identifier else {
            continue;
        };

        saver.tally().increment(&identifier);
        saver.after_increment();
    }
}
