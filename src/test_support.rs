//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::VecDeque;
use std::io;

use crate::capture::{CaptureError, KeySource};
use crate::core::key::KeyPress;

/// Replays a fixed list of key presses, then fails like a closed terminal.
pub struct ScriptedKeys {
    keys: VecDeque<KeyPress>,
}

impl ScriptedKeys {
    pub fn new(keys: Vec<KeyPress>) -> Self {
        Self { keys: keys.into() }
    }

    pub fn remaining(&self) -> usize {
        self.keys.len()
    }
}

impl KeySource for ScriptedKeys {
    fn next_key(&mut self) -> Result<KeyPress, CaptureError> {
        self.keys.pop_front().ok_or_else(|| {
            CaptureError::Read(io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted"))
        })
    }
}
