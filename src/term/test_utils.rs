//! Scriptable input sources for driving widgets without a terminal.

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use super::key::{ByteSource, Key, KeyInput};
use super::UiError;

/// Replays a fixed byte stream through the decoder. `poll_byte` returns the
/// next byte immediately while any remain and reports an elapsed window once
/// the queue is empty, which models a bare Escape press at end of script.
#[derive(Debug)]
pub struct ScriptedBytes {
    queue: VecDeque<u8>,
}

impl ScriptedBytes {
    pub fn new(bytes: &[u8]) -> Self {
        ScriptedBytes {
            queue: bytes.iter().copied().collect(),
        }
    }
}

impl ByteSource for ScriptedBytes {
    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(self.queue.pop_front())
    }

    fn poll_byte(&mut self, _timeout: Duration) -> io::Result<Option<u8>> {
        Ok(self.queue.pop_front())
    }
}

/// Replays a fixed sequence of already-decoded keys. Running past the end
/// yields Esc so a buggy widget loop terminates instead of spinning.
#[derive(Debug)]
pub struct ScriptedKeys {
    queue: VecDeque<Key>,
    interrupt_at_end: bool,
}

impl ScriptedKeys {
    pub fn new(keys: &[Key]) -> Self {
        ScriptedKeys {
            queue: keys.iter().copied().collect(),
            interrupt_at_end: false,
        }
    }

    /// After the scripted keys run out, report Ctrl-C instead of Esc.
    pub fn then_interrupt(keys: &[Key]) -> Self {
        ScriptedKeys {
            queue: keys.iter().copied().collect(),
            interrupt_at_end: true,
        }
    }
}

impl KeyInput for ScriptedKeys {
    fn read_key(&mut self) -> Result<Key, UiError> {
        match self.queue.pop_front() {
            Some(key) => Ok(key),
            None if self.interrupt_at_end => Err(UiError::Interrupted),
            None => Ok(Key::Esc),
        }
    }
}
