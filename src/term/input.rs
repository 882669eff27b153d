//! Production byte source: the stdin descriptor, read one byte at a time.
//!
//! `poll(2)` provides both the blocking wait and the bounded
//! escape-disambiguation wait; reads are single bytes so no buffered input
//! ever sits between the descriptor and the decoder.

use std::io;
use std::os::unix::io::RawFd;
use std::time::Duration;

use super::key::{read_key, ByteSource, Key, KeyInput};
use super::raw::RawModeGuard;
use super::UiError;

const STDIN_FD: RawFd = libc::STDIN_FILENO;

#[derive(Debug)]
struct TtyInput {
    fd: RawFd,
}

impl TtyInput {
    fn stdin() -> Self {
        TtyInput { fd: STDIN_FD }
    }

    fn read_one(&self) -> io::Result<Option<u8>> {
        let mut byte = 0u8;
        loop {
            let n = unsafe { libc::read(self.fd, (&mut byte as *mut u8).cast(), 1) };
            match n {
                1 => return Ok(Some(byte)),
                0 => return Ok(None),
                _ => {
                    let err = io::Error::last_os_error();
                    if err.kind() != io::ErrorKind::Interrupted {
                        return Err(err);
                    }
                }
            }
        }
    }

    /// Wait for readability. Negative timeout blocks indefinitely.
    fn wait_readable(&self, timeout_ms: i32) -> io::Result<bool> {
        let mut pfd = libc::pollfd {
            fd: self.fd,
            events: libc::POLLIN,
            revents: 0,
        };
        loop {
            let n = unsafe { libc::poll(&mut pfd, 1, timeout_ms) };
            match n {
                0 => return Ok(false),
                n if n > 0 => return Ok(pfd.revents & (libc::POLLIN | libc::POLLHUP) != 0),
                _ => {
                    let err = io::Error::last_os_error();
                    if err.kind() != io::ErrorKind::Interrupted {
                        return Err(err);
                    }
                }
            }
        }
    }
}

impl ByteSource for TtyInput {
    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        self.wait_readable(-1)?;
        self.read_one()
    }

    fn poll_byte(&mut self, timeout: Duration) -> io::Result<Option<u8>> {
        let ms = timeout.as_millis().min(i32::MAX as u128) as i32;
        if !self.wait_readable(ms)? {
            return Ok(None);
        }
        self.read_one()
    }
}

/// Key reader bound to the controlling terminal.
///
/// Raw mode is held only for the duration of each read, so everything the
/// widgets print between keys goes out in cooked mode with normal newline
/// handling.
#[derive(Debug)]
pub struct TtyKeys {
    input: TtyInput,
}

impl TtyKeys {
    pub fn new() -> Self {
        TtyKeys {
            input: TtyInput::stdin(),
        }
    }
}

impl Default for TtyKeys {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyInput for TtyKeys {
    fn read_key(&mut self) -> Result<Key, UiError> {
        let _raw = RawModeGuard::acquire()?;
        read_key(&mut self.input)
    }
}
