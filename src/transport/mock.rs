//! Scripted transport for testing drivers without hardware.
//!
//! [`MockTransport`] plays back a fixed stream of device output lines and
//! records everything the driver writes. Tests then compare the recorded
//! command lines against the expected wire traffic.
//!
//! # Example
//!
//! ```
//! use benchwire::MockTransport;
//! use std::io::Write;
//!
//! let mut mock = MockTransport::new(&[":r1a330"]);
//! mock.write_all(b":r1a\n").unwrap();
//! assert_eq!(mock.written_lines(), vec![":r1a"]);
//! ```

use std::io::{Cursor, Read, Write};

use crate::session::DEFAULT_TERMINATOR;

/// A [`Transport`](super::Transport) backed by in-memory buffers.
///
/// The device output is fixed up front, not matched against requests, so
/// unread lines simply stay in the buffer. Reading past the end returns
/// end-of-stream, which a session reports as a closed connection.
#[derive(Debug)]
pub struct MockTransport {
    /// Device output still to be read.
    output: Cursor<Vec<u8>>,
    /// Everything the driver wrote.
    written: Vec<u8>,
    terminator: String,
}

impl MockTransport {
    /// Create a mock whose device output is `replies`, each followed by `"\n"`.
    pub fn new(replies: &[&str]) -> Self {
        Self::with_terminator(replies, DEFAULT_TERMINATOR)
    }

    /// Create a mock framing each reply line with `terminator`.
    pub fn with_terminator(replies: &[&str], terminator: &str) -> Self {
        let mut output = Vec::new();
        for reply in replies {
            output.extend_from_slice(reply.as_bytes());
            output.extend_from_slice(terminator.as_bytes());
        }
        Self {
            output: Cursor::new(output),
            written: Vec::new(),
            terminator: terminator.to_string(),
        }
    }

    /// All bytes written so far, lossily decoded.
    pub fn written(&self) -> String {
        String::from_utf8_lossy(&self.written).into_owned()
    }

    /// Written bytes split into command lines, terminators removed.
    pub fn written_lines(&self) -> Vec<String> {
        let written = self.written();
        let mut lines: Vec<String> = written
            .split(self.terminator.as_str())
            .map(str::to_string)
            .collect();
        if lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        lines
    }

    /// Number of device output bytes not yet consumed by the reader.
    pub fn unread(&self) -> usize {
        let total = self.output.get_ref().len() as u64;
        (total - self.output.position().min(total)) as usize
    }
}

impl Read for MockTransport {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.output.read(buf)
    }
}

impl Write for MockTransport {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_written_lines_split_on_terminator() {
        let mut mock = MockTransport::with_terminator(&[], "\r\n");
        mock.write_all(b"FIRM?\r\n:WIND 7\r\n").unwrap();
        assert_eq!(mock.written_lines(), vec!["FIRM?", ":WIND 7"]);
    }

    #[test]
    fn test_output_is_replayed_in_order() {
        let mut mock = MockTransport::new(&["FIRM?", "Firmware v2.010"]);
        let mut out = String::new();
        mock.read_to_string(&mut out).unwrap();
        assert_eq!(out, "FIRM?\nFirmware v2.010\n");
        assert_eq!(mock.unread(), 0);
    }

    #[test]
    fn test_nothing_written() {
        let mock = MockTransport::new(&["ok"]);
        assert!(mock.written_lines().is_empty());
        assert_eq!(mock.unread(), 3);
    }
}
