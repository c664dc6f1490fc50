//! Line-oriented request/response session over a byte-stream transport.

use log::debug;
use std::io::{BufRead, BufReader, ErrorKind, Write};

use crate::error::InstrumentError;
use crate::transport::Transport;

/// Line terminator used by both supported instrument families.
pub const DEFAULT_TERMINATOR: &str = "\n";

/// A single-in-flight command channel to one instrument.
///
/// Every operation takes `&mut self`, so a second command cannot be issued
/// while a previous reply is still being read. Replies are returned with
/// the terminator and surrounding whitespace stripped.
///
/// # Examples
///
/// ```
/// use benchwire::{MockTransport, Session};
///
/// let mut session = Session::new(MockTransport::new(&["Firmware v2"]));
/// assert_eq!(session.send_query("FIRM?")?, "Firmware v2");
/// assert_eq!(session.get_ref().written_lines(), vec!["FIRM?"]);
/// # Ok::<(), benchwire::InstrumentError>(())
/// ```
pub struct Session<T: Transport> {
    reader: BufReader<T>,
    terminator: String,
}

impl<T: Transport> Session<T> {
    /// Wrap `transport` using the default `"\n"` terminator.
    pub fn new(transport: T) -> Self {
        Self {
            reader: BufReader::new(transport),
            terminator: DEFAULT_TERMINATOR.to_string(),
        }
    }

    /// Use a different line terminator, e.g. `"\r\n"`.
    ///
    /// The same terminator frames both outgoing commands and incoming
    /// replies.
    pub fn with_terminator(mut self, terminator: &str) -> Result<Self, InstrumentError> {
        if terminator.is_empty() {
            return Err(InstrumentError::InvalidRange {
                property: "terminator",
                value: format!("{terminator:?}"),
                expected: "a non-empty string".to_string(),
            });
        }
        self.terminator = terminator.to_string();
        Ok(self)
    }

    pub fn terminator(&self) -> &str {
        &self.terminator
    }

    /// Write one command line without reading anything back.
    pub fn send_command(&mut self, command: &str) -> Result<(), InstrumentError> {
        let line = format!("{command}{}", self.terminator);
        let transport = self.reader.get_mut();
        transport
            .write_all(line.as_bytes())
            .and_then(|_| transport.flush())
            .map_err(map_io_error)?;
        debug!("-> {command:?}");
        Ok(())
    }

    /// Write one command line and block until one reply line arrives.
    pub fn send_query(&mut self, command: &str) -> Result<String, InstrumentError> {
        self.send_command(command)?;
        self.read_line()
    }

    /// Read the next line from the instrument.
    ///
    /// Used directly by drivers that have to consume echoes or
    /// acknowledgements outside of a plain query.
    pub fn read_line(&mut self) -> Result<String, InstrumentError> {
        let terminator = self.terminator.as_bytes();
        let Some(&last) = terminator.last() else {
            return Err(InstrumentError::Protocol("empty line terminator".to_string()));
        };

        let mut buf = Vec::new();
        loop {
            let read = self
                .reader
                .read_until(last, &mut buf)
                .map_err(map_io_error)?;
            if read == 0 {
                if buf.is_empty() {
                    return Err(InstrumentError::ConnectionClosed);
                }
                // Stream ended on a partial line; hand back what arrived.
                break;
            }
            if buf.ends_with(terminator) {
                buf.truncate(buf.len() - terminator.len());
                break;
            }
        }

        let line = String::from_utf8_lossy(&buf).trim().to_string();
        debug!("<- {line:?}");
        Ok(line)
    }

    pub fn get_ref(&self) -> &T {
        self.reader.get_ref()
    }

    pub fn get_mut(&mut self) -> &mut T {
        self.reader.get_mut()
    }

    /// Release the transport. Bytes already buffered but not read are lost.
    pub fn into_inner(self) -> T {
        self.reader.into_inner()
    }
}

fn map_io_error(e: std::io::Error) -> InstrumentError {
    match e.kind() {
        ErrorKind::TimedOut | ErrorKind::WouldBlock => InstrumentError::Timeout,
        ErrorKind::UnexpectedEof | ErrorKind::BrokenPipe | ErrorKind::ConnectionReset => {
            InstrumentError::ConnectionClosed
        }
        _ => InstrumentError::Io(e),
    }
}
