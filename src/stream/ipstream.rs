use crate::{OpenMode, PopenBuf, StreamState, Unit};
use std::{
    ffi::OsStr,
    io::{self, BufRead, Read},
    process::ExitStatus,
};

/// An input stream reading from the standard output of a child process.
///
/// The stream is always opened for reading, whatever mode is passed to
/// [`open()`](Self::open). Dropping an open stream waits for the child to exit.
pub struct BasicIpStream<'b, U: Unit = u8> {
    buf: PopenBuf<'b, U>,
    state: StreamState,
}
multimacro! {
    BasicIpStream,
    forward_stream_state,
    forward_stream_debug,
}

impl<U: Unit> BasicIpStream<'_, U> {
    /// Creates a stream with no process attached.
    #[inline]
    pub fn new() -> Self {
        Self { buf: PopenBuf::new(), state: StreamState::default() }
    }
    /// Creates a stream and opens it on `command`.
    pub fn spawn(command: impl AsRef<OsStr>, mode: OpenMode) -> io::Result<Self> {
        let mut slf = Self::new();
        slf.open(command, mode)?;
        Ok(slf)
    }

    /// Spawns `command` with its standard output connected to this stream. [`OpenMode::READ`] is
    /// added to `mode`.
    ///
    /// Sets the failure flag on error.
    pub fn open(&mut self, command: impl AsRef<OsStr>, mode: OpenMode) -> io::Result<()> {
        let result = self.buf.open(command, mode | OpenMode::READ);
        self.state.track(result)
    }
    /// Waits for the child to exit and detaches it from the stream.
    ///
    /// Sets the failure flag on error, including when the stream is not open.
    pub fn close(&mut self) -> io::Result<ExitStatus> {
        let result = self.buf.close();
        self.state.track(result)
    }

    /// Reads and consumes one unit. `Ok(None)` means end-of-stream and sets the end-of-stream
    /// flag.
    pub fn get(&mut self) -> io::Result<Option<U>> {
        let result = self.buf.get_unit();
        let unit = self.state.track(result)?;
        if unit.is_none() {
            self.state.set_eof();
        }
        Ok(unit)
    }
    /// Returns the next unit without consuming it.
    pub fn peek(&mut self) -> io::Result<Option<U>> {
        let result = self.buf.peek_unit();
        let unit = self.state.track(result)?;
        if unit.is_none() {
            self.state.set_eof();
        }
        Ok(unit)
    }
    /// Reads units into `out`, returning how many were read.
    pub fn read_units(&mut self, out: &mut [U]) -> io::Result<usize> {
        let result = self.buf.read_units(out);
        let n = self.state.track(result)?;
        if n == 0 && !out.is_empty() {
            self.state.set_eof();
        }
        Ok(n)
    }
}

impl Read for BasicIpStream<'_, u8> {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_units(buf)
    }
}
impl BufRead for BasicIpStream<'_, u8> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        let Self { buf, state } = self;
        let avail = state.track(buf.fill_units())?;
        if avail.is_empty() {
            state.set_eof();
        }
        Ok(avail)
    }
    #[inline]
    fn consume(&mut self, amt: usize) {
        self.buf.consume_units(amt)
    }
}
