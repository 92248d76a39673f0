use crate::{OpenMode, PopenBuf, StreamState, Unit};
use std::{
    ffi::OsStr,
    io::{self, Write},
    process::ExitStatus,
};

/// An output stream writing to the standard input of a child process.
///
/// The stream is always opened for writing, whatever mode is passed to
/// [`open()`](Self::open). Output is buffered; it reaches the child when the buffer fills up, on
/// [`flush()`](Self::flush), and on close. Dropping an open stream closes it.
pub struct BasicOpStream<'b, U: Unit = u8> {
    buf: PopenBuf<'b, U>,
    state: StreamState,
}
multimacro! {
    BasicOpStream,
    forward_stream_state,
    forward_stream_debug,
}

impl<U: Unit> BasicOpStream<'_, U> {
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

    /// Spawns `command` with its standard input connected to this stream. [`OpenMode::WRITE`] is
    /// added to `mode`.
    ///
    /// Sets the failure flag on error.
    pub fn open(&mut self, command: impl AsRef<OsStr>, mode: OpenMode) -> io::Result<()> {
        let result = self.buf.open(command, mode | OpenMode::WRITE);
        self.state.track(result)
    }
    /// Flushes pending output, waits for the child to exit and detaches it from the stream.
    ///
    /// Sets the failure flag on error, including when the stream is not open.
    pub fn close(&mut self) -> io::Result<ExitStatus> {
        let result = self.buf.close();
        self.state.track(result)
    }

    /// Writes one unit.
    pub fn put(&mut self, unit: U) -> io::Result<()> {
        let result = self.buf.put_unit(unit);
        self.state.track(result)
    }
    /// Writes all of `units`.
    pub fn write_units(&mut self, units: &[U]) -> io::Result<()> {
        let result = self.buf.write_units(units);
        self.state.track(result)
    }
    /// Hands pending output to the child.
    pub fn flush(&mut self) -> io::Result<()> {
        let result = self.buf.sync();
        self.state.track(result)
    }
}

impl Write for BasicOpStream<'_, u8> {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let result = self.buf.try_write_units(buf);
        self.state.track(result)
    }
    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        BasicOpStream::flush(self)
    }
}
