use crate::{duplex_supported, OpenMode, PipeErrorKind, PopenBuf, StreamState, Unit};
use std::{
    ffi::OsStr,
    io::{self, BufRead, Read, Write},
    process::ExitStatus,
};

/// A bidirectional stream connected to both the standard input and the standard output of a child
/// process through one pipe.
///
/// Only usable where [`duplex_supported()`] returns `true`; elsewhere, [`open()`](Self::open)
/// always fails with [`PipeErrorKind::DuplexUnsupported`]. The backing buffer is split between
/// reading and writing.
///
/// Output is buffered, so a child that answers its input only sees that input once the stream is
/// [flushed](Self::flush). Input is buffered as well: a refill of the read region blocks until the
/// region is full or the child closes its output, even if fewer units are already available. A
/// conversation with a child that keeps running therefore has to deal in multiples of
/// [`read_capacity()`](crate::PopenBuf::read_capacity), or use a custom buffer sized to fit.
pub struct BasicPStream<'b, U: Unit = u8> {
    buf: PopenBuf<'b, U>,
    state: StreamState,
}
multimacro! {
    BasicPStream,
    forward_stream_state,
    forward_stream_debug,
}

impl<U: Unit> BasicPStream<'_, U> {
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

    /// Spawns `command` with both of its standard streams connected to this stream. Both
    /// directions are added to `mode`.
    ///
    /// Sets the failure flag on error.
    pub fn open(&mut self, command: impl AsRef<OsStr>, mode: OpenMode) -> io::Result<()> {
        let result = if duplex_supported() {
            self.buf.open(command, mode | OpenMode::READ_WRITE)
        } else {
            Err(PipeErrorKind::DuplexUnsupported.into())
        };
        self.state.track(result)
    }
    /// Flushes pending output, waits for the child to exit and detaches it from the stream.
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

impl Read for BasicPStream<'_, u8> {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_units(buf)
    }
}
impl BufRead for BasicPStream<'_, u8> {
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
impl Write for BasicPStream<'_, u8> {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let result = self.buf.try_write_units(buf);
        self.state.track(result)
    }
    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        BasicPStream::flush(self)
    }
}
