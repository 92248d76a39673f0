//! The raw pipe to a child process, without any buffering of its own.
//!
//! [`PipeHandle`] owns the stdio stream returned by the C runtime's `popen` and performs unit-sized
//! reads and writes on it. The operations it offers are collected in the [`RawPipe`] trait, which
//! is what a [`PopenBuf`](crate::PopenBuf) drives.

impmod! {popen,
    spawn as spawn_impl,
    wait as wait_impl,
}
use crate::{OpenMode, PipeErrorKind, Unit};
use libc::FILE;
use std::{
    ffi::OsStr,
    fmt::{self, Debug, Formatter},
    io,
    mem::size_of,
    process::ExitStatus,
    ptr::NonNull,
};
use tracing::{debug, warn};

/// Result of a successful [`RawPipe::read()`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The given number of units was stored at the start of the buffer.
    ///
    /// May be zero only if the end of the stream was reached during this read, so that the next
    /// read returns [`End`](Self::End).
    Read(usize),
    /// The stream had already reached its end before the read was attempted, and no units were
    /// transferred.
    End,
}

/// Unbuffered operations on a pipe connected to a child process.
///
/// Implemented by [`PipeHandle`]. A [`PopenBuf`](crate::PopenBuf) can be built on top of any
/// implementation via [`PopenBuf::with_pipe()`](crate::PopenBuf::with_pipe).
///
/// Every operation other than `popen`, `is_open` and `mode` requires the pipe to be open and must
/// fail with [`PipeErrorKind::NotOpen`] otherwise.
pub trait RawPipe {
    /// Spawns `command` and connects to it in the direction(s) given by `mode`.
    ///
    /// Fails with [`PipeErrorKind::AlreadyOpen`] if the pipe is open, and leaves it closed if
    /// spawning fails.
    fn popen(&mut self, command: &OsStr, mode: OpenMode) -> io::Result<()>;
    /// Waits for the child to exit and releases the pipe.
    ///
    /// The pipe is released even if an error is returned.
    fn pclose(&mut self) -> io::Result<ExitStatus>;
    /// Reads up to `buf.len()` units.
    ///
    /// Returns [`ReadOutcome::End`] if end-of-stream had been reached before this call. A read that
    /// transfers nothing must be followed by one that returns `End`; a second empty read in a row
    /// is taken to mean end-of-stream.
    fn read<U: Unit>(&mut self, buf: &mut [U]) -> io::Result<ReadOutcome>;
    /// Writes the entirety of `buf`. Partial writes are reported as failures.
    fn write<U: Unit>(&mut self, buf: &[U]) -> io::Result<()>;
    /// Pushes data buffered by the pipe itself to the child. Requires write mode.
    fn flush(&mut self) -> io::Result<()>;
    /// Returns `true` if a child process is attached.
    fn is_open(&self) -> bool;
    /// Returns the mode the pipe was last opened with.
    fn mode(&self) -> OpenMode;
}

/// A pipe to a child process spawned with `popen`.
///
/// The handle starts out closed. [`popen`](RawPipe::popen) spawns the child and
/// [`pclose`](RawPipe::pclose) reaps it; the handle can be reopened afterwards, with the same or a
/// different mode. Dropping an open handle reaps the child as well.
///
/// Reads and writes go through the C runtime's stdio stream for the pipe, so they are subject to
/// its buffering on top of whatever buffering the caller performs.
pub struct PipeHandle {
    file: Option<NonNull<FILE>>,
    mode: OpenMode,
}
// SAFETY: the stdio stream is exclusively owned by the handle, and stdio streams carry their own
// lock, so operating on one from another thread is fine.
unsafe impl Send for PipeHandle {}

impl PipeHandle {
    /// Creates a handle with no process attached.
    #[inline]
    pub const fn new() -> Self {
        Self { file: None, mode: OpenMode::NONE }
    }

    fn file(&self) -> io::Result<*mut FILE> {
        let file = self.file.ok_or(PipeErrorKind::NotOpen)?;
        Ok(file.as_ptr())
    }
    fn at_eof(&self) -> io::Result<bool> {
        let file = self.file()?;
        // SAFETY: `file` is the open stream owned by this handle
        Ok(unsafe { libc::feof(file) != 0 })
    }
}
impl Default for PipeHandle {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl RawPipe for PipeHandle {
    fn popen(&mut self, command: &OsStr, mode: OpenMode) -> io::Result<()> {
        if self.file.is_some() {
            return Err(PipeErrorKind::AlreadyOpen.into());
        }
        let file = spawn_impl(command, mode)?;
        debug!(?command, ?mode, "spawned child process");
        self.file = Some(file);
        self.mode = mode;
        Ok(())
    }

    fn pclose(&mut self) -> io::Result<ExitStatus> {
        let file = self.file.take().ok_or(PipeErrorKind::NotOpen)?;
        // SAFETY: taken out of `self.file`, so it cannot be closed twice
        let status = unsafe { wait_impl(file) };
        debug!(?status, "reaped child process");
        status
    }

    fn read<U: Unit>(&mut self, buf: &mut [U]) -> io::Result<ReadOutcome> {
        let file = self.file()?;
        if !self.mode.is_read() {
            return Err(PipeErrorKind::NotReadable.into());
        }
        if self.mode.is_duplex() {
            // stdio demands a flush whenever a stream switches from output to input.
            // SAFETY: `file` is the open stream owned by this handle
            let success = unsafe { libc::fflush(file) == 0 };
            ok_or_errno!(success => ())?;
        }
        if self.at_eof()? {
            return Ok(ReadOutcome::End);
        }
        // SAFETY: `buf` is valid for `buf.len()` units of `size_of::<U>()` bytes each, and any bit
        // pattern is a valid unit
        let count = unsafe { libc::fread(buf.as_mut_ptr().cast(), size_of::<U>(), buf.len(), file) };
        // SAFETY: as above
        let failed = count < buf.len() && unsafe { libc::ferror(file) != 0 };
        ok_or_errno!(!failed => ReadOutcome::Read(count))
    }

    fn write<U: Unit>(&mut self, buf: &[U]) -> io::Result<()> {
        let file = self.file()?;
        if !self.mode.is_write() {
            return Err(PipeErrorKind::NotWritable.into());
        }
        if self.at_eof()? {
            return Err(PipeErrorKind::WritePastEnd.into());
        }
        // SAFETY: `buf` is valid for reads of `buf.len()` units, and `file` is owned by this handle
        let count = unsafe { libc::fwrite(buf.as_ptr().cast(), size_of::<U>(), buf.len(), file) };
        // SAFETY: as above
        let errored = count < buf.len() && unsafe { libc::ferror(file) != 0 };
        if count == buf.len() {
            Ok(())
        } else if errored {
            Err(io::Error::last_os_error())
        } else {
            Err(PipeErrorKind::ShortWrite.with_detail(format_args!("{count} of {}", buf.len())))
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        let file = self.file()?;
        if !self.mode.is_write() {
            return Err(PipeErrorKind::NotWritable.into());
        }
        // SAFETY: `file` is the open stream owned by this handle
        let success = unsafe { libc::fflush(file) == 0 };
        ok_or_errno!(success => ())
    }

    #[inline]
    fn is_open(&self) -> bool {
        self.file.is_some()
    }
    #[inline]
    fn mode(&self) -> OpenMode {
        self.mode
    }
}

impl Drop for PipeHandle {
    fn drop(&mut self) {
        if self.file.is_some() {
            if let Err(e) = self.pclose() {
                warn!(error = %e, "failed to reap child process on drop");
            }
        }
    }
}

impl Debug for PipeHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipeHandle")
            .field("file", &self.file)
            .field("mode", &self.mode)
            .finish()
    }
}
