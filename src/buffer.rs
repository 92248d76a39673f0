//! The stream buffer that sits between a stream facade and the raw pipe.
//!
//! A [`PopenBuf`] owns one contiguous backing buffer and, while open, carves it into a read region
//! and a write region:
//!
//! - opened for reading only, the read region spans the whole buffer;
//! - opened for writing only, the write region spans the whole buffer;
//! - opened for both, the read region takes the first half (rounded up) and the write region the
//!   rest.
//!
//! Three operations keep the regions consistent with the pipe. [`underflow`](PopenBuf::underflow)
//! refills the read region with as many units as the pipe hands over in one read,
//! [`overflow`](PopenBuf::overflow) sends out a full write region in one write, and
//! [`sync`](PopenBuf::sync) sends out whatever is pending and flushes the pipe.

use crate::{OpenMode, PipeErrorKind, PipeHandle, RawPipe, ReadOutcome, Unit, DEFAULT_BUFFER_SIZE};
use std::{
    ffi::OsStr,
    fmt::{self, Debug, Formatter},
    io::{self, BufRead, Read, Write},
    process::ExitStatus,
};
use tracing::{debug, trace, warn};

/// Storage behind the regions.
enum Backing<'b, U> {
    Owned(Box<[U]>),
    /// Supplied by the caller, who keeps ownership of it.
    Borrowed(&'b mut [U]),
}
impl<U: Unit> Backing<'_, U> {
    fn default_owned() -> Self {
        Self::Owned(vec![U::default(); DEFAULT_BUFFER_SIZE].into_boxed_slice())
    }
    fn as_slice(&self) -> &[U] {
        match self {
            Self::Owned(b) => b,
            Self::Borrowed(b) => b,
        }
    }
    fn as_mut_slice(&mut self) -> &mut [U] {
        match self {
            Self::Owned(b) => b,
            Self::Borrowed(b) => b,
        }
    }
    fn is_borrowed(&self) -> bool {
        matches!(self, Self::Borrowed(..))
    }
}

/// Units `pos..end` of the read region are yet to be consumed. The region starts at index 0.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
struct ReadWindow {
    cap: usize,
    pos: usize,
    end: usize,
}
impl ReadWindow {
    #[inline]
    fn is_exhausted(&self) -> bool {
        self.pos >= self.end
    }
    fn clear(&mut self) {
        self.pos = 0;
        self.end = 0;
    }
}

/// The first `fill` units of the write region are pending. The region starts right after the read
/// region.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
struct WriteWindow {
    cap: usize,
    fill: usize,
}
impl WriteWindow {
    #[inline]
    fn space(&self) -> usize {
        self.cap.saturating_sub(self.fill)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Regions {
    read: ReadWindow,
    write: WriteWindow,
}
impl Regions {
    fn partition(total: usize, mode: OpenMode) -> io::Result<Self> {
        let read_cap = match (mode.is_read(), mode.is_write()) {
            (true, true) => total.div_ceil(2),
            (true, false) => total,
            (false, true) => 0,
            (false, false) => return Err(PipeErrorKind::UnsupportedMode.into()),
        };
        let write_cap = if mode.is_write() { total - read_cap } else { 0 };
        Ok(Self {
            read: ReadWindow { cap: read_cap, ..Default::default() },
            write: WriteWindow { cap: write_cap, fill: 0 },
        })
    }
}

/// Returns the read and write region capacities a buffer of `total` units is split into when
/// opened with `mode`.
///
/// # Errors
/// Fails with [`PipeErrorKind::UnsupportedMode`] if `mode` requests neither direction.
pub fn region_sizes(total: usize, mode: OpenMode) -> io::Result<(usize, usize)> {
    let regions = Regions::partition(total, mode)?;
    Ok((regions.read.cap, regions.write.cap))
}

/// A buffered, bidirectional stream over a [`RawPipe`], by default a [`PipeHandle`].
///
/// `U` is the character unit stored in the buffer and transferred through the pipe. For `u8`, the
/// buffer implements [`Read`], [`BufRead`] and [`Write`]; for every unit type, the same
/// functionality is available through the `*_unit(s)` methods.
///
/// The lifetime `'b` is that of a caller-supplied backing buffer installed with
/// [`set_buffer()`](Self::set_buffer). Buffers that allocate their own storage can use any
/// lifetime, including `'static`.
///
/// Dropping an open buffer closes it, which flushes pending output and waits for the child.
pub struct PopenBuf<'b, U: Unit = u8, P: RawPipe = PipeHandle> {
    pipe: P,
    backing: Backing<'b, U>,
    /// Present exactly when the pipe is open.
    regions: Option<Regions>,
}

/// Construction.
impl<U: Unit> PopenBuf<'_, U> {
    /// Creates a closed buffer with a backing buffer of [`DEFAULT_BUFFER_SIZE`] units.
    #[inline]
    pub fn new() -> Self {
        Self::with_pipe(PipeHandle::new())
    }
}
impl<U: Unit> Default for PopenBuf<'_, U> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
impl<U: Unit, P: RawPipe> PopenBuf<'_, U, P> {
    /// Creates a buffer on top of the given closed pipe, with a backing buffer of
    /// [`DEFAULT_BUFFER_SIZE`] units.
    pub fn with_pipe(pipe: P) -> Self {
        debug_assert!(!pipe.is_open(), "the pipe must be handed over closed");
        Self { pipe, backing: Backing::default_owned(), regions: None }
    }
}

/// State queries.
impl<U: Unit, P: RawPipe> PopenBuf<'_, U, P> {
    /// Returns `true` if a child process is attached.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.pipe.is_open()
    }
    /// Returns the mode the buffer was last opened with.
    #[inline]
    pub fn mode(&self) -> OpenMode {
        self.pipe.mode()
    }
    /// Returns the capacity of the backing buffer in units.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.backing.as_slice().len()
    }
    /// Returns the capacity of the read region, or 0 if closed or not reading.
    #[inline]
    pub fn read_capacity(&self) -> usize {
        self.regions.map_or(0, |r| r.read.cap)
    }
    /// Returns the capacity of the write region, or 0 if closed or not writing.
    #[inline]
    pub fn write_capacity(&self) -> usize {
        self.regions.map_or(0, |r| r.write.cap)
    }
    /// Returns the number of units written to the buffer but not yet handed to the pipe.
    #[inline]
    pub fn pending_output(&self) -> usize {
        self.regions.map_or(0, |r| r.write.fill)
    }
    /// Returns `true` if the backing buffer was supplied by the caller.
    #[inline]
    pub fn is_buffer_borrowed(&self) -> bool {
        self.backing.is_borrowed()
    }
    /// Borrows the underlying pipe.
    #[inline]
    pub fn pipe(&self) -> &P {
        &self.pipe
    }
}

/// Opening and closing.
impl<'b, U: Unit, P: RawPipe> PopenBuf<'b, U, P> {
    /// Spawns `command` and partitions the backing buffer for `mode`.
    ///
    /// # Errors
    /// - [`PipeErrorKind::AlreadyOpen`] if the buffer is open
    /// - [`PipeErrorKind::UnsupportedMode`] if `mode` is empty
    /// - [`PipeErrorKind::EmptyReadRegion`] if reading is requested but the backing buffer is
    ///   empty
    /// - whatever the pipe reports if spawning fails
    ///
    /// The buffer stays closed on failure.
    pub fn open(&mut self, command: impl AsRef<OsStr>, mode: OpenMode) -> io::Result<()> {
        self._open(command.as_ref(), mode)
    }
    fn _open(&mut self, command: &OsStr, mode: OpenMode) -> io::Result<()> {
        if self.is_open() {
            return Err(PipeErrorKind::AlreadyOpen.into());
        }
        debug_assert!(self.regions.is_none(), "closed buffer with regions");
        let regions = Regions::partition(self.capacity(), mode)?;
        if mode.is_read() && regions.read.cap == 0 {
            return Err(PipeErrorKind::EmptyReadRegion.into());
        }
        self.pipe.popen(command, mode)?;
        debug!(
            read_cap = regions.read.cap,
            write_cap = regions.write.cap,
            "stream buffer opened"
        );
        self.regions = Some(regions);
        Ok(())
    }

    /// Flushes pending output, waits for the child to exit and resets the regions.
    ///
    /// The pipe is closed even if flushing fails, in which case the flush error is returned. A
    /// caller-supplied backing buffer is released and replaced with an owned one of
    /// [`DEFAULT_BUFFER_SIZE`] units.
    ///
    /// # Errors
    /// [`PipeErrorKind::NotOpen`] if the buffer is already closed, which leaves it untouched.
    pub fn close(&mut self) -> io::Result<ExitStatus> {
        if !self.is_open() {
            return Err(PipeErrorKind::NotOpen.into());
        }
        let synced = if self.mode().is_write() { self.sync() } else { Ok(()) };
        let closed = self.pipe.pclose();
        self.regions = None;
        if self.backing.is_borrowed() {
            debug!("releasing caller-supplied buffer");
            self.backing = Backing::default_owned();
        }
        synced.and(closed)
    }

    /// Replaces the backing buffer. Only allowed while closed.
    ///
    /// `None` switches back to an owned buffer of [`DEFAULT_BUFFER_SIZE`] units; an owned buffer
    /// that is already in place is kept as is. `Some` installs a caller-supplied buffer, which the
    /// stream buffer borrows until it is closed, replaced again, or dropped.
    ///
    /// # Errors
    /// [`PipeErrorKind::BufferInUse`] if the buffer is open.
    pub fn set_buffer(&mut self, buf: Option<&'b mut [U]>) -> io::Result<()> {
        if self.is_open() {
            return Err(PipeErrorKind::BufferInUse.into());
        }
        match buf {
            None if !self.backing.is_borrowed() => {}
            None => self.backing = Backing::default_owned(),
            Some(buf) => self.backing = Backing::Borrowed(buf),
        }
        debug!(capacity = self.capacity(), borrowed = self.backing.is_borrowed(), "buffer replaced");
        Ok(())
    }
}

/// The refill/flush protocol.
impl<U: Unit, P: RawPipe> PopenBuf<'_, U, P> {
    /// Returns the next unconsumed unit, refilling the read region from the pipe if it has been
    /// exhausted. The unit is not consumed.
    ///
    /// A refill requests as many units as the read region holds. With a [`PipeHandle`], that
    /// request blocks until the region is full or the child's output ends. `Ok(None)` means the
    /// child's output has ended; the read region is empty afterwards.
    ///
    /// # Errors
    /// - [`PipeErrorKind::NotOpen`] if closed
    /// - [`PipeErrorKind::NotReadable`] if not opened for reading
    /// - whatever the pipe reports if reading fails
    pub fn underflow(&mut self) -> io::Result<Option<U>> {
        let Some(regions) = self.regions.as_mut() else {
            return Err(PipeErrorKind::NotOpen.into());
        };
        if !self.pipe.mode().is_read() {
            return Err(PipeErrorKind::NotReadable.into());
        }
        let read = &mut regions.read;
        let rbuf = self.backing.as_mut_slice().get_mut(..read.cap).unwrap_or_default();
        if !read.is_exhausted() {
            return Ok(rbuf.get(read.pos).copied());
        }
        read.clear();
        let mut retried = false;
        loop {
            match self.pipe.read(&mut *rbuf)? {
                ReadOutcome::End => {
                    trace!("refill hit end of stream");
                    return Ok(None);
                }
                // stdio sets the end-of-file indicator on short reads, so the next read reports End
                ReadOutcome::Read(0) if !retried => retried = true,
                ReadOutcome::Read(0) => {
                    trace!("second empty read, assuming end of stream");
                    return Ok(None);
                }
                ReadOutcome::Read(n) => {
                    let n = n.min(read.cap);
                    trace!(units = n, "refilled read region");
                    read.end = n;
                    return Ok(rbuf.first().copied());
                }
            }
        }
    }

    /// Sends out the entire write region in one write and places `unit` at its start. If the
    /// write region has no capacity, `unit` is written to the pipe directly.
    ///
    /// On failure, `unit` is not stored and the pending output is left in place.
    ///
    /// # Errors
    /// - [`PipeErrorKind::NotOpen`] if closed
    /// - [`PipeErrorKind::NotWritable`] if not opened for writing
    /// - whatever the pipe reports if writing fails
    pub fn overflow(&mut self, unit: U) -> io::Result<()> {
        let Regions { read, write } = self.write_regions()?;
        if write.cap == 0 {
            trace!("writing unit unbuffered");
            return self.pipe.write(&[unit]);
        }
        let start = read.cap;
        let wbuf = self.backing.as_mut_slice().get_mut(start..start + write.cap).unwrap_or_default();
        self.pipe.write(wbuf.get(..write.fill).unwrap_or_default())?;
        trace!(units = write.fill, "flushed write region on overflow");
        if let Some(slot) = wbuf.first_mut() {
            *slot = unit;
        }
        self.set_write_fill(1);
        Ok(())
    }

    /// Sends out pending output, if any, and flushes the pipe.
    ///
    /// The write region is emptied even if writing fails, and flushing is attempted regardless;
    /// the first error encountered is returned. Does nothing if the buffer is closed or not
    /// opened for writing.
    pub fn sync(&mut self) -> io::Result<()> {
        let Ok(Regions { read, write }) = self.write_regions() else { return Ok(()) };
        let start = read.cap;
        let pending = self.backing.as_slice().get(start..start + write.fill).unwrap_or_default();
        let written = if pending.is_empty() { Ok(()) } else { self.pipe.write(pending) };
        trace!(units = write.fill, "synced write region");
        self.set_write_fill(0);
        let flushed = self.pipe.flush();
        written.and(flushed)
    }

    fn write_regions(&self) -> io::Result<Regions> {
        let regions = self.regions.ok_or(PipeErrorKind::NotOpen)?;
        if !self.pipe.mode().is_write() {
            return Err(PipeErrorKind::NotWritable.into());
        }
        Ok(regions)
    }
    fn set_write_fill(&mut self, fill: usize) {
        if let Some(regions) = self.regions.as_mut() {
            debug_assert!(fill <= regions.write.cap, "write fill beyond region");
            regions.write.fill = fill;
        }
    }
}

/// Unit-level I/O.
impl<U: Unit, P: RawPipe> PopenBuf<'_, U, P> {
    /// Returns the unconsumed contents of the read region, refilling it first if it is empty. An
    /// empty slice signifies end-of-stream.
    pub fn fill_units(&mut self) -> io::Result<&[U]> {
        if self.underflow()?.is_none() {
            return Ok(&[]);
        }
        let read = self.regions.map(|r| r.read).unwrap_or_default();
        Ok(self.backing.as_slice().get(read.pos..read.end).unwrap_or_default())
    }
    /// Marks `amt` units of the read region as consumed. Saturates at the end of the region.
    pub fn consume_units(&mut self, amt: usize) {
        if let Some(regions) = self.regions.as_mut() {
            let read = &mut regions.read;
            read.pos = read.pos.saturating_add(amt).min(read.end);
        }
    }
    /// Reads and consumes a single unit. `Ok(None)` signifies end-of-stream.
    pub fn get_unit(&mut self) -> io::Result<Option<U>> {
        let unit = self.underflow()?;
        if unit.is_some() {
            self.consume_units(1);
        }
        Ok(unit)
    }
    /// Returns the next unit without consuming it. `Ok(None)` signifies end-of-stream.
    #[inline]
    pub fn peek_unit(&mut self) -> io::Result<Option<U>> {
        self.underflow()
    }
    /// Reads units into `out`, refilling the read region at most once. Returns how many units
    /// were read; 0 signifies end-of-stream unless `out` is empty.
    pub fn read_units(&mut self, out: &mut [U]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        let avail = self.fill_units()?;
        let n = avail.len().min(out.len());
        if let (Some(dst), Some(src)) = (out.get_mut(..n), avail.get(..n)) {
            dst.copy_from_slice(src);
        }
        self.consume_units(n);
        Ok(n)
    }
    /// Writes a single unit, overflowing if the write region is full.
    pub fn put_unit(&mut self, unit: U) -> io::Result<()> {
        let Regions { read, write } = self.write_regions()?;
        if write.space() == 0 {
            return self.overflow(unit);
        }
        if let Some(slot) = self.backing.as_mut_slice().get_mut(read.cap + write.fill) {
            *slot = unit;
        }
        self.set_write_fill(write.fill + 1);
        Ok(())
    }
    /// Writes all of `units`, overflowing every time the write region is full.
    ///
    /// On failure, the units that were accepted before it stay pending. Use
    /// [`try_write_units()`](Self::try_write_units) to learn how many that is.
    pub fn write_units(&mut self, units: &[U]) -> io::Result<()> {
        self.accept_units(units).1
    }
    /// Writes as many of `units` as possible, overflowing every time the write region is full, and
    /// returns how many were accepted.
    ///
    /// An error is only returned if not a single unit was accepted. Otherwise, the error is
    /// dropped and will resurface on the next write or sync, since the pending output that caused
    /// it is still in place.
    pub fn try_write_units(&mut self, units: &[U]) -> io::Result<usize> {
        match self.accept_units(units) {
            (0, Err(e)) => Err(e),
            (accepted, Err(e)) => {
                trace!(units = accepted, error = %e, "partial write");
                Ok(accepted)
            }
            (accepted, Ok(())) => Ok(accepted),
        }
    }
    fn accept_units(&mut self, units: &[U]) -> (usize, io::Result<()>) {
        let mut accepted = 0;
        while let Some((&first, rest)) = units.get(accepted..).unwrap_or_default().split_first() {
            let Regions { read, write } = match self.write_regions() {
                Ok(r) => r,
                Err(e) => return (accepted, Err(e)),
            };
            let n = write.space().min(rest.len() + 1);
            if n == 0 {
                if let Err(e) = self.overflow(first) {
                    return (accepted, Err(e));
                }
                accepted += 1;
                continue;
            }
            let at = read.cap + write.fill;
            if let (Some(dst), Some(src)) = (
                self.backing.as_mut_slice().get_mut(at..at + n),
                units.get(accepted..accepted + n),
            ) {
                dst.copy_from_slice(src);
            }
            self.set_write_fill(write.fill + n);
            accepted += n;
        }
        (accepted, Ok(()))
    }
}

impl<P: RawPipe> Read for PopenBuf<'_, u8, P> {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_units(buf)
    }
}
impl<P: RawPipe> BufRead for PopenBuf<'_, u8, P> {
    #[inline]
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.fill_units()
    }
    #[inline]
    fn consume(&mut self, amt: usize) {
        self.consume_units(amt)
    }
}
impl<P: RawPipe> Write for PopenBuf<'_, u8, P> {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.try_write_units(buf)
    }
    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        self.sync()
    }
}

impl<U: Unit, P: RawPipe> Drop for PopenBuf<'_, U, P> {
    fn drop(&mut self) {
        if self.is_open() {
            if let Err(e) = self.close() {
                warn!(error = %e, "failed to close stream buffer on drop");
            }
        }
    }
}

impl<U: Unit, P: RawPipe + Debug> Debug for PopenBuf<'_, U, P> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("PopenBuf")
            .field("pipe", &self.pipe)
            .field("capacity", &self.capacity())
            .field("borrowed", &self.backing.is_borrowed())
            .field("regions", &self.regions)
            .finish()
    }
}
