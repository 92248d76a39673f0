//! Error conditions specific to popen streams.
//!
//! Every fallible operation in this crate returns [`io::Error`]. Conditions that do not originate
//! from the operating system are described by [`PipeErrorKind`], which converts into an
//! [`io::Error`] with a fixed message and a fitting [`io::ErrorKind`]. The original kind can be
//! recovered with [`PipeErrorKind::of()`].

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    io,
};

/// Crate-specific failure conditions of pipe handles, stream buffers and stream facades.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PipeErrorKind {
    /// An open was requested on a handle, buffer or stream that is already open.
    AlreadyOpen,
    /// An operation that requires an open pipe was invoked while closed.
    NotOpen,
    /// A read was attempted on a pipe that was not opened for reading.
    NotReadable,
    /// A write or flush was attempted on a pipe that was not opened for writing.
    NotWritable,
    /// The open mode requested neither reading nor writing.
    UnsupportedMode,
    /// A combined read-and-write pipe was requested on a platform whose `popen` cannot provide
    /// one.
    DuplexUnsupported,
    /// Reading was requested, but the backing buffer is too small to leave any room for the read
    /// region.
    EmptyReadRegion,
    /// The backing buffer was about to be replaced while the pipe was open.
    BufferInUse,
    /// A write was attempted after the pipe reached end-of-stream.
    WritePastEnd,
    /// The C runtime accepted fewer units than it was handed.
    ShortWrite,
    /// The child process did not terminate normally.
    AbnormalExit,
    /// The command cannot be represented in the encoding `popen` expects.
    NonUnicodeCommand,
}
impl PipeErrorKind {
    const fn msg(self) -> &'static str {
        use PipeErrorKind::*;
        match self {
            AlreadyOpen => "the pipe is already open",
            NotOpen => "the pipe is not open",
            NotReadable => "the pipe was not opened for reading",
            NotWritable => "the pipe was not opened for writing",
            UnsupportedMode => "the open mode must include reading, writing or both",
            DuplexUnsupported => "bidirectional popen is unsupported on this platform",
            EmptyReadRegion => "the backing buffer leaves no room for reading",
            BufferInUse => "the buffer cannot be replaced while the pipe is open",
            WritePastEnd => "attempted to write past the end of the stream",
            ShortWrite => "the pipe accepted only part of the written data",
            AbnormalExit => "the child process terminated abnormally",
            NonUnicodeCommand => "the command is not valid Unicode",
        }
    }
    const fn io_kind(self) -> io::ErrorKind {
        use {io::ErrorKind as K, PipeErrorKind::*};
        match self {
            AlreadyOpen | NotOpen | NotReadable | NotWritable | BufferInUse => K::Other,
            UnsupportedMode | EmptyReadRegion | NonUnicodeCommand => K::InvalidInput,
            DuplexUnsupported => K::Unsupported,
            WritePastEnd => K::BrokenPipe,
            ShortWrite => K::WriteZero,
            AbnormalExit => K::Other,
        }
    }
    /// Extracts the crate-specific error kind from an [`io::Error`], if it was created from one.
    pub fn of(e: &io::Error) -> Option<Self> {
        e.get_ref()?.downcast_ref::<PipeError>().map(|pe| pe.kind)
    }
}
impl Display for PipeErrorKind {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.msg())
    }
}

/// Payload of [`io::Error`]s created from a [`PipeErrorKind`].
#[derive(Clone, Debug)]
struct PipeError {
    kind: PipeErrorKind,
    detail: Option<String>,
}
impl Display for PipeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.msg())?;
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}
impl Error for PipeError {}

impl PipeErrorKind {
    /// Creates an [`io::Error`] of this kind with additional context appended to the message.
    pub(crate) fn with_detail(self, detail: impl Display) -> io::Error {
        let detail = Some(detail.to_string());
        io::Error::new(self.io_kind(), PipeError { kind: self, detail })
    }
}
impl From<PipeErrorKind> for io::Error {
    fn from(kind: PipeErrorKind) -> Self {
        io::Error::new(kind.io_kind(), PipeError { kind, detail: None })
    }
}
