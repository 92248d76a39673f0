//! Stream facades over [`PopenBuf`](crate::PopenBuf).
//!
//! Each facade owns exactly one stream buffer and adds the stream state flags on top of it:
//!
//! - [`BasicIpStream`] reads the standard output of a child process;
//! - [`BasicOpStream`] writes to the standard input of a child process;
//! - [`BasicPStream`] does both through one bidirectional pipe, where the platform allows it (see
//!   [`duplex_supported()`](crate::duplex_supported)).
//!
//! The byte-oriented facades implement [`Read`](std::io::Read), [`BufRead`](std::io::BufRead) and
//! [`Write`](std::io::Write) as appropriate, so everything from `read_line` to `write!` works on
//! them. Wide facades offer the same operations at the level of single units.
//!
//! # Examples
//! Reading the output of a command line by line:
//! ```no_run
#![doc = doctest_file::include_doctest!("demos/ipstream_lines.rs")]
//! ```
//! Feeding input to a command:
//! ```no_run
#![doc = doctest_file::include_doctest!("demos/opstream_sort.rs")]
//! ```

mod ipstream;
mod opstream;
mod pstream;

pub use {ipstream::*, opstream::*, pstream::*};

use crate::WideUnit;
use std::io;

/// Status flags of a stream facade.
///
/// The failure flag is set whenever an operation on the facade returns an error, and the
/// end-of-stream flag is set when a read finds the child's output exhausted. Both stay set until
/// the facade's `clear()` is called.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct StreamState {
    fail: bool,
    eof: bool,
}
impl StreamState {
    /// Returns `true` if neither flag is set.
    #[inline]
    pub const fn good(self) -> bool {
        !self.fail && !self.eof
    }
    /// Returns `true` if an operation has failed.
    #[inline]
    pub const fn fail(self) -> bool {
        self.fail
    }
    /// Returns `true` if a read has reached end-of-stream.
    #[inline]
    pub const fn eof(self) -> bool {
        self.eof
    }

    /// Sets the failure flag if `result` is an error.
    pub(crate) fn track<T>(&mut self, result: io::Result<T>) -> io::Result<T> {
        if result.is_err() {
            self.fail = true;
        }
        result
    }
    pub(crate) fn set_eof(&mut self) {
        self.eof = true;
    }
}

/// Reads bytes from a child process.
pub type IpStream<'b> = BasicIpStream<'b, u8>;
/// Writes bytes to a child process.
pub type OpStream<'b> = BasicOpStream<'b, u8>;
/// Reads bytes from and writes bytes to a child process.
pub type PStream<'b> = BasicPStream<'b, u8>;
/// Reads wide units from a child process.
pub type WIpStream<'b> = BasicIpStream<'b, WideUnit>;
/// Writes wide units to a child process.
pub type WOpStream<'b> = BasicOpStream<'b, WideUnit>;
/// Reads wide units from and writes wide units to a child process.
pub type WPStream<'b> = BasicPStream<'b, WideUnit>;
