#![doc = include_str!("../README.md")]
#![cfg_attr(feature = "doc_cfg", feature(doc_cfg))]
// If this was in Cargo.toml, it would cover examples as well
#![warn(missing_docs, clippy::panic_in_result_fn, clippy::missing_assert_message)]

#[macro_use]
mod macros;

pub mod buffer;
pub mod error;
pub mod pipe;
pub mod stream;
pub mod unit;

/// Platform-specific glue around the C runtime's `popen` family.
///
/// Only one of the two submodules is compiled, depending on the target. Neither is public: the
/// differences between platforms are confined to spawning and reaping the child, while reading,
/// writing and flushing go through the portable stdio functions in [`pipe`].
mod os {
    #[cfg(unix)]
    pub(crate) mod unix;
    #[cfg(windows)]
    pub(crate) mod windows;
}

mod open_mode;
mod sealed;
pub use {
    buffer::PopenBuf,
    error::PipeErrorKind,
    open_mode::OpenMode,
    pipe::{PipeHandle, RawPipe, ReadOutcome},
    stream::{
        BasicIpStream, BasicOpStream, BasicPStream, IpStream, OpStream, PStream, StreamState,
        WIpStream, WOpStream, WPStream,
    },
    unit::{Unit, WideUnit},
};
pub(crate) use sealed::Sealed;

mod config {
    include!(concat!(env!("OUT_DIR"), "/config.rs"));
}

/// Capacity, in units, of the backing buffer a [`PopenBuf`] allocates for itself.
///
/// Set at build time through the `POPEN_STREAM_BUFFER_SIZE` environment variable, which must hold
/// an integer no smaller than 1. Defaults to 512.
pub const DEFAULT_BUFFER_SIZE: usize = config::CONFIGURED_BUFFER_SIZE;

/// Returns `true` if the platform's `popen` can connect to both standard streams of a child
/// through one bidirectional pipe.
///
/// When this returns `false`, opening anything with [`OpenMode::READ_WRITE`] fails with an error
/// of kind [`PipeErrorKind::DuplexUnsupported`], and [`PStream`] cannot be opened at all.
#[inline]
pub const fn duplex_supported() -> bool {
    cfg!(popen_duplex)
}

#[cfg(test)]
#[path = "../tests/index.rs"]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects, clippy::indexing_slicing)]
mod tests;
