//! Character units transferred through popen streams.

use crate::Sealed;
use std::fmt::Debug;

/// A fixed-size character unit that a stream buffer stores and the pipe transfers.
///
/// Units are moved through the pipe verbatim, `size_of::<U>()` bytes at a time, in native byte
/// order. No transcoding of any kind takes place.
///
/// This trait is sealed and implemented for `u8`, `u16` and `u32`.
pub trait Unit: Copy + Default + Debug + Send + Sync + Sealed + 'static {}

impl Sealed for u8 {}
impl Unit for u8 {}
impl Sealed for u16 {}
impl Unit for u16 {}
impl Sealed for u32 {}
impl Unit for u32 {}

/// The unit of wide streams, matching the platform's `wchar_t` in size.
#[cfg(windows)]
pub type WideUnit = u16;
/// The unit of wide streams, matching the platform's `wchar_t` in size.
#[cfg(not(windows))]
pub type WideUnit = u32;
