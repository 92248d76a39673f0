use std::{
    fmt::{self, Debug, Formatter},
    ops::{BitOr, BitOrAssign},
};

/// The direction(s) in which a child process's standard streams are connected to the pipe.
///
/// Modes are flags and can be combined with `|`. [`OpenMode::READ`] connects to the child's
/// standard output, [`OpenMode::WRITE`] connects to its standard input, and
/// [`OpenMode::READ_WRITE`] connects to both through a single bidirectional pipe, which is only
/// available where [`duplex_supported()`](crate::duplex_supported) returns `true`.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct OpenMode(u8);
impl OpenMode {
    /// Neither direction. Opening with this mode fails.
    pub const NONE: Self = Self(0);
    /// Read what the child writes to its standard output.
    pub const READ: Self = Self(1);
    /// Write to the child's standard input.
    pub const WRITE: Self = Self(1 << 1);
    /// Both directions at once.
    pub const READ_WRITE: Self = Self(Self::READ.0 | Self::WRITE.0);

    /// Returns `true` if every flag of `other` is also set in `self`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
    /// Shorthand for `contains(OpenMode::READ)`.
    #[inline]
    pub const fn is_read(self) -> bool {
        self.contains(Self::READ)
    }
    /// Shorthand for `contains(OpenMode::WRITE)`.
    #[inline]
    pub const fn is_write(self) -> bool {
        self.contains(Self::WRITE)
    }
    /// Returns `true` if both directions are requested.
    #[inline]
    pub const fn is_duplex(self) -> bool {
        self.contains(Self::READ_WRITE)
    }
    /// Returns `true` if no direction is requested.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}
impl BitOr for OpenMode {
    type Output = Self;
    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}
impl BitOrAssign for OpenMode {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}
impl Debug for OpenMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match (self.is_read(), self.is_write()) {
            (true, true) => "READ_WRITE",
            (true, false) => "READ",
            (false, true) => "WRITE",
            (false, false) => "NONE",
        };
        write!(f, "OpenMode::{name}")
    }
}
