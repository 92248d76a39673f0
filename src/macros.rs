#![allow(unused_macros)]

macro_rules! impmod {
    ($($osmod:ident)::+, $($orig:ident $(as $into:ident)?),* $(,)?) => {
        #[cfg(unix)]
        use $crate::os::unix::$($osmod)::+::{$($orig $(as $into)?,)*};
        #[cfg(windows)]
        use $crate::os::windows::$($osmod)::+::{$($orig $(as $into)?,)*};
    };
}

macro_rules! ok_or_errno {
    ($success:expr => $($scb:tt)+) => {
        if $success {
            Ok($($scb)+)
        } else {
            Err(::std::io::Error::last_os_error())
        }
    };
}

macro_rules! multimacro {
    ($ty:ident, $($macro:ident $(($($arg:tt)+))?),+ $(,)?) => {$(
        $macro!($ty $(, $($arg)+)?);
    )+};
}

/// Accessors every stream facade shares. The facade must have `buf` and `state` fields.
macro_rules! forward_stream_state {
    ($ty:ident) => {
        impl<'b, U: $crate::Unit> $ty<'b, U> {
            /// Returns `true` if a child process is currently attached.
            #[inline]
            pub fn is_open(&self) -> bool {
                self.buf.is_open()
            }
            /// Borrows the stream buffer driving this stream.
            #[inline]
            pub fn rdbuf(&self) -> &$crate::PopenBuf<'b, U> {
                &self.buf
            }
            /// Mutably borrows the stream buffer driving this stream.
            ///
            /// Operations performed directly on the buffer do not update the stream state.
            #[inline]
            pub fn rdbuf_mut(&mut self) -> &mut $crate::PopenBuf<'b, U> {
                &mut self.buf
            }
            /// Returns the stream state flags.
            #[inline]
            pub fn state(&self) -> $crate::StreamState {
                self.state
            }
            /// Returns `true` if neither the failure nor the end-of-stream flag is set.
            #[inline]
            pub fn good(&self) -> bool {
                self.state.good()
            }
            /// Returns `true` if an operation on this stream has failed since the last
            /// [`clear()`](Self::clear).
            #[inline]
            pub fn fail(&self) -> bool {
                self.state.fail()
            }
            /// Returns `true` if a read has reached the end of the child's output.
            #[inline]
            pub fn eof(&self) -> bool {
                self.state.eof()
            }
            /// Resets the failure and end-of-stream flags.
            #[inline]
            pub fn clear(&mut self) {
                self.state = $crate::StreamState::default();
            }
        }
        impl<U: $crate::Unit> ::std::default::Default for $ty<'_, U> {
            #[inline]
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

macro_rules! forward_stream_debug {
    ($ty:ident) => {
        impl<U: $crate::Unit> ::std::fmt::Debug for $ty<'_, U> {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.debug_struct(stringify!($ty))
                    .field("buf", &self.buf)
                    .field("state", &self.state)
                    .finish()
            }
        }
    };
}
