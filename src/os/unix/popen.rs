use crate::{OpenMode, PipeErrorKind};
use libc::FILE;
use std::{
    ffi::{CStr, CString, OsStr},
    io,
    os::unix::{ffi::OsStrExt, process::ExitStatusExt},
    process::ExitStatus,
    ptr::NonNull,
};

fn mode_str(mode: OpenMode) -> io::Result<&'static CStr> {
    match (mode.is_read(), mode.is_write()) {
        (true, false) => Ok(c"r"),
        (false, true) => Ok(c"w"),
        (true, true) if cfg!(popen_duplex) => Ok(c"r+"),
        (true, true) => Err(PipeErrorKind::DuplexUnsupported.into()),
        (false, false) => Err(PipeErrorKind::UnsupportedMode.into()),
    }
}

/// Runs `command` through `/bin/sh -c` with its standard stream(s) connected to the returned
/// stdio stream.
pub(crate) fn spawn(command: &OsStr, mode: OpenMode) -> io::Result<NonNull<FILE>> {
    let mode = mode_str(mode)?;
    let command = CString::new(command.as_bytes())?;
    // SAFETY: both arguments are NUL-terminated strings that outlive the call
    let file = unsafe { libc::popen(command.as_ptr(), mode.as_ptr()) };
    NonNull::new(file).ok_or_else(io::Error::last_os_error)
}

/// Waits for the child to exit and closes the stream.
///
/// # Safety
/// `file` must have been returned by [`spawn`] and not yet been passed to this function.
pub(crate) unsafe fn wait(file: NonNull<FILE>) -> io::Result<ExitStatus> {
    // SAFETY: guaranteed by the caller
    let raw = unsafe { libc::pclose(file.as_ptr()) };
    let status = ok_or_errno!(raw != -1 => ExitStatus::from_raw(raw))?;
    match status.signal() {
        Some(sig) => Err(PipeErrorKind::AbnormalExit.with_detail(format_args!("signal {sig}"))),
        None => Ok(status),
    }
}
