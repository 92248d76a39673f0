//! Spawning and reaping popen children on Unix-like systems.

pub(crate) mod popen;
