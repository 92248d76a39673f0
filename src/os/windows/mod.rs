//! Spawning and reaping popen children through the Microsoft C runtime.

pub(crate) mod popen;
