//! Daemon subsystem: the hourly monitor loop and interrupt handling.

pub mod loop_main;
pub mod signals;
