//! Core types: error taxonomy and startup configuration.

pub mod config;
pub mod errors;
