//! Outbound notification of broken images.

pub mod email;
