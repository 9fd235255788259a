//! Page monitoring: markup extraction, HTTP fetch seam, per-image checks, and
//! the cycle that ties them together.

pub mod cycle;
pub mod http;
pub mod inspect;
pub mod page;
