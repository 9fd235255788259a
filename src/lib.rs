//! Broken Image Watch: fetch one web page every hour, check that its main
//! content images still load and decode, and email the operator a list of the
//! ones that do not.
//!
//! The pipeline is strictly sequential: [`monitor::cycle::run_cycle`] does one
//! fetch → parse → check → notify pass, and [`daemon::loop_main::MonitorLoop`]
//! repeats it until interrupted.

#[cfg(feature = "cli")]
pub mod cli_app;
pub mod core;
#[cfg(feature = "daemon")]
pub mod daemon;
pub mod logger;
pub mod monitor;
pub mod notify;
