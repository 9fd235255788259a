//! The monitor loop: cycle, sleep, repeat until interrupted.

use tracing::{error, info};

use super::signals::ShutdownSignal;
use crate::core::config::WatchConfig;
use crate::core::errors::WatchError;
use crate::monitor::cycle::run_cycle;
use crate::monitor::http::HttpFetch;
use crate::notify::email::Notifier;

/// Why the loop returned.
#[derive(Debug)]
pub enum LoopExit {
    /// A stop was requested (SIGINT/SIGTERM).
    Interrupted {
        /// Cycles completed before the stop.
        cycles: u64,
    },
    /// A cycle failed outside the recovered taxonomy.
    Failed {
        /// Cycles completed before the failing one.
        cycles: u64,
        /// The error that ended the loop.
        error: WatchError,
    },
}

/// Owns everything a long-running monitor needs.
pub struct MonitorLoop<'a> {
    config: &'a WatchConfig,
    fetcher: &'a dyn HttpFetch,
    notifier: &'a dyn Notifier,
    shutdown: ShutdownSignal,
}

impl<'a> MonitorLoop<'a> {
    /// Assemble a loop; nothing runs until [`MonitorLoop::run`].
    pub fn new(
        config: &'a WatchConfig,
        fetcher: &'a dyn HttpFetch,
        notifier: &'a dyn Notifier,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            config,
            fetcher,
            notifier,
            shutdown,
        }
    }

    /// Run cycles back to back with `config.interval` between them.
    ///
    /// Never returns on its own: only an interrupt or an unexpected cycle
    /// error ends it.
    pub fn run(&self) -> LoopExit {
        let mut cycles = 0_u64;
        loop {
            if self.shutdown.is_requested() {
                break;
            }
            match run_cycle(self.config, self.fetcher, self.notifier) {
                Ok(_) => cycles += 1,
                Err(err) => {
                    error!(code = err.code(), "Unexpected error: {err}");
                    return LoopExit::Failed { cycles, error: err };
                }
            }
            if !self.shutdown.sleep(self.config.interval) {
                break;
            }
        }
        info!(cycles, "Monitor stopped by user");
        LoopExit::Interrupted { cycles }
    }
}
