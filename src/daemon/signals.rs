//! Interrupt handling: SIGINT/SIGTERM flip a shared flag the loop polls.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::flag;

use crate::core::errors::{Result, WatchError};

/// Longest stretch the loop sleeps without looking at the flag.
const POLL_SLICE: Duration = Duration::from_millis(250);

/// Exit status when a second interrupt forces termination.
const FORCED_EXIT_STATUS: i32 = 0;

/// Shared stop request.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    requested: Arc<AtomicBool>,
}

impl ShutdownSignal {
    /// A flag nothing but [`ShutdownSignal::request`] will set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wire SIGINT and SIGTERM to this flag.
    ///
    /// The first signal asks for a clean stop. A second one while the flag
    /// is already set terminates the process immediately with status 0, so a
    /// cycle stuck in network I/O can still be killed from the terminal.
    pub fn install() -> Result<Self> {
        let signal = Self::new();
        for sig in [SIGINT, SIGTERM] {
            // Registered first so it observes the flag before this signal sets it.
            flag::register_conditional_shutdown(
                sig,
                FORCED_EXIT_STATUS,
                Arc::clone(&signal.requested),
            )
            .and_then(|_| flag::register(sig, Arc::clone(&signal.requested)))
            .map_err(|e| WatchError::Runtime {
                details: format!("signal handler registration for {sig}: {e}"),
            })?;
        }
        Ok(signal)
    }

    /// Ask the loop to stop at its next check point.
    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    /// Whether a stop has been requested.
    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Sleep for `duration` unless a stop is requested first.
    ///
    /// Returns `true` if the full duration elapsed.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_requested() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            std::thread::sleep(POLL_SLICE.min(deadline - now));
        }
    }
}
