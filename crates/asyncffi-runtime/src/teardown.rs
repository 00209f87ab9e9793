//! Teardown signalling and in-flight accounting
//!
//! An accepted native call owes its caller exactly one completion. During
//! teardown each in-flight task sees its [`TeardownSignal`] fire, delivers a
//! shutdown error, and drops its [`InFlight`] guard. The engine is only
//! dropped once the in-flight count reaches zero or the grace period ends.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Owner side of the teardown signal plus the in-flight count
#[derive(Clone)]
pub struct Teardown {
    started: Arc<watch::Sender<bool>>,
    in_flight: Arc<InFlightCount>,
}

#[derive(Default)]
struct InFlightCount {
    count: Mutex<usize>,
    drained: Condvar,
}

impl Teardown {
    pub fn new() -> Self {
        let (started, _) = watch::channel(false);
        Self {
            started: Arc::new(started),
            in_flight: Arc::new(InFlightCount::default()),
        }
    }

    /// Fire the signal; returns `false` if it had already fired
    pub fn begin(&self) -> bool {
        !self.started.send_replace(true)
    }

    pub fn has_begun(&self) -> bool {
        *self.started.borrow()
    }

    pub fn signal(&self) -> TeardownSignal {
        TeardownSignal {
            started: self.started.subscribe(),
        }
    }

    /// Count one task as in flight until the guard drops
    pub fn enter(&self) -> InFlight {
        *self.in_flight.count.lock() += 1;
        InFlight {
            in_flight: self.in_flight.clone(),
        }
    }

    pub fn in_flight(&self) -> usize {
        *self.in_flight.count.lock()
    }

    /// Block until no task is in flight
    ///
    /// Returns `false` if some were still running when `timeout` elapsed.
    pub fn drain(&self, timeout: Duration) -> bool {
        let mut count = self.in_flight.count.lock();
        !self
            .in_flight
            .drained
            .wait_while_for(&mut count, |n| *n > 0, timeout)
            .timed_out()
    }
}

impl Default for Teardown {
    fn default() -> Self {
        Self::new()
    }
}

/// Held by a task that still owes a completion
pub struct InFlight {
    in_flight: Arc<InFlightCount>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let mut count = self.in_flight.count.lock();
        *count -= 1;
        if *count == 0 {
            self.in_flight.drained.notify_all();
        }
    }
}

/// Receiver side of the teardown signal, handed to spawned tasks
#[derive(Clone)]
pub struct TeardownSignal {
    started: watch::Receiver<bool>,
}

impl TeardownSignal {
    pub fn has_begun(&self) -> bool {
        *self.started.borrow()
    }

    /// Resolve once teardown has begun (immediately if it already has)
    pub async fn begun(&mut self) {
        // A dropped sender means the engine is gone, which counts as teardown
        let _ = self.started.wait_for(|started| *started).await;
    }
}

#[cfg(test)]
#[path = "teardown/teardown_tests.rs"]
mod teardown_tests;
