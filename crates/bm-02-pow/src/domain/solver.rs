//! Parallel nonce search
//!
//! Worker `i` of `N` tries nonces `i, i+N, i+2N, …`. The first worker to
//! find a nonce at or below the target stores it under the mutex and
//! signals the condvar; the coordinator then raises the stop flag and the
//! scope joins every worker. A slot that is already filled is never
//! overwritten, so a second find is dropped.

use crate::domain::trial::trial_value;
use crate::error::{PowError, Result};
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

#[derive(Default)]
struct SearchState {
    nonce: Option<u64>,
    finished_workers: usize,
}

struct Shared {
    state: Mutex<SearchState>,
    wake: Condvar,
    stop: AtomicBool,
}

/// Multi-threaded nonce search.
#[derive(Debug, Clone)]
pub struct PowSolver {
    threads: usize,
    limit: u64,
}

impl PowSolver {
    /// Search the whole u64 nonce space with `threads` workers.
    pub fn new(threads: usize) -> Self {
        Self {
            threads: threads.max(1),
            limit: u64::MAX,
        }
    }

    /// Only try nonces `<= limit`; past it the search reports `Exhausted`.
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// Number of workers.
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Find a nonce whose trial value is `<= target`.
    #[tracing::instrument(skip(self, initial_hash), fields(threads = self.threads))]
    pub fn solve(&self, initial_hash: &[u8; 64], target: u64) -> Result<u64> {
        let shared = Shared {
            state: Mutex::new(SearchState::default()),
            wake: Condvar::new(),
            stop: AtomicBool::new(false),
        };
        let workers = self.threads as u64;

        let outcome = std::thread::scope(|scope| {
            for worker in 0..workers {
                let shared = &shared;
                let limit = self.limit;
                scope.spawn(move || {
                    search(worker, workers, limit, initial_hash, target, shared);
                });
            }

            let mut state = shared.state.lock();
            while state.nonce.is_none() && state.finished_workers < self.threads {
                shared.wake.wait(&mut state);
            }
            shared.stop.store(true, Ordering::Relaxed);
            state.nonce
        });

        match outcome {
            Some(nonce) => {
                info!(nonce, "POW solved");
                Ok(nonce)
            }
            None => Err(PowError::Exhausted),
        }
    }
}

impl Default for PowSolver {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}

fn search(
    first: u64,
    step: u64,
    limit: u64,
    initial_hash: &[u8; 64],
    target: u64,
    shared: &Shared,
) {
    let mut nonce = first;
    while nonce <= limit {
        if shared.stop.load(Ordering::Relaxed) {
            break;
        }
        if trial_value(nonce, initial_hash) <= target {
            let mut state = shared.state.lock();
            if state.nonce.is_none() {
                state.nonce = Some(nonce);
                shared.wake.notify_all();
            } else {
                debug!(nonce, "late POW solution ignored");
            }
            return;
        }
        nonce = match nonce.checked_add(step) {
            Some(next) => next,
            None => break,
        };
    }

    let mut state = shared.state.lock();
    state.finished_workers += 1;
    shared.wake.notify_all();
}
