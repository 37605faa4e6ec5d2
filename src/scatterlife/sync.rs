//! Abortable rendezvous for the worker group.
//!
//! `std::sync::Barrier` cannot be released early, so a member that fails
//! between collectives would leave the rest blocked forever. `GroupBarrier`
//! adds a sticky abort flag: once set, every current and future `wait`
//! returns `LifeError::Aborted`.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::error::{LifeError, LifeResult};

#[derive(Debug)]
struct BarrierState {
    arrived: usize,
    epoch: u64,
    aborted: bool,
}

#[derive(Debug)]
pub struct GroupBarrier {
    size: usize,
    state: Mutex<BarrierState>,
    cvar: Condvar,
}

impl GroupBarrier {
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "barrier needs at least one member");
        Self {
            size,
            state: Mutex::new(BarrierState {
                arrived: 0,
                epoch: 0,
                aborted: false,
            }),
            cvar: Condvar::new(),
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    // The state is three plain fields updated atomically under the lock, so a
    // poisoned guard still holds consistent data.
    fn lock(&self) -> MutexGuard<'_, BarrierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until all `size` members have arrived or the group is aborted.
    pub fn wait(&self) -> LifeResult<()> {
        let mut state = self.lock();
        if state.aborted {
            return Err(LifeError::Aborted);
        }
        state.arrived += 1;
        if state.arrived == self.size {
            state.arrived = 0;
            state.epoch = state.epoch.wrapping_add(1);
            self.cvar.notify_all();
            return Ok(());
        }
        let epoch = state.epoch;
        let state = self
            .cvar
            .wait_while(state, |s| s.epoch == epoch && !s.aborted)
            .unwrap_or_else(PoisonError::into_inner);
        if state.epoch != epoch {
            Ok(())
        } else {
            Err(LifeError::Aborted)
        }
    }

    /// Release every waiter with `Aborted`. Idempotent.
    pub fn abort(&self) {
        let mut state = self.lock();
        if !state.aborted {
            state.aborted = true;
            self.cvar.notify_all();
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.lock().aborted
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use super::GroupBarrier;
    use crate::error::LifeError;

    #[test]
    fn releases_once_all_members_arrive() {
        let barrier = GroupBarrier::new(4);
        let passed = AtomicUsize::new(0);
        thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..16 {
                        barrier.wait().unwrap();
                    }
                    passed.fetch_add(1, Ordering::Relaxed);
                });
            }
        });
        assert_eq!(passed.load(Ordering::Relaxed), 4);
    }

    #[test]
    fn abort_wakes_blocked_members() {
        let barrier = GroupBarrier::new(3);
        thread::scope(|s| {
            let waiters: Vec<_> = (0..2).map(|_| s.spawn(|| barrier.wait())).collect();
            // Wait for both to block, then abort instead of arriving.
            while barrier.lock().arrived < 2 {
                thread::yield_now();
            }
            barrier.abort();
            for w in waiters {
                assert!(matches!(w.join().unwrap(), Err(LifeError::Aborted)));
            }
        });
        assert!(barrier.is_aborted());
        assert!(matches!(barrier.wait(), Err(LifeError::Aborted)));
    }
}
