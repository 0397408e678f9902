//! Shared reactor handle
//!
//! All reactor state sits behind one mutex. The tick driver holds the lock
//! for a whole tick, so a display reading a snapshot never sees a tick half
//! applied.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::core::error::{ReactorError, Result};
use crate::reactor::engine::{Reactor, TickReport};
use crate::reactor::snapshot::ReactorSnapshot;

#[derive(Clone)]
pub struct SharedReactor {
    inner: Arc<Mutex<Reactor>>,
}

impl SharedReactor {
    pub fn new(reactor: Reactor) -> Self {
        Self {
            inner: Arc::new(Mutex::new(reactor)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Reactor>> {
        self.inner.lock().map_err(|_| ReactorError::LockPoisoned)
    }

    pub fn advance_tick(&self) -> Result<TickReport> {
        self.lock()?.advance_tick()
    }

    pub fn snapshot(&self) -> Result<ReactorSnapshot> {
        Ok(self.lock()?.snapshot())
    }

    /// Run `f` with exclusive access to the reactor
    pub fn with<T>(&self, f: impl FnOnce(&mut Reactor) -> T) -> Result<T> {
        let mut guard = self.lock()?;
        Ok(f(&mut guard))
    }
}
