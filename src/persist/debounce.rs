//! Debounced persistence: rapid mutation bursts coalesce into one write
//! after ~1s of quiescence.
//!
//! The core is single-threaded and event-driven, so the debounce is
//! poll-based rather than timer-thread-based: the host marks the state
//! dirty after each mutation and polls on its own tick, passing the
//! current instant in.

use std::time::{Duration, Instant};

use tracing::debug;

use super::gateway::{to_blob, PersistError, PersistenceGateway};
use crate::store::Store;

pub const DEFAULT_FLUSH_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug)]
pub struct DebouncedSaver {
    delay: Duration,
    /// Instant of the most recent mutation; the write fires once `delay`
    /// has elapsed past it with no further mutation.
    dirty_since: Option<Instant>,
}

impl Default for DebouncedSaver {
    fn default() -> Self {
        Self::new(DEFAULT_FLUSH_DELAY)
    }
}

impl DebouncedSaver {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            dirty_since: None,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty_since.is_some()
    }

    /// Records a mutation. Each call restarts the quiescence window.
    pub fn mark_dirty(&mut self, now: Instant) {
        self.dirty_since = Some(now);
    }

    /// Writes the blob if the quiescence window has elapsed. Returns
    /// whether a write happened.
    pub fn poll<G: PersistenceGateway>(
        &mut self,
        now: Instant,
        store: &Store,
        gateway: &mut G,
    ) -> Result<bool, PersistError> {
        match self.dirty_since {
            Some(since) if now.duration_since(since) >= self.delay => {
                self.write(store, gateway)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Forces an immediate write of pending state (e.g. on shutdown).
    pub fn flush<G: PersistenceGateway>(
        &mut self,
        store: &Store,
        gateway: &mut G,
    ) -> Result<(), PersistError> {
        if self.dirty_since.is_some() {
            self.write(store, gateway)?;
        }
        Ok(())
    }

    fn write<G: PersistenceGateway>(
        &mut self,
        store: &Store,
        gateway: &mut G,
    ) -> Result<(), PersistError> {
        gateway.save(&to_blob(store)?)?;
        self.dirty_since = None;
        debug!("state blob flushed");
        Ok(())
    }
}
